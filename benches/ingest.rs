//! Benchmarks for the per-frame ingestion path.
//!
//! Run with: `cargo bench --bench ingest`

use can_dash_core::{
    encode, ChannelId, ChannelRegistry, ChannelStateTable, IngestionLoop, LatestValueMailbox,
    LatestValueNotifier, RawFrame,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

const TACH: ChannelId = ChannelId(0x1E005104);
const AFR_LEFT: ChannelId = ChannelId(0x1E019104);

/// Frames that land in each branch of the pipeline
fn frame_mix() -> Vec<(&'static str, Vec<RawFrame>)> {
    let frame = |id, value: f32| RawFrame::new(id, &encode(value)).unwrap_or_else(|e| panic!("{e}"));
    vec![
        // Every frame moves the quantized value
        (
            "changing",
            (0..64).map(|i| frame(AFR_LEFT, 10.0 + i as f32 * 0.1)).collect(),
        ),
        // Jitter under the channel's precision
        (
            "suppressed",
            (0..64).map(|i| frame(TACH, 5000.0 + (i % 4) as f32 * 0.1)).collect(),
        ),
        // Other traffic on the bus
        (
            "unknown",
            (0..64).map(|i| frame(ChannelId(0x700 + i), 1.0)).collect(),
        ),
    ]
}

fn bench_process_frame(c: &mut Criterion) {
    let registry = Arc::new(ChannelRegistry::reference());
    let mut group = c.benchmark_group("process_frame");

    for (name, frames) in frame_mix() {
        group.throughput(Throughput::Elements(frames.len() as u64));

        let table = Arc::new(ChannelStateTable::new(registry.clone()));
        let mut ingest = IngestionLoop::new(table, |id: ChannelId, value: f32| {
            black_box((id, value));
        });
        group.bench_with_input(BenchmarkId::new("closure", name), &frames, |b, frames| {
            b.iter(|| {
                for frame in frames {
                    black_box(ingest.process_frame(frame));
                }
            })
        });

        let table = Arc::new(ChannelStateTable::new(registry.clone()));
        let mailbox = Arc::new(LatestValueMailbox::new(&registry));
        let mut ingest = IngestionLoop::new(table, LatestValueNotifier::new(mailbox));
        group.bench_with_input(BenchmarkId::new("mailbox", name), &frames, |b, frames| {
            b.iter(|| {
                for frame in frames {
                    black_box(ingest.process_frame(frame));
                }
            })
        });
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let registry = Arc::new(ChannelRegistry::reference());
    let table = ChannelStateTable::new(registry);
    c.bench_function("state_table_snapshot", |b| b.iter(|| black_box(table.snapshot())));
}

criterion_group!(benches, bench_process_frame, bench_snapshot);
criterion_main!(benches);
