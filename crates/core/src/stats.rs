//! Ingestion counters and status, readable from any thread

use arc_swap::ArcSwap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running totals kept by the ingestion loop
#[derive(Debug, Default)]
pub struct IngestStats {
    frames: AtomicU64,
    unknown: AtomicU64,
    decode_errors: AtomicU64,
    changed: AtomicU64,
    suppressed: AtomicU64,
    reopens: AtomicU64,
}

/// Plain copy of [`IngestStats`] at one moment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames: u64,
    pub unknown: u64,
    pub decode_errors: u64,
    pub changed: u64,
    pub suppressed: u64,
    pub reopens: u64,
}

impl IngestStats {
    pub(crate) fn frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn unknown(&self) {
        self.unknown.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn changed(&self) {
        self.changed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn suppressed(&self) {
        self.suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reopened(&self) {
        self.reopens.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            unknown: self.unknown.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            changed: self.changed.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            reopens: self.reopens.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames, {} changed, {} suppressed, {} unknown, {} bad",
            self.frames, self.changed, self.suppressed, self.unknown, self.decode_errors
        )?;
        if self.reopens > 0 {
            write!(f, ", {} reopens", self.reopens)?;
        }
        Ok(())
    }
}

/// Where the ingestion loop is in its life
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestStatus {
    Starting,
    Running,
    Reopening { attempt: u32 },
    SourceClosed,
    Stopped,
    Failed(String),
}

impl IngestStatus {
    /// The loop has exited and values are frozen
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            IngestStatus::SourceClosed | IngestStatus::Stopped | IngestStatus::Failed(_)
        )
    }
}

impl fmt::Display for IngestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestStatus::Starting => write!(f, "starting"),
            IngestStatus::Running => write!(f, "live"),
            IngestStatus::Reopening { attempt } => write!(f, "reopening (attempt {})", attempt),
            IngestStatus::SourceClosed => write!(f, "source closed"),
            IngestStatus::Stopped => write!(f, "stopped"),
            IngestStatus::Failed(reason) => write!(f, "bus failed: {}", reason),
        }
    }
}

/// Latest status, swapped in whole so readers never lock
#[derive(Debug)]
pub struct StatusCell {
    inner: ArcSwap<IngestStatus>,
}

impl StatusCell {
    pub fn new() -> Self {
        Self {
            inner: ArcSwap::from_pointee(IngestStatus::Starting),
        }
    }

    pub fn get(&self) -> Arc<IngestStatus> {
        self.inner.load_full()
    }

    pub(crate) fn set(&self, status: IngestStatus) {
        self.inner.store(Arc::new(status));
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}
