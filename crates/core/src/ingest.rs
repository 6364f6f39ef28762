//! Ingestion loop: frames in, changed channel values out
//!
//! Runs on its own thread for as long as the source produces frames. Per-frame
//! problems (unknown id, short payload) are counted and skipped; a transport
//! error ends the loop and is returned to the caller.

use crate::decoder::decode;
use crate::error::{IngestError, SourceError};
use crate::frame_source::{FrameSource, Received};
use crate::notifier::UpdateNotifier;
use crate::reopen::ReopenPolicy;
use crate::state_table::{ChannelStateTable, UpdateOutcome};
use crate::stats::{IngestStats, IngestStatus, StatusCell};
use crate::stop::StopSignal;
use can_dash_types::RawFrame;
use log::{debug, error, info, trace, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// What happened to one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Not a channel this dash shows
    Unknown,
    /// Known channel, payload too short
    DecodeFailed,
    /// Quantized value matched the stored one
    Unchanged,
    /// Stored and handed to the notifier
    Changed(f32),
}

/// Why the loop returned without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestExit {
    SourceClosed,
    Stopped,
}

pub struct IngestionLoop<N> {
    table: Arc<ChannelStateTable>,
    notifier: N,
    stop: StopSignal,
    reopen: ReopenPolicy,
    stats: Arc<IngestStats>,
    status: Arc<StatusCell>,
}

impl<N: UpdateNotifier> IngestionLoop<N> {
    pub fn new(table: Arc<ChannelStateTable>, notifier: N) -> Self {
        Self {
            table,
            notifier,
            stop: StopSignal::new(),
            reopen: ReopenPolicy::default(),
            stats: Arc::new(IngestStats::default()),
            status: Arc::new(StatusCell::new()),
        }
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_reopen_policy(mut self, policy: ReopenPolicy) -> Self {
        self.reopen = policy;
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn stats(&self) -> Arc<IngestStats> {
        Arc::clone(&self.stats)
    }

    pub fn status(&self) -> Arc<StatusCell> {
        Arc::clone(&self.status)
    }

    pub fn table(&self) -> &Arc<ChannelStateTable> {
        &self.table
    }

    /// Look up, decode, quantize, compare, store and notify for one frame
    pub fn process_frame(&mut self, frame: &RawFrame) -> FrameOutcome {
        self.stats.frame();

        let Some(channel) = self.table.registry().lookup(frame.id()) else {
            self.stats.unknown();
            return FrameOutcome::Unknown;
        };

        let raw = match decode(frame.payload()) {
            Ok(raw) => raw,
            Err(e) => {
                self.stats.decode_error();
                debug!("Skipping frame for {} ({}): {}", channel.name, channel.id, e);
                return FrameOutcome::DecodeFailed;
            }
        };

        match self.table.update_slot(channel.index, raw) {
            UpdateOutcome::Changed(value) => {
                self.stats.changed();
                trace!("{} -> {}", channel.name, value);
                self.notifier.notify(channel, value);
                FrameOutcome::Changed(value)
            }
            UpdateOutcome::Unchanged => {
                self.stats.suppressed();
                FrameOutcome::Unchanged
            }
        }
    }

    /// Drive `source` until it closes, a stop is requested, or it fails.
    pub fn run<S: FrameSource + ?Sized>(&mut self, source: &mut S) -> Result<IngestExit, IngestError> {
        info!("Starting ingestion from {}", source.describe());
        self.status.set(IngestStatus::Running);

        loop {
            if self.stop.is_stopped() {
                info!("Ingestion stopped ({})", self.stats.snapshot());
                self.status.set(IngestStatus::Stopped);
                return Ok(IngestExit::Stopped);
            }

            match source.next_frame() {
                Ok(Received::Frame(frame)) => {
                    self.process_frame(&frame);
                }
                Ok(Received::Idle) => {}
                Ok(Received::Closed) => {
                    info!(
                        "Frame source {} closed ({})",
                        source.describe(),
                        self.stats.snapshot()
                    );
                    self.status.set(IngestStatus::SourceClosed);
                    return Ok(IngestExit::SourceClosed);
                }
                Err(e) => {
                    if !self.reopen.is_enabled() {
                        return Err(self.fail(IngestError::Source(e)));
                    }
                    if let Some(exit) = self.reopen_source(source, e)? {
                        return Ok(exit);
                    }
                }
            }
        }
    }

    /// Try to bring the source back under the reopen policy.
    ///
    /// `Ok(None)` means the source is usable again.
    fn reopen_source<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
        cause: SourceError,
    ) -> Result<Option<IngestExit>, IngestError> {
        warn!("Frame source {} failed: {}", source.describe(), cause);
        let mut last = cause;

        for attempt in 1..=self.reopen.max_attempts {
            self.status.set(IngestStatus::Reopening { attempt });
            if self.stop.sleep(self.reopen.delay_for(attempt)) {
                self.status.set(IngestStatus::Stopped);
                return Ok(Some(IngestExit::Stopped));
            }

            match source.reopen() {
                Ok(()) => {
                    info!("Reopened {} on attempt {}", source.describe(), attempt);
                    self.stats.reopened();
                    self.status.set(IngestStatus::Running);
                    return Ok(None);
                }
                Err(SourceError::ReopenUnsupported) => {
                    return Err(self.fail(IngestError::Source(last)));
                }
                Err(e) => {
                    warn!("Reopen attempt {} failed: {}", attempt, e);
                    last = e;
                }
            }
        }

        Err(self.fail(IngestError::ReopenExhausted {
            attempts: self.reopen.max_attempts,
            last,
        }))
    }

    fn fail(&self, err: IngestError) -> IngestError {
        error!("Ingestion failed: {}", err);
        self.status.set(IngestStatus::Failed(err.to_string()));
        err
    }
}

impl<N: UpdateNotifier + 'static> IngestionLoop<N> {
    /// Run on a dedicated thread named `can-ingest`
    pub fn spawn<S>(mut self, mut source: S) -> std::io::Result<JoinHandle<Result<IngestExit, IngestError>>>
    where
        S: FrameSource + 'static,
    {
        thread::Builder::new()
            .name("can-ingest".to_string())
            .spawn(move || self.run(&mut source))
    }
}
