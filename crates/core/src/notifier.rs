//! Delivery of changed values from the ingestion thread to a display sink
//!
//! None of these ever block the caller. A slow consumer sees the newest value
//! of each channel on its next read rather than a backlog.

use crate::constants::DEFAULT_QUEUE_CAPACITY;
use crate::display_sink::DisplaySink;
use crate::registry::ChannelRegistry;
use can_dash_types::{ChannelDescriptor, ChannelId};
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use log::debug;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// Called by the ingestion loop for every value that changed
pub trait UpdateNotifier: Send {
    fn notify(&mut self, channel: &ChannelDescriptor, value: f32);
}

impl<F> UpdateNotifier for F
where
    F: FnMut(ChannelId, f32) + Send,
{
    fn notify(&mut self, channel: &ChannelDescriptor, value: f32) {
        self(channel.id, value)
    }
}

/// A changed value in transit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelUpdate {
    pub id: ChannelId,
    pub value: f32,
}

struct MailboxEntry {
    id: ChannelId,
    bits: AtomicU32,
    pending: AtomicBool,
}

/// One "latest value + pending" cell per channel.
///
/// The ingestion side posts, the presentation side drains on its own cadence.
/// Repeated posts before a drain coalesce into one delivery of the last value.
pub struct LatestValueMailbox {
    entries: Box<[MailboxEntry]>,
}

impl LatestValueMailbox {
    pub fn new(registry: &ChannelRegistry) -> Self {
        let entries = registry
            .iter()
            .map(|c| MailboxEntry {
                id: c.id,
                bits: AtomicU32::new(0.0f32.to_bits()),
                pending: AtomicBool::new(false),
            })
            .collect();
        Self { entries }
    }

    fn post(&self, index: usize, value: f32) {
        if let Some(entry) = self.entries.get(index) {
            entry.bits.store(value.to_bits(), Ordering::Release);
            entry.pending.store(true, Ordering::Release);
        }
    }

    /// Hand every pending channel to `sink`, then flush it if anything was
    /// delivered. Returns the number of channels delivered.
    pub fn drain<S: DisplaySink + ?Sized>(&self, sink: &mut S) -> usize {
        let mut delivered = 0;
        for entry in self.entries.iter() {
            if entry.pending.swap(false, Ordering::AcqRel) {
                let value = f32::from_bits(entry.bits.load(Ordering::Acquire));
                sink.set(entry.id, value);
                delivered += 1;
            }
        }
        if delivered > 0 {
            sink.flush();
        }
        delivered
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.pending.load(Ordering::Acquire))
            .count()
    }
}

/// Posts into a shared [`LatestValueMailbox`]
pub struct LatestValueNotifier {
    mailbox: Arc<LatestValueMailbox>,
}

impl LatestValueNotifier {
    pub fn new(mailbox: Arc<LatestValueMailbox>) -> Self {
        Self { mailbox }
    }
}

impl UpdateNotifier for LatestValueNotifier {
    fn notify(&mut self, channel: &ChannelDescriptor, value: f32) {
        self.mailbox.post(channel.index, value);
    }
}

/// Pushes updates into a bounded queue, dropping them when it is full
pub struct QueueNotifier {
    tx: Sender<ChannelUpdate>,
    dropped: Arc<AtomicU64>,
}

impl QueueNotifier {
    /// Queue of `DEFAULT_QUEUE_CAPACITY` updates
    pub fn new() -> (Self, Receiver<ChannelUpdate>) {
        Self::bounded(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create the notifier and the receiving end of its queue
    pub fn bounded(capacity: usize) -> (Self, Receiver<ChannelUpdate>) {
        let (tx, rx) = channel::bounded(capacity);
        let notifier = Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (notifier, rx)
    }

    /// Shared counter of updates dropped because the queue was full or gone
    pub fn dropped_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped)
    }
}

impl UpdateNotifier for QueueNotifier {
    fn notify(&mut self, channel: &ChannelDescriptor, value: f32) {
        let update = ChannelUpdate {
            id: channel.id,
            value,
        };
        match self.tx.try_send(update) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Disconnected(_)) => {
                if self.dropped.fetch_add(1, Ordering::Relaxed) == 0 {
                    debug!("Update queue receiver is gone, dropping updates");
                }
            }
        }
    }
}

/// Calls a sink inline on the ingestion thread. Only for sinks that are cheap.
pub struct SinkNotifier<S> {
    sink: S,
}

impl<S: DisplaySink + Send> SinkNotifier<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}

impl<S: DisplaySink + Send> UpdateNotifier for SinkNotifier<S> {
    fn notify(&mut self, channel: &ChannelDescriptor, value: f32) {
        self.sink.set(channel.id, value);
    }
}
