//! can-dash-core: Channel registry, frame decoding and live channel state.
//!
//! This crate contains the pipeline between a bus and a display:
//! the read-only `ChannelRegistry`, the payload decoder, per-channel
//! quantization, the lock-free `ChannelStateTable`, the notifiers that carry
//! changed values to the presentation side, and the `IngestionLoop` that
//! drives a `FrameSource`.

pub mod constants;
mod decoder;
pub mod defaults;
mod display_sink;
pub mod error;
mod frame_source;
mod ingest;
mod notifier;
mod quantize;
mod registry;
mod reopen;
mod state_table;
mod stats;
mod stop;

pub use constants::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_READ_TIMEOUT, DEFAULT_REFRESH_INTERVAL, READING_LEN,
    STOP_POLL_INTERVAL,
};
pub use decoder::{decode, encode};
pub use display_sink::DisplaySink;
pub use error::{DecodeError, IngestError, RegistryError, SourceError, StateError};
pub use frame_source::{BoxedFrameSource, FrameSource, Received};
pub use ingest::{FrameOutcome, IngestExit, IngestionLoop};
pub use notifier::{
    ChannelUpdate, LatestValueMailbox, LatestValueNotifier, QueueNotifier, SinkNotifier,
    UpdateNotifier,
};
pub use quantize::round_to_precision;
pub use registry::ChannelRegistry;
pub use reopen::ReopenPolicy;
pub use state_table::{ChannelStateTable, UpdateOutcome};
pub use stats::{IngestStats, IngestStatus, StatsSnapshot, StatusCell};
pub use stop::StopSignal;

// Re-export types used in trait signatures for convenience
pub use can_dash_types::{
    ChannelDescriptor, ChannelId, ChannelTableEntry, FrameError, Precision, RawFrame,
};
