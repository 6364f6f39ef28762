//! can-dash-types: Shared data types for the can-dash telemetry dashboard.
//!
//! Plain data only: channel identity, the static channel table format,
//! raw bus frames and gauge descriptions. Everything else builds on these.

pub mod channel;
pub mod frame;
pub mod gauge;

// Re-export commonly used types at the crate root for convenience
pub use channel::{ChannelDescriptor, ChannelId, ChannelTableEntry, Precision};
pub use frame::{FrameError, RawFrame, MAX_PAYLOAD};
pub use gauge::GaugeSpec;
