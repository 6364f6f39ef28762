//! can-dash-sources: Frame source implementations for can-dash.
//!
//! - `SocketCanSource`: live Linux SocketCAN interface (feature `socketcan`)
//! - `ReplaySource`: candump log playback
//! - `SimulatedSource`: synthetic waveforms for bench testing

mod replay;
mod simulated;
#[cfg(all(target_os = "linux", feature = "socketcan"))]
mod socketcan;

pub use replay::{Pacing, ReplayError, ReplaySource};
pub use simulated::{SimulatedChannel, SimulatedConfig, SimulatedSource, WaveMode};
#[cfg(all(target_os = "linux", feature = "socketcan"))]
pub use socketcan::SocketCanSource;
