//! can-dash-displayers: Display sinks for can-dash.
//!
//! - `GaugeBoard`: text bar gauges, one per channel
//! - `LogSink`: writes each delivered value to the log

mod gauge_board;
mod log_sink;

pub use gauge_board::{reference_gauges, GaugeBoard, GaugeError, DEFAULT_GAUGE_WIDTH};
pub use log_sink::LogSink;
