//! can-dash: CAN bus telemetry dashboard
//!
//! This library ties the workspace crates together for the binary:
//! - Configuration (`AppConfig`): bus, channel table, gauges, display
//! - The `app` wiring: ingestion thread, mailbox and presentation loop

pub mod app;
pub mod config;

// Re-export commonly used types
pub use app::{open_source, run, run_until, Presentation, RunSummary, SourceKind};
pub use config::AppConfig;
