//! Configuration management

mod settings;

pub use settings::{AppConfig, BusConfig, DisplayConfig, CONFIG_VERSION};
