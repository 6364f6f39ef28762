//! Display sink that writes every delivered value to the log

use can_dash_core::{ChannelRegistry, DisplaySink};
use can_dash_types::ChannelId;
use log::{log, Level};
use std::sync::Arc;

/// Logs `name = value` for each update; useful headless or alongside a board
pub struct LogSink {
    registry: Arc<ChannelRegistry>,
    level: Level,
    delivered: u64,
}

impl LogSink {
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self {
            registry,
            level: Level::Info,
            delivered: 0,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Number of values logged so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl DisplaySink for LogSink {
    fn set(&mut self, id: ChannelId, value: f32) {
        self.delivered += 1;
        match self.registry.lookup(id) {
            Some(channel) => log!(self.level, "{} = {}", channel.name, value),
            None => log!(self.level, "{} = {}", id, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_deliveries() {
        let registry = Arc::new(ChannelRegistry::reference());
        let mut sink = LogSink::new(registry).with_level(Level::Debug);
        sink.set(ChannelId(0x1E005104), 5000.0);
        sink.set(ChannelId(0x7E8), 1.0);
        sink.flush();
        assert_eq!(sink.delivered(), 2);
    }
}
