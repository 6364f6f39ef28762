//! Bounded reopen policy for a failed frame source

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How hard the ingestion loop tries to bring a failed source back.
///
/// The default (`max_attempts = 0`) gives up on the first transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReopenPolicy {
    /// Consecutive reopen attempts before the loop fails; 0 disables reopening
    #[serde(default)]
    pub max_attempts: u32,
    /// Delay before the first attempt
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound on any single delay
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_base_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    5_000
}

impl Default for ReopenPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl ReopenPolicy {
    /// Never reopen
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }

    /// Delay before `attempt` (1-based): `base * 2^(attempt - 1)`, capped
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let shift = attempt.saturating_sub(1).min(30);
        let delay = self.base_delay_ms.saturating_mul(1u64 << shift);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}
