//! Shared constants for the pipeline

use std::time::Duration;

/// Bytes at the front of a payload that carry the reading
pub const READING_LEN: usize = 4;

/// How long a source read may block before reporting idle.
/// Bounds how late a stop request is noticed.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Slice length for interruptible sleeps (reopen backoff)
pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Presentation refresh cadence (10 Hz is plenty for needle gauges)
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Queue capacity of `QueueNotifier::new`
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
