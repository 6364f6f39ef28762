//! Error types for the ingestion pipeline
//!
//! Per-frame problems (`DecodeError`) are recoverable and never leave the
//! ingestion loop. Transport problems (`SourceError`) end it.

use can_dash_types::ChannelId;
use thiserror::Error;

pub use can_dash_types::FrameError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload truncated: {len} bytes, need 4")]
    Truncated { len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("channel table is empty")]
    Empty,
    #[error("duplicate channel id {0}")]
    DuplicateId(ChannelId),
    #[error("duplicate channel name {0:?}")]
    DuplicateName(String),
    #[error("channel {0} has an empty name")]
    EmptyName(ChannelId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("unknown channel {0}")]
    UnknownChannel(ChannelId),
}

/// Transport-level failures reported by a frame source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("bus interface {0:?} not found")]
    NotFound(String),
    #[error("bus closed: {0}")]
    Closed(String),
    #[error("bus I/O error: {0}")]
    Io(std::io::Error),
    #[error("source cannot be reopened")]
    ReopenUnsupported,
    #[error("{0}")]
    Other(String),
}

// Not `#[from]`: the message already carries the I/O error, so it must not
// show up again as the source.
impl From<std::io::Error> for SourceError {
    fn from(e: std::io::Error) -> Self {
        SourceError::Io(e)
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("frame source failed after {attempts} reopen attempts: {last}")]
    ReopenExhausted { attempts: u32, last: SourceError },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_source_failure_message_not_repeated() {
        let err = IngestError::from(SourceError::Closed("link down".into()));
        assert_eq!(err.to_string(), "bus closed: link down");
        // Nothing left in the chain to print a second time
        assert!(err.source().is_none());

        let io = IngestError::from(SourceError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "device reset",
        )));
        assert_eq!(io.to_string(), "bus I/O error: device reset");
        assert!(io.source().is_none());
    }
}
