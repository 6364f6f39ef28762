//! Frame source trait

use crate::error::SourceError;
use can_dash_types::RawFrame;

/// What a single read from a source produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Received {
    /// A frame arrived
    Frame(RawFrame),
    /// The read timed out with nothing on the bus; try again
    Idle,
    /// The source has no more frames (end of a replay, bus shut down cleanly)
    Closed,
}

/// Trait for all frame sources
///
/// Frame sources wrap a bus transport (SocketCAN, a log replay, a generator)
/// and hand frames to the ingestion loop one at a time. Reads may block, but
/// should return `Received::Idle` after a bounded wait so a stop request is
/// noticed.
pub trait FrameSource: Send {
    /// Human-readable description for logs (e.g. "socketcan:can0")
    fn describe(&self) -> String;

    /// Wait for the next frame.
    ///
    /// An `Err` is a transport failure and ends the ingestion loop unless a
    /// reopen policy is in force.
    fn next_frame(&mut self) -> Result<Received, SourceError>;

    /// Try to re-establish the transport after a failure
    fn reopen(&mut self) -> Result<(), SourceError> {
        Err(SourceError::ReopenUnsupported)
    }
}

/// Type-erased frame source for dynamic dispatch
pub type BoxedFrameSource = Box<dyn FrameSource>;

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn next_frame(&mut self) -> Result<Received, SourceError> {
        (**self).next_frame()
    }

    fn reopen(&mut self) -> Result<(), SourceError> {
        (**self).reopen()
    }
}
