//! Raw bus frames

use crate::channel::ChannelId;
use thiserror::Error;

/// Largest payload a frame can carry (CAN FD)
pub const MAX_PAYLOAD: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("payload of {len} bytes exceeds the {max} byte frame limit", max = MAX_PAYLOAD)]
    PayloadTooLong { len: usize },
}

/// One frame as read off the bus.
///
/// Fixed capacity so the ingestion path never allocates.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    id: ChannelId,
    data: [u8; MAX_PAYLOAD],
    len: u8,
}

impl RawFrame {
    pub fn new(id: ChannelId, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLong { len: payload.len() });
        }
        let mut data = [0u8; MAX_PAYLOAD];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            id,
            data,
            len: payload.len() as u8,
        })
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawFrame({}#", self.id)?;
        for b in self.payload() {
            write!(f, "{:02X}", b)?;
        }
        write!(f, ")")
    }
}
