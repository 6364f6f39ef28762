//! Frame payload decoding

use crate::constants::READING_LEN;
use crate::error::DecodeError;

/// Decode the reading carried in a payload.
///
/// The first four bytes are a big-endian IEEE-754 f32. Anything after them is
/// part of the fixed frame layout and is ignored.
pub fn decode(payload: &[u8]) -> Result<f32, DecodeError> {
    match payload.get(..READING_LEN) {
        Some(&[a, b, c, d]) => Ok(f32::from_be_bytes([a, b, c, d])),
        _ => Err(DecodeError::Truncated { len: payload.len() }),
    }
}

/// Inverse of [`decode`]: the four payload bytes for a reading
pub fn encode(value: f32) -> [u8; READING_LEN] {
    value.to_be_bytes()
}
