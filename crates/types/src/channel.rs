//! Channel identity and the static channel table format

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Numeric bus identifier of a channel (the CAN arbitration id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u32);

impl ChannelId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Parse `0x1E005104` or bare `1E005104`.
    ///
    /// Bare strings are read as hex, the way candump prints ids.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        u32::from_str_radix(hex, 16).ok().map(Self)
    }
}

impl From<u32> for ChannelId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl Serialize for ChannelId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChannelId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChannelIdVisitor;

        impl<'de> Visitor<'de> for ChannelIdVisitor {
            type Value = ChannelId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a u32 channel id or a hex string such as \"0x1E005104\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ChannelId, E> {
                u32::try_from(v)
                    .map(ChannelId)
                    .map_err(|_| E::custom(format!("channel id {} does not fit in 32 bits", v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ChannelId, E> {
                u32::try_from(v)
                    .map(ChannelId)
                    .map_err(|_| E::custom(format!("channel id {} does not fit in 32 bits", v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ChannelId, E> {
                ChannelId::parse(v).ok_or_else(|| E::custom(format!("invalid channel id: {:?}", v)))
            }
        }

        deserializer.deserialize_any(ChannelIdVisitor)
    }
}

/// Number of decimal places a channel is rounded to.
///
/// Negative values round to a power of ten (-1 rounds to tens).
pub type Precision = i8;

/// One row of the static channel table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelTableEntry {
    /// Bus identifier
    pub id: ChannelId,
    /// Display name, unique within the table
    pub name: String,
    /// Quantization precision in decimal places
    pub precision: Precision,
}

impl ChannelTableEntry {
    pub fn new(id: u32, name: impl Into<String>, precision: Precision) -> Self {
        Self {
            id: ChannelId(id),
            name: name.into(),
            precision,
        }
    }
}

/// Fully resolved channel, built once by the registry
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDescriptor {
    pub id: ChannelId,
    pub name: String,
    pub precision: Precision,
    /// Dense position of this channel's value slot
    pub index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_display_is_hex() {
        assert_eq!(ChannelId(0x1E005104).to_string(), "0x1E005104");
    }

    #[test]
    fn test_channel_id_parse() {
        assert_eq!(ChannelId::parse("0x1E005104"), Some(ChannelId(0x1E005104)));
        assert_eq!(ChannelId::parse("1e005104"), Some(ChannelId(0x1E005104)));
        assert_eq!(ChannelId::parse("zz"), None);
    }

    #[test]
    fn test_table_entry_accepts_number_or_hex() {
        let from_hex: ChannelTableEntry =
            serde_json::from_str(r#"{"id":"0x1E005104","name":"tachometer","precision":0}"#)
                .unwrap();
        let from_num: ChannelTableEntry =
            serde_json::from_str(r#"{"id":503337220,"name":"tachometer","precision":0}"#).unwrap();
        assert_eq!(from_hex, from_num);

        let json = serde_json::to_string(&from_hex).unwrap();
        assert!(json.contains("\"0x1E005104\""));
    }

    #[test]
    fn test_table_entry_rejects_negative_id() {
        let result: Result<ChannelTableEntry, _> =
            serde_json::from_str(r#"{"id":-1,"name":"x","precision":0}"#);
        assert!(result.is_err());
    }
}
