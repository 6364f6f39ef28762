//! Reference channel table for the '72 Camaro dash
//!
//! All channels carry a big-endian f32 in the first four payload bytes.

use can_dash_types::{ChannelTableEntry, Precision};

const REFERENCE_CHANNELS: [(u32, &str, Precision); 18] = [
    (0x1E005104, "tachometer", 0),
    (0x1E371104, "speedometer", 0),
    (0x1E085104, "voltmeter", 1),
    (0x1E089104, "oilometer", 1),
    (0x1E07D104, "coolant_temp", 1),
    (0x1E679104, "fuelometer", 0),
    (0x1E019104, "afr_left", 2),
    (0x1E01D104, "afr_right", 2),
    (0x1E021104, "afr_avg", 2),
    (0x1E385104, "trans_temp", 1),
    (0x1E4D1104, "outside_temp", 0),
    (0x1E4D5104, "outside_hum", 1),
    (0x1E4B9104, "ps_temp", 1),
    (0x1E4A9104, "oil_temp", 1),
    (0x1E4ED104, "drv_frnt_tire", 1),
    (0x1E4F5104, "drv_rear_tire", 1),
    (0x1E4F1104, "pass_frnt_tire", 1),
    (0x1E4F9104, "pass_rear_tire", 1),
];

/// The reference channel table, in table order
pub fn reference_table() -> Vec<ChannelTableEntry> {
    REFERENCE_CHANNELS
        .iter()
        .map(|&(id, name, precision)| ChannelTableEntry::new(id, name, precision))
        .collect()
}
