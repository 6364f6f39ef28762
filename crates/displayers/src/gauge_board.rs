//! Text gauge board
//!
//! Renders one horizontal bar gauge per channel, in registry order:
//!
//! ```text
//! RPM            [#####.....] 4000 / 8000
//! Oil PSI        [###.......] 38.5 / 120
//! ```
//!
//! Channels without a [`GaugeSpec`] are shown by name with an empty bar.

use can_dash_core::{ChannelRegistry, DisplaySink};
use can_dash_types::{ChannelId, GaugeSpec, Precision};
use std::collections::HashMap;
use thiserror::Error;

/// Width of the bar between the brackets when none is configured
pub const DEFAULT_GAUGE_WIDTH: usize = 20;

const FILLED: char = '#';
const EMPTY: char = '.';

#[derive(Debug, Error, PartialEq)]
pub enum GaugeError {
    #[error("gauge {label:?} refers to unknown channel {channel:?}")]
    UnknownChannel { channel: String, label: String },
    #[error("channel {0:?} has more than one gauge")]
    DuplicateGauge(String),
}

/// Labels and full-scale values of the reference dashboard
pub fn reference_gauges() -> Vec<GaugeSpec> {
    [
        ("afr_left", "AFR Left", 20.0),
        ("afr_right", "AFR Right", 20.0),
        ("afr_avg", "AFR Average", 20.0),
        ("ps_temp", "Power Steer °F", 260.0),
        ("outside_temp", "Outside °F", 120.0),
        ("outside_hum", "Outside Hum %", 100.0),
        ("speedometer", "MPH", 160.0),
        ("voltmeter", "Volts", 16.0),
        ("oilometer", "Oil PSI", 120.0),
        ("oil_temp", "Oil Temp °F", 300.0),
        ("coolant_temp", "Engine Temp °F", 260.0),
        ("trans_temp", "Trans Temp °F", 260.0),
        ("fuelometer", "FUEL %", 100.0),
        ("tachometer", "RPM", 8000.0),
        ("drv_frnt_tire", "Driver Front", 50.0),
        ("drv_rear_tire", "Driver Rear", 50.0),
        ("pass_frnt_tire", "Pass Front", 50.0),
        ("pass_rear_tire", "Pass Rear", 50.0),
    ]
    .into_iter()
    .map(|(channel, label, max)| GaugeSpec::new(channel, label, max))
    .collect()
}

#[derive(Debug, Clone)]
struct GaugeRow {
    spec: GaugeSpec,
    precision: Precision,
    value: Option<f32>,
}

/// Display sink that keeps the newest value per channel and draws it as text
#[derive(Debug)]
pub struct GaugeBoard {
    rows: Vec<GaugeRow>,
    by_id: HashMap<ChannelId, usize>,
    width: usize,
    label_width: usize,
    /// Set when a value changed since the last render
    dirty: bool,
}

impl GaugeBoard {
    pub fn new(
        registry: &ChannelRegistry,
        gauges: &[GaugeSpec],
        width: usize,
    ) -> Result<Self, GaugeError> {
        let mut specs: HashMap<&str, &GaugeSpec> = HashMap::new();
        for gauge in gauges {
            if registry.by_name(&gauge.channel).is_none() {
                return Err(GaugeError::UnknownChannel {
                    channel: gauge.channel.clone(),
                    label: gauge.label.clone(),
                });
            }
            if specs.insert(gauge.channel.as_str(), gauge).is_some() {
                return Err(GaugeError::DuplicateGauge(gauge.channel.clone()));
            }
        }

        let mut rows = Vec::with_capacity(registry.len());
        let mut by_id = HashMap::with_capacity(registry.len());
        for channel in registry.iter() {
            let spec = match specs.get(channel.name.as_str()) {
                Some(spec) => (*spec).clone(),
                None => GaugeSpec::new(channel.name.clone(), channel.name.clone(), 0.0),
            };
            by_id.insert(channel.id, rows.len());
            rows.push(GaugeRow {
                spec,
                precision: channel.precision,
                value: None,
            });
        }

        let label_width = rows
            .iter()
            .map(|row| row.spec.label.chars().count())
            .max()
            .unwrap_or(0);

        Ok(Self {
            rows,
            by_id,
            width: width.max(1),
            label_width,
            dirty: true,
        })
    }

    pub fn value(&self, id: ChannelId) -> Option<f32> {
        self.by_id.get(&id).and_then(|&i| self.rows[i].value)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// The whole board, one line per channel
    pub fn render(&self) -> String {
        self.rows
            .iter()
            .map(|row| self.render_row(row))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_row(&self, row: &GaugeRow) -> String {
        let filled = match row.value {
            Some(value) => (row.spec.fill(value) * self.width as f32).round() as usize,
            None => 0,
        }
        .min(self.width);

        let mut bar = String::with_capacity(self.width);
        bar.extend(std::iter::repeat(FILLED).take(filled));
        bar.extend(std::iter::repeat(EMPTY).take(self.width - filled));

        let value = match row.value {
            Some(value) => format_reading(value, row.precision),
            None => "--".to_string(),
        };

        if row.spec.max > 0.0 {
            format!(
                "{:<width$} [{}] {} / {}",
                row.spec.label,
                bar,
                value,
                row.spec.max,
                width = self.label_width
            )
        } else {
            format!(
                "{:<width$} [{}] {}",
                row.spec.label,
                bar,
                value,
                width = self.label_width
            )
        }
    }
}

/// Show as many decimals as the channel is quantized to
fn format_reading(value: f32, precision: Precision) -> String {
    let decimals = precision.max(0) as usize;
    format!("{:.*}", decimals, value)
}

impl DisplaySink for GaugeBoard {
    fn set(&mut self, id: ChannelId, value: f32) {
        if let Some(&index) = self.by_id.get(&id) {
            self.rows[index].value = Some(value);
            self.dirty = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use can_dash_types::ChannelTableEntry;

    const TACH: ChannelId = ChannelId(0x1E005104);
    const OIL: ChannelId = ChannelId(0x1E089104);

    fn registry() -> ChannelRegistry {
        ChannelRegistry::from_table(&[
            ChannelTableEntry::new(0x1E005104, "tachometer", 0),
            ChannelTableEntry::new(0x1E089104, "oilometer", 1),
        ])
        .unwrap()
    }

    #[test]
    fn test_render_single_gauge() {
        let registry = ChannelRegistry::from_table(&[ChannelTableEntry::new(
            0x1E005104,
            "tachometer",
            0,
        )])
        .unwrap();
        let mut board =
            GaugeBoard::new(&registry, &[GaugeSpec::new("tachometer", "RPM", 8000.0)], 10)
                .unwrap();
        assert_eq!(board.render(), "RPM [..........] -- / 8000");

        board.set(TACH, 4000.0);
        assert_eq!(board.render(), "RPM [#####.....] 4000 / 8000");

        board.set(TACH, 9500.0);
        assert_eq!(board.render(), "RPM [##########] 9500 / 8000");
    }

    #[test]
    fn test_labels_align_and_precision_shows() {
        let gauges = [
            GaugeSpec::new("tachometer", "RPM", 8000.0),
            GaugeSpec::new("oilometer", "Oil PSI", 120.0),
        ];
        let mut board = GaugeBoard::new(&registry(), &gauges, 4).unwrap();
        board.set(OIL, 60.0);
        let lines: Vec<String> = board.render().lines().map(str::to_string).collect();
        assert_eq!(lines[0], "RPM     [....] -- / 8000");
        assert_eq!(lines[1], "Oil PSI [##..] 60.0 / 120");
    }

    #[test]
    fn test_channel_without_gauge_uses_name() {
        let mut board =
            GaugeBoard::new(&registry(), &[GaugeSpec::new("tachometer", "RPM", 8000.0)], 4)
                .unwrap();
        board.set(OIL, 42.3);
        let rendered = board.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "RPM       [....] -- / 8000");
        assert_eq!(lines[1], "oilometer [....] 42.3");
    }

    #[test]
    fn test_unknown_ids_ignored() {
        let mut board = GaugeBoard::new(&registry(), &[], 4).unwrap();
        board.mark_clean();
        board.set(ChannelId(0x7E8), 1.0);
        assert!(!board.is_dirty());
        assert_eq!(board.value(ChannelId(0x7E8)), None);

        board.set(TACH, 800.0);
        assert!(board.is_dirty());
        assert_eq!(board.value(TACH), Some(800.0));
    }

    #[test]
    fn test_gauge_validation() {
        let err = GaugeBoard::new(&registry(), &[GaugeSpec::new("boost", "PSI", 30.0)], 4)
            .unwrap_err();
        assert!(matches!(err, GaugeError::UnknownChannel { .. }));

        let twice = [
            GaugeSpec::new("tachometer", "RPM", 8000.0),
            GaugeSpec::new("tachometer", "Revs", 8000.0),
        ];
        assert_eq!(
            GaugeBoard::new(&registry(), &twice, 4).unwrap_err(),
            GaugeError::DuplicateGauge("tachometer".to_string())
        );
    }

    #[test]
    fn test_reference_gauges_cover_reference_channels() {
        let registry = ChannelRegistry::reference();
        let gauges = reference_gauges();
        assert_eq!(gauges.len(), registry.len());
        let board = GaugeBoard::new(&registry, &gauges, DEFAULT_GAUGE_WIDTH).unwrap();
        assert_eq!(board.render().lines().count(), 18);
    }
}
