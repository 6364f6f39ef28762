//! Display-side gauge description

use serde::{Deserialize, Serialize};

/// How one channel is shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeSpec {
    /// Name of the channel this gauge follows
    pub channel: String,
    /// Caption shown under the gauge (e.g. "RPM", "Oil PSI")
    pub label: String,
    /// Full-scale value; the gauge reads 0.0 ..= max
    pub max: f32,
}

impl GaugeSpec {
    pub fn new(channel: impl Into<String>, label: impl Into<String>, max: f32) -> Self {
        Self {
            channel: channel.into(),
            label: label.into(),
            max,
        }
    }

    /// Fraction of full scale, clamped to 0.0 ..= 1.0
    pub fn fill(&self, value: f32) -> f32 {
        if self.max <= 0.0 || !value.is_finite() {
            return 0.0;
        }
        (value / self.max).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_clamps() {
        let gauge = GaugeSpec::new("tachometer", "RPM", 8000.0);
        assert_eq!(gauge.fill(4000.0), 0.5);
        assert_eq!(gauge.fill(9000.0), 1.0);
        assert_eq!(gauge.fill(-10.0), 0.0);
        assert_eq!(gauge.fill(f32::NAN), 0.0);
    }

    #[test]
    fn test_zero_scale_never_fills() {
        let gauge = GaugeSpec::new("x", "X", 0.0);
        assert_eq!(gauge.fill(10.0), 0.0);
    }
}
