//! Simulated bus for bench testing without a car
//!
//! Emits one frame per channel in turn, each following a waveform between the
//! channel's min and max, optionally with jitter and foreign bus traffic mixed in.

use can_dash_core::{encode, FrameSource, Received, SourceError, DEFAULT_READ_TIMEOUT};
use can_dash_types::{ChannelId, FrameError, RawFrame};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Id used for injected traffic that no dash channel listens to
const FOREIGN_ID: ChannelId = ChannelId(0x7E8);

/// One in this many frames is foreign traffic when enabled
const FOREIGN_EVERY: u64 = 16;

/// Waveform shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WaveMode {
    /// Hold the midpoint
    Constant,
    /// Sine wave oscillation
    #[default]
    SineWave,
    /// Sawtooth wave (linear ramp)
    Sawtooth,
    /// Triangle wave
    Triangle,
    /// Square wave
    Square,
}

/// Configuration for the simulated source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedConfig {
    pub mode: WaveMode,
    /// Wave period in seconds
    pub period: f64,
    /// Gap between frames in milliseconds
    pub frame_interval_ms: u64,
    /// Random jitter as a fraction of each channel's range
    pub jitter: f32,
    /// Mix in frames for unknown ids and truncated payloads
    pub foreign_traffic: bool,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            mode: WaveMode::SineWave,
            period: 8.0,
            frame_interval_ms: 2,
            jitter: 0.002,
            foreign_traffic: true,
        }
    }
}

/// One channel the simulator drives
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedChannel {
    pub id: ChannelId,
    pub min: f32,
    pub max: f32,
}

/// Frame source that synthesises readings
pub struct SimulatedSource {
    channels: Vec<SimulatedChannel>,
    config: SimulatedConfig,
    start_time: Instant,
    cursor: usize,
    emitted: u64,
    rng: StdRng,
    /// Longest single wait before reporting `Idle`
    read_timeout: Duration,
    next_due: Option<Instant>,
}

impl SimulatedSource {
    pub fn new(channels: Vec<SimulatedChannel>, config: SimulatedConfig) -> Self {
        Self {
            channels,
            config,
            start_time: Instant::now(),
            cursor: 0,
            emitted: 0,
            rng: StdRng::from_entropy(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            next_due: None,
        }
    }

    /// Bound each wait between frames so the ingestion loop can notice a stop
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Deterministic jitter for tests
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Waveform position in 0.0..=1.0 at `elapsed` seconds, offset by `phase`
    fn wave(mode: WaveMode, elapsed: f64, period: f64, phase: f64) -> f64 {
        let period = if period > 0.0 { period } else { 1.0 };
        let t = elapsed / period + phase;
        match mode {
            WaveMode::Constant => 0.5,
            WaveMode::SineWave => (t * std::f64::consts::TAU).sin() * 0.5 + 0.5,
            WaveMode::Sawtooth => t.fract(),
            WaveMode::Triangle => {
                let p = t.fract() * 2.0;
                if p <= 1.0 {
                    p
                } else {
                    2.0 - p
                }
            }
            WaveMode::Square => {
                if t.fract() < 0.5 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    fn reading(&mut self, index: usize) -> f32 {
        let channel = self.channels[index];
        let range = channel.max - channel.min;
        // Spread channels across the cycle so they do not move in lockstep
        let phase = index as f64 / self.channels.len().max(1) as f64;
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let position = Self::wave(self.config.mode, elapsed, self.config.period, phase) as f32;

        let mut value = channel.min + position * range;
        if self.config.jitter > 0.0 {
            value += self.rng.gen_range(-1.0f32..=1.0) * self.config.jitter * range;
        }
        value.clamp(channel.min.min(channel.max), channel.max.max(channel.min))
    }

    fn foreign_frame(&mut self) -> Result<RawFrame, FrameError> {
        let payload: [u8; 8] = self.rng.gen();
        // Alternate between a runt for a real channel and an id nobody decodes
        if (self.emitted / FOREIGN_EVERY) % 2 == 0 {
            if let Some(first) = self.channels.first() {
                return RawFrame::new(first.id, &payload[..2]);
            }
        }
        RawFrame::new(FOREIGN_ID, &payload)
    }
}

impl FrameSource for SimulatedSource {
    fn describe(&self) -> String {
        format!("simulated:{} channels", self.channels.len())
    }

    fn next_frame(&mut self) -> Result<Received, SourceError> {
        if self.channels.is_empty() {
            return Ok(Received::Closed);
        }

        let gap = Duration::from_millis(self.config.frame_interval_ms);
        if !gap.is_zero() {
            let due = *self.next_due.get_or_insert_with(|| Instant::now() + gap);
            let now = Instant::now();
            if due > now {
                let wait = due - now;
                if wait > self.read_timeout {
                    std::thread::sleep(self.read_timeout);
                    return Ok(Received::Idle);
                }
                std::thread::sleep(wait);
            }
            self.next_due = None;
        }

        self.emitted += 1;
        if self.config.foreign_traffic && self.emitted % FOREIGN_EVERY == 0 {
            let frame = self
                .foreign_frame()
                .map_err(|e| SourceError::Other(e.to_string()))?;
            return Ok(Received::Frame(frame));
        }

        let index = self.cursor;
        self.cursor = (self.cursor + 1) % self.channels.len();
        let value = self.reading(index);
        let frame = RawFrame::new(self.channels[index].id, &encode(value))
            .map_err(|e| SourceError::Other(e.to_string()))?;
        Ok(Received::Frame(frame))
    }

    fn reopen(&mut self) -> Result<(), SourceError> {
        self.start_time = Instant::now();
        self.next_due = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use can_dash_core::decode;

    fn channels() -> Vec<SimulatedChannel> {
        vec![
            SimulatedChannel {
                id: ChannelId(0x1E005104),
                min: 0.0,
                max: 8000.0,
            },
            SimulatedChannel {
                id: ChannelId(0x1E019104),
                min: 10.0,
                max: 20.0,
            },
        ]
    }

    fn quiet_config(mode: WaveMode) -> SimulatedConfig {
        SimulatedConfig {
            mode,
            period: 1.0,
            frame_interval_ms: 0,
            jitter: 0.0,
            foreign_traffic: false,
        }
    }

    #[test]
    fn test_round_robin_within_range() {
        let mut source = SimulatedSource::new(channels(), quiet_config(WaveMode::SineWave));
        for i in 0..10 {
            let Ok(Received::Frame(frame)) = source.next_frame() else {
                panic!("expected a frame");
            };
            let expected = channels()[i % 2];
            assert_eq!(frame.id(), expected.id);
            let value = decode(frame.payload()).unwrap();
            assert!(value >= expected.min && value <= expected.max, "{} out of range", value);
        }
    }

    #[test]
    fn test_constant_mode_is_midpoint() {
        let mut source = SimulatedSource::new(channels(), quiet_config(WaveMode::Constant));
        let Ok(Received::Frame(frame)) = source.next_frame() else {
            panic!("expected a frame");
        };
        assert_eq!(decode(frame.payload()), Ok(4000.0));
    }

    #[test]
    fn test_wave_shapes() {
        assert_eq!(SimulatedSource::wave(WaveMode::Sawtooth, 0.25, 1.0, 0.0), 0.25);
        assert_eq!(SimulatedSource::wave(WaveMode::Triangle, 0.75, 1.0, 0.0), 0.5);
        assert_eq!(SimulatedSource::wave(WaveMode::Square, 0.25, 1.0, 0.0), 0.0);
        assert_eq!(SimulatedSource::wave(WaveMode::Square, 0.75, 1.0, 0.0), 1.0);
        assert!((SimulatedSource::wave(WaveMode::SineWave, 0.25, 1.0, 0.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_foreign_traffic_is_mixed_in() {
        let mut config = quiet_config(WaveMode::Constant);
        config.foreign_traffic = true;
        let mut source = SimulatedSource::new(channels(), config).with_seed(7);

        let mut foreign = 0;
        let mut runts = 0;
        for _ in 0..64 {
            if let Ok(Received::Frame(frame)) = source.next_frame() {
                if frame.id() == FOREIGN_ID {
                    foreign += 1;
                } else if frame.len() < 4 {
                    runts += 1;
                }
            }
        }
        assert_eq!(foreign + runts, 4);
        assert!(foreign > 0 && runts > 0);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SimulatedConfig = serde_json::from_str(r#"{"mode": "triangle"}"#).unwrap();
        assert_eq!(config.mode, WaveMode::Triangle);
        assert_eq!(config.frame_interval_ms, 2);
        assert!(config.foreign_traffic);
    }

    #[test]
    fn test_slow_frames_report_idle_within_read_timeout() {
        let mut config = quiet_config(WaveMode::Constant);
        config.frame_interval_ms = 5_000;
        let mut source =
            SimulatedSource::new(channels(), config).with_read_timeout(Duration::from_millis(10));

        let started = Instant::now();
        assert!(matches!(source.next_frame(), Ok(Received::Idle)));
        assert!(started.elapsed() < Duration::from_secs(1));

        config = quiet_config(WaveMode::Constant);
        config.frame_interval_ms = 20;
        let mut source =
            SimulatedSource::new(channels(), config).with_read_timeout(Duration::from_millis(50));
        assert!(matches!(source.next_frame(), Ok(Received::Frame(_))));
    }

    #[test]
    fn test_no_channels_closes() {
        let mut source = SimulatedSource::new(Vec::new(), SimulatedConfig::default());
        assert!(matches!(source.next_frame(), Ok(Received::Closed)));
    }
}
