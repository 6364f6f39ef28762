//! Replay of recorded bus traffic in candump log format
//!
//! Accepts the lines `candump -L` writes, `(1436509052.249713) can0 1E005104#459C4800`,
//! as well as bare `1E005104#459C4800`. CAN FD frames (`ID##<flags><data>`)
//! are accepted; remote request frames carry no data and are skipped.

use can_dash_core::{FrameSource, Received, SourceError, DEFAULT_READ_TIMEOUT};
use can_dash_types::{ChannelId, FrameError, RawFrame, MAX_PAYLOAD};
use log::{debug, info};
use std::io::BufRead;
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("cannot read replay log")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// How fast frames come out of a replay
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pacing {
    /// As fast as the consumer reads
    Unthrottled,
    /// Fixed gap between frames
    Fixed(Duration),
    /// Follow the recorded timestamps (falls back to unthrottled without them)
    Recorded,
}

#[derive(Debug, Clone, Copy)]
struct LoggedFrame {
    timestamp: Option<f64>,
    frame: RawFrame,
}

/// Frame source that plays back a list of frames
pub struct ReplaySource {
    name: String,
    frames: Vec<LoggedFrame>,
    position: usize,
    pacing: Pacing,
    repeat: bool,
    /// Longest single wait before reporting `Idle`
    read_timeout: Duration,
    next_due: Option<Instant>,
}

impl ReplaySource {
    /// Replay frames already in memory
    pub fn from_frames(frames: Vec<RawFrame>) -> Self {
        Self::new(
            "replay:memory".to_string(),
            frames
                .into_iter()
                .map(|frame| LoggedFrame {
                    timestamp: None,
                    frame,
                })
                .collect(),
        )
    }

    /// Parse a candump log from any reader
    pub fn from_candump<R: BufRead>(reader: R) -> Result<Self, ReplayError> {
        let mut frames = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            match parse_candump_line(&line) {
                Ok(Some(logged)) => frames.push(logged),
                Ok(None) => {}
                Err(reason) => return Err(ReplayError::Parse { line: i + 1, reason }),
            }
        }
        Ok(Self::new("replay:candump".to_string(), frames))
    }

    /// Parse a candump log file
    pub fn open(path: &Path) -> Result<Self, ReplayError> {
        let file = std::fs::File::open(path)?;
        let mut source = Self::from_candump(std::io::BufReader::new(file))?;
        source.name = format!("replay:{}", path.display());
        info!("Loaded {} frames from {}", source.frames.len(), path.display());
        Ok(source)
    }

    fn new(name: String, frames: Vec<LoggedFrame>) -> Self {
        Self {
            name,
            frames,
            position: 0,
            pacing: Pacing::Unthrottled,
            repeat: false,
            read_timeout: DEFAULT_READ_TIMEOUT,
            next_due: None,
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Bound each pacing wait so the ingestion loop can notice a stop
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Start over from the first frame instead of closing at the end
    pub fn repeating(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Gap to wait before emitting the frame at `position`
    fn gap_before(&self, position: usize) -> Duration {
        match self.pacing {
            Pacing::Unthrottled => Duration::ZERO,
            Pacing::Fixed(gap) => gap,
            Pacing::Recorded => {
                if position == 0 {
                    return Duration::ZERO;
                }
                match (
                    self.frames[position - 1].timestamp,
                    self.frames[position].timestamp,
                ) {
                    (Some(prev), Some(cur)) if cur > prev => Duration::from_secs_f64(cur - prev),
                    _ => Duration::ZERO,
                }
            }
        }
    }
}

impl FrameSource for ReplaySource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn next_frame(&mut self) -> Result<Received, SourceError> {
        if self.position >= self.frames.len() {
            if !self.repeat || self.frames.is_empty() {
                return Ok(Received::Closed);
            }
            debug!("{}: restarting from the first frame", self.name);
            self.position = 0;
        }

        // Sleep in bounded steps so the ingestion loop can notice a stop
        let due = match self.next_due {
            Some(due) => due,
            None => {
                let due = Instant::now() + self.gap_before(self.position);
                self.next_due = Some(due);
                due
            }
        };
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
        let frame = self.frames[self.position].frame;
        self.position += 1;
        Ok(Received::Frame(frame))
    }

    fn reopen(&mut self) -> Result<(), SourceError> {
        self.position = 0;
        self.next_due = None;
        Ok(())
    }
}

/// Parse one log line. `Ok(None)` for blank lines, comments and remote frames.
fn parse_candump_line(line: &str) -> Result<Option<LoggedFrame>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (timestamp, frame_token) = match tokens.as_slice() {
        [frame] => (None, *frame),
        [ts, _iface, frame, ..] if ts.starts_with('(') => (Some(parse_timestamp(ts)?), *frame),
        _ => return Err(format!("unrecognised line: {:?}", line)),
    };

    let (id_part, data_part) = frame_token
        .split_once('#')
        .ok_or_else(|| format!("missing '#' in {:?}", frame_token))?;

    let id = ChannelId::parse(id_part).ok_or_else(|| format!("bad id {:?}", id_part))?;

    if data_part.starts_with('R') {
        return Ok(None);
    }
    // CAN FD: `##` followed by one flags nibble
    let data_hex = match data_part.strip_prefix('#') {
        Some(fd) => fd.get(1..).ok_or_else(|| "missing CAN FD flags".to_string())?,
        None => data_part,
    };

    let payload = parse_hex(data_hex)?;
    let frame = RawFrame::new(id, &payload).map_err(|e: FrameError| e.to_string())?;
    Ok(Some(LoggedFrame { timestamp, frame }))
}

fn parse_timestamp(token: &str) -> Result<f64, String> {
    token
        .trim_start_matches('(')
        .trim_end_matches(')')
        .parse::<f64>()
        .map_err(|e| format!("bad timestamp {:?}: {}", token, e))
}

fn parse_hex(hex: &str) -> Result<Vec<u8>, String> {
    // candump may separate bytes with '.'
    let digits: Vec<u8> = hex.bytes().filter(|b| *b != b'.').collect();
    if let Some(bad) = hex.chars().find(|c| *c != '.' && !c.is_ascii_hexdigit()) {
        return Err(format!("bad data digit {:?} in {:?}", bad, hex));
    }
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in {:?}", hex));
    }
    if digits.len() / 2 > MAX_PAYLOAD {
        return Err(format!("{} data bytes exceed {}", digits.len() / 2, MAX_PAYLOAD));
    }
    Ok(digits
        .chunks(2)
        .map(|pair| (hex_value(pair[0]) << 4) | hex_value(pair[1]))
        .collect())
}

/// Value of one ASCII hex digit; callers check `is_ascii_hexdigit` first
fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use can_dash_core::decode;

    const LOG: &str = "\
# recorded on the bench
(1436509052.249713) can0 1E005104#459C4800
(1436509052.259713) can0 7DF#0201
(1436509052.269713) can0 1E019104#416B3333DEADBEEF

1E371104#42480000
(1436509052.279713) can0 1E005104#R
";

    fn drain(source: &mut ReplaySource) -> Vec<RawFrame> {
        let mut out = Vec::new();
        loop {
            match source.next_frame().unwrap() {
                Received::Frame(f) => out.push(f),
                Received::Idle => {}
                Received::Closed => return out,
            }
        }
    }

    #[test]
    fn test_parses_candump_log() {
        let mut source = ReplaySource::from_candump(LOG.as_bytes()).unwrap();
        assert_eq!(source.len(), 4);

        let frames = drain(&mut source);
        assert_eq!(frames[0].id(), ChannelId(0x1E005104));
        assert_eq!(decode(frames[0].payload()), Ok(5000.0));
        assert_eq!(frames[1].id(), ChannelId(0x7DF));
        assert_eq!(frames[1].payload(), &[0x02, 0x01]);
        assert_eq!(frames[2].len(), 8);
        assert_eq!(frames[3].id(), ChannelId(0x1E371104));
        assert_eq!(decode(frames[3].payload()), Ok(50.0));
    }

    #[test]
    fn test_closed_at_end_unless_repeating() {
        let frame = RawFrame::new(ChannelId(1), &[0, 0, 0, 0]).unwrap();
        let mut once = ReplaySource::from_frames(vec![frame]);
        assert!(matches!(once.next_frame(), Ok(Received::Frame(_))));
        assert!(matches!(once.next_frame(), Ok(Received::Closed)));

        let mut looped = ReplaySource::from_frames(vec![frame]).repeating(true);
        for _ in 0..3 {
            assert!(matches!(looped.next_frame(), Ok(Received::Frame(_))));
        }
    }

    #[test]
    fn test_empty_repeating_replay_closes() {
        let mut source = ReplaySource::from_frames(Vec::new()).repeating(true);
        assert!(matches!(source.next_frame(), Ok(Received::Closed)));
    }

    #[test]
    fn test_can_fd_line() {
        let logged = parse_candump_line("(0.5) can1 123##1112233445566778899")
            .unwrap()
            .unwrap();
        assert_eq!(logged.frame.id(), ChannelId(0x123));
        assert_eq!(logged.frame.len(), 9);
        assert_eq!(logged.timestamp, Some(0.5));
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = ReplaySource::from_candump("1E005104#459C4800\nnot a frame here at all\n".as_bytes())
            .err()
            .unwrap();
        assert!(matches!(err, ReplayError::Parse { line: 2, .. }));

        assert!(parse_candump_line("123#ABC").is_err());
        assert!(parse_candump_line("XYZ#00").is_err());
        assert!(parse_candump_line("(abc) can0 123#00").is_err());
    }

    #[test]
    fn test_non_hex_data_is_a_parse_error() {
        assert!(parse_candump_line("123#aé0").is_err());
        assert!(parse_candump_line("123#+a").is_err());
        assert!(parse_candump_line("123#ÿÿ").is_err());

        let logged = parse_candump_line("123#De.aD").unwrap().unwrap();
        assert_eq!(logged.frame.payload(), &[0xDE, 0xAD]);
    }

    #[test]
    fn test_pacing_wait_bounded_by_read_timeout() {
        let frame = RawFrame::new(ChannelId(1), &[0, 0, 0, 0]).unwrap();
        let mut source = ReplaySource::from_frames(vec![frame])
            .with_pacing(Pacing::Fixed(Duration::from_secs(5)))
            .with_read_timeout(Duration::from_millis(10));

        let started = Instant::now();
        assert!(matches!(source.next_frame(), Ok(Received::Idle)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_recorded_pacing_gaps() {
        let source = ReplaySource::from_candump(LOG.as_bytes())
            .unwrap()
            .with_pacing(Pacing::Recorded);
        assert_eq!(source.gap_before(0), Duration::ZERO);
        let gap = source.gap_before(1);
        assert!(gap > Duration::from_millis(9) && gap < Duration::from_millis(11));
        // Untimestamped line: no wait
        assert_eq!(source.gap_before(3), Duration::ZERO);
    }
}
