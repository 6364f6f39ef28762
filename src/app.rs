//! Wiring between the ingestion thread and the presentation loop
//!
//! Ingestion runs on its own `std::thread` and never waits on the display.
//! Changed values land in a [`LatestValueMailbox`]; the presentation loop
//! drains it on a `tokio` interval into the gauge board (or the log) and
//! redraws.

use crate::config::AppConfig;
use anyhow::{anyhow, Context, Result};
use can_dash_core::{
    BoxedFrameSource, ChannelId, ChannelRegistry, ChannelStateTable, IngestError, IngestExit,
    IngestStats, IngestStatus, IngestionLoop, LatestValueMailbox, LatestValueNotifier,
    StatsSnapshot, StatusCell, StopSignal,
};
use can_dash_displayers::{GaugeBoard, LogSink};
use can_dash_sources::{Pacing, ReplaySource, SimulatedChannel, SimulatedSource};
use log::{info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Full-scale value for simulated channels that have no gauge
const SIMULATED_DEFAULT_MAX: f32 = 100.0;

/// ANSI clear screen + cursor home
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

/// Where frames come from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// Live SocketCAN interface from `bus.interface`
    Bus,
    /// candump log file
    Replay {
        path: PathBuf,
        /// Fixed gap between frames; `None` follows the recorded timestamps
        interval: Option<Duration>,
        repeat: bool,
    },
    /// Synthetic waveforms on every channel
    Simulate,
}

/// How values are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Redraw the text gauge board on stdout
    Board,
    /// Log each changed value, no board
    Log,
}

/// What a finished run looked like
#[derive(Debug)]
pub struct RunSummary {
    /// How ingestion ended. `Err` means the bus failed and the board stayed
    /// up with the last values until the user quit.
    pub ingest: Result<IngestExit, IngestError>,
    pub stats: StatsSnapshot,
    /// Final value of every channel, in registry order
    pub values: Vec<(ChannelId, f32)>,
}

/// Open the frame source selected on the command line
pub fn open_source(
    config: &AppConfig,
    registry: &ChannelRegistry,
    kind: &SourceKind,
) -> Result<BoxedFrameSource> {
    match kind {
        SourceKind::Bus => open_bus(config),
        SourceKind::Replay {
            path,
            interval,
            repeat,
        } => {
            let pacing = match interval {
                Some(gap) => Pacing::Fixed(*gap),
                None => Pacing::Recorded,
            };
            let source = ReplaySource::open(path)
                .with_context(|| format!("Failed to load replay {}", path.display()))?
                .with_pacing(pacing)
                .with_read_timeout(config.bus.read_timeout())
                .repeating(*repeat);
            Ok(Box::new(source))
        }
        SourceKind::Simulate => Ok(Box::new(
            SimulatedSource::new(simulated_channels(config, registry), config.simulate.clone())
                .with_read_timeout(config.bus.read_timeout()),
        )),
    }
}

#[cfg(all(target_os = "linux", feature = "socketcan"))]
fn open_bus(config: &AppConfig) -> Result<BoxedFrameSource> {
    let source = can_dash_sources::SocketCanSource::open(
        &config.bus.interface,
        config.bus.read_timeout(),
    )
    .with_context(|| format!("Failed to open CAN interface {}", config.bus.interface))?;
    Ok(Box::new(source))
}

#[cfg(not(all(target_os = "linux", feature = "socketcan")))]
fn open_bus(config: &AppConfig) -> Result<BoxedFrameSource> {
    Err(anyhow!(
        "Cannot open {}: this build has no SocketCAN support (use --replay or --simulate)",
        config.bus.interface
    ))
}

/// One simulated channel per registry entry, ranging over its gauge scale
fn simulated_channels(config: &AppConfig, registry: &ChannelRegistry) -> Vec<SimulatedChannel> {
    registry
        .iter()
        .map(|channel| {
            let max = config
                .gauges
                .iter()
                .find(|gauge| gauge.channel == channel.name && gauge.max > 0.0)
                .map(|gauge| gauge.max)
                .unwrap_or(SIMULATED_DEFAULT_MAX);
            SimulatedChannel {
                id: channel.id,
                min: 0.0,
                max,
            }
        })
        .collect()
}

/// Drains the mailbox into a sink and writes the result
enum Presenter {
    Board { board: GaugeBoard, clear: bool },
    Log(LogSink),
}

impl Presenter {
    fn new(config: &AppConfig, registry: &Arc<ChannelRegistry>, mode: Presentation) -> Result<Self> {
        Ok(match mode {
            Presentation::Board => Presenter::Board {
                board: GaugeBoard::new(registry, &config.gauges, config.display.gauge_width)
                    .context("Failed to build gauge board")?,
                clear: config.display.clear_screen,
            },
            Presentation::Log => Presenter::Log(LogSink::new(registry.clone())),
        })
    }

    /// Deliver pending values and redraw if anything moved
    fn refresh<W: Write>(
        &mut self,
        out: &mut W,
        mailbox: &LatestValueMailbox,
        status_line: Option<&str>,
    ) -> std::io::Result<()> {
        match self {
            Presenter::Board { board, clear } => {
                mailbox.drain(board);
                if !board.is_dirty() && status_line.is_none() {
                    return Ok(());
                }
                if *clear {
                    write!(out, "{}", CLEAR_SCREEN)?;
                }
                writeln!(out, "{}", board.render())?;
                if let Some(line) = status_line {
                    writeln!(out, "{}", line)?;
                }
                out.flush()?;
                board.mark_clean();
            }
            Presenter::Log(sink) => {
                mailbox.drain(sink);
                if let Some(line) = status_line {
                    info!("{}", line);
                }
            }
        }
        Ok(())
    }
}

/// Tracks the status line so it is only reprinted when it changes
struct StatusLine {
    status: Arc<StatusCell>,
    stats: Arc<IngestStats>,
    last: Option<(IngestStatus, StatsSnapshot)>,
    failure_reported: bool,
}

impl StatusLine {
    fn poll(&mut self) -> Option<String> {
        let current = ((*self.status.get()).clone(), self.stats.snapshot());
        if self.last.as_ref() == Some(&current) {
            return None;
        }
        let line = format!("[{}] {}", current.0, current.1);
        self.last = Some(current);
        Some(line)
    }

    /// Whether the presentation loop should end.
    ///
    /// A failed bus does not end it: the board keeps the frozen values and
    /// the failed status on screen until the user quits.
    fn should_exit(&mut self) -> bool {
        match &*self.status.get() {
            IngestStatus::SourceClosed | IngestStatus::Stopped => true,
            IngestStatus::Failed(reason) => {
                if !self.failure_reported {
                    warn!("Bus failed ({}), showing last values until Ctrl-C", reason);
                    self.failure_reported = true;
                }
                false
            }
            _ => false,
        }
    }
}

/// Run the dashboard until the source closes or Ctrl-C
pub fn run(
    config: &AppConfig,
    registry: ChannelRegistry,
    source: BoxedFrameSource,
    mode: Presentation,
) -> Result<RunSummary> {
    run_until(config, registry, source, mode, StopSignal::new())
}

/// Like [`run`], also ending when `stop` is signalled from another thread
pub fn run_until(
    config: &AppConfig,
    registry: ChannelRegistry,
    source: BoxedFrameSource,
    mode: Presentation,
    stop: StopSignal,
) -> Result<RunSummary> {
    let registry = Arc::new(registry);
    let table = Arc::new(ChannelStateTable::new(registry.clone()));
    let mailbox = Arc::new(LatestValueMailbox::new(&registry));

    let ingest = IngestionLoop::new(table.clone(), LatestValueNotifier::new(mailbox.clone()))
        .with_reopen_policy(config.bus.reopen)
        .with_stop_signal(stop.clone());
    let mut status = StatusLine {
        status: ingest.status(),
        stats: ingest.stats(),
        last: None,
        failure_reported: false,
    };
    let mut presenter = Presenter::new(config, &registry, mode)?;

    info!(
        "Reading {} channels from {}",
        registry.len(),
        source.describe()
    );
    let handle = ingest
        .spawn(source)
        .context("Failed to start ingestion thread")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;
    runtime.block_on(present(
        config.display.refresh_interval(),
        &mut presenter,
        &mailbox,
        &mut status,
        &stop,
    ));

    stop.stop();
    let result = handle
        .join()
        .map_err(|_| anyhow!("Ingestion thread panicked"))?;

    // Show whatever arrived between the last tick and the exit
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = presenter.refresh(&mut stdout, &mailbox, status.poll().as_deref()) {
        warn!("Failed to draw final values: {}", e);
    }

    let stats = status.stats.snapshot();
    match &result {
        Ok(exit) => info!("Ingestion ended ({:?}): {}", exit, stats),
        Err(e) => info!("Ingestion had failed: {} ({})", e, stats),
    }

    Ok(RunSummary {
        ingest: result,
        stats,
        values: table.snapshot(),
    })
}

/// Presentation loop: redraw on every tick until the source closes, a stop
/// is requested, or Ctrl-C
async fn present(
    refresh: Duration,
    presenter: &mut Presenter,
    mailbox: &LatestValueMailbox,
    status: &mut StatusLine,
    stop: &StopSignal,
) {
    let mut interval = tokio::time::interval(refresh);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut listening = true;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = presenter.refresh(&mut stdout, mailbox, status.poll().as_deref()) {
                    warn!("Failed to draw: {}", e);
                }
                if stop.is_stopped() || status.should_exit() {
                    break;
                }
            }
            result = &mut ctrl_c, if listening => {
                match result {
                    Ok(()) => {
                        info!("Interrupted, stopping");
                        stop.stop();
                        break;
                    }
                    Err(e) => {
                        // Without a Ctrl-C listener only the source or `stop` can end the loop
                        warn!("Failed to listen for Ctrl-C: {}", e);
                        listening = false;
                    }
                }
            }
        }
    }
}
