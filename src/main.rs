use anyhow::{Context, Result};
use can_dash::app::{self, Presentation, SourceKind};
use can_dash::config::AppConfig;
use can_dash_core::ChannelRegistry;
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Duration;

/// can-dash - CAN bus telemetry dashboard
#[derive(Parser, Debug, Clone)]
#[command(name = "can-dash")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SocketCAN interface to read (overrides bus.interface from the config)
    #[arg(short = 'i', long = "interface", value_name = "IFACE")]
    interface: Option<String>,

    /// Replay a candump log instead of reading the bus
    #[arg(short = 'r', long = "replay", value_name = "FILE", conflicts_with = "simulate")]
    replay: Option<PathBuf>,

    /// Fixed gap between replayed frames instead of the recorded timing
    #[arg(long = "replay-interval-ms", value_name = "MS", requires = "replay")]
    replay_interval_ms: Option<u64>,

    /// Start the replay over when it reaches the end
    #[arg(long = "repeat", requires = "replay")]
    repeat: bool,

    /// Generate synthetic readings on every channel
    #[arg(short = 's', long = "simulate")]
    simulate: bool,

    /// Log changed values instead of drawing the gauge board
    #[arg(long = "headless")]
    headless: bool,

    /// Configuration file to load instead of the default location
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long = "dump-config")]
    dump_config: bool,

    /// Validate the effective configuration, save it to the default location and exit
    #[arg(long = "save-config", conflicts_with = "dump_config")]
    save_config: bool,

    /// List the configured channels and exit
    #[arg(short = 'l', long = "list-channels")]
    list_channels: bool,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info
    // Level 2: debug
    // Level 3+: trace
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("Starting can-dash v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = match cli.config {
        Some(ref path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {:#}", e);
            AppConfig::default()
        }),
    };
    if let Some(ref interface) = cli.interface {
        config.bus.interface = interface.clone();
    }

    if cli.dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let registry = config.validate()?;

    if cli.save_config {
        config.channels = registry.to_table();
        config.save()?;
        println!("Saved configuration to {}", AppConfig::config_path()?.display());
        return Ok(());
    }

    if cli.list_channels {
        list_channels(&registry);
        return Ok(());
    }

    let kind = if let Some(ref path) = cli.replay {
        SourceKind::Replay {
            path: path.clone(),
            interval: cli.replay_interval_ms.map(Duration::from_millis),
            repeat: cli.repeat,
        }
    } else if cli.simulate {
        SourceKind::Simulate
    } else {
        SourceKind::Bus
    };
    let presentation = if cli.headless {
        Presentation::Log
    } else {
        Presentation::Board
    };

    let source = app::open_source(&config, &registry, &kind)?;
    let summary = app::run(&config, registry, source, presentation)
        .context("Dashboard stopped with an error")?;
    match summary.ingest {
        Ok(exit) => {
            info!("Done: {:?}, {}", exit, summary.stats);
            Ok(())
        }
        // The board stayed up with frozen values until the user quit
        Err(e) => Err(anyhow::Error::new(e).context("CAN bus failed")),
    }
}

/// Print the channel table to stdout
fn list_channels(registry: &ChannelRegistry) {
    println!("Channels ({}):", registry.len());
    println!();
    for channel in registry.iter() {
        println!(
            "  {}  {:<16} precision {}",
            channel.id, channel.name, channel.precision
        );
    }
}
