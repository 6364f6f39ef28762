//! Application configuration

use anyhow::{anyhow, bail, Context, Result};
use can_dash_core::{defaults, ChannelRegistry, ReopenPolicy, DEFAULT_READ_TIMEOUT, DEFAULT_REFRESH_INTERVAL};
use can_dash_displayers::{reference_gauges, GaugeBoard, DEFAULT_GAUGE_WIDTH};
use can_dash_sources::SimulatedConfig;
use can_dash_types::{ChannelTableEntry, GaugeSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Current config format version
pub const CONFIG_VERSION: u32 = 1;

/// Application-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the config format
    #[serde(default = "default_version")]
    pub version: u32,
    /// Bus connection
    #[serde(default)]
    pub bus: BusConfig,
    /// Channel table: id, name and rounding precision per channel
    #[serde(default = "defaults::reference_table")]
    pub channels: Vec<ChannelTableEntry>,
    /// Gauge captions and full-scale values
    #[serde(default = "reference_gauges")]
    pub gauges: Vec<GaugeSpec>,
    /// Terminal board
    #[serde(default)]
    pub display: DisplayConfig,
    /// Waveforms used by `--simulate`
    #[serde(default)]
    pub simulate: SimulatedConfig,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl AppConfig {
    /// Load configuration from disk, or defaults when there is none yet
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            log::debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_path()?)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "can-dash", "can-dash")
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.json"))
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        if config.version > CONFIG_VERSION {
            log::warn!(
                "Config {} is version {}, newer than {}; unknown fields are ignored",
                path.display(),
                config.version,
                CONFIG_VERSION
            );
        }
        Ok(config)
    }

    /// Save configuration to a specific file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    /// Check the whole configuration and build the channel registry from it
    pub fn validate(&self) -> Result<ChannelRegistry> {
        let registry =
            ChannelRegistry::from_table(&self.channels).context("Invalid channel table")?;
        GaugeBoard::new(&registry, &self.gauges, self.display.gauge_width)
            .context("Invalid gauge list")?;

        if self.bus.interface.trim().is_empty() {
            bail!("bus.interface must not be empty");
        }
        if self.bus.read_timeout_ms == 0 {
            bail!("bus.read_timeout_ms must be greater than zero");
        }
        if self.display.refresh_interval_ms == 0 {
            bail!("display.refresh_interval_ms must be greater than zero");
        }
        if self.display.gauge_width == 0 {
            bail!("display.gauge_width must be greater than zero");
        }
        Ok(registry)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            bus: BusConfig::default(),
            channels: defaults::reference_table(),
            gauges: reference_gauges(),
            display: DisplayConfig::default(),
            simulate: SimulatedConfig::default(),
        }
    }
}

/// Bus connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusConfig {
    /// SocketCAN interface name
    #[serde(default = "default_interface")]
    pub interface: String,
    /// How long one read may block before the loop checks for a stop
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// What to do when the bus fails (disabled: first failure ends ingestion)
    #[serde(default)]
    pub reopen: ReopenPolicy,
}

fn default_interface() -> String {
    "can0".to_string()
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT.as_millis() as u64
}

impl BusConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            read_timeout_ms: default_read_timeout_ms(),
            reopen: ReopenPolicy::default(),
        }
    }
}

/// Terminal board settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// How often the board is redrawn
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Characters between the brackets of each gauge
    #[serde(default = "default_gauge_width")]
    pub gauge_width: usize,
    /// Clear the terminal before each redraw
    #[serde(default = "default_clear_screen")]
    pub clear_screen: bool,
}

fn default_refresh_interval_ms() -> u64 {
    DEFAULT_REFRESH_INTERVAL.as_millis() as u64
}

fn default_gauge_width() -> usize {
    DEFAULT_GAUGE_WIDTH
}

fn default_clear_screen() -> bool {
    true
}

impl DisplayConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            gauge_width: default_gauge_width(),
            clear_screen: default_clear_screen(),
        }
    }
}
