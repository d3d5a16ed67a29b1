//! Configuration management for firboard.
//!
//! Loaded with figment from defaults, a TOML file and `FIRBOARD_`
//! environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::reconciler::BoardPolicy;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default config directory name.
const CONFIG_DIR_NAME: &str = "firboard";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FIRBOARD_`, sections split by `__`)
/// 2. TOML config file at `~/.config/firboard/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Viewer listener configuration.
    pub server: ServerConfig,
    /// Board behaviour.
    pub board: BoardConfig,
    /// Feed file pollers.
    pub feed: FeedConfig,
}

/// Viewer listener configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address viewers and feed producers connect to.
    pub bind: String,
    /// Events buffered per viewer before it is considered lagging.
    pub broadcast_capacity: usize,
}

/// Board behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Feed data older than this many minutes is shown as stale.
    pub staleness_threshold_minutes: u32,
    /// Pilot and center estimates this close, in minutes, are aligned.
    pub alignment_tolerance_minutes: u16,
    /// Seconds between clock ticks.
    pub clock_tick_secs: u64,
    /// Minutes an override outlives its flight's last appearance.
    /// Set to 0 to keep overrides for the life of the process.
    pub override_grace_minutes: u32,
}

/// Feed file pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// JSON file holding the inbound snapshot.
    pub inbound_path: Option<PathBuf>,
    /// JSON file holding the outbound snapshot.
    pub outbound_path: Option<PathBuf>,
    /// Milliseconds between file checks.
    pub poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3001".to_string(),
            broadcast_capacity: 256,
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            staleness_threshold_minutes: 15,
            alignment_tolerance_minutes: 3,
            clock_tick_secs: 10,
            override_grace_minutes: 0,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            inbound_path: None,
            outbound_path: None,
            poll_interval_ms: 5000,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("FIRBOARD_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        if self.server.broadcast_capacity == 0 {
            return Err(Error::ConfigValidation {
                message: "broadcast_capacity must be greater than 0".to_string(),
            });
        }

        if self.board.staleness_threshold_minutes == 0 {
            return Err(Error::ConfigValidation {
                message: "staleness_threshold_minutes must be greater than 0".to_string(),
            });
        }

        if self.board.clock_tick_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "clock_tick_secs must be greater than 0".to_string(),
            });
        }

        if self.feed.poll_interval_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "poll_interval_ms must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// The listener address.
    ///
    /// # Errors
    ///
    /// Returns an error if `server.bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|_| Error::ConfigValidation {
                message: format!("invalid bind address: {}", self.server.bind),
            })
    }

    /// Thresholds for the reconciler.
    #[must_use]
    pub fn board_policy(&self) -> BoardPolicy {
        BoardPolicy {
            staleness_threshold: chrono::Duration::minutes(i64::from(
                self.board.staleness_threshold_minutes,
            )),
            alignment_tolerance_minutes: self.board.alignment_tolerance_minutes,
            override_grace: (self.board.override_grace_minutes > 0).then(|| {
                chrono::Duration::minutes(i64::from(self.board.override_grace_minutes))
            }),
        }
    }

    /// Get the clock tick interval as a Duration.
    #[must_use]
    pub fn clock_tick(&self) -> Duration {
        Duration::from_secs(self.board.clock_tick_secs)
    }

    /// Get the feed poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.feed.poll_interval_ms)
    }
}
