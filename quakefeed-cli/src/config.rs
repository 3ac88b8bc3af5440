//! Persistent configuration for the quakefeed monitor.
//!
//! Config file lives at `~/.config/quakefeed/config.toml` unless `--config`
//! points elsewhere. The access token is never read from or written to it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use quakefeed_sdk::ClientConfig;
use serde::{Deserialize, Serialize};

/// User configuration (persisted in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Server-list endpoint.
    pub discovery_url: Option<String>,
    /// Socket URL used when the server list is unavailable.
    pub fallback_url: Option<String>,
    /// Connect on start when a token is available. Default: true
    pub autoconnect: Option<bool>,
    /// Seconds between heartbeat frames.
    pub heartbeat_secs: Option<u64>,
    /// Upper bound on the WebSocket handshake, in seconds.
    pub connect_timeout_secs: Option<u64>,
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quakefeed")
        .join("config.toml")
}

impl Config {
    /// Load from `path`, or the default location. Missing or broken files
    /// fall back to defaults with a warning.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(&path) {
            Ok(s) => match Self::parse(&s) {
                Ok(c) => return c,
                Err(e) => tracing::warn!("Bad config file {}: {e}", path.display()),
            },
            Err(e) => tracing::warn!("Can't read {}: {e}", path.display()),
        }
        Self::default()
    }

    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

/// Effective settings after merging CLI args > config file > defaults.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub token: Option<String>,
    pub autoconnect: bool,
    pub client: ClientConfig,
}

impl Resolved {
    pub fn merge(cli: &super::Cli, config: &Config) -> Self {
        let defaults = ClientConfig::default();

        let discovery_url = cli
            .discovery_url
            .clone()
            .or_else(|| config.discovery_url.clone())
            .unwrap_or_else(|| defaults.discovery_url.clone());
        let fallback_url = cli
            .fallback_url
            .clone()
            .or_else(|| config.fallback_url.clone())
            .unwrap_or_else(|| defaults.fallback_url.clone());
        let heartbeat_interval = config
            .heartbeat_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.heartbeat_interval);
        let connect_timeout = config
            .connect_timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .or(defaults.connect_timeout);

        let token = cli
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let autoconnect = !cli.no_autoconnect && config.autoconnect.unwrap_or(true);

        Self {
            token,
            autoconnect,
            client: ClientConfig {
                discovery_url,
                fallback_url,
                heartbeat_interval,
                connect_timeout,
                ..defaults
            },
        }
    }
}
