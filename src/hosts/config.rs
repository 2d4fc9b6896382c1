//! Client configuration and host file loading.
//!
//! Host files are TOML by default. A file ending in `.json` is read in the
//! legacy `hosts.json` layout: an object keyed by host id, each value
//! holding `name`, `host` and `port`.

use super::{HostEntry, HostTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Timeouts and verbosity for talking to camerad.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Maximum wait for each read of a reply, in seconds.
    pub reply_timeout_secs: f64,
    /// Maximum wait for a TCP connect, in seconds.
    pub connect_timeout_secs: f64,
    /// Log every command and reply at info level.
    pub verbose: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            reply_timeout_secs: 10.0,
            connect_timeout_secs: 5.0,
            verbose: false,
        }
    }
}

impl ClientConfig {
    /// Reply timeout as a [`Duration`].
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.reply_timeout_secs)
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.connect_timeout_secs)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for secs in [self.reply_timeout_secs, self.connect_timeout_secs] {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::InvalidTimeout(secs));
            }
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// No hosts configured.
    #[error("host table is empty")]
    EmptyHostTable,
    /// Two entries share an id.
    #[error("duplicate host id {0}")]
    DuplicateHostId(u32),
    /// Port 0.
    #[error("invalid port for host {0}")]
    InvalidPort(String),
    /// A selected id is not in the table.
    #[error("unknown host id {0}")]
    UnknownHostId(u32),
    /// Zero, negative or non-finite timeout.
    #[error("invalid timeout {0} (must be a positive number of seconds)")]
    InvalidTimeout(f64),
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML or JSON for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// camerad hosts serving the camera.
    #[serde(default = "default_hosts")]
    pub hosts: Vec<HostEntry>,
    /// Client behavior.
    #[serde(default)]
    pub client: ClientConfig,
}

fn default_hosts() -> Vec<HostEntry> {
    vec![HostEntry::localhost()]
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            client: ClientConfig::default(),
        }
    }
}

/// One value of the legacy `hosts.json` map.
#[derive(Debug, Deserialize)]
struct LegacyHost {
    name: String,
    host: String,
    port: u16,
}

impl FileConfig {
    /// Loads configuration from a TOML file, or a legacy JSON host map.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileReadError(format!("{}: {}", path.display(), e)))?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config = if is_json {
            Self::from_legacy_json(&content)?
        } else {
            Self::from_toml(&content)?
        };
        tracing::debug!(path = %path.display(), hosts = config.hosts.len(), "Loaded host config");
        Ok(config)
    }

    /// Parses and validates TOML configuration text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a legacy JSON host map with default client settings.
    pub fn from_legacy_json(content: &str) -> Result<Self, ConfigError> {
        let map: BTreeMap<String, LegacyHost> =
            serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        let mut hosts = Vec::with_capacity(map.len());
        for (key, legacy) in map {
            let id = key
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::ParseError(format!("host key '{key}' is not a number")))?;
            hosts.push(HostEntry::new(id, legacy.name, legacy.host, legacy.port));
        }
        hosts.sort_by_key(|h| h.id);

        let config = Self {
            hosts,
            client: ClientConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates hosts and client settings together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.client.validate()?;
        HostTable::new(self.hosts.clone()).map(|_| ())
    }

    /// Builds the validated host table.
    pub fn host_table(&self) -> Result<HostTable, ConfigError> {
        HostTable::new(self.hosts.clone())
    }
}
