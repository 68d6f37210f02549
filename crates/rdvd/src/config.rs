//! Daemon configuration.
//!
//! Everything has a default, so the daemon runs without a config file. A
//! file may override any field; a `clients` list replaces the built-in
//! table entirely.
//!
//! ```toml
//! socket_path = "/tmp/rdvd.sock"
//! read_timeout_secs = 30
//!
//! [[clients]]
//! id = 1
//! name = "CLIENT_A"
//! address = "client_a.socket"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use rdv_core::ClientTable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::server::{DEFAULT_READ_TIMEOUT, DEFAULT_SOCKET_PATH};

/// Runtime configuration for the registration daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// Where the registration socket is bound
    pub socket_path: PathBuf,

    /// Seconds a connected client may take to send its id
    pub read_timeout_secs: u64,

    /// Known clients and their rendezvous addresses
    pub clients: ClientTable,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            read_timeout_secs: DEFAULT_READ_TIMEOUT.as_secs(),
            clients: ClientTable::default(),
        }
    }
}

impl DaemonConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;

        if config.read_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "read_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// Errors loading the daemon configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {error}")]
    Read { path: PathBuf, error: String },

    #[error("Invalid config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
