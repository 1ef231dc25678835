//! Optional TOML configuration file for the server.
//!
//! Every key is optional; keys that are present override the built-in
//! defaults and are in turn overridden by command-line flags (see `main.rs`).
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0"
//! port = 8080
//! ws_path = "/ws"
//! default_game = "game-1"
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::ServerConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed or has unknown keys.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level layout of the config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub server: ServerSection,
}

/// The `[server]` table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub bind: Option<IpAddr>,
    pub port: Option<u16>,
    pub ws_path: Option<String>,
    pub default_game: Option<String>,
}

impl ConfigFile {
    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("loaded config file {}", path.display());
        Self::parse(&text)
    }

    /// Parses config file text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on invalid TOML or unknown keys.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Overwrites the fields of `config` that this file sets.
    pub fn apply(&self, config: &mut ServerConfig) {
        let section = &self.server;
        let ip = section.bind.unwrap_or(config.bind_addr.ip());
        let port = section.port.unwrap_or(config.bind_addr.port());
        config.bind_addr = SocketAddr::new(ip, port);
        if let Some(path) = &section.ws_path {
            config.ws_path.clone_from(path);
        }
        if let Some(game) = &section.default_game {
            config.default_game_id.clone_from(game);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
