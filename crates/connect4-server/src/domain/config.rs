//! Server configuration types.
//!
//! [`ServerConfig`] holds every runtime setting.  It is a plain struct with
//! defaults matching the classic deployment (`0.0.0.0:8080`, WebSocket at
//! `/ws`, unnamed games going to `game-1`); `main.rs` fills it from the CLI,
//! the environment and an optional TOML file.

use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;

/// Session identifier used when a player connects without a `game_id`.
pub const DEFAULT_GAME_ID: &str = "game-1";

/// Default WebSocket endpoint path.
pub const DEFAULT_WS_PATH: &str = "/ws";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// All runtime configuration for the game server.
///
/// # Example
///
/// ```rust
/// use connect4_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8080);
/// assert_eq!(cfg.ws_path, "/ws");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the TCP listener binds to.  Port `0` picks a free port.
    pub bind_addr: SocketAddr,

    /// Request path that is upgraded to a WebSocket.  Other paths get plain HTTP.
    pub ws_path: String,

    /// Session joined by connections that do not name one.
    pub default_game_id: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            ws_path: DEFAULT_WS_PATH.to_string(),
            default_game_id: DEFAULT_GAME_ID.to_string(),
        }
    }
}

/// A configuration value that cannot work at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidConfig {
    #[error("WebSocket path must start with '/': {0:?}")]
    WsPath(String),

    /// `/` serves the banner; `{`, `}`, `*` and `:` are route-pattern syntax.
    #[error("WebSocket path {0:?} is reserved or contains route-pattern characters")]
    ReservedWsPath(String),

    #[error("default game id must not be empty")]
    EmptyGameId,
}

impl ServerConfig {
    /// Checks values that parse fine but cannot be served.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfig`] for a WebSocket path the router cannot
    /// register as a plain route, or an empty default game id.
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if !self.ws_path.starts_with('/') {
            return Err(InvalidConfig::WsPath(self.ws_path.clone()));
        }
        // The router panics on these, so catch them before it is built.
        if self.ws_path == "/" || self.ws_path.contains(&['{', '}', '*', ':'][..]) {
            return Err(InvalidConfig::ReservedWsPath(self.ws_path.clone()));
        }
        if self.default_game_id.is_empty() {
            return Err(InvalidConfig::EmptyGameId);
        }
        Ok(())
    }
}
