//! Infrastructure layer for connect4-server.
//!
//! All I/O lives here: the axum router with its WebSocket upgrade, the
//! per-connection read and write tasks, and loading the optional TOML config
//! file.
//!
//! # What does NOT belong here?
//!
//! - Seating, turn checks and rematch votes (application layer)
//! - Board rules and the wire format (connect4-core)

pub mod config_file;
pub mod connection;
pub mod ws_server;

pub use config_file::{ConfigError, ConfigFile};
pub use connection::run_connection;
pub use ws_server::{run_server, GameServer, BANNER};
