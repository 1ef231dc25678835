//! Domain layer for connect4-server.
//!
//! Plain configuration types with no I/O.  The game rules themselves live in
//! `connect4-core`; reading files and parsing arguments is done by
//! `infrastructure` and `main.rs`.

pub mod config;

pub use config::{InvalidConfig, ServerConfig, DEFAULT_GAME_ID, DEFAULT_PORT, DEFAULT_WS_PATH};
