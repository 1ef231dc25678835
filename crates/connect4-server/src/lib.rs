//! connect4-server library crate.
//!
//! A WebSocket server hosting two-player Connect 4 games.  Players connect to
//! a named session, are seated as player 1 or 2, send moves and rematch
//! votes as JSON, and receive the full board after every change.
//!
//! # Architecture
//!
//! ```text
//! Terminal / browser clients  (JSON over WebSocket)
//!         ↕
//! [connect4-server]
//!   ├── domain/           ServerConfig and its defaults
//!   ├── application/      Session, SessionRegistry, broadcaster
//!   └── infrastructure/
//!         ├── ws_server/  axum router, banner, WebSocket upgrade
//!         ├── connection/ Per-connection read and write tasks
//!         └── config_file/ Optional TOML config
//!         ↕
//! connect4-core  (Board rules, message types, codec)
//! ```

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: sessions, matchmaking and broadcasting.
pub mod application;

/// Infrastructure layer: sockets, WebSocket tasks and config loading.
pub mod infrastructure;
