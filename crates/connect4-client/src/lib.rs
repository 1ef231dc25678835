//! connect4-client library crate.
//!
//! A terminal front end for the Connect 4 server.  It prints the board and a
//! status line after every `game_state`, reads commands from stdin and sends
//! them as protocol intents.
//!
//! The binary in `main.rs` only parses arguments and starts
//! [`infrastructure::run_client`]; everything it drives lives here so it can
//! be tested without a terminal.

/// Application layer: command parsing and the view of the game.
pub mod application;

/// Infrastructure layer: the WebSocket connection and stdin loop.
pub mod infrastructure;
