//! # connect4-core
//!
//! Shared library for the Connect 4 server and client containing the board
//! engine and the JSON wire protocol.
//!
//! It has no dependencies on sockets, async runtimes or UI frameworks.
//!
//! - **`domain`** – the [`Board`] state machine: dropping pieces, alternating
//!   turns, and detecting wins and draws.
//! - **`protocol`** – the messages players and server exchange
//!   ([`ClientMessage`], [`ServerMessage`]) and the codec that turns them into
//!   WebSocket text frames.

pub mod domain;
pub mod protocol;

pub use domain::board::{
    Board, Cell, GameResult, InvalidPlayerNumber, MoveRejected, Placement, Player, COLS, ROWS,
};
pub use protocol::codec::ProtocolError;
pub use protocol::messages::{ClientMessage, GameSnapshot, ServerMessage, GAME_FULL_NOTICE};
