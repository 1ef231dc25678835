//! Domain entities for Connect 4.
//!
//! Pure game rules with no I/O, no async and no knowledge of connections.
//! The server owns one [`board::Board`] per session and serialises access to
//! it; everything here assumes single-threaded use.

/// The board engine: grid, turn, win and draw detection.
pub mod board;
