//! Application layer for the terminal client.
//!
//! - **`command`** turns a typed line into a [`Command`].
//! - **`view`** tracks what the server told us and renders it as text.
//!
//! Neither module does I/O.

pub mod command;
pub mod view;

pub use command::{parse_command, Command, CommandError};
pub use view::{render_board, status_text, GameView, MoveBlocked};
