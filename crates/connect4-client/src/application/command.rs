//! Parsing of what the user types.
//!
//! Columns are entered 1–7, matching the header printed above the board, and
//! converted to the 0-based index the protocol uses.

use connect4_core::COLS;
use thiserror::Error;

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Drop a piece into this 0-based column.
    Move(i64),
    /// Vote for a rematch.
    PlayAgain,
    /// Leave the game.
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty input")]
    Empty,

    #[error("column must be between 1 and 7, got {0}")]
    ColumnOutOfRange(i64),

    #[error("unknown command {0:?}; type a column (1-7), \"again\" or \"quit\"")]
    Unknown(String),
}

/// Parses a line of input.
///
/// # Errors
///
/// Returns [`CommandError`] for blank lines, out-of-range columns and
/// unrecognised words.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let word = line.trim();
    if word.is_empty() {
        return Err(CommandError::Empty);
    }

    if let Ok(n) = word.parse::<i64>() {
        return if (1..=COLS as i64).contains(&n) {
            Ok(Command::Move(n - 1))
        } else {
            Err(CommandError::ColumnOutOfRange(n))
        };
    }

    match word.to_ascii_lowercase().as_str() {
        "again" | "a" | "play_again" => Ok(Command::PlayAgain),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        _ => Err(CommandError::Unknown(word.to_string())),
    }
}
