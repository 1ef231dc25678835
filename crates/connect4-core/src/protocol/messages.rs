//! JSON message types exchanged between players and the server.
//!
//! Every message is a JSON object whose `"type"` field names the variant:
//!
//! ```json
//! {"type":"move","column":3}
//! {"type":"play_again"}
//! {"type":"init","player":1}
//! {"type":"game_state","game":{"board":[[0,0,0,0,0,0,0],...],"current_turn":2,"is_over":false,"winner":0}}
//! {"type":"reset"}
//! ```
//!
//! The two directions use distinct enums, so the server cannot send a
//! client-only message and an unknown `"type"` fails to decode instead of
//! being silently dropped.

use serde::{Deserialize, Serialize};

use crate::domain::board::{Board, Player, COLS, ROWS};

/// Plain-text notice sent to a connection that tries to join a session which
/// already has two players.  It is not JSON.
pub const GAME_FULL_NOTICE: &str = "Game is full";

// ── Client → Server ───────────────────────────────────────────────────────────

/// Intents a player can send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Drop a piece into `column`.
    ///
    /// Any integer decodes; the board engine ignores columns outside `0..=6`.
    Move { column: i64 },

    /// The sender is ready for a rematch.
    PlayAgain,
}

// ── Server → Client ───────────────────────────────────────────────────────────

/// Messages the server sends to a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once after matchmaking: the slot this connection plays.
    Init { player: Player },

    /// Full snapshot of the game.
    GameState { game: GameSnapshot },

    /// A rematch was agreed; a fresh `GameState` follows immediately.
    Reset,
}

/// Externally visible state of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// `board[row][column]`, row 0 at the top; `0` empty, `1`/`2` a player's piece.
    pub board: [[u8; COLS]; ROWS],
    pub current_turn: Player,
    pub is_over: bool,
    /// Winning player number, or `0` while in progress or after a draw.
    pub winner: u8,
}

impl From<&Board> for GameSnapshot {
    fn from(board: &Board) -> Self {
        let mut cells = [[0u8; COLS]; ROWS];
        for (row, line) in board.grid().iter().enumerate() {
            for (col, cell) in line.iter().enumerate() {
                cells[row][col] = cell.number();
            }
        }

        let result = board.result();
        Self {
            board: cells,
            current_turn: board.current_turn(),
            is_over: result.is_over(),
            winner: result.winner().map_or(0, Player::number),
        }
    }
}

impl GameSnapshot {
    /// Returns `true` when the snapshot shows a finished game without a winner.
    pub fn is_draw(&self) -> bool {
        self.is_over && self.winner == 0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
