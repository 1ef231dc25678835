//! The Connect 4 board engine.
//!
//! [`Board`] is a pure state machine: a 6 × 7 grid, the player whose turn it
//! is, and the game result.  It performs no I/O and knows nothing about
//! connections or locking; the server wraps one instance per session behind
//! the session's lock.
//!
//! # Coordinates
//!
//! Row 0 is the **top** of the board and row 5 the bottom.  Pieces fall, so
//! within a column the occupied cells always form a contiguous run that
//! starts at row 5 and grows upwards.
//!
//! ```text
//!        col 0 1 2 3 4 5 6
//! row 0      . . . . . . .
//! row 1      . . . . . . .
//! row 2      . . . . . . .
//! row 3      . . . . . . .
//! row 4      . . 2 . . . .
//! row 5      . 1 1 2 . . .
//! ```
//!
//! # Win detection
//!
//! After every placement only the lines through the new piece can have
//! changed, so [`Board::drop_piece`] walks outwards from that cell along the
//! four axes (horizontal, vertical and both diagonals) instead of rescanning
//! the grid.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of rows on the board.
pub const ROWS: usize = 6;

/// Number of columns on the board.
pub const COLS: usize = 7;

/// Pieces in a line needed to win.
const CONNECT: usize = 4;

/// Axis directions walked by the win check, as `(delta_row, delta_col)`.
/// Each axis is also walked in the opposite direction.
const AXES: [(isize, isize); 4] = [
    (0, 1),  // horizontal
    (1, 0),  // vertical
    (1, 1),  // diagonal, top-left to bottom-right
    (1, -1), // diagonal, top-right to bottom-left
];

// ── Player ────────────────────────────────────────────────────────────────────

/// One of the two players, also used as a connection's slot within a session.
///
/// On the wire a player is its number: `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Player {
    /// Player 1, who moves first in a fresh game.
    One,
    /// Player 2.
    Two,
}

/// A number that is not a valid player slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid player number: {0} (expected 1 or 2)")]
pub struct InvalidPlayerNumber(pub u8);

impl Player {
    /// Returns the wire number of this player (`1` or `2`).
    pub fn number(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }

    /// Returns the opponent.
    pub fn other(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }
}

impl From<Player> for u8 {
    fn from(player: Player) -> Self {
        player.number()
    }
}

impl TryFrom<u8> for Player {
    type Error = InvalidPlayerNumber;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Player::One),
            2 => Ok(Player::Two),
            other => Err(InvalidPlayerNumber(other)),
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player {}", self.number())
    }
}

// ── Cell / result ─────────────────────────────────────────────────────────────

/// Contents of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Occupied(Player),
}

impl Cell {
    /// Wire value of the cell: `0` for empty, otherwise the player number.
    pub fn number(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Occupied(player) => player.number(),
        }
    }

    /// Returns `true` if no piece has been placed here.
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

/// Outcome of the game so far.
///
/// Only ever moves from `InProgress` to `Won` or `Drawn`; going back requires
/// [`Board::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameResult {
    #[default]
    InProgress,
    Won(Player),
    Drawn,
}

impl GameResult {
    /// Returns `true` once the game has been won or drawn.
    pub fn is_over(self) -> bool {
        !matches!(self, GameResult::InProgress)
    }

    /// Returns the winner, if any.
    pub fn winner(self) -> Option<Player> {
        match self {
            GameResult::Won(player) => Some(player),
            _ => None,
        }
    }
}

// ── Move outcome ──────────────────────────────────────────────────────────────

/// Why [`Board::drop_piece`] did not apply a move.
///
/// Rule violations are never reported to players; the server only logs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveRejected {
    #[error("column {0} is outside the board")]
    ColumnOutOfRange(i64),

    #[error("the game is already over")]
    GameOver,

    #[error("column {0} is full")]
    ColumnFull(usize),
}

/// Where an applied move landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub row: usize,
    pub column: usize,
    pub player: Player,
}

// ── Board ─────────────────────────────────────────────────────────────────────

/// Grid, turn and result of one Connect 4 game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    grid: [[Cell; COLS]; ROWS],
    current_turn: Player,
    result: GameResult,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Creates an empty board with player 1 to move.
    pub fn new() -> Self {
        Self {
            grid: [[Cell::Empty; COLS]; ROWS],
            current_turn: Player::One,
            result: GameResult::InProgress,
        }
    }

    /// Reinitialises the whole board: empty grid, player 1 to move, in progress.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The grid, indexed `[row][column]` with row 0 at the top.
    pub fn grid(&self) -> &[[Cell; COLS]; ROWS] {
        &self.grid
    }

    /// Returns the cell at `(row, column)`, or `None` if outside the board.
    pub fn cell(&self, row: usize, column: usize) -> Option<Cell> {
        self.grid.get(row).and_then(|r| r.get(column)).copied()
    }

    pub fn current_turn(&self) -> Player {
        self.current_turn
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    /// Gives the move to `player` without touching the grid.
    ///
    /// Used by the session when a departing player leaves the other one in
    /// charge of the next move.
    pub fn hand_turn_to(&mut self, player: Player) {
        self.current_turn = player;
    }

    /// Drops a piece for the player to move into `column`.
    ///
    /// `column` is taken as received from the wire, so any integer is
    /// accepted and checked here.  On success the piece lands in the lowest
    /// empty row, the result is re-evaluated from that cell, and the turn
    /// passes to the other player.  The turn passes even when the move ends
    /// the game, so after a win `current_turn` names the loser.
    ///
    /// # Errors
    ///
    /// Returns [`MoveRejected`] if the column is outside `0..=6`, the game is
    /// over, or the column is full.  The board is unchanged in every case.
    pub fn drop_piece(&mut self, column: i64) -> Result<Placement, MoveRejected> {
        let col = usize::try_from(column)
            .ok()
            .filter(|&c| c < COLS)
            .ok_or(MoveRejected::ColumnOutOfRange(column))?;

        if self.result.is_over() {
            return Err(MoveRejected::GameOver);
        }

        let row = (0..ROWS)
            .rev()
            .find(|&r| self.grid[r][col].is_empty())
            .ok_or(MoveRejected::ColumnFull(col))?;

        let player = self.current_turn;
        self.grid[row][col] = Cell::Occupied(player);
        self.check_win(row, col);
        self.current_turn = player.other();

        Ok(Placement {
            row,
            column: col,
            player,
        })
    }

    /// Re-evaluates the result after the player to move placed at `(row, col)`.
    fn check_win(&mut self, row: usize, col: usize) {
        let player = self.current_turn;

        for (dr, dc) in AXES {
            let run = 1
                + self.count_direction(row, col, dr, dc, player)
                + self.count_direction(row, col, -dr, -dc, player);
            if run >= CONNECT {
                self.result = GameResult::Won(player);
                return;
            }
        }

        if self.is_full() {
            self.result = GameResult::Drawn;
        }
    }

    /// Counts consecutive `player` pieces starting next to `(row, col)` and
    /// walking in direction `(dr, dc)`.  The starting cell is not counted.
    fn count_direction(&self, row: usize, col: usize, dr: isize, dc: isize, player: Player) -> usize {
        let mut count = 0;
        let (mut r, mut c) = (row as isize, col as isize);
        loop {
            r += dr;
            c += dc;
            let inside = (0..ROWS as isize).contains(&r) && (0..COLS as isize).contains(&c);
            if !inside || self.grid[r as usize][c as usize] != Cell::Occupied(player) {
                return count;
            }
            count += 1;
        }
    }

    /// The board is full once the top row has no empty cell.
    pub fn is_full(&self) -> bool {
        self.grid[0].iter().all(|cell| !cell.is_empty())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
