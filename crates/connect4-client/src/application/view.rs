//! What the client knows about its game, and how it is drawn.

use std::fmt::Write as _;

use connect4_core::protocol::{GameSnapshot, ServerMessage};
use connect4_core::{Player, COLS};

/// Why a typed move is not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveBlocked {
    NotJoined,
    GameOver,
    NotYourTurn,
}

impl MoveBlocked {
    pub fn hint(self) -> &'static str {
        match self {
            Self::NotJoined => "Still waiting for the server",
            Self::GameOver => "The game is over; type \"again\" for a rematch",
            Self::NotYourTurn => "Wait for your opponent to move",
        }
    }
}

/// Client-side state built from server messages.
#[derive(Debug, Clone, Default)]
pub struct GameView {
    player: Option<Player>,
    game: Option<GameSnapshot>,
    voted: bool,
}

impl GameView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn game(&self) -> Option<&GameSnapshot> {
        self.game.as_ref()
    }

    /// Folds a server message into the view and returns the text to show.
    pub fn apply(&mut self, msg: ServerMessage) -> String {
        match msg {
            ServerMessage::Init { player } => {
                self.player = Some(player);
                format!("You are Player {}", player.number())
            }
            ServerMessage::GameState { game } => {
                let mut screen = render_board(&game);
                if let Some(me) = self.player {
                    screen.push_str(status_text(&game, me));
                    if game.is_over && !self.voted {
                        screen.push_str("\nType \"again\" to play again.");
                    }
                }
                self.game = Some(game);
                screen
            }
            ServerMessage::Reset => {
                self.voted = false;
                self.game = None;
                "New game!".to_string()
            }
        }
    }

    /// Checks locally whether a move would be accepted, so obviously useless
    /// frames are not sent.
    pub fn check_move(&self) -> Result<(), MoveBlocked> {
        let (Some(me), Some(game)) = (self.player, &self.game) else {
            return Err(MoveBlocked::NotJoined);
        };
        if game.is_over {
            return Err(MoveBlocked::GameOver);
        }
        if game.current_turn != me {
            return Err(MoveBlocked::NotYourTurn);
        }
        Ok(())
    }

    /// Records that this client asked for a rematch.
    pub fn mark_voted(&mut self) {
        self.voted = true;
    }
}

/// Draws the grid with a column header, `X` for player 1 and `O` for player 2.
pub fn render_board(game: &GameSnapshot) -> String {
    let mut out = String::new();
    for col in 1..=COLS {
        let _ = write!(out, " {col}");
    }
    out.push('\n');
    for row in &game.board {
        for &cell in row {
            let mark = match cell {
                1 => 'X',
                2 => 'O',
                _ => '.',
            };
            out.push(' ');
            out.push(mark);
        }
        out.push('\n');
    }
    out
}

/// One-line status from `me`'s point of view.
pub fn status_text(game: &GameSnapshot, me: Player) -> &'static str {
    if game.is_draw() {
        "It's a tie!"
    } else if game.is_over {
        if game.winner == me.number() {
            "You win!"
        } else {
            "You lose!"
        }
    } else if game.current_turn == me {
        "Your turn"
    } else {
        "Opponent's turn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connect4_core::Board;

    fn snapshot_after(moves: &[i64]) -> GameSnapshot {
        let mut board = Board::new();
        for &c in moves {
            board.drop_piece(c).unwrap();
        }
        GameSnapshot::from(&board)
    }

    #[test]
    fn test_render_board_marks_pieces_bottom_up() {
        let text = render_board(&snapshot_after(&[0, 0, 6]));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], " 1 2 3 4 5 6 7");
        assert_eq!(lines[5], " O . . . . . .");
        assert_eq!(lines[6], " X . . . . . X");
    }

    #[test]
    fn test_status_text_turns() {
        let game = snapshot_after(&[]);
        assert_eq!(status_text(&game, Player::One), "Your turn");
        assert_eq!(status_text(&game, Player::Two), "Opponent's turn");
    }

    #[test]
    fn test_status_text_outcomes() {
        let won = snapshot_after(&[0, 1, 0, 1, 0, 1, 0]);
        assert_eq!(status_text(&won, Player::One), "You win!");
        assert_eq!(status_text(&won, Player::Two), "You lose!");

        let tie = GameSnapshot {
            is_over: true,
            winner: 0,
            ..snapshot_after(&[])
        };
        assert_eq!(status_text(&tie, Player::One), "It's a tie!");
    }

    #[test]
    fn test_check_move_follows_turn_and_game_over() {
        let mut view = GameView::new();
        assert_eq!(view.check_move(), Err(MoveBlocked::NotJoined));

        view.apply(ServerMessage::Init { player: Player::Two });
        view.apply(ServerMessage::GameState {
            game: snapshot_after(&[]),
        });
        assert_eq!(view.check_move(), Err(MoveBlocked::NotYourTurn));

        view.apply(ServerMessage::GameState {
            game: snapshot_after(&[3]),
        });
        assert_eq!(view.check_move(), Ok(()));

        view.apply(ServerMessage::GameState {
            game: snapshot_after(&[0, 1, 0, 1, 0, 1, 0]),
        });
        assert_eq!(view.check_move(), Err(MoveBlocked::GameOver));
    }

    #[test]
    fn test_rematch_prompt_until_voted_and_cleared_by_reset() {
        let mut view = GameView::new();
        view.apply(ServerMessage::Init { player: Player::One });
        let over = snapshot_after(&[0, 1, 0, 1, 0, 1, 0]);

        assert!(view
            .apply(ServerMessage::GameState { game: over.clone() })
            .contains("again"));

        view.mark_voted();
        assert!(!view
            .apply(ServerMessage::GameState { game: over.clone() })
            .contains("again"));

        assert_eq!(view.apply(ServerMessage::Reset), "New game!");
        assert!(view.game().is_none());
        assert!(view
            .apply(ServerMessage::GameState { game: over })
            .contains("again"));
    }
}
