//! One game session: a board plus the connections seated at it.
//!
//! A [`Session`] guards its [`SessionState`] with a single `tokio` mutex.
//! Every read or write of the board or the seat list goes through that lock,
//! and every broadcast happens while it is still held, so all mutations of
//! one session are totally ordered and every player sees them in that order.
//!
//! Work done under the lock is bounded: a board update plus pushing encoded
//! payloads onto unbounded queues.  Network writes happen elsewhere, in each
//! connection's outbound task.
//!
//! # Seat lifecycle
//!
//! ```text
//! admit ──► seated ──► (move / play_again)* ──► depart
//!                                                  │
//!            0 left: session closed and released ◄─┤
//!            1 left: board reset, survivor moves ◄─┘
//! ```

use connect4_core::protocol::{ClientMessage, GameSnapshot, ServerMessage};
use connect4_core::{Board, MoveRejected, Placement, Player};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::broadcaster::{
    broadcast, broadcast_message, encode, game_state, send_to, OutboundSender,
};
use crate::application::registry::SessionRegistry;

/// Identifies one accepted connection for its whole lifetime.
pub type ConnectionId = Uuid;

/// A connection seated in a session.
#[derive(Debug)]
pub struct Seat {
    pub(crate) connection_id: ConnectionId,
    pub(crate) player: Player,
    pub(crate) ready: bool,
    pub(crate) outbound: OutboundSender,
}

impl Seat {
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn player(&self) -> Player {
        self.player
    }

    /// Whether this connection has asked for a rematch.
    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Mutable state of a session.  Only reachable through the session's lock.
#[derive(Debug)]
pub struct SessionState {
    board: Board,
    seats: Vec<Seat>,
    closed: bool,
}

/// Result of trying to seat a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Seated(Player),
    /// Both slots are taken.
    Full,
    /// The session was released after this handle was resolved; resolve again.
    Closed,
}

/// Why a move intent was dropped without effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveIgnored {
    NotSeated,
    NotYourTurn,
    Rejected(MoveRejected),
}

/// Outcome of a rematch vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RematchVote {
    NotSeated,
    /// Recorded; at least one seated connection has not voted yet.
    Waiting,
    /// Everyone was ready: the board was reset and the new game broadcast.
    Reset,
}

/// What a disconnect did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The connection was not seated (already removed).
    NotSeated,
    /// Nobody is left; the session is closed and released from the registry.
    Emptied,
    /// One player is left; the board was reset and they move first.
    Restarted(Player),
    /// More than one player is left and the departing one held the turn.
    TurnHandedOver(Player),
    /// More than one player is left and nothing changed.
    Continued,
}

impl SessionState {
    fn new() -> Self {
        Self {
            board: Board::new(),
            seats: Vec::with_capacity(2),
            closed: false,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    fn seat(&self, connection_id: ConnectionId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.connection_id == connection_id)
    }

    /// Seats a connection in the first free slot and queues its `init` and
    /// the current state for it.
    ///
    /// Nothing is queued for the other seat: the newcomer's arrival does not
    /// change the board, so the opponent's view is still current.
    fn admit(&mut self, connection_id: ConnectionId, outbound: OutboundSender) -> Admission {
        // A released session must not take new players; the caller resolves
        // the name again and gets a fresh instance.
        if self.closed {
            return Admission::Closed;
        }

        // Slot 1 first.  With one seat taken the newcomer gets the other slot,
        // which is slot 1 again if the original player 1 has left.
        let player = match self.seats.as_slice() {
            [] => Player::One,
            [only] => only.player.other(),
            _ => return Admission::Full,
        };

        let seat = Seat {
            connection_id,
            player,
            ready: false,
            outbound,
        };
        for msg in [ServerMessage::Init { player }, game_state(self)] {
            if let Some(payload) = encode(&msg) {
                send_to(&seat, &payload);
            }
        }
        self.seats.push(seat);

        Admission::Seated(player)
    }

    /// Applies a move from `connection_id` and broadcasts the new state.
    fn apply_move(
        &mut self,
        connection_id: ConnectionId,
        column: i64,
    ) -> Result<Placement, MoveIgnored> {
        let player = self
            .seat(connection_id)
            .ok_or(MoveIgnored::NotSeated)?
            .player;

        // The board checks range, full columns and game over; the turn is a
        // session concern because the board does not know who is connected.
        if player != self.board.current_turn() {
            return Err(MoveIgnored::NotYourTurn);
        }

        let placement = self.board.drop_piece(column).map_err(MoveIgnored::Rejected)?;
        broadcast(self);
        Ok(placement)
    }

    /// Records a rematch vote; resets the game once every seat has voted.
    fn mark_ready(&mut self, connection_id: ConnectionId) -> RematchVote {
        let Some(seat) = self
            .seats
            .iter_mut()
            .find(|s| s.connection_id == connection_id)
        else {
            return RematchVote::NotSeated;
        };
        seat.ready = true;

        if !self.seats.iter().all(|s| s.ready) {
            return RematchVote::Waiting;
        }

        self.board.reset();
        for seat in &mut self.seats {
            seat.ready = false;
        }
        broadcast_message(self, &ServerMessage::Reset);
        broadcast(self);
        RematchVote::Reset
    }

    /// Unseats a connection and adjusts the game for whoever is left.
    ///
    /// - nobody left: the session is marked closed so late joiners retry;
    /// - one left: the game restarts and the survivor moves first;
    /// - more left: the turn passes on if the departing player held it.
    fn remove(&mut self, connection_id: ConnectionId) -> Departure {
        let Some(index) = self
            .seats
            .iter()
            .position(|s| s.connection_id == connection_id)
        else {
            return Departure::NotSeated;
        };
        let departed = self.seats.remove(index);

        match self.seats.len() {
            0 => {
                self.closed = true;
                Departure::Emptied
            }
            1 => {
                let survivor = self.seats[0].player;
                self.seats[0].ready = false;
                self.board.reset();
                self.board.hand_turn_to(survivor);
                broadcast(self);
                Departure::Restarted(survivor)
            }
            _ => {
                // Not reachable through admission, which caps a session at two.
                if self.board.current_turn() != departed.player {
                    return Departure::Continued;
                }
                let next = departed.player.other();
                self.board.hand_turn_to(next);
                broadcast(self);
                Departure::TurnHandedOver(next)
            }
        }
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// A named game and the lock that serialises everything done to it.
#[derive(Debug)]
pub struct Session {
    id: String,
    state: Mutex<SessionState>,
}

impl Session {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(SessionState::new()),
        }
    }

    /// The session identifier players connect with.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) async fn admit(
        &self,
        connection_id: ConnectionId,
        outbound: OutboundSender,
    ) -> Admission {
        let admission = self.state.lock().await.admit(connection_id, outbound);
        if let Admission::Seated(player) = admission {
            info!("session {}: connection {connection_id} seated as {player}", self.id);
        }
        admission
    }

    /// Applies an intent from a seated connection.
    ///
    /// Rule violations (wrong turn, full column, finished game, bad column)
    /// change nothing and send nothing; they are only logged.
    ///
    /// # Parameters
    ///
    /// - `connection_id` – The sender.  Intents from unseated ids are ignored.
    /// - `msg`           – A decoded `move` or `play_again` intent.
    pub async fn submit(&self, connection_id: ConnectionId, msg: ClientMessage) {
        // The lock is held until the resulting broadcast has been queued, so
        // every seat sees this change before any later one.
        let mut state = self.state.lock().await;
        match msg {
            ClientMessage::Move { column } => match state.apply_move(connection_id, column) {
                Ok(placement) => debug!(
                    "session {}: {} dropped into column {} (row {}), now {:?}",
                    self.id,
                    placement.player,
                    placement.column,
                    placement.row,
                    state.board().result()
                ),
                Err(reason) => debug!(
                    "session {}: ignored move to column {column} from {connection_id}: {reason:?}",
                    self.id
                ),
            },
            ClientMessage::PlayAgain => match state.mark_ready(connection_id) {
                RematchVote::Reset => info!("session {}: rematch started", self.id),
                vote => debug!("session {}: rematch vote from {connection_id}: {vote:?}", self.id),
            },
        }
    }

    /// Unseats a connection.  When the last one leaves, the session is closed
    /// and released from `registry` before the lock is dropped.
    ///
    /// Releasing under the session lock follows the lock order (session, then
    /// registry).  A concurrent `join` that already resolved this instance
    /// waits on the lock, then sees it closed and resolves again.
    pub(crate) async fn depart(
        &self,
        connection_id: ConnectionId,
        registry: &SessionRegistry,
    ) -> Departure {
        let mut state = self.state.lock().await;
        let departure = state.remove(connection_id);
        match departure {
            Departure::Emptied => {
                registry.release(self).await;
                info!("session {}: last player left, session destroyed", self.id);
            }
            Departure::NotSeated => {}
            other => info!(
                "session {}: connection {connection_id} left ({other:?})",
                self.id
            ),
        }
        departure
    }

    /// Current game state as players would see it.
    pub async fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::from(self.state.lock().await.board())
    }

    /// Whether the last player has left and the session was released.
    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::broadcaster::OutboundReceiver;
    use connect4_core::protocol::decode_server_message;
    use connect4_core::GameResult;
    use tokio::sync::mpsc;

    fn seat(state: &mut SessionState) -> (ConnectionId, Player, OutboundReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        match state.admit(id, tx) {
            Admission::Seated(player) => (id, player, rx),
            other => panic!("expected a seat, got {other:?}"),
        }
    }

    fn drain(rx: &mut OutboundReceiver) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(payload) = rx.try_recv() {
            out.push(decode_server_message(&payload).expect("server output must decode"));
        }
        out
    }

    fn current_turn(msgs: &[ServerMessage]) -> Option<Player> {
        msgs.iter().rev().find_map(|m| match m {
            ServerMessage::GameState { game } => Some(game.current_turn),
            _ => None,
        })
    }

    #[test]
    fn test_first_connection_gets_player_one_then_two() {
        let mut state = SessionState::new();
        let (_, p1, _rx1) = seat(&mut state);
        let (_, p2, _rx2) = seat(&mut state);
        assert_eq!(p1, Player::One);
        assert_eq!(p2, Player::Two);
    }

    #[test]
    fn test_admit_queues_init_then_state() {
        let mut state = SessionState::new();
        let (_, _, mut rx) = seat(&mut state);

        let msgs = drain(&mut rx);

        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0], ServerMessage::Init { player: Player::One });
        assert!(matches!(msgs[1], ServerMessage::GameState { .. }));
    }

    #[test]
    fn test_third_connection_is_refused_and_state_untouched() {
        let mut state = SessionState::new();
        let (_, _, _rx1) = seat(&mut state);
        let (_, _, _rx2) = seat(&mut state);
        let (tx, mut rx3) = mpsc::unbounded_channel();

        let admission = state.admit(Uuid::new_v4(), tx);

        assert_eq!(admission, Admission::Full);
        assert_eq!(state.seats().len(), 2);
        assert!(rx3.try_recv().is_err(), "refused connection gets nothing queued");
    }

    #[test]
    fn test_newcomer_takes_the_free_slot() {
        let mut state = SessionState::new();
        let (id1, _, _rx1) = seat(&mut state);
        let (_, _, _rx2) = seat(&mut state);
        state.remove(id1);

        let (_, player, _rx3) = seat(&mut state);

        assert_eq!(player, Player::One);
    }

    #[test]
    fn test_move_broadcasts_to_both_players() {
        let mut state = SessionState::new();
        let (id1, _, mut rx1) = seat(&mut state);
        let (_, _, mut rx2) = seat(&mut state);
        drain(&mut rx1);
        drain(&mut rx2);

        state.apply_move(id1, 3).unwrap();

        for rx in [&mut rx1, &mut rx2] {
            let msgs = drain(rx);
            assert_eq!(msgs.len(), 1);
            match &msgs[0] {
                ServerMessage::GameState { game } => {
                    assert_eq!(game.board[5][3], 1);
                    assert_eq!(game.current_turn, Player::Two);
                }
                other => panic!("expected game_state, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_out_of_turn_move_changes_nothing() {
        let mut state = SessionState::new();
        let (_, _, mut rx1) = seat(&mut state);
        let (id2, _, mut rx2) = seat(&mut state);
        drain(&mut rx1);
        drain(&mut rx2);

        let result = state.apply_move(id2, 0);

        assert_eq!(result, Err(MoveIgnored::NotYourTurn));
        assert_eq!(*state.board(), Board::new());
        assert!(drain(&mut rx1).is_empty());
        assert!(drain(&mut rx2).is_empty());
    }

    #[test]
    fn test_invalid_column_changes_nothing() {
        let mut state = SessionState::new();
        let (id1, _, mut rx1) = seat(&mut state);
        drain(&mut rx1);

        assert_eq!(
            state.apply_move(id1, 9),
            Err(MoveIgnored::Rejected(MoveRejected::ColumnOutOfRange(9)))
        );
        assert!(drain(&mut rx1).is_empty());
    }

    #[test]
    fn test_unseated_connection_cannot_move() {
        let mut state = SessionState::new();
        let (_, _, _rx1) = seat(&mut state);
        assert_eq!(state.apply_move(Uuid::new_v4(), 0), Err(MoveIgnored::NotSeated));
    }

    #[test]
    fn test_single_rematch_vote_does_not_reset() {
        let mut state = SessionState::new();
        let (id1, _, mut rx1) = seat(&mut state);
        let (_, _, _rx2) = seat(&mut state);
        state.apply_move(id1, 0).unwrap();
        drain(&mut rx1);

        assert_eq!(state.mark_ready(id1), RematchVote::Waiting);
        assert!(state.board().cell(5, 0).is_some_and(|c| !c.is_empty()));
        assert!(drain(&mut rx1).is_empty());
    }

    #[test]
    fn test_rematch_after_both_votes_sends_reset_then_fresh_state() {
        let mut state = SessionState::new();
        let (id1, _, mut rx1) = seat(&mut state);
        let (id2, _, mut rx2) = seat(&mut state);
        state.apply_move(id1, 0).unwrap();
        state.apply_move(id2, 1).unwrap();
        state.apply_move(id1, 0).unwrap();
        drain(&mut rx1);
        drain(&mut rx2);

        state.mark_ready(id2);
        let vote = state.mark_ready(id1);

        assert_eq!(vote, RematchVote::Reset);
        assert_eq!(*state.board(), Board::new());
        assert!(state.seats().iter().all(|s| !s.is_ready()));
        for rx in [&mut rx1, &mut rx2] {
            let msgs = drain(rx);
            assert_eq!(msgs.len(), 2);
            assert_eq!(msgs[0], ServerMessage::Reset);
            assert_eq!(current_turn(&msgs), Some(Player::One));
        }
    }

    #[test]
    fn test_disconnect_with_one_left_restarts_with_survivor_to_move() {
        let mut state = SessionState::new();
        let (id1, _, _rx1) = seat(&mut state);
        let (id2, _, mut rx2) = seat(&mut state);
        state.apply_move(id1, 2).unwrap();
        state.mark_ready(id2);
        drain(&mut rx2);

        let departure = state.remove(id1);

        assert_eq!(departure, Departure::Restarted(Player::Two));
        assert_eq!(state.board().current_turn(), Player::Two);
        assert_eq!(state.board().result(), GameResult::InProgress);
        assert!(state.board().grid().iter().flatten().all(|c| c.is_empty()));
        assert!(!state.seats()[0].is_ready());
        assert_eq!(current_turn(&drain(&mut rx2)), Some(Player::Two));
    }

    #[test]
    fn test_last_disconnect_closes_session() {
        let mut state = SessionState::new();
        let (id1, _, _rx1) = seat(&mut state);

        assert_eq!(state.remove(id1), Departure::Emptied);
        assert!(state.closed);
        assert_eq!(state.admit(Uuid::new_v4(), mpsc::unbounded_channel().0), Admission::Closed);
    }

    #[test]
    fn test_removing_unknown_connection_is_a_no_op() {
        let mut state = SessionState::new();
        let (_, _, _rx1) = seat(&mut state);
        assert_eq!(state.remove(Uuid::new_v4()), Departure::NotSeated);
        assert_eq!(state.seats().len(), 1);
    }

    /// Builds a session with three seats, bypassing the admission cap.
    fn overfull_state() -> (SessionState, Vec<(ConnectionId, OutboundReceiver)>) {
        let mut state = SessionState::new();
        let mut handles = Vec::new();
        for player in [Player::One, Player::Two, Player::Two] {
            let (tx, rx) = mpsc::unbounded_channel();
            let id = Uuid::new_v4();
            state.seats.push(Seat {
                connection_id: id,
                player,
                ready: false,
                outbound: tx,
            });
            handles.push((id, rx));
        }
        (state, handles)
    }

    #[test]
    fn test_departing_turn_holder_hands_turn_over_when_two_remain() {
        let (mut state, mut handles) = overfull_state();
        let departing = handles[0].0;

        let departure = state.remove(departing);

        assert_eq!(departure, Departure::TurnHandedOver(Player::Two));
        assert_eq!(state.board().current_turn(), Player::Two);
        assert_eq!(current_turn(&drain(&mut handles[1].1)), Some(Player::Two));
    }

    #[test]
    fn test_departing_non_turn_holder_changes_nothing_when_two_remain() {
        let (mut state, mut handles) = overfull_state();
        let departing = handles[1].0;

        let departure = state.remove(departing);

        assert_eq!(departure, Departure::Continued);
        assert_eq!(state.board().current_turn(), Player::One);
        assert!(drain(&mut handles[0].1).is_empty());
    }
}
