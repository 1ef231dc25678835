//! Fan-out of encoded messages to the connections seated in a session.
//!
//! Every function here takes a `&SessionState`, which only exists behind the
//! session's lock, so a broadcast always observes a consistent state and all
//! connections receive snapshots in the order the mutations were applied.
//! Nothing here touches the network: payloads are pushed onto each
//! connection's unbounded delivery queue and written later by that
//! connection's own outbound task.

use std::sync::Arc;

use connect4_core::protocol::{encode_server_message, GameSnapshot, ServerMessage};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::application::session::{Seat, SessionState};

/// An encoded text frame, shared by every queue it is broadcast to.
pub type Payload = Arc<str>;

/// Producer side of a connection's delivery queue.
pub type OutboundSender = mpsc::UnboundedSender<Payload>;

/// Consumer side of a connection's delivery queue, drained by its outbound task.
pub type OutboundReceiver = mpsc::UnboundedReceiver<Payload>;

/// Encodes `msg` once, or logs and returns `None` if that fails.
pub(crate) fn encode(msg: &ServerMessage) -> Option<Payload> {
    match encode_server_message(msg) {
        Ok(text) => Some(Payload::from(text)),
        Err(e) => {
            error!("failed to encode outbound message: {e}");
            None
        }
    }
}

/// Builds the `game_state` message for the current board.
pub(crate) fn game_state(state: &SessionState) -> ServerMessage {
    ServerMessage::GameState {
        game: GameSnapshot::from(state.board()),
    }
}

/// Queues `payload` for one seat.
///
/// A closed queue means the connection is already tearing down; its own
/// disconnect handling removes the seat, so the failure is only logged.
pub(crate) fn send_to(seat: &Seat, payload: &Payload) {
    if seat.outbound.send(Arc::clone(payload)).is_err() {
        debug!(
            "connection {} ({}): delivery queue closed, dropping message",
            seat.connection_id, seat.player
        );
    }
}

/// Encodes `msg` once and queues it for every seated connection.
pub(crate) fn broadcast_message(state: &SessionState, msg: &ServerMessage) {
    let Some(payload) = encode(msg) else {
        return;
    };
    for seat in state.seats() {
        send_to(seat, &payload);
    }
}

/// Queues the current game state for every seated connection.
pub fn broadcast(state: &SessionState) {
    broadcast_message(state, &game_state(state));
}
