//! Application layer for connect4-server.
//!
//! Sessions, the session registry and the broadcaster.  This is where the
//! game is coordinated: matchmaking into slots, applying intents under each
//! session's lock, rematch votes and disconnect handling.
//!
//! # What does NOT belong here?
//!
//! - Sockets, the WebSocket handshake and frame I/O (infrastructure)
//! - Board rules (connect4-core)
//!
//! The only async this layer needs is `tokio::sync`: locks and the unbounded
//! delivery queues that connect it to the outbound tasks.

pub mod broadcaster;
pub mod registry;
pub mod session;

pub use broadcaster::{broadcast, OutboundReceiver, OutboundSender, Payload};
pub use registry::{JoinError, SessionRegistry};
pub use session::{ConnectionId, Departure, MoveIgnored, RematchVote, Seat, Session, SessionState};
