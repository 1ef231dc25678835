//! Process-wide map from session identifier to [`Session`].
//!
//! The registry is an explicit object owned by the server and shared with
//! every connection task through an `Arc`.  Its own lock only protects the
//! map; it is held briefly to look up, create or remove an entry and is never
//! held while waiting for a session's lock.  The reverse nesting does happen:
//! a session releases itself while holding its own lock, so the lock order is
//! always session → registry.

use std::collections::HashMap;
use std::sync::Arc;

use connect4_core::Player;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::application::broadcaster::OutboundSender;
use crate::application::session::{Admission, ConnectionId, Departure, Session};

/// Why a connection could not be seated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// Both slots of the session are already taken.
    #[error("session {game_id} already has two players")]
    Full { game_id: String },
}

/// Owner of every live session.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `game_id`, creating an empty one if needed.
    pub async fn resolve(&self, game_id: &str) -> Arc<Session> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(game_id.to_string()).or_insert_with(|| {
            info!("session {game_id}: created");
            Arc::new(Session::new(game_id))
        });
        Arc::clone(session)
    }

    /// Removes `session` from the map.
    ///
    /// Only the exact instance is removed: if the identifier has meanwhile
    /// been taken by a newer session, that one stays.
    pub async fn release(&self, session: &Session) {
        let mut sessions = self.sessions.lock().await;
        let is_same = sessions
            .get(session.id())
            .is_some_and(|current| std::ptr::eq(current.as_ref(), session));
        if is_same {
            sessions.remove(session.id());
        }
    }

    /// Looks up a session without creating it.
    pub async fn get(&self, game_id: &str) -> Option<Arc<Session>> {
        self.sessions.lock().await.get(game_id).cloned()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Matchmaking: seats a connection in session `game_id`.
    ///
    /// On success the connection's `init` message and the current game state
    /// are already queued on `outbound`.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError::Full`] if the session already has two players.
    /// Nothing about the session changes in that case.
    pub async fn join(
        &self,
        game_id: &str,
        connection_id: ConnectionId,
        outbound: OutboundSender,
    ) -> Result<(Arc<Session>, Player), JoinError> {
        loop {
            let session = self.resolve(game_id).await;
            match session.admit(connection_id, outbound.clone()).await {
                Admission::Seated(player) => return Ok((session, player)),
                Admission::Full => {
                    return Err(JoinError::Full {
                        game_id: game_id.to_string(),
                    })
                }
                // Emptied and released between resolve and admit.
                Admission::Closed => {
                    debug!("session {game_id}: resolved a released session, retrying");
                }
            }
        }
    }

    /// Disconnect handling: unseats `connection_id` from `session`.
    ///
    /// Safe to call more than once; later calls are no-ops.
    pub async fn leave(&self, session: &Session, connection_id: ConnectionId) -> Departure {
        session.depart(connection_id, self).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
