//! Game server: HTTP routing and the WebSocket upgrade.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Routing every request through an axum [`Router`]:
//!    - the configured WebSocket path is upgraded and handed to
//!      [`run_connection`], with the session taken from the `game_id` query
//!      parameter;
//!    - `GET /` answers with a plain-text banner;
//!    - anything else falls through to the router's `404 Not Found`.
//! 3. Stopping when the shared `running` flag is cleared.
//!
//! # Scalability
//!
//! `axum::serve` runs each TCP connection in its own Tokio task, and every
//! upgraded socket gets a further task of its own.  A slow client never holds
//! up the listener or another session.
//!
//! # Shutdown
//!
//! Cooperative, as in the rest of the server: a graceful-shutdown future polls
//! the `AtomicBool` every 200 ms.  Once it clears the listener stops accepting
//! and plain HTTP exchanges in flight are finished.  Upgraded connections are
//! left to end on their own.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::application::SessionRegistry;
use crate::domain::ServerConfig;
use crate::infrastructure::connection::run_connection;

/// Body of the plain HTTP response served at `/`.
pub const BANNER: &str = "Connect 4 Server is running. Use the client application to connect.";

/// How often the shutdown future rechecks the `running` flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

// ── Public API ────────────────────────────────────────────────────────────────

/// A bound, not yet serving, game server.
///
/// Binding and serving are separate so callers (and tests) can learn the
/// actual address when binding to port `0`.
pub struct GameServer {
    listener: TcpListener,
    config: Arc<ServerConfig>,
    registry: Arc<SessionRegistry>,
}

impl GameServer {
    /// Validates `config` and binds the listener on `config.bind_addr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be routed, or the address
    /// is in use or cannot be bound.
    pub async fn bind(config: ServerConfig) -> anyhow::Result<Self> {
        // The router refuses some paths by panicking; reject them here instead.
        config.validate().context("invalid server configuration")?;

        // `TcpListener::bind` is the async equivalent of `bind()` + `listen()`.
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .with_context(|| format!("failed to bind game server on {}", config.bind_addr))?;

        Ok(Self {
            listener,
            config: Arc::new(config),
            registry: Arc::new(SessionRegistry::new()),
        })
    }

    /// The address actually bound.
    ///
    /// # Errors
    ///
    /// Propagates the OS error if the socket address cannot be read.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The registry shared by every connection of this server.
    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Serves requests until `running` is cleared.
    ///
    /// # Parameters
    ///
    /// - `running` – Shared flag; the listener stops when it is set to `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP server fails outright.  Errors on single
    /// connections are logged by the server and do not end it.
    pub async fn serve(self, running: Arc<AtomicBool>) -> anyhow::Result<()> {
        match self.listener.local_addr() {
            Ok(addr) => info!(
                "Connect 4 server listening on {addr} (WebSocket path {})",
                self.config.ws_path
            ),
            Err(e) => warn!("Connect 4 server listening on unknown address: {e}"),
        }

        // `ConnectInfo` needs the peer address of each accepted socket, which
        // only this make-service variant records.
        let app = build_router(Arc::clone(&self.config), Arc::clone(&self.registry))
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(self.listener, app)
            .with_graceful_shutdown(wait_for_shutdown(running))
            .await
            .context("game server failed")?;

        info!("listener stopped");
        Ok(())
    }
}

/// Binds on `config.bind_addr` and serves until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the listener cannot
/// be bound.
pub async fn run_server(config: ServerConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    GameServer::bind(config).await?.serve(running).await
}

// ── Routing ───────────────────────────────────────────────────────────────────

/// Shared state handed to every handler.
#[derive(Clone)]
struct AppState {
    config: Arc<ServerConfig>,
    registry: Arc<SessionRegistry>,
}

/// Query parameters of the upgrade request.  Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
struct JoinParams {
    game_id: Option<String>,
}

impl JoinParams {
    /// The session to join; a missing or empty `game_id` selects the default.
    fn session_id(self, default_game_id: &str) -> String {
        self.game_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| default_game_id.to_string())
    }
}

/// Builds the router.  `config.ws_path` must have passed
/// [`ServerConfig::validate`].
fn build_router(config: Arc<ServerConfig>, registry: Arc<SessionRegistry>) -> Router {
    let ws_path = config.ws_path.clone();
    Router::new()
        .route("/", get(banner))
        .route(&ws_path, get(upgrade))
        .with_state(AppState { config, registry })
}

async fn banner() -> &'static str {
    BANNER
}

/// Accepts the WebSocket upgrade and hands the socket to the connection task.
///
/// The query string is percent-decoded by the `Query` extractor, so
/// `?game_id=my%20room` joins `my room`.
async fn upgrade(
    ws: WebSocketUpgrade,
    Query(params): Query<JoinParams>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    let game_id = params.session_id(&state.config.default_game_id);
    debug!("upgrading {peer_addr} into session {game_id}");

    ws.on_upgrade(move |socket| handle_client(socket, peer_addr, game_id, state.registry))
}

/// Wraps [`run_connection`] and logs the outcome.
async fn handle_client(
    socket: WebSocket,
    peer_addr: SocketAddr,
    game_id: String,
    registry: Arc<SessionRegistry>,
) {
    match run_connection(socket, peer_addr, game_id, registry).await {
        Ok(()) => debug!("client {peer_addr} done"),
        Err(e) => warn!("client {peer_addr} closed with error: {e:#}"),
    }
}

/// Resolves once `running` has been cleared.
async fn wait_for_shutdown(running: Arc<AtomicBool>) {
    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(SHUTDOWN_POLL).await;
    }
    info!("shutdown flag set; stopping listener");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
