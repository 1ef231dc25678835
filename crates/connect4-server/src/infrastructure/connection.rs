//! Lifecycle of one player connection after the WebSocket upgrade.
//!
//! This module is responsible for:
//!
//! 1. Seating the connection through the [`SessionRegistry`], or telling it
//!    the game is full and closing it.
//! 2. Running two concurrent tasks per seated connection:
//!    - **inbound**: reads text frames, decodes them as [`ClientMessage`]s
//!      and submits them to the session.
//!    - **outbound**: drains the connection's delivery queue onto the socket.
//! 3. Tearing down when either task ends: disconnect handling runs exactly
//!    once, the outbound task is told to stop, and the socket is dropped.
//!
//! # Slow or silent peers
//!
//! Sessions never write to sockets; they push onto unbounded queues and
//! return.  A peer that stops reading therefore only stalls its own outbound
//! task.  That task races every write against the disconnect signal, so a
//! stalled write never outlives the connection.
//!
//! [`ClientMessage`]: connect4_core::protocol::ClientMessage

use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::ws::{Message, WebSocket};
use connect4_core::protocol::{decode_client_message, GAME_FULL_NOTICE};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::{
    ConnectionId, Departure, JoinError, OutboundReceiver, Session, SessionRegistry,
};

/// How long the outbound task waits for the closing handshake to flush.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Why the inbound task stopped reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InboundEnd {
    /// Close frame or end of stream.
    Closed,
    /// A frame that is not a valid intent.
    ProtocolViolation,
    /// The socket failed while reading.
    TransportFailed,
}

/// Why the outbound task stopped writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutboundEnd {
    /// Every sender of the delivery queue is gone.
    QueueClosed,
    /// The disconnect signal fired.
    Stopped,
    /// A write to the socket failed.
    TransportFailed,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Runs a connection from matchmaking to teardown.
///
/// # Parameters
///
/// - `ws`        – The upgraded socket.
/// - `peer_addr` – Remote address, for logs only.
/// - `game_id`   – Session to join, already defaulted by the router.
/// - `registry`  – Registry shared by every connection of the server.
///
/// # Errors
///
/// Returns an error only if the "game full" notice cannot be delivered to a
/// refused connection.  Everything after seating is logged, not returned.
pub async fn run_connection(
    mut ws: WebSocket,
    peer_addr: SocketAddr,
    game_id: String,
    registry: Arc<SessionRegistry>,
) -> anyhow::Result<()> {
    let connection_id = Uuid::new_v4();

    // ── Step 1: Matchmaking ───────────────────────────────────────────────────
    //
    // The delivery queue exists before the seat does: admission pushes `init`
    // and the current state onto it while still holding the session lock.
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

    let (session, player) = match registry.join(&game_id, connection_id, outbound_tx).await {
        Ok(seated) => seated,
        Err(e @ JoinError::Full { .. }) => {
            info!("connection {connection_id} ({peer_addr}): refused, {e}");
            ws.send(Message::Text(GAME_FULL_NOTICE.to_string().into()))
                .await
                .with_context(|| format!("failed to send game-full notice to {peer_addr}"))?;
            if let Err(e) = SinkExt::close(&mut ws).await {
                debug!("connection {connection_id} ({peer_addr}): close after refusal: {e}");
            }
            return Ok(());
        }
    };

    info!("connection {connection_id} ({peer_addr}): seated as {player} in session {game_id}");

    // ── Step 2: Active until either half stops ────────────────────────────────
    let (ws_tx, ws_rx) = ws.split();
    let departure =
        drive_connection(ws_tx, ws_rx, outbound_rx, session, registry, connection_id).await;

    // ── Step 3: Disconnected ──────────────────────────────────────────────────
    info!("connection {connection_id} ({peer_addr}): left session {game_id} ({departure:?})");
    Ok(())
}

// ── Connection tasks ──────────────────────────────────────────────────────────

/// Runs the inbound and outbound tasks of a seated connection and performs
/// disconnect handling once, whichever of them ends first.
///
/// Returns what the departure did to the session.
pub(crate) async fn drive_connection<S, St>(
    ws_tx: S,
    ws_rx: St,
    outbound: OutboundReceiver,
    session: Arc<Session>,
    registry: Arc<SessionRegistry>,
    connection_id: ConnectionId,
) -> Departure
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display,
    St: Stream<Item = Result<Message, axum::Error>> + Unpin + Send + 'static,
{
    let (stop_tx, stop_rx) = oneshot::channel();

    let mut writer = tokio::spawn(write_loop(ws_tx, outbound, stop_rx, connection_id));
    let mut reader = tokio::spawn(read_loop(ws_rx, Arc::clone(&session), connection_id));

    tokio::select! {
        ended = &mut reader => {
            match ended {
                Ok(reason) => debug!("connection {connection_id}: inbound ended ({reason:?})"),
                Err(e) => warn!("connection {connection_id}: inbound task failed: {e}"),
            }
            let departure = registry.leave(&session, connection_id).await;

            // The receiver is gone if the writer already quit on its own.
            let _ = stop_tx.send(());
            match writer.await {
                Ok(end) => debug!("connection {connection_id}: outbound ended ({end:?})"),
                Err(e) => warn!("connection {connection_id}: outbound task failed: {e}"),
            }
            departure
        }
        ended = &mut writer => {
            match ended {
                Ok(OutboundEnd::TransportFailed) => {
                    warn!("connection {connection_id}: delivery failed, disconnecting");
                }
                Ok(end) => debug!("connection {connection_id}: outbound ended ({end:?})"),
                Err(e) => warn!("connection {connection_id}: outbound task failed: {e}"),
            }
            // Nobody writes to this socket any more, so stop reading from it too.
            reader.abort();
            registry.leave(&session, connection_id).await
        }
    }
}

/// Reads frames until the peer closes, fails, or breaks the protocol.
pub(crate) async fn read_loop<St>(
    mut ws_rx: St,
    session: Arc<Session>,
    connection_id: ConnectionId,
) -> InboundEnd
where
    St: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(frame) = ws_rx.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                debug!("connection {connection_id}: read error: {e}");
                return InboundEnd::TransportFailed;
            }
        };

        match frame {
            Message::Text(text) => match decode_client_message(text.as_str()) {
                Ok(msg) => session.submit(connection_id, msg).await,
                Err(e) => {
                    warn!("connection {connection_id}: {e}");
                    return InboundEnd::ProtocolViolation;
                }
            },
            Message::Binary(_) => {
                warn!("connection {connection_id}: binary frames are not part of the protocol");
                return InboundEnd::ProtocolViolation;
            }
            Message::Close(_) => return InboundEnd::Closed,
            // The WebSocket layer answers pings itself.
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
    InboundEnd::Closed
}

/// Writes queued payloads to the socket until the queue closes, a write
/// fails, or `stop` fires.
///
/// `stop` is also raced against each write, so a peer that stopped reading
/// cannot hold the task open.  On a clean stop the closing handshake gets
/// [`CLOSE_GRACE`] to complete; the socket is dropped either way.
pub(crate) async fn write_loop<S>(
    mut ws_tx: S,
    mut queue: OutboundReceiver,
    mut stop: oneshot::Receiver<()>,
    connection_id: ConnectionId,
) -> OutboundEnd
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let end = loop {
        let payload = tokio::select! {
            item = queue.recv() => match item {
                Some(payload) => payload,
                None => break OutboundEnd::QueueClosed,
            },
            _ = &mut stop => break OutboundEnd::Stopped,
        };

        tokio::select! {
            sent = ws_tx.send(Message::Text(payload.to_string().into())) => {
                if let Err(e) = sent {
                    debug!("connection {connection_id}: write error: {e}");
                    return OutboundEnd::TransportFailed;
                }
            }
            _ = &mut stop => {
                debug!("connection {connection_id}: disconnected with a write in flight");
                break OutboundEnd::Stopped;
            }
        }
    };

    match timeout(CLOSE_GRACE, ws_tx.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("connection {connection_id}: close error: {e}"),
        Err(_) => debug!("connection {connection_id}: peer did not take the close frame"),
    }
    end
}

// ── Tests ─────────────────────────────────────────────────────────────────────
