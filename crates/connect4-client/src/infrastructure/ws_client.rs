//! WebSocket connection to the game server.
//!
//! A single task selects between frames from the server and lines from
//! stdin.  Server messages are folded into a [`GameView`] and printed; typed
//! commands are checked against the view and sent as intents.

use anyhow::Context;
use connect4_core::protocol::{
    decode_server_message, encode_client_message, ClientMessage, GAME_FULL_NOTICE,
};
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::application::{parse_command, Command, CommandError, GameView};

/// Builds the connection URL, adding `game_id` when a session is named.
///
/// # Errors
///
/// Returns an error if `base` is not a valid URL.
pub fn server_url(base: &str, game: Option<&str>) -> anyhow::Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("invalid server URL: {base:?}"))?;
    if let Some(game) = game {
        url.query_pairs_mut().append_pair("game_id", game);
    }
    Ok(url)
}

/// Plays until the server closes the connection, stdin ends, or the user quits.
///
/// # Errors
///
/// Returns an error if the connection cannot be opened or fails mid-game.
pub async fn run_client(url: Url) -> anyhow::Result<()> {
    let (ws, _) = connect_async(url.as_str())
        .await
        .with_context(|| format!("failed to connect to {url}"))?;
    info!("connected to {url}");
    println!("Connecting to game...");

    let (mut ws_tx, mut ws_rx) = ws.split();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut view = GameView::new();

    loop {
        tokio::select! {
            frame = ws_rx.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    if text == GAME_FULL_NOTICE {
                        println!("{GAME_FULL_NOTICE}");
                        return Ok(());
                    }
                    match decode_server_message(&text) {
                        Ok(msg) => println!("{}", view.apply(msg)),
                        Err(e) => warn!("ignoring message from server: {e}"),
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    println!("Disconnected from server");
                    return Ok(());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("connection to server failed"),
            },
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    debug!("stdin closed");
                    break;
                };
                match parse_command(&line) {
                    Ok(Command::Move(column)) => match view.check_move() {
                        Ok(()) => send(&mut ws_tx, &ClientMessage::Move { column }).await?,
                        Err(blocked) => println!("{}", blocked.hint()),
                    },
                    Ok(Command::PlayAgain) => {
                        view.mark_voted();
                        send(&mut ws_tx, &ClientMessage::PlayAgain).await?;
                        println!("Waiting for your opponent...");
                    }
                    Ok(Command::Quit) => break,
                    Err(CommandError::Empty) => {}
                    Err(e) => println!("{e}"),
                }
            }
        }
    }

    if let Err(e) = ws_tx.close().await {
        debug!("close error: {e}");
    }
    Ok(())
}

async fn send<S>(ws_tx: &mut S, msg: &ClientMessage) -> anyhow::Result<()>
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
{
    let text = encode_client_message(msg)?;
    ws_tx
        .send(WsMessage::Text(text))
        .await
        .context("failed to send to server")
}
