//! Text codec for the WebSocket protocol.
//!
//! Messages travel as JSON in WebSocket text frames.  These helpers are the
//! only place that touches `serde_json`, so both server and client agree on
//! the encoding and report failures as [`ProtocolError`].

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::protocol::messages::{ClientMessage, ServerMessage};

/// Errors that can occur while encoding or decoding a message.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The text was not valid JSON or did not match any known message.
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),

    /// A message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

fn encode<T: Serialize>(msg: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(ProtocolError::Encode)
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Malformed)
}

/// Encodes a server message into the text of a WebSocket frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
///
/// # Example
///
/// ```rust
/// use connect4_core::protocol::{encode_server_message, ServerMessage};
///
/// let text = encode_server_message(&ServerMessage::Reset).unwrap();
/// assert_eq!(text, r#"{"type":"reset"}"#);
/// ```
pub fn encode_server_message(msg: &ServerMessage) -> Result<String, ProtocolError> {
    encode(msg)
}

/// Decodes the text of a WebSocket frame sent by the server.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if the text is not a known message.
pub fn decode_server_message(text: &str) -> Result<ServerMessage, ProtocolError> {
    decode(text)
}

/// Encodes a client intent into the text of a WebSocket frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
pub fn encode_client_message(msg: &ClientMessage) -> Result<String, ProtocolError> {
    encode(msg)
}

/// Decodes the text of a WebSocket frame sent by a player.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if the text is not a known intent.
///
/// # Example
///
/// ```rust
/// use connect4_core::protocol::{decode_client_message, ClientMessage};
///
/// let msg = decode_client_message(r#"{"type":"move","column":4}"#).unwrap();
/// assert_eq!(msg, ClientMessage::Move { column: 4 });
/// ```
pub fn decode_client_message(text: &str) -> Result<ClientMessage, ProtocolError> {
    decode(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_client_message_rejects_garbage() {
        let err = decode_client_message("not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
        assert!(err.to_string().starts_with("malformed message"));
    }

    #[test]
    fn test_decode_client_message_rejects_game_full_notice() {
        assert!(decode_client_message(crate::protocol::GAME_FULL_NOTICE).is_err());
    }

    #[test]
    fn test_client_message_encoding_matches_wire_format() {
        let text = encode_client_message(&ClientMessage::PlayAgain).unwrap();
        assert_eq!(text, r#"{"type":"play_again"}"#);

        let text = encode_client_message(&ClientMessage::Move { column: 6 }).unwrap();
        assert_eq!(text, r#"{"type":"move","column":6}"#);
    }

    #[test]
    fn test_server_message_decodes_what_server_encodes() {
        let msg = ServerMessage::Init {
            player: crate::Player::One,
        };
        let text = encode_server_message(&msg).unwrap();
        assert_eq!(decode_server_message(&text).unwrap(), msg);
    }
}
