//! Protocol module containing message types and the JSON text codec.

pub mod codec;
pub mod messages;

pub use codec::{
    decode_client_message, decode_server_message, encode_client_message, encode_server_message,
    ProtocolError,
};
pub use messages::*;
