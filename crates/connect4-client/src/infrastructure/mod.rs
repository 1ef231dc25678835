//! Infrastructure layer for the terminal client: the WebSocket connection to
//! the server and the stdin command loop.

pub mod ws_client;

pub use ws_client::{run_client, server_url};
