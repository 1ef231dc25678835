//! Connect 4 terminal client: entry point.
//!
//! ```text
//! connect4-client [--url ws://HOST:PORT/ws] [--game NAME]
//! ```
//!
//! Type a column number (1-7) to drop a piece, `again` to vote for a rematch
//! and `quit` to leave.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use connect4_client::infrastructure::{run_client, server_url};

/// Terminal client for the Connect 4 server.
#[derive(Debug, Parser)]
#[command(
    name = "connect4-client",
    about = "Play Connect 4 against another client from the terminal",
    version
)]
struct Cli {
    /// WebSocket URL of the server.
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws", env = "CONNECT4_URL")]
    url: String,

    /// Session to join.  Without it the server picks its default game.
    #[arg(long)]
    game: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Board output goes to stdout; logs go to stderr and are quiet by default.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let url = server_url(&cli.url, cli.game.as_deref())?;
    run_client(url).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["connect4-client"]);
        assert!(cli.url.starts_with("ws://"));
        assert_eq!(cli.game, None);
    }

    #[test]
    fn test_cli_game_override() {
        let cli = Cli::parse_from(["connect4-client", "--game", "lobby"]);
        assert_eq!(cli.game.as_deref(), Some("lobby"));
    }
}
