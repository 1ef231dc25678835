//! Connect 4 game server: entry point.
//!
//! Hosts any number of two-player Connect 4 sessions over WebSocket.  Clients
//! connect to `ws://HOST:PORT/ws?game_id=NAME`; the first two connections to a
//! name play each other, a third is told the game is full.
//!
//! # Usage
//!
//! ```text
//! connect4-server [OPTIONS]
//!
//! Options:
//!   --bind <IP>            Address to listen on [default: 0.0.0.0]
//!   --port <PORT>          Port to listen on [default: 8080]
//!   --ws-path <PATH>       WebSocket endpoint path [default: /ws]
//!   --default-game <ID>    Session for clients without game_id [default: game-1]
//!   --config <FILE>        Optional TOML config file
//! ```
//!
//! Every flag can also be given as a `CONNECT4_*` environment variable.
//! Precedence is flags / environment, then the config file, then defaults.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use connect4_server::domain::ServerConfig;
use connect4_server::infrastructure::{run_server, ConfigFile};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Multiplayer Connect 4 server.
///
/// Options left unset fall back to the config file, then to built-in defaults.
#[derive(Debug, Parser)]
#[command(
    name = "connect4-server",
    about = "WebSocket server for two-player Connect 4 sessions",
    version
)]
struct Cli {
    /// IP address to listen on.
    #[arg(long, env = "CONNECT4_BIND")]
    bind: Option<IpAddr>,

    /// TCP port to listen on.  `0` picks a free port.
    #[arg(long, env = "CONNECT4_PORT")]
    port: Option<u16>,

    /// Request path upgraded to a WebSocket.
    #[arg(long, env = "CONNECT4_WS_PATH")]
    ws_path: Option<String>,

    /// Session joined by clients that do not send a `game_id`.
    #[arg(long, env = "CONNECT4_DEFAULT_GAME")]
    default_game: Option<String>,

    /// TOML config file with a `[server]` table.
    #[arg(long, env = "CONNECT4_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Merges defaults, the config file and the command line into a
    /// [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or the merged
    /// settings are invalid.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let mut config = ServerConfig::default();

        if let Some(path) = &self.config {
            ConfigFile::load(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?
                .apply(&mut config);
        }

        let ip = self.bind.unwrap_or(config.bind_addr.ip());
        let port = self.port.unwrap_or(config.bind_addr.port());
        config.bind_addr = SocketAddr::new(ip, port);
        if let Some(ws_path) = self.ws_path {
            config.ws_path = ws_path;
        }
        if let Some(game) = self.default_game {
            config.default_game_id = game;
        }

        config.validate().context("invalid server configuration")?;
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_server_config()?;

    info!(
        "Connect 4 server starting: bind={}, ws_path={}, default_game={}",
        config.bind_addr, config.ws_path, config.default_game_id
    );

    // Cleared by Ctrl+C; the server polls it every 200 ms.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, running).await?;

    info!("Connect 4 server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("connect4-server").chain(args.iter().copied()))
    }

    #[test]
    fn test_into_server_config_without_flags_is_default() {
        let cli = Cli {
            bind: None,
            port: None,
            ws_path: None,
            default_game: None,
            config: None,
        };
        assert_eq!(cli.into_server_config().unwrap(), ServerConfig::default());
    }

    #[test]
    fn test_cli_port_override() {
        let cli = cli(&["--port", "9999"]);
        assert_eq!(cli.port, Some(9999));
    }

    #[test]
    fn test_cli_bind_must_be_an_ip() {
        assert!(Cli::try_parse_from(["connect4-server", "--bind", "not.an.ip"]).is_err());
    }

    #[test]
    fn test_into_server_config_applies_flags() {
        // Arrange
        let cli = cli(&[
            "--bind",
            "127.0.0.1",
            "--port",
            "9100",
            "--ws-path",
            "/play",
            "--default-game",
            "lobby",
        ]);

        // Act
        let config = cli.into_server_config().unwrap();

        // Assert
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9100");
        assert_eq!(config.ws_path, "/play");
        assert_eq!(config.default_game_id, "lobby");
    }

    #[test]
    fn test_flags_override_config_file() {
        // Arrange: the file sets port and game, the CLI overrides the port only.
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 7000\ndefault_game = \"from-file\"").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let cli = cli(&["--config", &path, "--port", "7100"]);

        // Act
        let config = cli.into_server_config().unwrap();

        // Assert
        assert_eq!(config.bind_addr.port(), 7100);
        assert_eq!(config.default_game_id, "from-file");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = cli(&["--config", "/definitely/not/here.toml"]);
        assert!(cli.into_server_config().is_err());
    }

    #[test]
    fn test_invalid_ws_path_is_rejected() {
        let cli = cli(&["--ws-path", "ws"]);
        assert!(cli.into_server_config().is_err());
    }
}
