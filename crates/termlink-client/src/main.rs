//! termlink-type: types stdin into a remote terminal session.
//!
//! Each line read from stdin is delivered as `Text(line)` followed by
//! `Key(enter)`, through the same WebSocket-first, HTTP-fallback delivery
//! the interactive input path uses.  Handy for scripted sessions and for
//! checking a deployment's input endpoints end to end.
//!
//! # Usage
//!
//! ```text
//! termlink-type --session <ID> [OPTIONS]
//!
//! Options:
//!   --session  <ID>    Session to type into
//!   --config   <PATH>  TOML config file [default: termlink.toml]
//!   --ws-url   <URL>   Override endpoints.ws_base_url
//!   --http-url <URL>   Override endpoints.http_base_url
//!   --token    <TOK>   Bearer token for both transports
//!   --no-enter         Do not press Enter after each line
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable            | Flag         |
//! |---------------------|--------------|
//! | `TERMLINK_SESSION`  | `--session`  |
//! | `TERMLINK_CONFIG`   | `--config`   |
//! | `TERMLINK_WS_URL`   | `--ws-url`   |
//! | `TERMLINK_HTTP_URL` | `--http-url` |
//! | `TERMLINK_TOKEN`    | `--token`    |
//!
//! The program exits when stdin closes, when the remote session exits, or
//! on Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use termlink_client::application::{DeliveryOutcome, DualTransportDelivery, UiNotifier};
use termlink_client::domain::{ClientConfig, SessionHandle};
use termlink_client::infrastructure::{
    AuthHeaderProvider, BearerToken, HttpFallback, NoAuth, WsChannel,
};
use termlink_core::{ChannelState, ResolvedInput, Session, SessionId, SpecialKeyToken};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Types stdin into a remote terminal session.
#[derive(Debug, Parser)]
#[command(
    name = "termlink-type",
    about = "Type stdin into a remote terminal session over WebSocket with HTTP fallback",
    version
)]
struct Cli {
    /// Id of the session to type into.
    #[arg(long, env = "TERMLINK_SESSION")]
    session: String,

    /// Path to the TOML config file.  A missing file means all defaults.
    #[arg(long, default_value = "termlink.toml", env = "TERMLINK_CONFIG")]
    config: PathBuf,

    /// Overrides `endpoints.ws_base_url` from the config file.
    #[arg(long, env = "TERMLINK_WS_URL")]
    ws_url: Option<String>,

    /// Overrides `endpoints.http_base_url` from the config file.
    #[arg(long, env = "TERMLINK_HTTP_URL")]
    http_url: Option<String>,

    /// Bearer token sent on the WebSocket upgrade and every fallback call.
    #[arg(long, env = "TERMLINK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Do not press Enter after each line.
    #[arg(long)]
    no_enter: bool,
}

impl Cli {
    /// Loads the config file and applies the command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// result fails validation.
    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = ClientConfig::load(&self.config)
            .with_context(|| format!("failed to load config from {}", self.config.display()))?;

        if let Some(url) = &self.ws_url {
            config.endpoints.ws_base_url = url.clone();
        }
        if let Some(url) = &self.http_url {
            config.endpoints.http_base_url = url.clone();
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    fn auth(&self) -> Arc<dyn AuthHeaderProvider> {
        match &self.token {
            Some(token) => Arc::new(BearerToken::new(token.clone())),
            None => Arc::new(NoAuth),
        }
    }
}

// ── UI notifier ───────────────────────────────────────────────────────────────

/// There is no view to refresh; a refresh request means the session is
/// gone, so wake the main loop.
#[derive(Default)]
struct ExitSignal {
    exited: Notify,
}

impl UiNotifier for ExitSignal {
    fn request_refresh(&self) {
        self.exited.notify_one();
    }

    fn capture_toggled(&self, active: bool) {
        info!(active, "input capture toggled");
    }
}

/// The inputs one stdin line turns into.
fn line_inputs(line: &str, press_enter: bool) -> Vec<ResolvedInput> {
    let mut inputs: Vec<ResolvedInput> = ResolvedInput::text(line).into_iter().collect();
    if press_enter {
        inputs.push(ResolvedInput::Key(SpecialKeyToken::Enter));
    }
    inputs
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `RUST_LOG` controls verbosity; default to `info`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.client_config()?;
    let auth = cli.auth();
    let session_id = SessionId::new(cli.session.clone());

    info!(
        session = %session_id,
        ws = %config.endpoints.ws_base_url,
        http = %config.endpoints.http_base_url,
        "termlink-type starting"
    );

    let handle = SessionHandle::new(Session::new(session_id.clone()));
    let channel = Arc::new(WsChannel::connect(
        &config.endpoints,
        &session_id,
        Arc::clone(&auth),
    ));
    let fallback = Arc::new(
        HttpFallback::new(&config.endpoints, auth).context("failed to set up fallback transport")?,
    );
    let exit = Arc::new(ExitSignal::default());

    // The session counts as active once the persistent channel first opens.
    let mut channel_state = channel.subscribe();
    let activating = handle.clone();
    tokio::spawn(async move {
        if channel_state
            .wait_for(|s| *s == ChannelState::Connected)
            .await
            .is_ok()
            && activating.activate()
        {
            info!("session active");
        }
    });

    let delivery = DualTransportDelivery::new(handle.clone(), channel, fallback, exit.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    info!("stdin closed");
                    break;
                };
                // Sequential sends keep the remote side in typing order.
                for input in line_inputs(&line, !cli.no_enter) {
                    if let DeliveryOutcome::Dropped(e) = delivery.send(&input).await {
                        warn!("{} not delivered: {e}", input.describe());
                    }
                }
            }
            _ = exit.exited.notified() => {
                warn!("remote session exited");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C");
                break;
            }
        }
    }

    handle.release();
    info!("termlink-type stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_only_session() {
        // Arrange / Act
        let cli = Cli::parse_from(["termlink-type", "--session", "s-1"]);

        // Assert
        assert_eq!(cli.session, "s-1");
        assert_eq!(cli.config, PathBuf::from("termlink.toml"));
        assert_eq!(cli.ws_url, None);
        assert!(!cli.no_enter);
    }

    #[test]
    fn test_cli_missing_session_is_error() {
        let result = Cli::try_parse_from(["termlink-type"]);
        // Only an error when TERMLINK_SESSION is not set in the test env.
        if std::env::var_os("TERMLINK_SESSION").is_none() {
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_cli_url_overrides_apply_to_config() {
        // Arrange
        let cli = Cli::parse_from([
            "termlink-type",
            "--session",
            "s-1",
            "--config",
            "/nonexistent/termlink.toml",
            "--ws-url",
            "wss://term.example.com",
            "--http-url",
            "https://term.example.com/api",
        ]);

        // Act
        let config = cli.client_config().unwrap();

        // Assert
        assert_eq!(config.endpoints.ws_base_url, "wss://term.example.com");
        assert_eq!(config.endpoints.http_base_url, "https://term.example.com/api");
    }

    #[test]
    fn test_cli_invalid_override_fails_validation() {
        let cli = Cli::parse_from([
            "termlink-type",
            "--session",
            "s-1",
            "--config",
            "/nonexistent/termlink.toml",
            "--ws-url",
            "http://wrong-scheme",
        ]);
        assert!(cli.client_config().is_err());
    }

    #[test]
    fn test_token_selects_bearer_auth() {
        let with = Cli::parse_from(["termlink-type", "--session", "s", "--token", "t0k"]);
        let without = Cli::parse_from(["termlink-type", "--session", "s"]);

        if std::env::var_os("TERMLINK_TOKEN").is_none() {
            assert_eq!(without.auth().authorization(), None);
        }
        assert_eq!(with.auth().authorization().as_deref(), Some("Bearer t0k"));
    }

    #[test]
    fn test_line_becomes_text_then_enter() {
        assert_eq!(
            line_inputs("ls -la", true),
            vec![
                ResolvedInput::Text("ls -la".to_string()),
                ResolvedInput::Key(SpecialKeyToken::Enter),
            ]
        );
    }

    #[test]
    fn test_empty_line_is_just_enter() {
        assert_eq!(
            line_inputs("", true),
            vec![ResolvedInput::Key(SpecialKeyToken::Enter)]
        );
    }

    #[test]
    fn test_no_enter_sends_text_only() {
        assert_eq!(
            line_inputs("echo", false),
            vec![ResolvedInput::Text("echo".to_string())]
        );
    }

    #[tokio::test]
    async fn test_exit_signal_wakes_waiter_after_the_fact() {
        // Arrange
        let signal = ExitSignal::default();

        // Act: the refresh lands before anyone waits
        signal.request_refresh();

        // Assert: the stored permit is picked up
        tokio::time::timeout(std::time::Duration::from_secs(1), signal.exited.notified())
            .await
            .unwrap();
    }
}
