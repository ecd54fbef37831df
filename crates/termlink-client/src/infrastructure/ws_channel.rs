//! WebSocket persistent channel.
//!
//! [`WsChannel`] is a cheap handle; a background task owns the socket:
//!
//! ```text
//!            ┌──────────── reconnect_delay ◄───────────┐
//!            ▼                                         │
//! Connecting ──connect ok──► Connected ──socket drops──┘
//!     │                          │
//!     └──connect failed──► Disconnected ──reconnect_delay──► Connecting
//! ```
//!
//! The task publishes every transition through a `watch` channel, so
//! [`PersistentChannel::state`] is a plain read.  Outbound payloads go
//! through a bounded queue; [`PersistentChannel::try_send`] never waits, and
//! a full queue counts as "not taken" so the caller falls back.
//!
//! Frames still queued when the socket drops are discarded.  Dropping the
//! handle closes the socket and ends the task.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use termlink_core::{ChannelState, SessionId};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        handshake::client::Request,
        http::{header::AUTHORIZATION, HeaderValue},
        error::UrlError,
        Error as WsError, Message,
    },
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, info, warn};

use crate::application::delivery::PersistentChannel;
use crate::domain::config::EndpointConfig;
use crate::infrastructure::auth::AuthHeaderProvider;
use crate::infrastructure::endpoint::session_endpoint;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WsChannel {
    state: watch::Receiver<ChannelState>,
    outbound: mpsc::Sender<String>,
}

impl WsChannel {
    /// Spawns the connection task for `session` and returns immediately,
    /// in the `Connecting` state.  Must be called from within a Tokio
    /// runtime.
    pub fn connect(
        config: &EndpointConfig,
        session: &SessionId,
        auth: Arc<dyn AuthHeaderProvider>,
    ) -> Self {
        let (state_tx, state) = watch::channel(ChannelState::Connecting);
        // A zero capacity panics in mpsc::channel; validation rejects it,
        // but a hand-built config may not have been validated.
        let (outbound, outbound_rx) = mpsc::channel(config.outbound_buffer.max(1));

        let target = Target {
            base_url: config.ws_base_url.clone(),
            session: session.clone(),
            auth,
            reconnect_delay: config.reconnect_delay(),
        };
        tokio::spawn(run_connection(target, state_tx, outbound_rx));

        Self { state, outbound }
    }

    /// A receiver that sees every state change.
    pub fn subscribe(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }
}

impl PersistentChannel for WsChannel {
    fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    fn try_send(&self, payload: &str) -> bool {
        if self.state() != ChannelState::Connected {
            return false;
        }
        match self.outbound.try_send(payload.to_owned()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("persistent channel queue full; caller will fall back");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

// ── Connection task ───────────────────────────────────────────────────────────

struct Target {
    base_url: String,
    session: SessionId,
    auth: Arc<dyn AuthHeaderProvider>,
    reconnect_delay: Duration,
}

impl Target {
    fn request(&self) -> Result<Request, WsError> {
        let url = session_endpoint(&self.base_url, &self.session, "stream")
            .map_err(|e| WsError::Url(UrlError::UnableToConnect(e.to_string())))?;
        let mut request = url.as_str().into_client_request()?;
        if let Some(value) = self.auth.authorization() {
            let value = HeaderValue::from_str(&value).map_err(|e| WsError::HttpFormat(e.into()))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Ok(request)
    }
}

/// Why [`pump`] returned.
#[derive(Debug, PartialEq)]
enum PumpEnd {
    /// The socket closed or failed; reconnect.
    SocketLost,
    /// Every [`WsChannel`] handle is gone; stop.
    HandleDropped,
}

async fn run_connection(
    target: Target,
    state_tx: watch::Sender<ChannelState>,
    mut outbound: mpsc::Receiver<String>,
) {
    let session = target.session.as_str().to_owned();

    loop {
        state_tx.send_replace(ChannelState::Connecting);

        let request = match target.request() {
            Ok(request) => request,
            Err(e) => {
                // Nothing about the URL or header will change on retry.
                error!(%session, "cannot build persistent channel request: {e}");
                state_tx.send_replace(ChannelState::Disconnected);
                return;
            }
        };

        let attempt = tokio::select! {
            result = connect_async(request) => result,
            _ = state_tx.closed() => return,
        };

        match attempt {
            Ok((ws, _response)) => {
                info!(%session, "persistent channel connected");
                state_tx.send_replace(ChannelState::Connected);

                let end = pump(ws, &mut outbound).await;
                state_tx.send_replace(ChannelState::Disconnected);

                let discarded = drain(&mut outbound);
                if discarded > 0 {
                    warn!(%session, discarded, "dropped frames queued on a lost channel");
                }
                if end == PumpEnd::HandleDropped {
                    debug!(%session, "persistent channel handle dropped; closing");
                    return;
                }
                info!(
                    %session,
                    "persistent channel lost; reconnecting in {:?}", target.reconnect_delay
                );
            }
            Err(e) => {
                state_tx.send_replace(ChannelState::Disconnected);
                warn!(%session, "could not open persistent channel: {e}");
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(target.reconnect_delay) => {}
            _ = state_tx.closed() => return,
        }
    }
}

/// Moves queued payloads onto the socket until either side goes away.
///
/// Inbound frames carry terminal output, which another component renders;
/// here they only tell us the socket is alive.
async fn pump(ws: WsStream, outbound: &mut mpsc::Receiver<String>) -> PumpEnd {
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(payload) => {
                    if let Err(e) = sink.send(Message::Text(payload)).await {
                        warn!("persistent channel send failed: {e}");
                        return PumpEnd::SocketLost;
                    }
                }
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    return PumpEnd::HandleDropped;
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "server closed persistent channel");
                    return PumpEnd::SocketLost;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("persistent channel read failed: {e}");
                    return PumpEnd::SocketLost;
                }
                None => return PumpEnd::SocketLost,
            },
        }
    }
}

fn drain(outbound: &mut mpsc::Receiver<String>) -> usize {
    let mut discarded = 0;
    while outbound.try_recv().is_ok() {
        discarded += 1;
    }
    discarded
}

// ── Tests ─────────────────────────────────────────────────────────────────────
