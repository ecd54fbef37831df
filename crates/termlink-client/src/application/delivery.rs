//! Dual-transport delivery.
//!
//! Every [`ResolvedInput`] goes out over exactly one transport:
//!
//! ```text
//! session exited or released? ──yes──► no-op
//!        │ no
//! persistent channel connected and accepts? ──yes──► done
//!        │ no
//! one fallback call with the same payload
//!        │
//!        ├─ 2xx ──────────────────► done
//!        ├─ 4xx invalid_input ────► dropped, session untouched
//!        ├─ other 4xx ────────────► session exited, one UI refresh
//!        └─ anything else ────────► dropped, logged
//! ```
//!
//! Nothing is retried and nothing propagates to the caller as a hard error;
//! [`DualTransportDelivery::send`] reports what happened as a
//! [`DeliveryOutcome`] for logging and for the position refresher.
//!
//! The payload is encoded once, so both transports carry byte-identical JSON.

use std::sync::Arc;

use async_trait::async_trait;
use termlink_core::{
    encode_input,
    protocol::{classify_fallback_response, FallbackVerdict},
    ChannelState, ProtocolError, ResolvedInput, SessionId,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::SessionHandle;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why an input did not take the primary path, or did not arrive at all.
#[derive(Debug, Error, PartialEq)]
pub enum DeliveryError {
    /// The persistent channel was not connected or refused the payload.
    /// Handled by falling back; never surfaced to the user.
    #[error("persistent channel unavailable (state: {0:?})")]
    TransportUnavailable(ChannelState),

    /// The fallback endpoint definitively rejected the session.
    #[error("session exited (fallback status {status})")]
    SessionExited { status: u16 },

    /// The fallback endpoint rejected this payload but not the session.
    #[error("input rejected by fallback endpoint (status {status})")]
    InvalidInput { status: u16 },

    /// Any other fallback failure: 5xx, I/O error, timeout.
    #[error("transient delivery failure: {0}")]
    TransientDeliveryFailure(String),

    /// The input could not be encoded.
    #[error("could not encode input: {0}")]
    Encode(#[from] ProtocolError),
}

/// Errors from a fallback transport implementation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    #[error("fallback request timed out")]
    Timeout,
    #[error("fallback request failed: {0}")]
    Request(String),
}

// ── Transport seams ───────────────────────────────────────────────────────────

/// The long-lived primary transport.
#[cfg_attr(test, mockall::automock)]
pub trait PersistentChannel: Send + Sync {
    fn state(&self) -> ChannelState;

    /// Hands an encoded payload to the channel.  `false` means it was not
    /// taken, and the caller falls back.
    fn try_send(&self, payload: &str) -> bool;
}

/// Raw response of a fallback call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackResponse {
    pub status: u16,
    pub body: String,
}

/// The request/response fallback transport.
#[async_trait]
pub trait FallbackTransport: Send + Sync {
    /// Posts one encoded payload to the session's input endpoint.
    async fn post_input(
        &self,
        session: &SessionId,
        payload: &str,
    ) -> Result<FallbackResponse, TransportError>;
}

/// Signals raised towards the hosting view.
pub trait UiNotifier: Send + Sync {
    /// The session has exited; the view should re-render its state.
    fn request_refresh(&self);

    /// Local capture was toggled by a double Escape.
    fn capture_toggled(&self, active: bool);
}

// ── Delivery ──────────────────────────────────────────────────────────────────

/// What happened to one input.
#[derive(Debug, PartialEq)]
pub enum DeliveryOutcome {
    /// Taken by the persistent channel.
    Persistent,
    /// Accepted by the fallback endpoint.
    Fallback,
    /// The session was exited or released before sending.
    Skipped,
    /// Not delivered.
    Dropped(DeliveryError),
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Persistent | Self::Fallback)
    }
}

pub struct DualTransportDelivery {
    session: SessionHandle,
    channel: Arc<dyn PersistentChannel>,
    fallback: Arc<dyn FallbackTransport>,
    notifier: Arc<dyn UiNotifier>,
}

impl DualTransportDelivery {
    pub fn new(
        session: SessionHandle,
        channel: Arc<dyn PersistentChannel>,
        fallback: Arc<dyn FallbackTransport>,
        notifier: Arc<dyn UiNotifier>,
    ) -> Self {
        Self {
            session,
            channel,
            fallback,
            notifier,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Delivers one input.  Never fails; see the module docs for the paths.
    pub async fn send(&self, input: &ResolvedInput) -> DeliveryOutcome {
        let session_id = match self.session.id() {
            Some(id) if self.session.accepts_input() => id,
            _ => {
                debug!(input = %input.describe(), "session closed; input not sent");
                return DeliveryOutcome::Skipped;
            }
        };

        let payload = match encode_input(input) {
            Ok(p) => p,
            Err(e) => {
                warn!(session = %session_id, "dropping input: {e}");
                return DeliveryOutcome::Dropped(e.into());
            }
        };

        let state = self.channel.state();
        if state == ChannelState::Connected && self.channel.try_send(&payload) {
            debug!(session = %session_id, input = %input.describe(), "sent over persistent channel");
            return DeliveryOutcome::Persistent;
        }
        debug!(
            session = %session_id,
            reason = %DeliveryError::TransportUnavailable(state),
            "using fallback"
        );

        match self.post_fallback(&session_id, &payload).await {
            Ok(()) => {
                debug!(session = %session_id, input = %input.describe(), "sent over fallback");
                DeliveryOutcome::Fallback
            }
            Err(e) => DeliveryOutcome::Dropped(e),
        }
    }

    async fn post_fallback(&self, session_id: &SessionId, payload: &str) -> Result<(), DeliveryError> {
        let response = self
            .fallback
            .post_input(session_id, payload)
            .await
            .map_err(|e| {
                warn!(session = %session_id, "input dropped: {e}");
                DeliveryError::TransientDeliveryFailure(e.to_string())
            })?;

        let status = response.status;
        match classify_fallback_response(status, &response.body) {
            FallbackVerdict::Accepted => Ok(()),
            FallbackVerdict::SessionExited => {
                if self.session.mark_exited() {
                    info!(session = %session_id, status, "session exited; requesting UI refresh");
                    self.notifier.request_refresh();
                }
                Err(DeliveryError::SessionExited { status })
            }
            FallbackVerdict::InvalidInput => {
                warn!(session = %session_id, status, "input rejected by endpoint; dropped");
                Err(DeliveryError::InvalidInput { status })
            }
            FallbackVerdict::Transient => {
                warn!(session = %session_id, status, "fallback call failed; input dropped");
                Err(DeliveryError::TransientDeliveryFailure(format!(
                    "unexpected status {status}"
                )))
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use termlink_core::{Session, SessionStatus, SpecialKeyToken};

    /// Fallback transport that records every call and replays a fixed reply.
    struct RecordingFallback {
        calls: Mutex<Vec<(SessionId, String)>>,
        reply: Result<FallbackResponse, TransportError>,
    }

    impl RecordingFallback {
        fn replying(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply: Ok(FallbackResponse {
                    status,
                    body: body.to_string(),
                }),
            })
        }

        fn failing(err: TransportError) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply: Err(err),
            })
        }

        fn payloads(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
        }
    }

    #[async_trait]
    impl FallbackTransport for RecordingFallback {
        async fn post_input(
            &self,
            session: &SessionId,
            payload: &str,
        ) -> Result<FallbackResponse, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((session.clone(), payload.to_string()));
            // Let other in-flight sends reach this point too.
            tokio::task::yield_now().await;
            self.reply.clone()
        }
    }

    #[derive(Default)]
    struct CountingNotifier {
        refreshes: AtomicUsize,
    }

    impl UiNotifier for CountingNotifier {
        fn request_refresh(&self) {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
        }

        fn capture_toggled(&self, _active: bool) {}
    }

    fn active_session() -> SessionHandle {
        let h = SessionHandle::new(Session::new(SessionId::new("abc")));
        h.activate();
        h
    }

    fn disconnected_channel() -> MockPersistentChannel {
        let mut ch = MockPersistentChannel::new();
        ch.expect_state().return_const(ChannelState::Disconnected);
        ch.expect_try_send().never();
        ch
    }

    fn delivery(
        session: SessionHandle,
        channel: MockPersistentChannel,
        fallback: Arc<RecordingFallback>,
        notifier: Arc<CountingNotifier>,
    ) -> DualTransportDelivery {
        DualTransportDelivery::new(session, Arc::new(channel), fallback, notifier)
    }

    #[tokio::test]
    async fn test_connected_channel_accepting_means_zero_fallback_calls() {
        // Arrange
        let mut ch = MockPersistentChannel::new();
        ch.expect_state().return_const(ChannelState::Connected);
        ch.expect_try_send()
            .withf(|p| p == r#"{"text":"\u0001"}"#)
            .times(1)
            .return_const(true);
        let fallback = RecordingFallback::replying(200, "");
        let d = delivery(active_session(), ch, Arc::clone(&fallback), Arc::default());

        // Act
        let out = d.send(&ResolvedInput::Text("\u{1}".to_string())).await;

        // Assert
        assert_eq!(out, DeliveryOutcome::Persistent);
        assert!(fallback.payloads().is_empty());
    }

    #[tokio::test]
    async fn test_channel_refusal_means_one_fallback_with_identical_payload() {
        // Arrange
        let sent = Arc::new(Mutex::new(String::new()));
        let sent_clone = Arc::clone(&sent);
        let mut ch = MockPersistentChannel::new();
        ch.expect_state().return_const(ChannelState::Connected);
        ch.expect_try_send().times(1).returning(move |p| {
            *sent_clone.lock().unwrap() = p.to_string();
            false
        });
        let fallback = RecordingFallback::replying(204, "");
        let d = delivery(active_session(), ch, Arc::clone(&fallback), Arc::default());

        // Act
        let out = d.send(&ResolvedInput::Key(SpecialKeyToken::ShiftTab)).await;

        // Assert
        assert_eq!(out, DeliveryOutcome::Fallback);
        assert_eq!(fallback.payloads(), vec![sent.lock().unwrap().clone()]);
        assert_eq!(fallback.payloads()[0], r#"{"key":"shift_tab"}"#);
    }

    #[tokio::test]
    async fn test_disconnected_channel_goes_straight_to_fallback() {
        let fallback = RecordingFallback::replying(200, "");
        let d = delivery(
            active_session(),
            disconnected_channel(),
            Arc::clone(&fallback),
            Arc::default(),
        );

        let out = d.send(&ResolvedInput::Text("ls".to_string())).await;

        assert_eq!(out, DeliveryOutcome::Fallback);
        assert_eq!(fallback.calls.lock().unwrap()[0].0, SessionId::new("abc"));
    }

    #[tokio::test]
    async fn test_400_exits_session_and_refreshes_once() {
        // Arrange
        let session = active_session();
        let fallback = RecordingFallback::replying(400, "");
        let notifier = Arc::new(CountingNotifier::default());
        let d = delivery(
            session.clone(),
            disconnected_channel(),
            Arc::clone(&fallback),
            Arc::clone(&notifier),
        );

        // Act
        let first = d.send(&ResolvedInput::Key(SpecialKeyToken::Enter)).await;
        let second = d.send(&ResolvedInput::Key(SpecialKeyToken::Enter)).await;

        // Assert
        assert_eq!(first, DeliveryOutcome::Dropped(DeliveryError::SessionExited { status: 400 }));
        assert_eq!(second, DeliveryOutcome::Skipped);
        assert_eq!(session.status(), Some(SessionStatus::Exited));
        assert_eq!(notifier.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(fallback.payloads().len(), 1, "no call after exit");
    }

    #[tokio::test]
    async fn test_concurrent_rejections_refresh_once() {
        // Two calls in flight when the session ends both come back 4xx.
        let session = active_session();
        let fallback = RecordingFallback::replying(404, "");
        let notifier = Arc::new(CountingNotifier::default());
        let d = delivery(
            session,
            disconnected_channel(),
            Arc::clone(&fallback),
            Arc::clone(&notifier),
        );

        let a = ResolvedInput::Text("a".to_string());
        let b = ResolvedInput::Text("b".to_string());
        let (ra, rb) = tokio::join!(d.send(&a), d.send(&b));

        assert_eq!(fallback.payloads().len(), 2, "both calls were in flight");
        assert_eq!(ra, DeliveryOutcome::Dropped(DeliveryError::SessionExited { status: 404 }));
        assert_eq!(rb, DeliveryOutcome::Dropped(DeliveryError::SessionExited { status: 404 }));
        assert_eq!(notifier.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_body_keeps_session_active() {
        let session = active_session();
        let notifier = Arc::new(CountingNotifier::default());
        let d = delivery(
            session.clone(),
            disconnected_channel(),
            RecordingFallback::replying(400, r#"{"error":"invalid_input"}"#),
            Arc::clone(&notifier),
        );

        let out = d.send(&ResolvedInput::Text("x".to_string())).await;

        assert_eq!(out, DeliveryOutcome::Dropped(DeliveryError::InvalidInput { status: 400 }));
        assert_eq!(session.status(), Some(SessionStatus::Active));
        assert_eq!(notifier.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_5xx_is_transient_and_not_retried() {
        let session = active_session();
        let fallback = RecordingFallback::replying(503, "busy");
        let d = delivery(
            session.clone(),
            disconnected_channel(),
            Arc::clone(&fallback),
            Arc::default(),
        );

        let out = d.send(&ResolvedInput::Text("x".to_string())).await;

        assert!(matches!(
            out,
            DeliveryOutcome::Dropped(DeliveryError::TransientDeliveryFailure(_))
        ));
        assert_eq!(fallback.payloads().len(), 1);
        assert_eq!(session.status(), Some(SessionStatus::Active));
    }

    #[tokio::test]
    async fn test_transport_error_is_transient() {
        let session = active_session();
        let d = delivery(
            session.clone(),
            disconnected_channel(),
            RecordingFallback::failing(TransportError::Timeout),
            Arc::default(),
        );

        let out = d.send(&ResolvedInput::Text("x".to_string())).await;

        assert_eq!(
            out,
            DeliveryOutcome::Dropped(DeliveryError::TransientDeliveryFailure(
                "fallback request timed out".to_string()
            ))
        );
        assert!(session.accepts_input());
    }

    #[tokio::test]
    async fn test_released_session_sends_nothing() {
        // Arrange
        let session = active_session();
        session.release();
        let mut ch = MockPersistentChannel::new();
        ch.expect_state().never();
        ch.expect_try_send().never();
        let fallback = RecordingFallback::replying(200, "");
        let d = delivery(session, ch, Arc::clone(&fallback), Arc::default());

        // Act
        let out = d.send(&ResolvedInput::Text("late".to_string())).await;

        // Assert
        assert_eq!(out, DeliveryOutcome::Skipped);
        assert!(fallback.payloads().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_after_release_does_not_refresh() {
        // A fallback call still in flight at teardown comes back 400.
        struct ReleasingFallback(SessionHandle);

        #[async_trait]
        impl FallbackTransport for ReleasingFallback {
            async fn post_input(
                &self,
                _session: &SessionId,
                _payload: &str,
            ) -> Result<FallbackResponse, TransportError> {
                self.0.release();
                Ok(FallbackResponse {
                    status: 400,
                    body: String::new(),
                })
            }
        }

        let session = active_session();
        let notifier = Arc::new(CountingNotifier::default());
        let d = DualTransportDelivery::new(
            session.clone(),
            Arc::new(disconnected_channel()),
            Arc::new(ReleasingFallback(session)),
            Arc::clone(&notifier) as Arc<dyn UiNotifier>,
        );

        d.send(&ResolvedInput::Text("x".to_string())).await;

        assert_eq!(notifier.refreshes.load(Ordering::SeqCst), 0);
    }
}
