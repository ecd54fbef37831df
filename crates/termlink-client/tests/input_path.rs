//! Integration tests for the termlink-client input path.
//!
//! Host events go in through a running `InputSession`; what comes out is the
//! exact payload each transport was handed.  Transports are in-memory fakes,
//! so these tests exercise the event loop, the spawning dispatcher, and
//! dual-transport delivery together without opening sockets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use termlink_client::application::{
    DeliveryOutcome, DualTransportDelivery, EventDisposition, FallbackResponse, FallbackTransport,
    HostEvent, InputSession, NoCapabilities, PersistentChannel, SpawningDispatcher,
    TransportError, UiEvent, UiNotifier,
};
use termlink_client::domain::{ClientConfig, SessionHandle};
use termlink_core::{ChannelState, KeyPress, ResolvedInput, Session, SessionId, SessionStatus};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// ── Fakes ─────────────────────────────────────────────────────────────────────

/// Persistent channel with a fixed state that records what it accepts.
struct FakeChannel {
    state: ChannelState,
    frames: Mutex<Vec<String>>,
}

impl FakeChannel {
    fn new(state: ChannelState) -> Arc<Self> {
        Arc::new(Self {
            state,
            frames: Mutex::new(Vec::new()),
        })
    }

    fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap().clone()
    }
}

impl PersistentChannel for FakeChannel {
    fn state(&self) -> ChannelState {
        self.state
    }

    fn try_send(&self, payload: &str) -> bool {
        self.frames.lock().unwrap().push(payload.to_string());
        true
    }
}

/// Fallback endpoint that records payloads and answers with a fixed status.
struct FakeEndpoint {
    status: u16,
    body: &'static str,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeEndpoint {
    fn answering(status: u16, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn payloads(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }
}

#[async_trait]
impl FallbackTransport for FakeEndpoint {
    async fn post_input(
        &self,
        session: &SessionId,
        payload: &str,
    ) -> Result<FallbackResponse, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((session.as_str().to_string(), payload.to_string()));
        Ok(FallbackResponse {
            status: self.status,
            body: self.body.to_string(),
        })
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

// ── Harness ───────────────────────────────────────────────────────────────────

struct Harness {
    events: mpsc::Sender<HostEvent>,
    session: SessionHandle,
    notifier: Arc<CountingNotifier>,
    task: JoinHandle<()>,
}

impl Harness {
    fn start(channel: Arc<FakeChannel>, endpoint: Arc<FakeEndpoint>) -> Self {
        let session = SessionHandle::new(Session::new(SessionId::new("s-42")));
        session.activate();
        let notifier = Arc::new(CountingNotifier::default());
        let delivery = Arc::new(DualTransportDelivery::new(
            session.clone(),
            channel,
            endpoint,
            Arc::clone(&notifier) as Arc<dyn UiNotifier>,
        ));
        let (dispatcher, completions) = SpawningDispatcher::new(delivery);
        let input = InputSession::new(
            &ClientConfig::default(),
            session.clone(),
            dispatcher,
            Arc::clone(&notifier) as Arc<dyn UiNotifier>,
            Arc::new(NoCapabilities),
        );
        let (events, events_rx) = mpsc::channel(32);
        let task = tokio::spawn(input.run(events_rx, completions, None));
        Self {
            events,
            session,
            notifier,
            task,
        }
    }

    async fn send(&self, event: UiEvent) -> EventDisposition {
        let (host, reply) = HostEvent::with_reply(event);
        self.events.send(host).await.unwrap();
        reply.await.unwrap()
    }

    async fn finish(self) {
        self.send(UiEvent::Teardown).await;
        self.task.await.unwrap();
    }
}

/// Polls `check` until it holds or a generous deadline passes.
async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never held");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_paste_reaches_fallback_exactly_once() {
    // Arrange: socket down, endpoint accepting
    let channel = FakeChannel::new(ChannelState::Disconnected);
    let endpoint = FakeEndpoint::answering(200, "{}");
    let h = Harness::start(Arc::clone(&channel), Arc::clone(&endpoint));

    // Act
    let disposition = h.send(UiEvent::Paste("hello".to_string())).await;

    // Assert
    assert!(disposition.suppress_default);
    eventually(|| !endpoint.payloads().is_empty()).await;
    assert_eq!(endpoint.payloads(), vec![r#"{"text":"hello"}"#.to_string()]);
    assert_eq!(endpoint.calls.lock().unwrap()[0].0, "s-42");
    assert!(channel.frames().is_empty());
    h.finish().await;
}

#[tokio::test]
async fn test_connected_channel_carries_keys_and_fallback_is_idle() {
    // Arrange
    let channel = FakeChannel::new(ChannelState::Connected);
    let endpoint = FakeEndpoint::answering(200, "{}");
    let h = Harness::start(Arc::clone(&channel), Arc::clone(&endpoint));

    // Act: Ctrl+C, then Enter
    h.send(UiEvent::KeyDown(KeyPress::new("c").ctrl())).await;
    eventually(|| channel.frames().len() == 1).await;
    h.send(UiEvent::KeyDown(KeyPress::new("Enter"))).await;
    eventually(|| channel.frames().len() == 2).await;

    // Assert
    assert_eq!(
        channel.frames(),
        vec![r#"{"text":"\u0003"}"#.to_string(), r#"{"key":"enter"}"#.to_string()]
    );
    assert!(endpoint.payloads().is_empty());
    h.finish().await;
}

#[tokio::test]
async fn test_composition_commits_one_text_payload() {
    let channel = FakeChannel::new(ChannelState::Connected);
    let endpoint = FakeEndpoint::answering(200, "{}");
    let h = Harness::start(Arc::clone(&channel), endpoint);

    h.send(UiEvent::CompositionStart).await;
    let mid = h.send(UiEvent::KeyDown(KeyPress::new("n"))).await;
    h.send(UiEvent::CompositionUpdate("に".to_string())).await;
    h.send(UiEvent::CompositionEnd("日本語".to_string())).await;
    eventually(|| !channel.frames().is_empty()).await;

    assert!(!mid.suppress_default);
    assert_eq!(channel.frames(), vec![r#"{"text":"日本語"}"#.to_string()]);
    h.finish().await;
}

#[tokio::test]
async fn test_rejected_session_exits_and_later_keys_are_left_to_host() {
    // Arrange: socket down, endpoint says the session is gone
    let channel = FakeChannel::new(ChannelState::Disconnected);
    let endpoint = FakeEndpoint::answering(404, r#"{"error":"not_found"}"#);
    let h = Harness::start(channel, Arc::clone(&endpoint));

    // Act
    h.send(UiEvent::KeyDown(KeyPress::new("x"))).await;
    eventually(|| h.session.status() == Some(SessionStatus::Exited)).await;
    let after = h.send(UiEvent::KeyDown(KeyPress::new("y"))).await;

    // Assert
    assert!(!after.suppress_default);
    assert_eq!(h.notifier.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(endpoint.payloads(), vec![r#"{"text":"x"}"#.to_string()]);
    h.finish().await;
}

#[tokio::test]
async fn test_invalid_input_keeps_session_alive() {
    let channel = FakeChannel::new(ChannelState::Disconnected);
    let endpoint = FakeEndpoint::answering(400, r#"{"error":"invalid_input"}"#);
    let h = Harness::start(channel, Arc::clone(&endpoint));

    h.send(UiEvent::KeyDown(KeyPress::new("x"))).await;
    h.send(UiEvent::KeyDown(KeyPress::new("y"))).await;
    eventually(|| endpoint.payloads().len() == 2).await;

    assert_eq!(h.session.status(), Some(SessionStatus::Active));
    assert_eq!(h.notifier.refreshes.load(Ordering::SeqCst), 0);
    h.finish().await;
}

#[test]
fn test_delivery_without_event_loop() {
    // The delivery layer is usable on its own, e.g. from a headless typer.
    let channel = FakeChannel::new(ChannelState::Connecting);
    let endpoint = FakeEndpoint::answering(204, "");
    let session = SessionHandle::new(Session::new(SessionId::new("plain")));
    let delivery = DualTransportDelivery::new(
        session,
        Arc::clone(&channel) as Arc<dyn PersistentChannel>,
        Arc::clone(&endpoint) as Arc<dyn FallbackTransport>,
        Arc::new(CountingNotifier::default()),
    );

    let outcome = tokio_test::block_on(delivery.send(&ResolvedInput::Text("ok".to_string())));

    assert_eq!(outcome, DeliveryOutcome::Fallback);
    assert!(channel.frames().is_empty(), "a connecting channel is not used");
    assert_eq!(endpoint.payloads(), vec![r#"{"text":"ok"}"#.to_string()]);
}
