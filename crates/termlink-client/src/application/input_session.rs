//! InputSession: routes every UI event for one terminal session.
//!
//! This is the input path's event loop.  The host view forwards raw events
//! ([`UiEvent`]); the session decides what each one means, hands finished
//! inputs to an [`InputDispatcher`], and drives the proxy surface.
//!
//! ```text
//! KeyDown ──► composing? ──yes──► left to the IME (clipboard shortcuts excepted)
//!               │ no
//!               ▼
//!           KeyMapper ──► Send ─────────► dispatcher
//!                     ├─► ToggleCapture ─► notifier.capture_toggled
//!                     └─► PassThrough / Ignored ─► host default
//! Composition* / Input / Paste ──► CompositionTracker ──► dispatcher
//! Focus / Blur ──► FocusCoordinator ──► proxy visibility
//! delivery finished ──► PositionRefresher ──► proxy placement
//! ```
//!
//! # Architecture
//!
//! `handle`, `on_delivery_finished`, and `poll_timers` are synchronous and
//! take `now` explicitly, so every state transition is unit-testable without
//! a runtime.  [`InputSession::run`] wraps them in a Tokio `select!` loop over
//! host events, delivery completions, the proxy-ready notification, and the
//! next timer deadline.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::OptionFuture;
use termlink_core::{DeviceClass, KeyAction, KeyMapper, KeyPress, ResolvedInput};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::application::composition::CompositionTracker;
use crate::application::delivery::{DualTransportDelivery, UiNotifier};
use crate::application::focus::{CaretPosition, FocusCoordinator, Visibility};
use crate::application::reposition::{
    placement, PositionRefresher, ProxyPlacement, TerminalCapabilities,
};
use crate::domain::{ClientConfig, CompositionSignals, SessionHandle};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failures while setting up the composition proxy.  The input path keeps
/// working without a proxy; these are logged, never propagated.
#[derive(Debug, Error, PartialEq)]
pub enum SetupError {
    #[error("proxy container not ready after {waited:?}")]
    SetupRetryExhausted { waited: Duration },

    #[error("proxy container went away before it was ready")]
    ContainerGone,
}

// ── Host-facing types ─────────────────────────────────────────────────────────

/// A raw event from the host view.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    KeyDown(KeyPress),
    CompositionStart,
    CompositionUpdate(String),
    CompositionEnd(String),
    /// Text inserted into the proxy without a mapped keydown.
    Input(String),
    Paste(String),
    Focus,
    Blur,
    CaretMoved(CaretPosition),
    /// The view is going away.  Ends [`InputSession::run`].
    Teardown,
}

/// What the host should do with the event it just forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventDisposition {
    /// Cancel the host's default handling (e.g. `preventDefault`).
    pub suppress_default: bool,
}

impl EventDisposition {
    const SUPPRESS: Self = Self {
        suppress_default: true,
    };
}

/// An event plus an optional channel for the host to learn its disposition.
#[derive(Debug)]
pub struct HostEvent {
    pub event: UiEvent,
    reply: Option<oneshot::Sender<EventDisposition>>,
}

impl HostEvent {
    pub fn new(event: UiEvent) -> Self {
        Self { event, reply: None }
    }

    pub fn with_reply(event: UiEvent) -> (Self, oneshot::Receiver<EventDisposition>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                event,
                reply: Some(tx),
            },
            rx,
        )
    }
}

impl From<UiEvent> for HostEvent {
    fn from(event: UiEvent) -> Self {
        Self::new(event)
    }
}

/// The hidden text surface that receives composition events.
pub trait ProxySurface: Send + Sync {
    fn set_visible(&self, visible: bool);
    fn move_to(&self, placement: ProxyPlacement);
    /// Empties the surface's text.
    fn clear(&self);
}

/// Resolves once the proxy's container is ready, carrying the surface.
pub type ProxyReady = oneshot::Receiver<Arc<dyn ProxySurface>>;

type AttachFuture = Pin<Box<dyn Future<Output = Result<Arc<dyn ProxySurface>, SetupError>> + Send>>;

/// Waits for the proxy container, bounded by `bound`.
///
/// # Errors
///
/// [`SetupError::SetupRetryExhausted`] if the bound passes first,
/// [`SetupError::ContainerGone`] if the sender is dropped.
pub async fn wait_for_proxy(
    ready: ProxyReady,
    bound: Duration,
) -> Result<Arc<dyn ProxySurface>, SetupError> {
    match tokio::time::timeout(bound, ready).await {
        Ok(Ok(surface)) => Ok(surface),
        Ok(Err(_)) => Err(SetupError::ContainerGone),
        Err(_) => Err(SetupError::SetupRetryExhausted { waited: bound }),
    }
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

/// Takes a finished input off the loop's hands.  Must not block.
pub trait InputDispatcher: Send + Sync {
    fn dispatch(&self, input: ResolvedInput);
}

/// Completion report for one dispatched input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryFinished {
    pub success: bool,
}

/// Runs each delivery in its own task and reports back to the loop.
pub struct SpawningDispatcher {
    delivery: Arc<DualTransportDelivery>,
    completions: mpsc::UnboundedSender<DeliveryFinished>,
}

impl SpawningDispatcher {
    /// Returns the dispatcher and the receiver to pass to
    /// [`InputSession::run`].
    pub fn new(
        delivery: Arc<DualTransportDelivery>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<DeliveryFinished>) {
        let (completions, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                delivery,
                completions,
            }),
            rx,
        )
    }
}

impl InputDispatcher for SpawningDispatcher {
    fn dispatch(&self, input: ResolvedInput) {
        let delivery = Arc::clone(&self.delivery);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let outcome = delivery.send(&input).await;
            // The loop may already be gone; that is fine.
            let _ = completions.send(DeliveryFinished {
                success: outcome.is_success(),
            });
        });
    }
}

// ── The session ───────────────────────────────────────────────────────────────

pub struct InputSession {
    session: SessionHandle,
    device_class: DeviceClass,
    attach_bound: Duration,
    mapper: KeyMapper,
    tracker: CompositionTracker,
    focus: FocusCoordinator,
    refresher: PositionRefresher,
    signals: CompositionSignals,
    capture_active: bool,
    proxy: Option<Arc<dyn ProxySurface>>,
    capabilities: Arc<dyn TerminalCapabilities>,
    dispatcher: Arc<dyn InputDispatcher>,
    notifier: Arc<dyn UiNotifier>,
}

impl InputSession {
    pub fn new(
        config: &ClientConfig,
        session: SessionHandle,
        dispatcher: Arc<dyn InputDispatcher>,
        notifier: Arc<dyn UiNotifier>,
        capabilities: Arc<dyn TerminalCapabilities>,
    ) -> Self {
        let (signals, composing, focused) = CompositionSignals::new();
        let timing = &config.timing;
        Self {
            session,
            device_class: config.proxy.device_class,
            attach_bound: timing.attach_timeout(),
            mapper: KeyMapper::with_escape_window(timing.double_escape_window()),
            tracker: CompositionTracker::new(composing),
            focus: FocusCoordinator::new(focused, timing.blur_grace(), config.proxy.anchor),
            refresher: PositionRefresher::new(timing.reposition_delay()),
            signals,
            capture_active: true,
            proxy: None,
            capabilities,
            dispatcher,
            notifier,
        }
    }

    /// Read-only view of the `composing` / `input-focused` flags.
    pub fn signals(&self) -> CompositionSignals {
        self.signals.clone()
    }

    pub fn capture_active(&self) -> bool {
        self.capture_active
    }

    pub fn has_proxy(&self) -> bool {
        self.proxy.is_some()
    }

    pub fn visibility(&self) -> Visibility {
        self.focus.visibility()
    }

    /// Installs the composition proxy.  Refused (returns `false`) on
    /// handheld devices, after teardown, or if one is already attached.
    ///
    /// A `Connecting` session gets its proxy too: it already accepts input,
    /// so composed text typed before the socket opens goes out over the
    /// fallback.
    pub fn attach_proxy(&mut self, surface: Arc<dyn ProxySurface>) -> bool {
        if !self.device_class.supports_composition_proxy() {
            debug!("handheld device; composition proxy not created");
            return false;
        }
        if self.proxy.is_some() || self.session.is_released() {
            return false;
        }
        surface.set_visible(self.focus.visibility() == Visibility::Visible);
        surface.move_to(placement(self.focus.anchor(), self.capabilities.as_ref()));
        self.proxy = Some(surface);
        info!("composition proxy attached");
        true
    }

    /// Handles one host event.
    pub fn handle(&mut self, event: UiEvent, now: Instant) -> EventDisposition {
        if !self.session.accepts_input() {
            return EventDisposition::default();
        }

        match event {
            UiEvent::KeyDown(press) => return self.on_key_down(&press, now),
            UiEvent::CompositionStart => {
                self.tracker.on_composition_start();
                if let Some(v) = self.focus.on_composition_start() {
                    self.apply_visibility(v);
                }
            }
            UiEvent::CompositionUpdate(data) => self.tracker.on_composition_update(&data),
            UiEvent::CompositionEnd(text) => {
                if let Some(input) = self.tracker.on_composition_end(&text) {
                    self.dispatch(input);
                }
                self.clear_proxy();
                self.focus.on_composition_end(now);
            }
            UiEvent::Input(text) => {
                if let Some(input) = self.tracker.on_plain_input(&text) {
                    self.dispatch(input);
                    self.clear_proxy();
                }
            }
            UiEvent::Paste(text) => {
                let outcome = self.tracker.on_paste(&text);
                if let Some(input) = outcome.input {
                    self.dispatch(input);
                }
                return EventDisposition {
                    suppress_default: outcome.suppress_default,
                };
            }
            UiEvent::Focus => {
                if let Some(v) = self.focus.on_focus() {
                    self.apply_visibility(v);
                }
            }
            UiEvent::Blur => self.focus.on_blur(now),
            UiEvent::CaretMoved(position) => self.focus.set_caret_hint(position),
            UiEvent::Teardown => self.teardown(),
        }
        EventDisposition::default()
    }

    fn on_key_down(&mut self, press: &KeyPress, now: Instant) -> EventDisposition {
        if !self.tracker.should_forward_keydown(press) {
            return EventDisposition::default();
        }

        match self.mapper.map(press, self.tracker.buffer_is_empty(), now) {
            KeyAction::Send(input) => {
                self.dispatch(input);
                EventDisposition::SUPPRESS
            }
            KeyAction::ToggleCapture => {
                self.capture_active = !self.capture_active;
                info!(active = self.capture_active, "input capture toggled");
                self.notifier.capture_toggled(self.capture_active);
                EventDisposition::SUPPRESS
            }
            KeyAction::PassThrough | KeyAction::Ignored => EventDisposition::default(),
        }
    }

    /// Feeds back the result of one dispatched input.
    pub fn on_delivery_finished(&mut self, success: bool, now: Instant) {
        if !success || self.session.is_released() {
            return;
        }
        if self.refresher.on_send_succeeded(now, self.focus.is_focused()) {
            self.reposition();
        }
    }

    /// Fires any timers that are due.
    pub fn poll_timers(&mut self, now: Instant) {
        if let Some(v) = self.focus.poll(now, self.tracker.is_composing()) {
            self.apply_visibility(v);
        }
        if self.refresher.poll(now) {
            self.reposition();
        }
    }

    /// Earliest pending timer, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.focus.next_deadline(), self.refresher.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Releases the session and resets all state.  In-flight deliveries
    /// that finish afterwards are no-ops.
    pub fn teardown(&mut self) {
        if self.session.release() {
            info!("input session torn down");
        }
        self.tracker.reset();
        self.focus.reset();
        self.refresher.cancel();
        if let Some(proxy) = self.proxy.take() {
            proxy.clear();
            proxy.set_visible(false);
        }
    }

    /// Runs the event loop until [`UiEvent::Teardown`] arrives or the host
    /// drops its sender.
    ///
    /// `proxy_ready` resolves when the proxy's container is ready.  If it
    /// does not resolve within the configured attach bound the session runs
    /// on without a proxy.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<HostEvent>,
        mut completions: mpsc::UnboundedReceiver<DeliveryFinished>,
        proxy_ready: Option<ProxyReady>,
    ) {
        let mut attach: Option<AttachFuture> = match proxy_ready {
            Some(ready) if self.device_class.supports_composition_proxy() => {
                Some(Box::pin(wait_for_proxy(ready, self.attach_bound)))
            }
            Some(_) => {
                debug!("handheld device; ignoring proxy container");
                None
            }
            None => None,
        };

        loop {
            let deadline = self.next_deadline().map(tokio::time::Instant::from_std);
            let sleep_target =
                deadline.unwrap_or_else(|| tokio::time::Instant::now() + Duration::from_secs(3600));

            // Completions, proxy readiness, and timers go first so state is
            // current before the next host event is handled.
            tokio::select! {
                biased;

                Some(result) = OptionFuture::from(attach.as_mut()), if attach.is_some() => {
                    attach = None;
                    match result {
                        Ok(surface) => {
                            self.attach_proxy(surface);
                        }
                        Err(e) => warn!("composition proxy disabled for this session: {e}"),
                    }
                }
                Some(done) = completions.recv() => {
                    self.on_delivery_finished(done.success, clock_now());
                }
                _ = tokio::time::sleep_until(sleep_target), if deadline.is_some() => {
                    self.poll_timers(clock_now());
                }
                host = events.recv() => match host {
                    Some(HostEvent { event: UiEvent::Teardown, reply }) => {
                        if let Some(reply) = reply {
                            let _ = reply.send(EventDisposition::default());
                        }
                        break;
                    }
                    Some(HostEvent { event, reply }) => {
                        let disposition = self.handle(event, clock_now());
                        if let Some(reply) = reply {
                            let _ = reply.send(disposition);
                        }
                    }
                    None => break,
                },
            }
        }

        self.teardown();
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn dispatch(&self, input: ResolvedInput) {
        debug!(input = %input.describe(), "dispatching input");
        self.dispatcher.dispatch(input);
    }

    fn apply_visibility(&self, visibility: Visibility) {
        if let Some(proxy) = &self.proxy {
            proxy.set_visible(visibility == Visibility::Visible);
        }
    }

    fn reposition(&self) {
        if let Some(proxy) = &self.proxy {
            proxy.move_to(placement(self.focus.anchor(), self.capabilities.as_ref()));
        }
    }

    fn clear_proxy(&self) {
        if let Some(proxy) = &self.proxy {
            proxy.clear();
        }
    }
}

/// Current time on the runtime's clock (paused in tests).
fn clock_now() -> Instant {
    tokio::time::Instant::now().into_std()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
