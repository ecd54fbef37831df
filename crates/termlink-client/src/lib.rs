//! termlink-client library crate.
//!
//! The input side of a web terminal: it turns keydowns, IME composition,
//! and pastes into [`termlink_core::ResolvedInput`]s and delivers them to a
//! remote terminal session over a WebSocket, falling back to an HTTP call
//! when the socket is not available.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Host view (keydown / composition / paste / focus events)
//!         ↓
//! [termlink-client]
//!   ├── domain/           ClientConfig, CompositionSignals, SessionHandle
//!   ├── application/
//!   │     ├── input_session   Event loop: routes every UI event
//!   │     ├── composition     Composition tracker (IME + paste)
//!   │     ├── focus           Proxy visibility and anchoring
//!   │     ├── reposition      Debounced proxy re-anchoring after sends
//!   │     └── delivery        WebSocket-first, HTTP-fallback delivery
//!   └── infrastructure/
//!         ├── ws_channel      Persistent channel (tokio-tungstenite)
//!         ├── http_fallback   Fallback channel (reqwest)
//!         ├── endpoint        Per-session URLs
//!         └── auth            Auth header providers
//!         ↓
//! Remote terminal session
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `termlink-core`; it talks to the
//!   outside world only through traits (`PersistentChannel`,
//!   `FallbackTransport`, `UiNotifier`, `ProxySurface`).
//! - `infrastructure` implements those traits with real sockets.
//!
//! # For beginners: why are the handlers synchronous?
//!
//! Every UI event is handled to completion before the next one is looked at,
//! so the composition, focus, and escape state can never be observed half
//! updated.  The only thing that waits on the network is delivery, and that
//! runs in its own spawned task whose result comes back to the loop as just
//! another event.

/// Domain layer: configuration and shared state handles (no I/O).
pub mod domain;

/// Application layer: the input state machines and delivery logic.
pub mod application;

/// Infrastructure layer: WebSocket channel, HTTP fallback, auth headers.
pub mod infrastructure;
