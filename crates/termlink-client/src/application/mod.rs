//! Application layer: the input state machines and delivery logic.
//!
//! # What lives here?
//!
//! - **`input_session`** – The event loop.  Receives every raw UI event for
//!   one session and routes it to the pieces below.
//!
//! - **`composition`** – Tracks IME composition and the proxy's text buffer,
//!   and turns composition ends, plain input, and pastes into text inputs.
//!
//! - **`focus`** – Decides when the composition proxy is shown or hidden,
//!   including the short grace period after a blur.
//!
//! - **`reposition`** – Re-anchors the proxy after successful sends, once
//!   immediately and once after a short delay.
//!
//! - **`delivery`** – Sends one input over the persistent channel when it is
//!   connected, otherwise over a one-shot fallback call, and reacts to the
//!   fallback's verdict.
//!
//! Nothing here opens a socket.  Transports and the host UI are reached
//! through the traits defined in `delivery` and `input_session`.

pub mod composition;
pub mod delivery;
pub mod focus;
pub mod input_session;
pub mod reposition;

pub use composition::{CompositionTracker, PasteOutcome};
pub use delivery::{
    DeliveryError, DeliveryOutcome, DualTransportDelivery, FallbackResponse, FallbackTransport,
    PersistentChannel, TransportError, UiNotifier,
};
pub use focus::{CaretPosition, FocusCoordinator, Visibility};
pub use input_session::{
    wait_for_proxy, DeliveryFinished, EventDisposition, HostEvent, InputDispatcher, InputSession,
    ProxyReady, ProxySurface, SetupError, SpawningDispatcher, UiEvent,
};
pub use reposition::{
    placement, NoCapabilities, PositionRefresher, ProxyPlacement, TerminalCapabilities,
    DEFAULT_FONT_SIZE_PX,
};
