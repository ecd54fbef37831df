//! Infrastructure layer: the real transports.
//!
//! Implements the seams defined in `application::delivery` with sockets.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain`,
//! and `termlink_core`, but MUST NOT be imported by them.
//!
//! # Sub-modules
//!
//! - **`ws_channel`** – The persistent channel.  A background task owns one
//!   WebSocket, publishes its connection state, and reconnects when it drops.
//!
//! - **`http_fallback`** – The fallback transport: one `POST` per input.
//!
//! - **`auth`** – Supplies the `Authorization` header both transports send.
//!
//! - **`endpoint`** – Builds the per-session URLs from the configured bases.

pub mod auth;
pub mod endpoint;
pub mod http_fallback;
pub mod ws_channel;

pub use auth::{AuthHeaderProvider, BearerToken, NoAuth};
pub use http_fallback::{HttpFallback, HttpFallbackError};
pub use ws_channel::WsChannel;
