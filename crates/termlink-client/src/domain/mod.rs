//! Domain layer for termlink-client.
//!
//! Plain types shared by the application and infrastructure layers.
//!
//! # What belongs in the domain layer?
//!
//! - Configuration structures and their defaults
//! - The shared composition/focus signal handle
//! - The session handle the loop and in-flight deliveries share
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, socket, or HTTP types
//! - Anything that waits on external state

pub mod config;
pub mod session_handle;
pub mod signals;

pub use config::{Anchor, ClientConfig, ConfigError};
pub use session_handle::SessionHandle;
pub use signals::{CompositionSignals, SignalWriter};
