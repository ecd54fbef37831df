//! # termlink-core
//!
//! Shared library for the termlink terminal input path: the types every
//! keystroke is reduced to, the rules that reduce it, and the wire payload
//! both transports carry.
//!
//! It has zero dependencies on browsers, sockets, or async runtimes.
//!
//! # Architecture overview
//!
//! A web terminal client captures keystrokes, IME-composed text, and pastes,
//! and forwards them to a remote terminal session.  This crate defines:
//!
//! - **`domain`** – `Session`, `ResolvedInput`, and `SpecialKeyToken`: what a
//!   session is and what a unit of input looks like.
//!
//! - **`keymap`** – The ordered rules that turn a raw keydown
//!   (`{key, ctrl, alt, meta, shift}`) into a `ResolvedInput`, including
//!   double-Escape detection.
//!
//! - **`protocol`** – The `{text}` / `{key}` JSON payload and the verdict
//!   table for fallback-call responses.

pub mod domain;
pub mod keymap;
pub mod protocol;

// Flat paths for the types every caller touches.
pub use domain::input::{ResolvedInput, SpecialKeyToken};
pub use domain::session::{ChannelState, DeviceClass, Session, SessionId, SessionStatus};
pub use keymap::{KeyAction, KeyMapper, KeyPress};
pub use protocol::codec::{decode_input, encode_input, ProtocolError};
