//! Domain entities for the terminal input path.
//!
//! Pure types with no I/O, no async, and no framework dependencies: the
//! session as the input path sees it, and the [`ResolvedInput`] every
//! keystroke is reduced to.
//!
//! Code in the outer layers (the client crate's application and
//! infrastructure modules) depends on these types; nothing here depends on
//! them.

pub mod input;
pub mod session;

pub use input::{ResolvedInput, SpecialKeyToken};
pub use session::{ChannelState, DeviceClass, Session, SessionId, SessionStatus};
