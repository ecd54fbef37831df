//! Wire protocol shared by the persistent channel and the fallback call.
//!
//! Both transports carry the same JSON object: `{"text": ...}` or
//! `{"key": ...}`.  The fallback call additionally returns an HTTP status
//! that [`status::classify_fallback_response`] turns into a verdict.

pub mod codec;
pub mod status;

pub use codec::{decode_input, encode_input, ProtocolError};
pub use status::{classify_fallback_response, FallbackVerdict, INVALID_INPUT_ERROR};
