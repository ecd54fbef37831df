//! JSON codec for the input wire payload.
//!
//! Wire format (one JSON object, exactly one field):
//! ```text
//! {"text": "<non-empty string>"}
//! {"key":  "<special key token>"}
//! ```
//!
//! Encoding is infallible in practice (the payload is a string or a unit
//! enum), but the signature returns `Result` so a future payload change cannot
//! silently panic.  Decoding is strict: unknown fields, both fields, neither
//! field, and empty text are all rejected.

use serde::Deserialize;
use thiserror::Error;

use crate::domain::input::{ResolvedInput, SpecialKeyToken};

/// Errors that can occur while encoding or decoding an input payload.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The bytes were not valid JSON, or a field had the wrong type.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Neither `text` nor `key` was present.
    #[error("payload carries neither `text` nor `key`")]
    MissingField,

    /// Both `text` and `key` were present.
    #[error("payload carries both `text` and `key`")]
    AmbiguousPayload,

    /// `text` was present but empty.
    #[error("payload text is empty")]
    EmptyText,
}

/// Decoding shape: both fields optional so that exclusivity can be checked
/// explicitly and reported with a precise error.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WirePayload {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    key: Option<SpecialKeyToken>,
}

/// Encodes a [`ResolvedInput`] as its JSON wire payload.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use termlink_core::domain::{ResolvedInput, SpecialKeyToken};
/// use termlink_core::protocol::encode_input;
///
/// let json = encode_input(&ResolvedInput::Key(SpecialKeyToken::ShiftTab)).unwrap();
/// assert_eq!(json, r#"{"key":"shift_tab"}"#);
/// ```
pub fn encode_input(input: &ResolvedInput) -> Result<String, ProtocolError> {
    serde_json::to_string(input).map_err(|e| ProtocolError::MalformedPayload(e.to_string()))
}

/// Decodes a JSON wire payload into a [`ResolvedInput`].
///
/// # Errors
///
/// See [`ProtocolError`] for the rejected shapes.
pub fn decode_input(json: &str) -> Result<ResolvedInput, ProtocolError> {
    let wire: WirePayload =
        serde_json::from_str(json).map_err(|e| ProtocolError::MalformedPayload(e.to_string()))?;

    match (wire.text, wire.key) {
        (Some(_), Some(_)) => Err(ProtocolError::AmbiguousPayload),
        (None, None) => Err(ProtocolError::MissingField),
        (Some(text), None) => ResolvedInput::text(text).ok_or(ProtocolError::EmptyText),
        (None, Some(key)) => Ok(ResolvedInput::Key(key)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
