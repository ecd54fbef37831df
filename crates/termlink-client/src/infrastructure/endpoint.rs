//! Per-session endpoint URLs.
//!
//! ```text
//! {ws_base_url}/sessions/{id}/stream    persistent channel
//! {http_base_url}/sessions/{id}/input   fallback call
//! ```
//!
//! Any path on the base URL is kept, and the session id is percent-encoded
//! as a single path segment.

use reqwest::Url;
use termlink_core::SessionId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EndpointError {
    #[error("invalid base url {url:?}: {reason}")]
    InvalidBase { url: String, reason: String },
}

/// `{base}/sessions/{id}/{leaf}`.
///
/// # Errors
///
/// Returns [`EndpointError::InvalidBase`] if `base` does not parse or cannot
/// carry a path (e.g. `mailto:`).
pub fn session_endpoint(base: &str, session: &SessionId, leaf: &str) -> Result<Url, EndpointError> {
    let invalid = |reason: String| EndpointError::InvalidBase {
        url: base.to_string(),
        reason,
    };

    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("cannot carry a path".to_string()))?
        .pop_if_empty()
        .extend(["sessions", session.as_str(), leaf]);
    Ok(url)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
