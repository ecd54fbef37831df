//! Interpretation of fallback-call responses.
//!
//! | Status        | Body                          | Verdict          |
//! |---------------|-------------------------------|------------------|
//! | 2xx           | any                           | `Accepted`       |
//! | 408, 429      | any                           | `Transient`      |
//! | 4xx           | `{"error":"invalid_input"}`   | `InvalidInput`   |
//! | 4xx           | anything else                 | `SessionExited`  |
//! | anything else | any                           | `Transient`      |
//!
//! A 4xx is normally definitive: the session behind the endpoint is gone.
//! Endpoints that can tell a malformed payload apart from a dead session say
//! so in the body, and only that payload is dropped. Timeouts and rate
//! limiting are retryable and never end the session. 401 and 403 do: the
//! client holds one token for its lifetime and cannot re-authenticate.

use serde::Deserialize;

/// Error code a fallback endpoint uses to reject the payload, not the session.
pub const INVALID_INPUT_ERROR: &str = "invalid_input";

/// What a fallback response means for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackVerdict {
    /// The input was applied.
    Accepted,
    /// The session has ended; no further input will be accepted.
    SessionExited,
    /// This payload was rejected; the session is still alive.
    InvalidInput,
    /// Server error or unexpected status; drop this input and carry on.
    Transient,
}

const REQUEST_TIMEOUT: u16 = 408;
const TOO_MANY_REQUESTS: u16 = 429;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Classifies a fallback response from its status code and body.
pub fn classify_fallback_response(status: u16, body: &str) -> FallbackVerdict {
    match status {
        200..=299 => FallbackVerdict::Accepted,
        REQUEST_TIMEOUT | TOO_MANY_REQUESTS => FallbackVerdict::Transient,
        400..=499 => {
            let invalid_input = serde_json::from_str::<ErrorBody>(body)
                .map(|b| b.error == INVALID_INPUT_ERROR)
                .unwrap_or(false);
            if invalid_input {
                FallbackVerdict::InvalidInput
            } else {
                FallbackVerdict::SessionExited
            }
        }
        _ => FallbackVerdict::Transient,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
