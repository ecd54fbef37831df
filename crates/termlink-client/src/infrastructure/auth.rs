//! Auth header providers.
//!
//! Session credentials are issued elsewhere; the input path only attaches
//! whatever header it is handed to every WebSocket upgrade and fallback call.

use std::fmt;

/// Supplies the `Authorization` header value for outgoing requests.
pub trait AuthHeaderProvider: Send + Sync {
    /// `None` sends no header.
    fn authorization(&self) -> Option<String>;
}

/// Sends no `Authorization` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl AuthHeaderProvider for NoAuth {
    fn authorization(&self) -> Option<String> {
        None
    }
}

/// A static bearer token: `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

// Never print the token itself.
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerToken").field(&"<redacted>").finish()
    }
}

impl AuthHeaderProvider for BearerToken {
    fn authorization(&self) -> Option<String> {
        Some(format!("Bearer {}", self.0))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
