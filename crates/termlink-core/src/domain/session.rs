//! Remote terminal session identity and lifecycle.
//!
//! The session itself is created and owned by an external service; the input
//! path only tracks the bits it needs to decide whether input may still be
//! sent.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a remote terminal session, as issued by the session service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a session as seen by the input path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Connecting,
    Active,
    /// Terminal state.  Reached only through a definitive rejection from the
    /// fallback transport.
    Exited,
}

/// A remote terminal session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    status: SessionStatus,
}

impl Session {
    /// Creates a session in the `Connecting` state.
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            status: SessionStatus::Connecting,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Moves `Connecting` to `Active`.  Returns `true` if the status changed.
    ///
    /// An exited session stays exited.
    pub fn activate(&mut self) -> bool {
        if self.status == SessionStatus::Connecting {
            self.status = SessionStatus::Active;
            true
        } else {
            false
        }
    }

    /// Moves the session to `Exited`.  Returns `true` only on the first call,
    /// which lets callers fire one-shot side effects (UI refresh) exactly once.
    pub fn mark_exited(&mut self) -> bool {
        if self.status == SessionStatus::Exited {
            false
        } else {
            self.status = SessionStatus::Exited;
            true
        }
    }

    /// `false` once the session has exited.
    pub fn accepts_input(&self) -> bool {
        self.status != SessionStatus::Exited
    }
}

/// Connection state of the persistent channel.
///
/// Independent of [`SessionStatus`]: the channel can drop and reconnect many
/// times during one active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Class of device hosting the terminal view.
///
/// Handheld devices bring their own on-screen keyboard handling, so no
/// composition proxy is created for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    #[default]
    Desktop,
    Handheld,
}

impl DeviceClass {
    pub fn supports_composition_proxy(self) -> bool {
        matches!(self, DeviceClass::Desktop)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_connecting() {
        let session = Session::new(SessionId::new("s-1"));
        assert_eq!(session.status(), SessionStatus::Connecting);
        assert!(session.accepts_input());
    }

    #[test]
    fn test_activate_only_from_connecting() {
        let mut session = Session::new(SessionId::new("s-1"));
        assert!(session.activate());
        assert!(!session.activate(), "second activation is a no-op");
        assert_eq!(session.status(), SessionStatus::Active);
    }

    #[test]
    fn test_mark_exited_reports_first_transition_only() {
        let mut session = Session::new(SessionId::new("s-1"));
        session.activate();

        assert!(session.mark_exited());
        assert!(!session.mark_exited());
        assert!(!session.accepts_input());
    }

    #[test]
    fn test_exited_session_cannot_be_reactivated() {
        let mut session = Session::new(SessionId::new("s-1"));
        session.mark_exited();

        assert!(!session.activate());
        assert_eq!(session.status(), SessionStatus::Exited);
    }

    #[test]
    fn test_channel_state_defaults_to_disconnected() {
        assert_eq!(ChannelState::default(), ChannelState::Disconnected);
    }

    #[test]
    fn test_only_desktop_gets_a_composition_proxy() {
        assert!(DeviceClass::Desktop.supports_composition_proxy());
        assert!(!DeviceClass::Handheld.supports_composition_proxy());
    }

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let id = SessionId::new("abc-123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc-123\"");
        assert_eq!(id.to_string(), "abc-123");
    }
}
