//! Resolved input: the unit of work that leaves the input path.
//!
//! Every keystroke, composed character sequence, or paste that survives the
//! key mapper or the composition tracker becomes exactly one
//! [`ResolvedInput`].  The type is a two-variant enum, so "both fields set"
//! and "neither field set" are unrepresentable.
//!
//! # Wire shape
//!
//! Serde's default external tagging with `snake_case` variant names produces
//! exactly the payload the remote session expects:
//!
//! ```json
//! {"text":"hello"}
//! {"key":"shift_tab"}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A non-printable control key the remote side interprets by name.
///
/// The set is closed: the remote endpoint rejects any token it does not know,
/// so adding a variant here is a protocol change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialKeyToken {
    Enter,
    Escape,
    Backspace,
    Tab,
    ShiftTab,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    CtrlEnter,
    ShiftEnter,
    Delete,
    PageUp,
    PageDown,
    Home,
    End,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

impl SpecialKeyToken {
    /// Every token, in declaration order.
    pub const ALL: [SpecialKeyToken; 28] = [
        Self::Enter,
        Self::Escape,
        Self::Backspace,
        Self::Tab,
        Self::ShiftTab,
        Self::ArrowUp,
        Self::ArrowDown,
        Self::ArrowLeft,
        Self::ArrowRight,
        Self::CtrlEnter,
        Self::ShiftEnter,
        Self::Delete,
        Self::PageUp,
        Self::PageDown,
        Self::Home,
        Self::End,
        Self::F1,
        Self::F2,
        Self::F3,
        Self::F4,
        Self::F5,
        Self::F6,
        Self::F7,
        Self::F8,
        Self::F9,
        Self::F10,
        Self::F11,
        Self::F12,
    ];

    /// Returns the token name exactly as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Escape => "escape",
            Self::Backspace => "backspace",
            Self::Tab => "tab",
            Self::ShiftTab => "shift_tab",
            Self::ArrowUp => "arrow_up",
            Self::ArrowDown => "arrow_down",
            Self::ArrowLeft => "arrow_left",
            Self::ArrowRight => "arrow_right",
            Self::CtrlEnter => "ctrl_enter",
            Self::ShiftEnter => "shift_enter",
            Self::Delete => "delete",
            Self::PageUp => "page_up",
            Self::PageDown => "page_down",
            Self::Home => "home",
            Self::End => "end",
            Self::F1 => "f1",
            Self::F2 => "f2",
            Self::F3 => "f3",
            Self::F4 => "f4",
            Self::F5 => "f5",
            Self::F6 => "f6",
            Self::F7 => "f7",
            Self::F8 => "f8",
            Self::F9 => "f9",
            Self::F10 => "f10",
            Self::F11 => "f11",
            Self::F12 => "f12",
        }
    }

    /// Maps a function-key number (1-12) to its token.
    pub fn function_key(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::F1),
            2 => Some(Self::F2),
            3 => Some(Self::F3),
            4 => Some(Self::F4),
            5 => Some(Self::F5),
            6 => Some(Self::F6),
            7 => Some(Self::F7),
            8 => Some(Self::F8),
            9 => Some(Self::F9),
            10 => Some(Self::F10),
            11 => Some(Self::F11),
            12 => Some(Self::F12),
            _ => None,
        }
    }
}

impl fmt::Display for SpecialKeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finalized unit of user input, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedInput {
    /// Literal text, including control characters such as `\u{1}` for Ctrl+A.
    Text(String),
    /// A named special key.
    Key(SpecialKeyToken),
}

impl ResolvedInput {
    /// Builds a `Text` input, or `None` when `text` is empty.
    ///
    /// Empty text is never delivered, so callers that receive user-supplied
    /// strings go through this constructor rather than the variant directly.
    pub fn text(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.is_empty() {
            None
        } else {
            Some(Self::Text(text))
        }
    }

    /// Builds a `Key` input.
    pub fn key(token: SpecialKeyToken) -> Self {
        Self::Key(token)
    }

    /// Returns the text payload, if this is a `Text` input.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            Self::Key(_) => None,
        }
    }

    /// Returns the key token, if this is a `Key` input.
    pub fn as_key(&self) -> Option<SpecialKeyToken> {
        match self {
            Self::Text(_) => None,
            Self::Key(k) => Some(*k),
        }
    }

    /// A log-safe description: the key token name, or the text length.
    ///
    /// Typed text can contain passwords, so log lines use this instead of
    /// the `Debug` representation.
    pub fn describe(&self) -> String {
        match self {
            Self::Text(t) => format!("text({} chars)", t.chars().count()),
            Self::Key(k) => format!("key({k})"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
