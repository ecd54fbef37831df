//! Key mapping: raw key presses to [`ResolvedInput`].
//!
//! The browser reports each keydown as a DOM `KeyboardEvent.key` string plus
//! four modifier flags.  [`KeyMapper::map`] turns that into one
//! [`KeyAction`] by applying an ordered list of rules; the first rule that
//! matches wins:
//!
//! 1. Platform clipboard shortcuts (and any other Meta combination) pass
//!    through to the host untouched.
//! 2. Alt+ArrowLeft / Alt+ArrowRight / Alt+Backspace become readline word
//!    motion sequences.
//! 3. Enter, with Ctrl / Shift variants.
//! 4. Escape, with double-press detection.
//! 5. Navigation and editing keys.
//! 6. Ctrl + lowercase letter becomes a C0 control code.
//! 7. Any other single printable character is sent literally.
//! 8. Everything else is ignored.
//!
//! The order matters: moving rule 6 above rule 1 would swallow Ctrl+Shift+C,
//! and moving rule 7 above rule 6 would send a literal `a` for Ctrl+A.

pub mod control;
pub mod escape;

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::input::{ResolvedInput, SpecialKeyToken};

pub use escape::{DoubleEscapeDetector, EscapePress, DOUBLE_ESCAPE_WINDOW};

/// A raw keydown as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyPress {
    /// DOM `KeyboardEvent.key` value, e.g. `"a"`, `"Enter"`, `"ArrowLeft"`.
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub shift: bool,
}

impl KeyPress {
    /// A press of `key` with no modifiers held.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// `true` when none of the four modifiers is held.
    pub fn is_unmodified(&self) -> bool {
        !(self.ctrl || self.alt || self.meta || self.shift)
    }

    /// `true` for the copy/paste combinations the host platform handles
    /// itself: Meta+C/V/X, Ctrl+Shift+C/V, Ctrl+Insert and Shift+Insert.
    ///
    /// These are honoured even mid-composition.
    pub fn is_clipboard_shortcut(&self) -> bool {
        let lower = self.key.to_ascii_lowercase();
        let letter = lower.as_str();
        if self.meta && !self.ctrl && matches!(letter, "c" | "v" | "x") {
            return true;
        }
        if self.ctrl && self.shift && !self.meta && matches!(letter, "c" | "v") {
            return true;
        }
        self.key == "Insert" && (self.ctrl ^ self.shift) && !self.meta && !self.alt
    }
}

/// What the host should do with a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Deliver this input to the remote session and suppress the default.
    Send(ResolvedInput),
    /// Leave the event to the host (clipboard shortcuts, caret movement
    /// inside a non-empty proxy buffer).
    PassThrough,
    /// Second Escape of a double press: toggle local capture, send nothing.
    ToggleCapture,
    /// Not a key the terminal cares about.
    Ignored,
}

/// Stateful key mapper.  The only state is the double-Escape timer.
#[derive(Debug, Clone, Default)]
pub struct KeyMapper {
    escape: DoubleEscapeDetector,
}

impl KeyMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mapper with a custom double-Escape window.
    pub fn with_escape_window(window: Duration) -> Self {
        Self {
            escape: DoubleEscapeDetector::new(window),
        }
    }

    /// Maps one key press.
    ///
    /// `proxy_buffer_empty` tells the mapper whether the composition proxy
    /// holds uncommitted text; arrow keys then move the proxy's caret instead
    /// of the terminal's cursor.
    pub fn map(&mut self, press: &KeyPress, proxy_buffer_empty: bool, now: Instant) -> KeyAction {
        let action = self.resolve(press, proxy_buffer_empty, now);

        // A pair of Escapes must be adjacent; anything delivered in between
        // breaks the pair.
        if let KeyAction::Send(ref input) = action {
            if input.as_key() != Some(SpecialKeyToken::Escape) {
                self.escape.reset();
            }
        }

        debug!(key = %press.key, action = %describe_action(&action), "key mapped");
        action
    }

    fn resolve(&mut self, press: &KeyPress, proxy_buffer_empty: bool, now: Instant) -> KeyAction {
        // Rule 1: platform shortcuts.
        if press.is_clipboard_shortcut() || press.meta {
            return KeyAction::PassThrough;
        }

        let key = press.key.as_str();

        // Rule 2: Alt word motion.
        if press.alt && !press.ctrl && !press.shift {
            let sequence = match key {
                "ArrowLeft" => Some(control::WORD_BACKWARD),
                "ArrowRight" => Some(control::WORD_FORWARD),
                "Backspace" => Some(control::DELETE_WORD_BACKWARD),
                _ => None,
            };
            if let Some(seq) = sequence {
                return KeyAction::Send(ResolvedInput::Text(seq.to_string()));
            }
        }

        // Rule 3: Enter.
        if key == "Enter" {
            let token = if press.ctrl {
                SpecialKeyToken::CtrlEnter
            } else if press.shift {
                SpecialKeyToken::ShiftEnter
            } else {
                SpecialKeyToken::Enter
            };
            return KeyAction::Send(ResolvedInput::Key(token));
        }

        // Rule 4: Escape.
        if key == "Escape" {
            if press.is_unmodified() && self.escape.register(now) == EscapePress::Double {
                return KeyAction::ToggleCapture;
            }
            return KeyAction::Send(ResolvedInput::Key(SpecialKeyToken::Escape));
        }

        // Rule 5: navigation and editing keys.
        if let Some(action) = navigation_action(press, proxy_buffer_empty) {
            return action;
        }

        // Rule 6: Ctrl + lowercase letter.
        if press.ctrl && !press.alt {
            if let Some(code) = control::single_printable(key).and_then(control::ctrl_letter_code) {
                return KeyAction::Send(ResolvedInput::Text(code.to_string()));
            }
        }

        // Rule 7: literal printable character. AltGr arrives as Ctrl+Alt.
        if !press.ctrl || press.alt {
            if let Some(ch) = control::single_printable(key) {
                return KeyAction::Send(ResolvedInput::Text(ch.to_string()));
            }
        }

        // Rule 8.
        KeyAction::Ignored
    }
}

fn navigation_action(press: &KeyPress, proxy_buffer_empty: bool) -> Option<KeyAction> {
    let token = match press.key.as_str() {
        "ArrowUp" | "ArrowDown" | "ArrowLeft" | "ArrowRight" if !proxy_buffer_empty => {
            return Some(KeyAction::PassThrough);
        }
        "ArrowUp" => SpecialKeyToken::ArrowUp,
        "ArrowDown" => SpecialKeyToken::ArrowDown,
        "ArrowLeft" => SpecialKeyToken::ArrowLeft,
        "ArrowRight" => SpecialKeyToken::ArrowRight,
        "Tab" if press.shift => SpecialKeyToken::ShiftTab,
        "Tab" => SpecialKeyToken::Tab,
        "Backspace" => SpecialKeyToken::Backspace,
        "Delete" => SpecialKeyToken::Delete,
        "PageUp" => SpecialKeyToken::PageUp,
        "PageDown" => SpecialKeyToken::PageDown,
        "Home" => SpecialKeyToken::Home,
        "End" => SpecialKeyToken::End,
        " " => return Some(KeyAction::Send(ResolvedInput::Text(" ".to_string()))),
        other => SpecialKeyToken::function_key(control::parse_function_key(other)?)?,
    };
    Some(KeyAction::Send(ResolvedInput::Key(token)))
}

/// Log-safe summary of a [`KeyAction`]; never includes typed text.
fn describe_action(action: &KeyAction) -> String {
    match action {
        KeyAction::Send(input) => format!("send {}", input.describe()),
        KeyAction::PassThrough => "pass-through".to_string(),
        KeyAction::ToggleCapture => "toggle-capture".to_string(),
        KeyAction::Ignored => "ignored".to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
