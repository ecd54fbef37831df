//! Composition tracker: IME composition, plain proxy input, and paste.
//!
//! The composition proxy is a hidden, focusable text surface that receives
//! composition events on behalf of the terminal view.  This tracker decides
//! what the raw event stream from that surface turns into:
//!
//! ```text
//! compositionstart ─► composing = true
//! compositionupdate(X) ─► buffer = X                  (nothing sent)
//! compositionend(Y) ─► composing = false, buffer = "" ─► Text(Y) if Y != ""
//! input(T), not composing ─► buffer = "" ─► Text(T)
//! input(T), composing ─► buffer += T                  (nothing sent)
//! paste(P) ─► Text(P) if P != "", default paste always suppressed
//! ```
//!
//! While composing, raw keydowns must not reach the key mapper: the IME owns
//! them.  The only exception is the platform clipboard shortcuts, which keep
//! working mid-composition.

use termlink_core::{KeyPress, ResolvedInput};
use tracing::debug;

use crate::domain::SignalWriter;

/// Result of a paste event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteOutcome {
    /// The text to deliver; `None` for an empty clipboard.
    pub input: Option<ResolvedInput>,
    /// Whether the host must cancel its own paste handling.  Always `true`:
    /// the pasted text is delivered exactly once, by us.
    pub suppress_default: bool,
}

/// Tracks composition state and the proxy's text buffer.
#[derive(Debug)]
pub struct CompositionTracker {
    composing: SignalWriter,
    buffer: String,
}

impl CompositionTracker {
    /// Creates a tracker that owns the `composing` flag writer.
    pub fn new(composing: SignalWriter) -> Self {
        composing.set(false);
        Self {
            composing,
            buffer: String::new(),
        }
    }

    pub fn is_composing(&self) -> bool {
        self.composing.get()
    }

    /// Current proxy text (the in-progress composition or mirrored input).
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn buffer_is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Whether a raw keydown should go to the key mapper.
    pub fn should_forward_keydown(&self, press: &KeyPress) -> bool {
        !self.is_composing() || press.is_clipboard_shortcut()
    }

    pub fn on_composition_start(&mut self) {
        self.composing.set(true);
        debug!("composition started");
    }

    pub fn on_composition_update(&mut self, data: &str) {
        self.buffer.clear();
        self.buffer.push_str(data);
    }

    /// Ends the composition.  Returns the committed text, if any.
    pub fn on_composition_end(&mut self, text: &str) -> Option<ResolvedInput> {
        self.composing.set(false);
        self.buffer.clear();

        let input = ResolvedInput::text(text);
        if input.is_none() {
            debug!("composition ended with empty text; nothing to send");
        }
        input
    }

    /// Handles text typed into the proxy outside of a key mapping, such as
    /// fast typing that skips keydown.
    ///
    /// While composing the text only mirrors into the buffer; the
    /// composition end carries the final text.
    pub fn on_plain_input(&mut self, text: &str) -> Option<ResolvedInput> {
        if self.is_composing() {
            self.buffer.push_str(text);
            return None;
        }
        self.buffer.clear();
        ResolvedInput::text(text)
    }

    /// Handles a paste, in or out of a composition.
    pub fn on_paste(&mut self, text: &str) -> PasteOutcome {
        if !self.is_composing() {
            self.buffer.clear();
        }
        let input = ResolvedInput::text(text);
        if input.is_none() {
            debug!("paste with empty clipboard; default suppressed, nothing sent");
        }
        PasteOutcome {
            input,
            suppress_default: true,
        }
    }

    /// Clears all state (session teardown).
    pub fn reset(&mut self) {
        self.composing.set(false);
        self.buffer.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
