//! Focus/visibility coordinator for the composition proxy.
//!
//! The proxy has two presentation states:
//!
//! - `Hidden`: low prominence, but still focusable and still receiving
//!   input.
//! - `Visible`: shown at its anchor so the IME candidate window has a stable
//!   place to attach to.
//!
//! Transitions:
//!
//! ```text
//! focus ──────────────► Visible   (cancels a pending hide)
//! composition start ──► Visible   (regardless of focus)
//! blur ───────────────► hide deadline = now + grace
//! deadline reached ───► Hidden    if still unfocused and not composing
//! composition end ────► hide deadline re-armed if unfocused
//! ```
//!
//! The proxy is pinned to a fixed [`Anchor`] rather than following the
//! terminal caret.  Caret positions reported by the host are stored but do
//! not move the proxy.
//!
//! All methods take `now` explicitly; the coordinator never reads a clock.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::{Anchor, SignalWriter};

/// Presentation state of the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Hidden,
    Visible,
}

/// A caret position reported by the terminal, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretPosition {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug)]
pub struct FocusCoordinator {
    focused: SignalWriter,
    visibility: Visibility,
    grace: Duration,
    hide_deadline: Option<Instant>,
    anchor: Anchor,
    caret_hint: Option<CaretPosition>,
}

impl FocusCoordinator {
    /// Creates a coordinator that owns the `input-focused` flag writer.
    pub fn new(focused: SignalWriter, grace: Duration, anchor: Anchor) -> Self {
        focused.set(false);
        Self {
            focused,
            visibility: Visibility::Hidden,
            grace,
            hide_deadline: None,
            anchor,
            caret_hint: None,
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_focused(&self) -> bool {
        self.focused.get()
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Last caret position reported by the host, if any.
    pub fn caret_hint(&self) -> Option<CaretPosition> {
        self.caret_hint
    }

    pub fn set_caret_hint(&mut self, position: CaretPosition) {
        self.caret_hint = Some(position);
    }

    /// When [`FocusCoordinator::poll`] next has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.hide_deadline
    }

    /// Returns the new visibility if it changed.
    pub fn on_focus(&mut self) -> Option<Visibility> {
        self.focused.set(true);
        self.hide_deadline = None;
        self.show()
    }

    pub fn on_blur(&mut self, now: Instant) {
        self.focused.set(false);
        self.hide_deadline = Some(now + self.grace);
    }

    /// Forces the proxy visible so the candidate window is never lost
    /// mid-composition.  Returns the new visibility if it changed.
    pub fn on_composition_start(&mut self) -> Option<Visibility> {
        self.show()
    }

    /// A composition that outlived the blur grace kept the proxy visible;
    /// give it a fresh grace period now that it is over.
    pub fn on_composition_end(&mut self, now: Instant) {
        if !self.is_focused() && self.visibility == Visibility::Visible {
            self.hide_deadline = Some(now + self.grace);
        }
    }

    /// Fires the hide deadline if it has passed.  Returns the new visibility
    /// if it changed.
    pub fn poll(&mut self, now: Instant, composing: bool) -> Option<Visibility> {
        let deadline = self.hide_deadline?;
        if now < deadline {
            return None;
        }
        self.hide_deadline = None;

        if self.is_focused() || composing || self.visibility == Visibility::Hidden {
            return None;
        }
        self.visibility = Visibility::Hidden;
        debug!("composition proxy hidden after blur grace");
        Some(Visibility::Hidden)
    }

    /// Drops any pending deadline and unfocuses (session teardown).
    pub fn reset(&mut self) {
        self.hide_deadline = None;
        self.focused.set(false);
        self.visibility = Visibility::Hidden;
    }

    fn show(&mut self) -> Option<Visibility> {
        if self.visibility == Visibility::Visible {
            return None;
        }
        self.visibility = Visibility::Visible;
        Some(Visibility::Visible)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
