//! Double-Escape detection.
//!
//! Two unmodified Escape presses in quick succession release (or re-take)
//! local keyboard capture instead of reaching the remote terminal.  A single
//! Escape must still reach the terminal immediately, so the first press is
//! always forwarded and only the second one is swallowed.

use std::time::{Duration, Instant};

/// Maximum gap between two Escape presses that still counts as a double press.
pub const DOUBLE_ESCAPE_WINDOW: Duration = Duration::from_millis(500);

/// Classification of one unmodified Escape press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapePress {
    /// Forward to the terminal; the timestamp has been recorded.
    Single,
    /// Second press inside the window; the timer has been reset.
    Double,
}

/// Remembers the last unmodified Escape and classifies the next one.
#[derive(Debug, Clone)]
pub struct DoubleEscapeDetector {
    window: Duration,
    last_escape: Option<Instant>,
}

impl DoubleEscapeDetector {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_escape: None,
        }
    }

    /// Registers an unmodified Escape press at `now`.
    pub fn register(&mut self, now: Instant) -> EscapePress {
        match self.last_escape {
            Some(prev) if now.saturating_duration_since(prev) <= self.window => {
                // Clearing here means a third rapid press starts a new pair
                // instead of toggling again.
                self.last_escape = None;
                EscapePress::Double
            }
            _ => {
                self.last_escape = Some(now);
                EscapePress::Single
            }
        }
    }

    /// Forgets any recorded press.
    pub fn reset(&mut self) {
        self.last_escape = None;
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for DoubleEscapeDetector {
    fn default() -> Self {
        Self::new(DOUBLE_ESCAPE_WINDOW)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
