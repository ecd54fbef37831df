//! Shared `composing` / `input-focused` flags.
//!
//! Two components own a flag each: the composition tracker sets `composing`
//! and the focus coordinator sets `input-focused`.  Everything else (the
//! delivery layer, host integrations, tests) gets a cloneable, read-only
//! [`CompositionSignals`] view.
//!
//! The split is enforced by the types: [`SignalWriter`] is not `Clone`, and
//! [`CompositionSignals::new`] hands out exactly one writer per flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Read-only view of both flags.
#[derive(Debug, Clone)]
pub struct CompositionSignals {
    composing: Arc<AtomicBool>,
    input_focused: Arc<AtomicBool>,
}

/// The single writer of one flag.
#[derive(Debug)]
pub struct SignalWriter {
    flag: Arc<AtomicBool>,
}

impl CompositionSignals {
    /// Creates both flags (initially `false`).
    ///
    /// Returns the read view, the `composing` writer, and the
    /// `input-focused` writer, in that order.
    pub fn new() -> (Self, SignalWriter, SignalWriter) {
        let composing = Arc::new(AtomicBool::new(false));
        let input_focused = Arc::new(AtomicBool::new(false));
        let view = Self {
            composing: Arc::clone(&composing),
            input_focused: Arc::clone(&input_focused),
        };
        (
            view,
            SignalWriter { flag: composing },
            SignalWriter {
                flag: input_focused,
            },
        )
    }

    pub fn is_composing(&self) -> bool {
        self.composing.load(Ordering::Relaxed)
    }

    pub fn is_input_focused(&self) -> bool {
        self.input_focused.load(Ordering::Relaxed)
    }
}

impl SignalWriter {
    pub fn set(&self, value: bool) {
        self.flag.store(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
