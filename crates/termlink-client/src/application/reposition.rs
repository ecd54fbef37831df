//! Position refresher: re-anchors the proxy after successful sends.
//!
//! After a send succeeds while the proxy has focus, the proxy is moved once
//! immediately and once more a short delay later, once the remote cursor
//! state has had time to come back.  Bursts of sends share one delayed
//! reposition: each success pushes the single pending deadline out.

use std::time::{Duration, Instant};

use crate::domain::Anchor;

/// Font size used when the terminal does not report one.
pub const DEFAULT_FONT_SIZE_PX: f32 = 14.0;

/// Optional capabilities the hosting terminal may expose.
///
/// Both methods default to `None`; a terminal overrides what it supports.
pub trait TerminalCapabilities: Send + Sync {
    /// Cursor cell position `(column, row)`.
    fn cursor_info(&self) -> Option<(u16, u16)> {
        None
    }

    fn font_size(&self) -> Option<f32> {
        None
    }
}

/// A terminal that reports no capabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapabilities;

impl TerminalCapabilities for NoCapabilities {}

/// Where and how to draw the proxy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxyPlacement {
    pub left_px: u32,
    pub bottom_px: u32,
    pub font_size_px: f32,
    /// Terminal cursor cell at the time of placement, if reported.  A hint
    /// for the surface; the pixel anchor above is authoritative.
    pub cursor_cell: Option<(u16, u16)>,
}

/// Placement for the proxy: the fixed anchor, with the terminal's font size
/// and cursor cell if it reports them.
pub fn placement(anchor: Anchor, capabilities: &dyn TerminalCapabilities) -> ProxyPlacement {
    ProxyPlacement {
        left_px: anchor.left_px,
        bottom_px: anchor.bottom_px,
        cursor_cell: capabilities.cursor_info(),
        font_size_px: capabilities
            .font_size()
            .filter(|size| size.is_finite() && *size > 0.0)
            .unwrap_or(DEFAULT_FONT_SIZE_PX),
    }
}

#[derive(Debug)]
pub struct PositionRefresher {
    delay: Duration,
    pending: Option<Instant>,
}

impl PositionRefresher {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Records a successful send.  Returns `true` if the caller should
    /// reposition right now.
    ///
    /// Nothing is scheduled when the proxy is not focused.
    pub fn on_send_succeeded(&mut self, now: Instant, proxy_focused: bool) -> bool {
        if !proxy_focused {
            return false;
        }
        self.pending = Some(now + self.delay);
        true
    }

    /// Returns `true` once when the delayed reposition is due.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(deadline) if now >= deadline => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
