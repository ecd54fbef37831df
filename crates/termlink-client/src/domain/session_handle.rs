//! Shared handle to the session the input path is feeding.
//!
//! The event loop and every in-flight delivery task hold a clone.  Teardown
//! calls [`SessionHandle::release`], which empties the slot: deliveries that
//! complete afterwards find no session and do nothing.

use std::sync::{Arc, Mutex, MutexGuard};

use termlink_core::{Session, SessionId, SessionStatus};

#[derive(Debug, Clone)]
pub struct SessionHandle {
    slot: Arc<Mutex<Option<Session>>>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(session))),
        }
    }

    // A poisoned lock only means another task panicked mid-update; the
    // session value itself is always in a valid state.
    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// `None` once released.
    pub fn id(&self) -> Option<SessionId> {
        self.lock().as_ref().map(|s| s.id.clone())
    }

    /// `None` once released.
    pub fn status(&self) -> Option<SessionStatus> {
        self.lock().as_ref().map(Session::status)
    }

    /// `false` once the session has exited or been released.
    pub fn accepts_input(&self) -> bool {
        self.lock().as_ref().is_some_and(Session::accepts_input)
    }

    /// See [`Session::activate`].  `false` if released.
    pub fn activate(&self) -> bool {
        self.lock().as_mut().is_some_and(Session::activate)
    }

    /// See [`Session::mark_exited`].  `false` if released, so a completion
    /// arriving after teardown never fires the exit side effects.
    pub fn mark_exited(&self) -> bool {
        self.lock().as_mut().is_some_and(Session::mark_exited)
    }

    /// Drops the session.  Returns `true` if there was one to drop.
    pub fn release(&self) -> bool {
        self.lock().take().is_some()
    }

    pub fn is_released(&self) -> bool {
        self.lock().is_none()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
