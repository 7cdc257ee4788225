//! Presence gate: is the authorizing token attached right now?

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use keystack_types::TokenId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    Absent,
    Present(TokenId),
}

/// Outcome of feeding an attach/detach event into the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    ToPresent,
    ToAbsent,
    /// Duplicate event; state and recorded identity are untouched.
    Unchanged,
}

/// Single source of truth for authorization.
///
/// `is_present` is a lone atomic load so callers never queue behind stack
/// traffic. Transitions are serialized by `state`, which is never held while
/// anything else runs.
#[derive(Debug)]
pub struct PresenceGate {
    present: AtomicBool,
    state: Mutex<PresenceState>,
}

impl PresenceGate {
    #[must_use]
    pub fn new() -> Self {
        Self {
            present: AtomicBool::new(false),
            state: Mutex::new(PresenceState::Absent),
        }
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.present.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn state(&self) -> PresenceState {
        *self.state.lock()
    }

    pub fn on_attach(&self, token: TokenId) -> Transition {
        let mut state = self.state.lock();
        if let PresenceState::Present(_) = *state {
            return Transition::Unchanged;
        }
        *state = PresenceState::Present(token);
        self.present.store(true, Ordering::Release);
        Transition::ToPresent
    }

    /// The identity is informational; any detach while present closes the gate.
    pub fn on_detach(&self, _token: TokenId) -> Transition {
        let mut state = self.state.lock();
        if *state == PresenceState::Absent {
            return Transition::Unchanged;
        }
        self.present.store(false, Ordering::Release);
        *state = PresenceState::Absent;
        Transition::ToAbsent
    }
}

impl Default for PresenceGate {
    fn default() -> Self {
        Self::new()
    }
}
