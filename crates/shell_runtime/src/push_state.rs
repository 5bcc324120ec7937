//! Single-writer push token and permission state.
//!
//! One instance is created at process start, updated only through the
//! capability facade's registration results, and read by the bridge. No other
//! component writes to it.

use std::cell::RefCell;

use shell_host::{NotificationPermissionState, PushRegistration};

/// Point-in-time view of the push token and permission posture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PushTokenSnapshot {
    /// Current device push token, when one is held.
    pub token: Option<String>,
    /// Last observed permission posture.
    pub permission: NotificationPermissionState,
}

/// Owned, single-writer holder of the current push registration state.
#[derive(Debug, Default)]
pub struct PushTokenState {
    inner: RefCell<PushTokenSnapshot>,
}

impl PushTokenState {
    /// Creates empty state: no token, permission unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> PushTokenSnapshot {
        self.inner.borrow().clone()
    }

    /// Applies a registration result, returning whether anything changed.
    ///
    /// The change flag drives the bridge's state-change push; redundant
    /// registrations produce no extra sends.
    pub fn apply_registration(&self, registration: PushRegistration) -> bool {
        let next = PushTokenSnapshot {
            token: registration.token,
            permission: registration.status,
        };
        let mut current = self.inner.borrow_mut();
        if *current == next {
            return false;
        }
        *current = next;
        true
    }
}
