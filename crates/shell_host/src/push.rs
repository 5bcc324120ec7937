//! Push-registration contracts: permission state, token acquisition, and adapters.

use std::{future::Future, pin::Pin};

use serde::{Deserialize, Serialize};

/// Object-safe boxed future used by [`PushRegistrationService`].
pub type PushFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Notification permission posture reported by the host.
///
/// Transitions are driven only by explicit permission checks/requests or
/// app-foreground re-checks, never inferred from other signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermissionState {
    /// No permission check has completed yet.
    #[default]
    Unknown,
    /// The host or device cannot deliver push notifications at all.
    Unavailable,
    /// The user denied notification permission.
    Denied,
    /// The user granted notification permission.
    Granted,
    /// A permission check or token fetch failed unexpectedly.
    Error,
}

impl NotificationPermissionState {
    /// Returns the stable wire token for this state.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Unavailable => "unavailable",
            Self::Denied => "denied",
            Self::Granted => "granted",
            Self::Error => "error",
        }
    }
}

/// Result of a push-registration attempt.
///
/// A `None` token with a non-granted status is a normal outcome, not an error;
/// the bridge still conveys the status to the hosted page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PushRegistration {
    /// Device push token, when one could be acquired.
    pub token: Option<String>,
    /// Permission posture observed during acquisition.
    pub status: NotificationPermissionState,
}

impl PushRegistration {
    /// Registration for hosts without push support.
    pub const fn unavailable() -> Self {
        Self {
            token: None,
            status: NotificationPermissionState::Unavailable,
        }
    }
}

/// Host service that acquires notification permission and a push token.
///
/// Implementations fail soft: any underlying failure is folded into the
/// returned [`PushRegistration`] status rather than surfaced as an error.
pub trait PushRegistrationService {
    /// Checks (and requests, when needed) notification permission and fetches
    /// the current push token.
    fn acquire<'a>(&'a self) -> PushFuture<'a, PushRegistration>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op push-registration service for hosts without push support.
pub struct NoopPushRegistrationService;

impl PushRegistrationService for NoopPushRegistrationService {
    fn acquire<'a>(&'a self) -> PushFuture<'a, PushRegistration> {
        Box::pin(async { PushRegistration::unavailable() })
    }
}

#[derive(Debug, Clone, Default)]
/// Push-registration service that returns a fixed registration, for tests.
pub struct StaticPushRegistrationService {
    registration: PushRegistration,
}

impl StaticPushRegistrationService {
    /// Creates a service that always reports `registration`.
    pub fn new(registration: PushRegistration) -> Self {
        Self { registration }
    }

    /// Creates a granted registration with the given token.
    pub fn granted(token: impl Into<String>) -> Self {
        Self::new(PushRegistration {
            token: Some(token.into()),
            status: NotificationPermissionState::Granted,
        })
    }
}

impl PushRegistrationService for StaticPushRegistrationService {
    fn acquire<'a>(&'a self) -> PushFuture<'a, PushRegistration> {
        Box::pin(async move { self.registration.clone() })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn noop_service_reports_unavailable_without_token() {
        let service = NoopPushRegistrationService;
        let registration = block_on(service.acquire());
        assert_eq!(registration.token, None);
        assert_eq!(
            registration.status,
            NotificationPermissionState::Unavailable
        );
    }

    #[test]
    fn static_service_returns_configured_registration() {
        let service = StaticPushRegistrationService::granted("ExponentPushToken[abc]");
        let registration = block_on(service.acquire());
        assert_eq!(
            registration.token.as_deref(),
            Some("ExponentPushToken[abc]")
        );
        assert_eq!(registration.status, NotificationPermissionState::Granted);
    }

    #[test]
    fn permission_state_serializes_to_lowercase_wire_tokens() {
        for (state, expected) in [
            (NotificationPermissionState::Unknown, "\"unknown\""),
            (NotificationPermissionState::Unavailable, "\"unavailable\""),
            (NotificationPermissionState::Denied, "\"denied\""),
            (NotificationPermissionState::Granted, "\"granted\""),
            (NotificationPermissionState::Error, "\"error\""),
        ] {
            assert_eq!(serde_json::to_string(&state).expect("serialize"), expected);
            assert_eq!(state.as_str(), expected.trim_matches('"'));
        }
    }
}
