//! Host service bundle and capability posture shared across shell compositions.

use std::rc::Rc;

use crate::{PrefsStore, PushRegistrationService, ShareService, SocialLoginService};

/// Stable host strategy selected for the current build/runtime composition path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStrategy {
    /// Tauri-hosted shell composition.
    Tauri,
    /// Composition with placeholder/no-op native adapters.
    Stub,
}

impl HostStrategy {
    /// Returns a stable string token for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tauri => "tauri",
            Self::Stub => "stub",
        }
    }
}

/// Host availability state for one optional capability domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityStatus {
    /// Capability is available for use.
    Available,
    /// Capability is not implemented or not supported on the active host.
    Unavailable,
    /// Capability exists but needs an explicit user permission grant first.
    RequiresUserActivation,
}

impl CapabilityStatus {
    /// Returns whether the capability can be used immediately.
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Host availability snapshot for the capability domains the bridge exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Push token acquisition and delivery.
    pub push_notifications: CapabilityStatus,
    /// Native share sheet.
    pub share: CapabilityStatus,
    /// Native social-login flow.
    pub social_login: CapabilityStatus,
    /// OS deep-link interception.
    pub deep_links: CapabilityStatus,
}

impl HostCapabilities {
    /// Tauri host capability posture.
    pub const fn tauri() -> Self {
        Self {
            push_notifications: CapabilityStatus::RequiresUserActivation,
            share: CapabilityStatus::Available,
            social_login: CapabilityStatus::Unavailable,
            deep_links: CapabilityStatus::Available,
        }
    }

    /// Stub capability posture with everything unavailable.
    pub const fn stub() -> Self {
        Self {
            push_notifications: CapabilityStatus::Unavailable,
            share: CapabilityStatus::Unavailable,
            social_login: CapabilityStatus::Unavailable,
            deep_links: CapabilityStatus::Unavailable,
        }
    }
}

/// Runtime-selected host service bundle injected into the shell runtime.
///
/// All environment-specific adapter selection happens before this bundle
/// crosses into `shell_runtime`, which keeps the runtime decoupled from host
/// adapter details.
#[derive(Clone)]
pub struct HostServices {
    /// Persisted key-value store for deferred-link state.
    pub prefs: Rc<dyn PrefsStore>,
    /// Push permission/token acquisition service.
    pub push_registration: Rc<dyn PushRegistrationService>,
    /// Native share-sheet service.
    pub share: Rc<dyn ShareService>,
    /// Native social-login service.
    pub social_login: Rc<dyn SocialLoginService>,
    /// Host availability snapshot for optional capability domains.
    pub capabilities: HostCapabilities,
    /// Stable strategy identifier for diagnostics.
    pub host_strategy: HostStrategy,
}

impl HostServices {
    /// Bundle of no-op adapters with the stub capability posture.
    pub fn stub() -> Self {
        Self {
            prefs: Rc::new(crate::NoopPrefsStore),
            push_registration: Rc::new(crate::NoopPushRegistrationService),
            share: Rc::new(crate::NoopShareService),
            social_login: Rc::new(crate::NoopSocialLoginService),
            capabilities: HostCapabilities::stub(),
            host_strategy: HostStrategy::Stub,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::NotificationPermissionState;

    #[test]
    fn stub_bundle_has_everything_unavailable_but_functional() {
        let services = HostServices::stub();
        assert_eq!(services.host_strategy.as_str(), "stub");
        assert!(!services.capabilities.push_notifications.is_available());
        assert!(!services.capabilities.share.is_available());

        let registration = block_on(services.push_registration.acquire());
        assert_eq!(
            registration.status,
            NotificationPermissionState::Unavailable
        );
    }
}
