//! Link-resolution models and app identity constants.

use serde::{Deserialize, Serialize};
use shell_host::next_event_ordinal;

/// Custom URL scheme intercepted by the shell.
pub const CUSTOM_SCHEME: &str = "vibzworld";

/// Hostnames the shell intercepts and routes internally instead of deferring to
/// the OS default handler. Matched by exact hostname, no subdomain wildcarding.
pub const HANDLED_DOMAINS: [&str; 3] = [
    "loveappneo.vibz.world",
    "lovenote.vibz.world",
    "openinapp.vibz.world",
];

/// Base URL of the editor surface, used by notification-tap navigation.
pub const EDITOR_BASE_URL: &str = "https://loveappneo.vibz.world";

/// Base URL relative deep-link values are resolved against.
pub const MESSAGE_BASE_URL: &str = "https://lovenote.vibz.world";

/// Origin of one potential navigation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkSource {
    /// URL the OS handed to the process at launch.
    OsInitialLink,
    /// Runtime link event on the custom scheme or a handled domain.
    CustomScheme,
    /// Deferred link delivered by the attribution SDK.
    AttributionDeferred,
}

/// A potential navigation target observed from one link source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    /// Raw value as delivered by the source, before normalization.
    pub raw_value: String,
    /// Which source produced the candidate.
    pub source: LinkSource,
    /// Monotonic observation ordinal. Candidates are ordered by observation,
    /// not wall time, because the attribution callback and the OS initial-link
    /// check race.
    pub observed_at: u64,
}

impl LinkCandidate {
    /// Records a candidate observed now.
    pub fn observe(raw_value: impl Into<String>, source: LinkSource) -> Self {
        Self {
            raw_value: raw_value.into(),
            source,
            observed_at: next_event_ordinal(),
        }
    }
}

/// The single navigation target chosen for one cold start.
///
/// Created at most once per cold start and consumed exactly once: either
/// navigated to (`should_persist` false) or written to the deferred-link store
/// for the next cold start (`should_persist` true, used when the attribution
/// callback lands before first-launch handling has completed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNavigation {
    /// Fully qualified target URL (scheme, host, path).
    pub absolute_url: String,
    /// Whether the value must be persisted for the next cold start instead of
    /// navigated to now.
    pub should_persist: bool,
}

impl ResolvedNavigation {
    /// Target to navigate to immediately.
    pub fn immediate(absolute_url: impl Into<String>) -> Self {
        Self {
            absolute_url: absolute_url.into(),
            should_persist: false,
        }
    }

    /// Target to persist for consumption at the next cold start.
    pub fn deferred(absolute_url: impl Into<String>) -> Self {
        Self {
            absolute_url: absolute_url.into(),
            should_persist: true,
        }
    }
}
