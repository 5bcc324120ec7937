//! Typed host-capability contracts and shared models for the Vibz shell runtime.
//!
//! This crate is the API-first boundary toward native capabilities. It exposes the
//! push-registration, share, and social-login facade traits, the key-value preference
//! store that backs deferred deep-link persistence, and the event-source subscription
//! seams, while concrete adapters live in `shell_tauri`. Every service ships a `Noop`
//! adapter for unsupported hosts and an in-memory adapter for tests.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod events;
pub mod host;
pub mod login;
pub mod push;
pub mod share;
pub mod storage;
pub mod time;

pub use events::{
    AttributionEventSource, AttributionHandler, AttributionPayload, LinkEventSource, LinkHandler,
    MemoryAttributionEvents, MemoryLinkEvents, MemoryNotificationEvents, NotificationEventSource,
    NotificationResponseHandler, Subscription,
};
pub use host::{CapabilityStatus, HostCapabilities, HostServices, HostStrategy};
pub use login::{
    LoginFuture, LoginOutcome, NoopSocialLoginService, SocialLoginService,
    StaticSocialLoginService,
};
pub use push::{
    NoopPushRegistrationService, NotificationPermissionState, PushFuture, PushRegistration,
    PushRegistrationService, StaticPushRegistrationService,
};
pub use share::{
    NoopShareService, RecordingShareService, ShareFuture, ShareOutcome, ShareRequest, ShareService,
};
pub use storage::{MemoryPrefsStore, NoopPrefsStore, PrefsStore, PrefsStoreFuture};
pub use time::{next_event_ordinal, unix_time_ms_now};
