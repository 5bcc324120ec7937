//! Core state machines for the Vibz shell: deep-link resolution, deferred-link
//! persistence, the surface message bridge, and single-writer push-token state.
//!
//! Everything in this crate is host-agnostic. Native capabilities arrive through
//! the `shell_host` traits, the embedded surface through [`bridge::BridgeTransport`],
//! so the whole runtime runs against in-memory fakes in tests.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod bridge;
pub mod deferred;
pub mod model;
pub mod notifications;
pub mod push_state;
pub mod resolver;
pub mod route;
pub mod session;

pub use bridge::{
    BridgeCommand, BridgeDriver, BridgeFuture, BridgeSession, BridgeTransport, InboundMessage,
    MemoryBridgeTransport, OutboundMessage,
};
pub use deferred::{DeferredLinkStore, DEFERRED_LINK_KEY, FIRST_LAUNCH_HANDLED_KEY};
pub use model::{
    LinkCandidate, LinkSource, ResolvedNavigation, CUSTOM_SCHEME, EDITOR_BASE_URL,
    HANDLED_DOMAINS, MESSAGE_BASE_URL,
};
pub use notifications::navigation_url_from_notification;
pub use push_state::{PushTokenSnapshot, PushTokenState};
pub use resolver::{
    classify_incoming_url, decide_attribution, normalize_deep_link_value, DeepLinkResolver,
};
pub use route::internal_route;
pub use session::{NavigationSink, RecordingNavigationSink, ShellSession};
