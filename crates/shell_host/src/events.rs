//! Event-source contracts for OS links, attribution callbacks, and notification taps.
//!
//! Listener-heavy native SDKs are modeled as subscribe interfaces returning a
//! disposable [`Subscription`] handle. Registrations are process-lifetime scoped
//! and must be released when their owning component is torn down, so a
//! re-initialized component never receives duplicate deliveries.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Disposable handle for an event-source registration.
///
/// Dropping the handle releases the registration; [`Subscription::dispose`]
/// does the same explicitly at teardown sites.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wraps a release closure invoked exactly once.
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Handle with nothing to release.
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Releases the registration now.
    pub fn dispose(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Handler invoked with each raw URL delivered by a [`LinkEventSource`].
pub type LinkHandler = Rc<dyn Fn(&str)>;

/// Handler invoked with each payload delivered by an [`AttributionEventSource`].
pub type AttributionHandler = Rc<dyn Fn(&AttributionPayload)>;

/// Handler invoked with each notification-response payload.
pub type NotificationResponseHandler = Rc<dyn Fn(&Value)>;

/// Source of OS-level link events (initial launch URL aside, which is polled).
pub trait LinkEventSource {
    /// Registers `handler` for every subsequent link event.
    fn subscribe(&self, handler: LinkHandler) -> Subscription;
}

/// Source of attribution-SDK callbacks.
///
/// The SDK delivers two callback shapes: a direct deep-link callback and an
/// install-conversion-data callback. Both race the OS initial-link check; the
/// resolver arbitrates.
pub trait AttributionEventSource {
    /// Registers `handler` for direct deep-link callbacks.
    fn subscribe_deep_link(&self, handler: AttributionHandler) -> Subscription;

    /// Registers `handler` for install-conversion-data callbacks.
    fn subscribe_install_conversion(&self, handler: AttributionHandler) -> Subscription;
}

/// Source of notification-tap responses.
pub trait NotificationEventSource {
    /// Registers `handler` for each notification the user tapped.
    fn subscribe_response(&self, handler: NotificationResponseHandler) -> Subscription;
}

/// Attribution callback payload.
///
/// Only the link fields and the first-launch marker are interpreted; all other
/// attribution fields are carried opaquely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributionPayload {
    /// Primary deep-link value set by the attribution platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_link_value: Option<String>,
    /// Legacy deep-link fallback field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub af_dp: Option<String>,
    /// First-launch marker; the SDK reports boolean `true` or the string `"true"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_first_launch: Option<Value>,
    /// Remaining attribution fields, uninterpreted.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AttributionPayload {
    /// Extracted link value: `deep_link_value` first, `af_dp` as fallback.
    pub fn link_value(&self) -> Option<&str> {
        self.deep_link_value
            .as_deref()
            .or(self.af_dp.as_deref())
    }

    /// Whether the payload marks an install-conversion first launch.
    pub fn reports_first_launch(&self) -> bool {
        match &self.is_first_launch {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(text)) => text == "true",
            _ => false,
        }
    }
}

type HandlerMap<H> = Rc<RefCell<HashMap<u64, H>>>;

fn register<H: 'static>(handlers: &HandlerMap<H>, next_id: &Cell<u64>, handler: H) -> Subscription {
    let id = next_id.get();
    next_id.set(id + 1);
    handlers.borrow_mut().insert(id, handler);
    let handlers = Rc::clone(handlers);
    Subscription::new(move || {
        handlers.borrow_mut().remove(&id);
    })
}

// Handlers are cloned out before invocation so a handler that subscribes or
// disposes re-entrantly never observes a held borrow.
fn snapshot<H: Clone>(handlers: &HandlerMap<H>) -> Vec<H> {
    handlers.borrow().values().cloned().collect()
}

#[derive(Clone, Default)]
/// In-memory link event source for tests and headless hosts.
pub struct MemoryLinkEvents {
    handlers: HandlerMap<LinkHandler>,
    next_id: Rc<Cell<u64>>,
}

impl MemoryLinkEvents {
    /// Delivers `url` to every live subscriber.
    pub fn emit(&self, url: &str) {
        for handler in snapshot(&self.handlers) {
            handler(url);
        }
    }

    /// Number of live registrations.
    pub fn subscriber_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

impl LinkEventSource for MemoryLinkEvents {
    fn subscribe(&self, handler: LinkHandler) -> Subscription {
        register(&self.handlers, &self.next_id, handler)
    }
}

#[derive(Clone, Default)]
/// In-memory attribution event source for tests and headless hosts.
pub struct MemoryAttributionEvents {
    deep_link: HandlerMap<AttributionHandler>,
    install: HandlerMap<AttributionHandler>,
    next_id: Rc<Cell<u64>>,
}

impl MemoryAttributionEvents {
    /// Delivers a direct deep-link callback.
    pub fn emit_deep_link(&self, payload: &AttributionPayload) {
        for handler in snapshot(&self.deep_link) {
            handler(payload);
        }
    }

    /// Delivers an install-conversion-data callback.
    pub fn emit_install_conversion(&self, payload: &AttributionPayload) {
        for handler in snapshot(&self.install) {
            handler(payload);
        }
    }
}

impl AttributionEventSource for MemoryAttributionEvents {
    fn subscribe_deep_link(&self, handler: AttributionHandler) -> Subscription {
        register(&self.deep_link, &self.next_id, handler)
    }

    fn subscribe_install_conversion(&self, handler: AttributionHandler) -> Subscription {
        register(&self.install, &self.next_id, handler)
    }
}

#[derive(Clone, Default)]
/// In-memory notification event source for tests and headless hosts.
pub struct MemoryNotificationEvents {
    handlers: HandlerMap<NotificationResponseHandler>,
    next_id: Rc<Cell<u64>>,
}

impl MemoryNotificationEvents {
    /// Delivers a notification-response payload to every live subscriber.
    pub fn emit_response(&self, data: &Value) {
        for handler in snapshot(&self.handlers) {
            handler(data);
        }
    }
}

impl NotificationEventSource for MemoryNotificationEvents {
    fn subscribe_response(&self, handler: NotificationResponseHandler) -> Subscription {
        register(&self.handlers, &self.next_id, handler)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn disposed_subscription_stops_delivery() {
        let events = MemoryLinkEvents::default();
        let seen = Rc::new(RefCell::new(Vec::<String>::new()));

        let sink = Rc::clone(&seen);
        let subscription = events.subscribe(Rc::new(move |url: &str| {
            sink.borrow_mut().push(url.to_string());
        }));
        events.emit("vibzworld://open?url=https%3A%2F%2Flovenote.vibz.world%2Fa");
        assert_eq!(events.subscriber_count(), 1);

        subscription.dispose();
        events.emit("https://lovenote.vibz.world/b");

        assert_eq!(
            *seen.borrow(),
            vec!["vibzworld://open?url=https%3A%2F%2Flovenote.vibz.world%2Fa".to_string()]
        );
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test]
    fn dropping_subscription_releases_registration() {
        let events = MemoryLinkEvents::default();
        {
            let _subscription = events.subscribe(Rc::new(|_url: &str| {}));
            assert_eq!(events.subscriber_count(), 1);
        }
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test]
    fn payload_link_value_prefers_deep_link_value_over_af_dp() {
        let payload: AttributionPayload = serde_json::from_value(json!({
            "deep_link_value": "/shared/abc",
            "af_dp": "/legacy/def",
            "campaign": "spring",
        }))
        .expect("payload");
        assert_eq!(payload.link_value(), Some("/shared/abc"));
        assert_eq!(payload.extra.get("campaign"), Some(&json!("spring")));

        let fallback: AttributionPayload =
            serde_json::from_value(json!({ "af_dp": "/legacy/def" })).expect("payload");
        assert_eq!(fallback.link_value(), Some("/legacy/def"));
    }

    #[test]
    fn first_launch_marker_accepts_bool_and_string_forms() {
        let as_bool: AttributionPayload =
            serde_json::from_value(json!({ "is_first_launch": true })).expect("payload");
        assert!(as_bool.reports_first_launch());

        let as_string: AttributionPayload =
            serde_json::from_value(json!({ "is_first_launch": "true" })).expect("payload");
        assert!(as_string.reports_first_launch());

        let negative: AttributionPayload =
            serde_json::from_value(json!({ "is_first_launch": "false" })).expect("payload");
        assert!(!negative.reports_first_launch());

        let absent = AttributionPayload::default();
        assert!(!absent.reports_first_launch());
    }
}
