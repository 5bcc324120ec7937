//! Process-session wiring between event sources, the resolver, and the bridge.
//!
//! A [`ShellSession`] owns the subscriptions registered against the host event
//! sources for the lifetime of the process and releases them on teardown, so a
//! re-initialized session never receives duplicate deliveries.

use std::{cell::RefCell, rc::Rc};

use futures::executor::block_on;
use serde_json::Value;
use shell_host::{
    AttributionEventSource, LinkEventSource, NotificationEventSource, Subscription,
};

use crate::bridge::BridgeDriver;
use crate::notifications::navigation_url_from_notification;
use crate::resolver::DeepLinkResolver;

/// Sink receiving the absolute URLs the session decides to navigate to.
pub trait NavigationSink {
    /// Loads `absolute_url` into the embedded surface.
    fn navigate(&self, absolute_url: &str);
}

#[derive(Debug, Clone, Default)]
/// Navigation sink that records targets, for tests and headless hosts.
pub struct RecordingNavigationSink {
    targets: Rc<RefCell<Vec<String>>>,
}

impl RecordingNavigationSink {
    /// Targets navigated to so far, in order.
    pub fn navigated(&self) -> Vec<String> {
        self.targets.borrow().clone()
    }
}

impl NavigationSink for RecordingNavigationSink {
    fn navigate(&self, absolute_url: &str) {
        self.targets.borrow_mut().push(absolute_url.to_string());
    }
}

/// Event wiring for one process session.
pub struct ShellSession {
    resolver: Rc<DeepLinkResolver>,
    driver: Rc<BridgeDriver>,
    navigator: Rc<dyn NavigationSink>,
    subscriptions: Vec<Subscription>,
}

impl ShellSession {
    /// Creates a session over the resolver, bridge driver, and navigation sink.
    pub fn new(
        resolver: Rc<DeepLinkResolver>,
        driver: Rc<BridgeDriver>,
        navigator: Rc<dyn NavigationSink>,
    ) -> Self {
        Self {
            resolver,
            driver,
            navigator,
            subscriptions: Vec::new(),
        }
    }

    /// Subscribes to runtime link events (custom scheme and handled domains).
    ///
    /// Every matching event navigates; there is no first-launch gating after
    /// cold start.
    pub fn attach_link_source(&mut self, source: &dyn LinkEventSource) {
        let resolver = Rc::clone(&self.resolver);
        let navigator = Rc::clone(&self.navigator);
        self.subscriptions.push(source.subscribe(Rc::new(move |url| {
            if let Some(navigation) = resolver.handle_runtime_link(url) {
                navigator.navigate(&navigation.absolute_url);
            }
        })));
    }

    /// Subscribes to both attribution callback shapes.
    pub fn attach_attribution_source(&mut self, source: &dyn AttributionEventSource) {
        let resolver = Rc::clone(&self.resolver);
        let navigator = Rc::clone(&self.navigator);
        self.subscriptions
            .push(source.subscribe_deep_link(Rc::new(move |payload| {
                if let Some(navigation) = block_on(resolver.handle_attribution_deep_link(payload)) {
                    navigator.navigate(&navigation.absolute_url);
                }
            })));

        let resolver = Rc::clone(&self.resolver);
        let navigator = Rc::clone(&self.navigator);
        self.subscriptions
            .push(source.subscribe_install_conversion(Rc::new(move |payload| {
                if let Some(navigation) = block_on(resolver.handle_install_conversion(payload)) {
                    navigator.navigate(&navigation.absolute_url);
                }
            })));
    }

    /// Subscribes to notification-tap responses.
    ///
    /// A ready surface receives the tap data over the bridge; before readiness
    /// the shell navigates directly to the mapped target instead.
    pub fn attach_notification_source(&mut self, source: &dyn NotificationEventSource) {
        let driver = Rc::clone(&self.driver);
        let navigator = Rc::clone(&self.navigator);
        self.subscriptions
            .push(source.subscribe_response(Rc::new(move |data: &Value| {
                if driver.is_ready() {
                    block_on(driver.on_notification_response(data.clone()));
                } else if let Some(url) = navigation_url_from_notification(data) {
                    navigator.navigate(&url);
                }
            })));
    }

    /// Releases every registration now instead of at drop time.
    pub fn shutdown(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use shell_host::{
        MemoryAttributionEvents, MemoryLinkEvents, MemoryNotificationEvents, MemoryPrefsStore,
        NoopShareService, StaticSocialLoginService,
    };

    use super::*;
    use crate::bridge::{MemoryBridgeTransport, OutboundMessage};
    use crate::deferred::DeferredLinkStore;
    use crate::push_state::PushTokenState;

    struct Fixture {
        session: ShellSession,
        navigator: RecordingNavigationSink,
        transport: MemoryBridgeTransport,
        driver: Rc<BridgeDriver>,
        prefs: MemoryPrefsStore,
    }

    fn fixture() -> Fixture {
        let prefs = MemoryPrefsStore::default();
        let resolver = Rc::new(DeepLinkResolver::new(DeferredLinkStore::new(Rc::new(
            prefs.clone(),
        ))));
        let transport = MemoryBridgeTransport::default();
        let driver = Rc::new(BridgeDriver::new(
            Rc::new(PushTokenState::new()),
            Rc::new(transport.clone()),
            Rc::new(NoopShareService),
            Rc::new(StaticSocialLoginService::default()),
        ));
        let navigator = RecordingNavigationSink::default();
        let session = ShellSession::new(
            resolver,
            Rc::clone(&driver),
            Rc::new(navigator.clone()),
        );
        Fixture {
            session,
            navigator,
            transport,
            driver,
            prefs,
        }
    }

    #[test]
    fn runtime_link_events_navigate_on_every_match() {
        let mut fixture = fixture();
        let links = MemoryLinkEvents::default();
        fixture.session.attach_link_source(&links);

        links.emit("https://openinapp.vibz.world/a");
        links.emit("https://example.com/ignored");
        links.emit("vibzworld://open?url=https%3A%2F%2Flovenote.vibz.world%2Fb");

        assert_eq!(
            fixture.navigator.navigated(),
            vec![
                "https://openinapp.vibz.world/a".to_string(),
                "https://lovenote.vibz.world/b".to_string(),
            ]
        );
    }

    #[test]
    fn attribution_events_defer_on_first_launch_and_navigate_afterwards() {
        let mut fixture = fixture();
        let attribution = MemoryAttributionEvents::default();
        fixture.session.attach_attribution_source(&attribution);

        let payload = serde_json::from_value(json!({ "deep_link_value": "/shared/abc" }))
            .expect("payload");
        attribution.emit_deep_link(&payload);
        assert_eq!(fixture.navigator.navigated(), Vec::<String>::new());
        assert_eq!(
            futures::executor::block_on(
                DeferredLinkStore::new(Rc::new(fixture.prefs.clone())).get()
            ),
            Some("https://lovenote.vibz.world/shared/abc".to_string())
        );

        // First launch is now handled; the next callback navigates directly.
        attribution.emit_deep_link(&payload);
        assert_eq!(
            fixture.navigator.navigated(),
            vec!["https://lovenote.vibz.world/shared/abc".to_string()]
        );
    }

    #[test]
    fn notification_taps_forward_when_ready_and_navigate_when_not() {
        let mut fixture = fixture();
        let notifications = MemoryNotificationEvents::default();
        fixture.session.attach_notification_source(&notifications);
        let data = json!({ "type": "message_accepted", "shareId": "xyz" });

        notifications.emit_response(&data);
        assert_eq!(
            fixture.navigator.navigated(),
            vec!["https://lovenote.vibz.world/xyz".to_string()]
        );

        futures::executor::block_on(
            fixture
                .driver
                .on_surface_message(&json!({ "type": "webViewReady" }).to_string()),
        );
        notifications.emit_response(&data);

        assert_eq!(
            fixture.transport.posted().last(),
            Some(&OutboundMessage::NotificationTapped { data }),
        );
        assert_eq!(fixture.navigator.navigated().len(), 1, "no second direct navigation");
    }

    #[test]
    fn shutdown_releases_every_registration() {
        let mut fixture = fixture();
        let links = MemoryLinkEvents::default();
        fixture.session.attach_link_source(&links);
        assert_eq!(links.subscriber_count(), 1);

        fixture.session.shutdown();
        assert_eq!(links.subscriber_count(), 0);

        links.emit("https://openinapp.vibz.world/late");
        assert_eq!(fixture.navigator.navigated(), Vec::<String>::new());
    }
}
