//! Deep-link arbitration across the three competing link sources.
//!
//! Three sources can produce a navigation target around a cold start: the URL
//! the OS handed to the process, runtime custom-scheme/handled-domain link
//! events, and the attribution SDK's asynchronous callbacks. The resolver
//! reconciles them into at most one [`ResolvedNavigation`] per cold start, and
//! decides when a late attribution value must be parked for the next session
//! instead of navigated to.

use std::cell::Cell;

use shell_host::AttributionPayload;
use tracing::debug;
use url::Url;

use crate::deferred::DeferredLinkStore;
use crate::model::{
    LinkCandidate, LinkSource, ResolvedNavigation, CUSTOM_SCHEME, HANDLED_DOMAINS,
    MESSAGE_BASE_URL,
};

/// Resolves a raw deep-link value to an absolute URL.
///
/// A value already carrying a scheme prefix is used verbatim; a value starting
/// with `/` is appended to the fixed message base host; anything else is
/// appended with a separating `/`.
pub fn normalize_deep_link_value(value: &str) -> String {
    if value.starts_with("http://") || value.starts_with("https://") {
        value.to_string()
    } else if value.starts_with('/') {
        format!("{MESSAGE_BASE_URL}{value}")
    } else {
        format!("{MESSAGE_BASE_URL}/{value}")
    }
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Classifies an incoming URL against the handled link patterns.
///
/// Returns the absolute navigation target when the URL is the custom scheme
/// with a `url` query parameter, an `http`/`https` URL whose hostname exactly
/// matches a handled domain, or any URL carrying an `openUrl` query parameter.
/// Malformed or unmatched URLs yield `None`; nothing is raised to the caller.
pub fn classify_incoming_url(raw: &str) -> Option<String> {
    let parsed = match Url::parse(raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(url = raw, error = %err, "ignoring unparsable link");
            return None;
        }
    };

    if parsed.scheme() == CUSTOM_SCHEME {
        if let Some(target) = query_param(&parsed, "url") {
            return Some(normalize_deep_link_value(&target));
        }
    }

    if matches!(parsed.scheme(), "http" | "https") {
        let host = parsed.host_str().unwrap_or_default();
        if HANDLED_DOMAINS.iter().any(|domain| host == *domain) {
            return Some(parsed.to_string());
        }
    }

    if let Some(target) = query_param(&parsed, "openUrl") {
        return Some(normalize_deep_link_value(&target));
    }

    debug!(url = raw, "link matches no handled pattern");
    None
}

/// Pure arbitration for one attribution callback.
///
/// A payload without a usable link value is discarded. Otherwise the decision
/// depends only on the first-launch flag: not yet handled means the value is
/// parked for the next cold start (`should_persist` true), handled means an
/// immediate navigation.
pub fn decide_attribution(
    payload: &AttributionPayload,
    first_launch_handled: bool,
) -> Option<ResolvedNavigation> {
    let value = payload.link_value()?;
    let absolute = normalize_deep_link_value(value);
    if first_launch_handled {
        Some(ResolvedNavigation::immediate(absolute))
    } else {
        Some(ResolvedNavigation::deferred(absolute))
    }
}

/// Cold-start link arbitration over the deferred-link store.
///
/// Cold-start resolution is terminal: once a candidate has been promoted, later
/// calls to [`DeepLinkResolver::resolve_cold_start`] return `None`. Runtime
/// link events and attribution callbacks remain live for the process lifetime.
pub struct DeepLinkResolver {
    store: DeferredLinkStore,
    cold_start_resolved: Cell<bool>,
}

impl DeepLinkResolver {
    /// Creates a resolver over the deferred-link store.
    pub fn new(store: DeferredLinkStore) -> Self {
        Self {
            store,
            cold_start_resolved: Cell::new(false),
        }
    }

    /// Resolves the cold-start navigation target, if any.
    ///
    /// A previously deferred value wins and is consumed from the store before
    /// the OS initial link is even considered; otherwise the initial link is
    /// classified against the handled patterns. The first resolution from any
    /// source latches the first-launch flag.
    pub async fn resolve_cold_start(&self, initial_link: Option<&str>) -> Option<ResolvedNavigation> {
        if self.cold_start_resolved.get() {
            return None;
        }

        if let Some(stored) = self.store.take().await {
            let candidate = LinkCandidate::observe(stored, LinkSource::AttributionDeferred);
            debug!(
                value = %candidate.raw_value,
                ordinal = candidate.observed_at,
                "consuming deferred deep link"
            );
            return Some(
                self.promote(normalize_deep_link_value(&candidate.raw_value))
                    .await,
            );
        }

        if let Some(raw) = initial_link {
            if let Some(target) = classify_incoming_url(raw) {
                let candidate = LinkCandidate::observe(raw, LinkSource::OsInitialLink);
                debug!(
                    url = %target,
                    ordinal = candidate.observed_at,
                    "resolved initial launch link"
                );
                return Some(self.promote(target).await);
            }
        }

        None
    }

    /// Handles a runtime link event (custom scheme or handled domain).
    ///
    /// Active for the process lifetime, independent of cold-start resolution:
    /// every matching event yields a fresh navigation, with no first-launch
    /// gating.
    pub fn handle_runtime_link(&self, raw: &str) -> Option<ResolvedNavigation> {
        let target = classify_incoming_url(raw)?;
        let candidate = LinkCandidate::observe(raw, LinkSource::CustomScheme);
        debug!(url = %target, ordinal = candidate.observed_at, "resolved runtime link");
        Some(ResolvedNavigation::immediate(target))
    }

    /// Handles a direct attribution deep-link callback.
    ///
    /// Returns a navigation target only when first-launch handling is already
    /// complete; otherwise the value is persisted for the next cold start and
    /// the first-launch flag is latched.
    pub async fn handle_attribution_deep_link(
        &self,
        payload: &AttributionPayload,
    ) -> Option<ResolvedNavigation> {
        let handled = self.store.is_first_launch_handled().await;
        match decide_attribution(payload, handled) {
            None => {
                debug!("attribution payload carries no deep link value, discarding");
                None
            }
            Some(navigation) if navigation.should_persist => {
                debug!(value = %navigation.absolute_url, "deferring attribution link to next cold start");
                self.store.set(&navigation.absolute_url).await;
                self.store.mark_first_launch_handled().await;
                None
            }
            Some(navigation) => Some(navigation),
        }
    }

    /// Handles an install-conversion-data callback.
    ///
    /// Conversion payloads are only acted on when they explicitly mark a first
    /// launch (boolean `true` or the string `"true"`).
    pub async fn handle_install_conversion(
        &self,
        payload: &AttributionPayload,
    ) -> Option<ResolvedNavigation> {
        if !payload.reports_first_launch() {
            debug!("install conversion without first-launch marker, ignoring");
            return None;
        }
        self.handle_attribution_deep_link(payload).await
    }

    async fn promote(&self, absolute_url: String) -> ResolvedNavigation {
        self.cold_start_resolved.set(true);
        self.store.mark_first_launch_handled().await;
        ResolvedNavigation::immediate(absolute_url)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::block_on;
    use pretty_assertions::assert_eq;
    use shell_host::MemoryPrefsStore;

    use super::*;

    fn resolver_with_prefs(prefs: &MemoryPrefsStore) -> DeepLinkResolver {
        DeepLinkResolver::new(DeferredLinkStore::new(Rc::new(prefs.clone())))
    }

    fn payload(value: &str) -> AttributionPayload {
        serde_json::from_value(serde_json::json!({ "deep_link_value": value }))
            .expect("attribution payload")
    }

    #[test]
    fn classify_matches_expected_patterns() {
        let cases = [
            (
                "vibzworld://open?url=https%3A%2F%2Flovenote.vibz.world%2Fabc",
                Some("https://lovenote.vibz.world/abc".to_string()),
            ),
            (
                "https://lovenote.vibz.world/abc123",
                Some("https://lovenote.vibz.world/abc123".to_string()),
            ),
            (
                "myapp://launch?openUrl=https%3A%2F%2Flovenote.vibz.world%2Fxyz",
                Some("https://lovenote.vibz.world/xyz".to_string()),
            ),
            ("https://evil.loveappneo.vibz.world/abc", None),
            ("https://example.com/abc", None),
            ("not a url", None),
        ];

        for (input, expected) in cases {
            assert_eq!(classify_incoming_url(input), expected, "input={input:?}");
        }
    }

    #[test]
    fn handled_domain_requires_exact_hostname_match() {
        assert!(classify_incoming_url("https://loveappneo.vibz.world/x").is_some());
        assert_eq!(classify_incoming_url("https://evil.loveappneo.vibz.world/x"), None);
        assert_eq!(classify_incoming_url("https://loveappneo.vibz.world.evil.io/x"), None);
    }

    #[test]
    fn normalize_follows_scheme_slash_and_bare_rules() {
        assert_eq!(
            normalize_deep_link_value("https://openinapp.vibz.world/q"),
            "https://openinapp.vibz.world/q"
        );
        assert_eq!(
            normalize_deep_link_value("/shared/xyz"),
            "https://lovenote.vibz.world/shared/xyz"
        );
        assert_eq!(
            normalize_deep_link_value("shared/xyz"),
            "https://lovenote.vibz.world/shared/xyz"
        );
    }

    #[test]
    fn attribution_decision_is_pure_over_flag_and_payload() {
        let with_value = payload("/shared/abc");
        assert_eq!(
            decide_attribution(&with_value, false),
            Some(ResolvedNavigation::deferred(
                "https://lovenote.vibz.world/shared/abc"
            ))
        );
        assert_eq!(
            decide_attribution(&with_value, true),
            Some(ResolvedNavigation::immediate(
                "https://lovenote.vibz.world/shared/abc"
            ))
        );
        assert_eq!(decide_attribution(&AttributionPayload::default(), false), None);
        assert_eq!(decide_attribution(&AttributionPayload::default(), true), None);
    }

    #[test]
    fn stored_deferred_link_wins_over_initial_link_and_is_cleared() {
        let prefs = MemoryPrefsStore::default();
        let resolver = resolver_with_prefs(&prefs);
        let store = DeferredLinkStore::new(Rc::new(prefs.clone()));
        block_on(store.set("/shared/xyz"));

        let navigation = block_on(
            resolver.resolve_cold_start(Some("https://lovenote.vibz.world/other")),
        )
        .expect("deferred value resolves");

        assert_eq!(
            navigation,
            ResolvedNavigation::immediate("https://lovenote.vibz.world/shared/xyz")
        );
        assert_eq!(block_on(store.get()), None, "store is cleared on consumption");
    }

    #[test]
    fn initial_link_resolves_when_no_deferred_value_is_stored() {
        let prefs = MemoryPrefsStore::default();
        let resolver = resolver_with_prefs(&prefs);

        let navigation = block_on(
            resolver.resolve_cold_start(Some("https://lovenote.vibz.world/abc123")),
        )
        .expect("initial link resolves");

        assert_eq!(
            navigation,
            ResolvedNavigation::immediate("https://lovenote.vibz.world/abc123")
        );
    }

    #[test]
    fn initial_link_resolution_feeds_the_internal_route_encoding() {
        let prefs = MemoryPrefsStore::default();
        let resolver = resolver_with_prefs(&prefs);

        let navigation = block_on(
            resolver.resolve_cold_start(Some("https://lovenote.vibz.world/abc123")),
        )
        .expect("initial link resolves");

        assert_eq!(
            crate::route::internal_route(&navigation.absolute_url),
            "/?url=https%3A%2F%2Flovenote.vibz.world%2Fabc123"
        );
    }

    #[test]
    fn cold_start_resolution_is_terminal() {
        let prefs = MemoryPrefsStore::default();
        let resolver = resolver_with_prefs(&prefs);

        block_on(resolver.resolve_cold_start(Some("https://lovenote.vibz.world/a")))
            .expect("first resolution");
        assert_eq!(
            block_on(resolver.resolve_cold_start(Some("https://lovenote.vibz.world/b"))),
            None
        );
    }

    #[test]
    fn unmatched_initial_link_resolves_nothing() {
        let prefs = MemoryPrefsStore::default();
        let resolver = resolver_with_prefs(&prefs);
        assert_eq!(
            block_on(resolver.resolve_cold_start(Some("https://example.com/elsewhere"))),
            None
        );
        assert_eq!(block_on(resolver.resolve_cold_start(None)), None);
    }

    #[test]
    fn attribution_before_first_resolution_persists_instead_of_navigating() {
        let prefs = MemoryPrefsStore::default();
        let resolver = resolver_with_prefs(&prefs);
        let store = DeferredLinkStore::new(Rc::new(prefs.clone()));

        let navigation = block_on(resolver.handle_attribution_deep_link(&payload("/shared/abc")));

        assert_eq!(navigation, None, "first-launch attribution never navigates");
        assert_eq!(
            block_on(store.get()),
            Some("https://lovenote.vibz.world/shared/abc".to_string())
        );
        assert!(block_on(store.is_first_launch_handled()));
    }

    #[test]
    fn attribution_after_first_resolution_navigates_instead_of_persisting() {
        let prefs = MemoryPrefsStore::default();
        let resolver = resolver_with_prefs(&prefs);
        let store = DeferredLinkStore::new(Rc::new(prefs.clone()));
        block_on(store.mark_first_launch_handled());

        let navigation = block_on(resolver.handle_attribution_deep_link(&payload("/shared/abc")));

        assert_eq!(
            navigation,
            Some(ResolvedNavigation::immediate(
                "https://lovenote.vibz.world/shared/abc"
            ))
        );
        assert_eq!(block_on(store.get()), None, "nothing persisted on direct navigation");
    }

    #[test]
    fn attribution_gating_holds_for_either_arrival_order() {
        // Attribution lands before the cold-start check.
        let prefs = MemoryPrefsStore::default();
        let resolver = resolver_with_prefs(&prefs);
        assert_eq!(
            block_on(resolver.handle_attribution_deep_link(&payload("/shared/early"))),
            None
        );
        let navigation = block_on(resolver.resolve_cold_start(None));
        assert_eq!(navigation, None, "value waits for the next cold start");

        // Attribution lands after the cold-start check resolved an OS link.
        let prefs = MemoryPrefsStore::default();
        let resolver = resolver_with_prefs(&prefs);
        block_on(resolver.resolve_cold_start(Some("https://lovenote.vibz.world/first")))
            .expect("cold start resolves");
        assert_eq!(
            block_on(resolver.handle_attribution_deep_link(&payload("/shared/late"))),
            Some(ResolvedNavigation::immediate(
                "https://lovenote.vibz.world/shared/late"
            ))
        );
    }

    #[test]
    fn deferred_value_from_one_session_resolves_at_the_next_cold_start() {
        let prefs = MemoryPrefsStore::default();

        let first_session = resolver_with_prefs(&prefs);
        assert_eq!(
            block_on(first_session.handle_attribution_deep_link(&payload("/shared/xyz"))),
            None
        );

        let second_session = resolver_with_prefs(&prefs);
        let navigation =
            block_on(second_session.resolve_cold_start(None)).expect("deferred value resolves");
        assert_eq!(
            navigation,
            ResolvedNavigation::immediate("https://lovenote.vibz.world/shared/xyz")
        );
        assert_eq!(
            block_on(DeferredLinkStore::new(Rc::new(prefs.clone())).get()),
            None
        );
    }

    #[test]
    fn install_conversion_requires_explicit_first_launch_marker() {
        let prefs = MemoryPrefsStore::default();
        let resolver = resolver_with_prefs(&prefs);
        let store = DeferredLinkStore::new(Rc::new(prefs.clone()));

        let unmarked: AttributionPayload =
            serde_json::from_value(serde_json::json!({ "deep_link_value": "/shared/abc" }))
                .expect("payload");
        assert_eq!(block_on(resolver.handle_install_conversion(&unmarked)), None);
        assert_eq!(block_on(store.get()), None);

        let marked: AttributionPayload = serde_json::from_value(serde_json::json!({
            "deep_link_value": "/shared/abc",
            "is_first_launch": "true",
        }))
        .expect("payload");
        assert_eq!(block_on(resolver.handle_install_conversion(&marked)), None);
        assert_eq!(
            block_on(store.get()),
            Some("https://lovenote.vibz.world/shared/abc".to_string())
        );
    }

    #[test]
    fn runtime_links_keep_navigating_after_cold_start() {
        let prefs = MemoryPrefsStore::default();
        let resolver = resolver_with_prefs(&prefs);
        block_on(resolver.resolve_cold_start(Some("https://lovenote.vibz.world/first")))
            .expect("cold start resolves");

        assert_eq!(
            resolver.handle_runtime_link("https://openinapp.vibz.world/second"),
            Some(ResolvedNavigation::immediate(
                "https://openinapp.vibz.world/second"
            ))
        );
        assert_eq!(
            resolver.handle_runtime_link("https://openinapp.vibz.world/third"),
            Some(ResolvedNavigation::immediate(
                "https://openinapp.vibz.world/third"
            ))
        );
        assert_eq!(resolver.handle_runtime_link("https://example.com/x"), None);
    }
}
