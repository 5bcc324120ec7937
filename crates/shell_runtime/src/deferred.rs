//! Persistent deferred-link record and first-launch flag.
//!
//! Deep-link delivery is best-effort: every underlying storage error is logged
//! and treated as "no value present", never surfaced to the resolver.

use std::rc::Rc;

use shell_host::PrefsStore;
use tracing::warn;

/// Storage key for the deferred deep-link value.
pub const DEFERRED_LINK_KEY: &str = "vibz.links.deferred.v1";

/// Storage key for the first-launch-handled flag (boolean as string).
pub const FIRST_LAUNCH_HANDLED_KEY: &str = "vibz.links.first_launch_handled.v1";

/// Persistent record of a deep link captured before it could be navigated to,
/// plus the first-launch-handled flag that gates attribution arbitration.
#[derive(Clone)]
pub struct DeferredLinkStore {
    prefs: Rc<dyn PrefsStore>,
}

impl DeferredLinkStore {
    /// Creates a store over the host preference service.
    pub fn new(prefs: Rc<dyn PrefsStore>) -> Self {
        Self { prefs }
    }

    /// Reads the pending deferred link, if any.
    pub async fn get(&self) -> Option<String> {
        match self.prefs.load_value(DEFERRED_LINK_KEY).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(err) => {
                warn!(error = %err, "failed to read deferred deep link");
                None
            }
        }
    }

    /// Stores a deferred link for the next cold start.
    pub async fn set(&self, value: &str) {
        if let Err(err) = self.prefs.save_value(DEFERRED_LINK_KEY, value).await {
            warn!(error = %err, "failed to persist deferred deep link");
        }
    }

    /// Removes any pending deferred link.
    pub async fn clear(&self) {
        if let Err(err) = self.prefs.delete_value(DEFERRED_LINK_KEY).await {
            warn!(error = %err, "failed to clear deferred deep link");
        }
    }

    /// Consumes the pending deferred link: returns it and clears the record.
    ///
    /// Idempotent: a second call returns `None` without error.
    pub async fn take(&self) -> Option<String> {
        let value = self.get().await?;
        self.clear().await;
        Some(value)
    }

    /// Whether a cold start has already resolved a link candidate.
    pub async fn is_first_launch_handled(&self) -> bool {
        match self.prefs.load_value(FIRST_LAUNCH_HANDLED_KEY).await {
            Ok(value) => value.as_deref() == Some("true"),
            Err(err) => {
                warn!(error = %err, "failed to read first-launch flag");
                false
            }
        }
    }

    /// Marks first-launch handling complete. Never reset afterwards.
    pub async fn mark_first_launch_handled(&self) {
        if let Err(err) = self.prefs.save_value(FIRST_LAUNCH_HANDLED_KEY, "true").await {
            warn!(error = %err, "failed to persist first-launch flag");
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use shell_host::{MemoryPrefsStore, PrefsStoreFuture};

    use super::*;

    struct FailingPrefsStore;

    impl PrefsStore for FailingPrefsStore {
        fn load_value<'a>(
            &'a self,
            _key: &'a str,
        ) -> PrefsStoreFuture<'a, Result<Option<String>, String>> {
            Box::pin(async { Err("storage offline".to_string()) })
        }

        fn save_value<'a>(
            &'a self,
            _key: &'a str,
            _value: &'a str,
        ) -> PrefsStoreFuture<'a, Result<(), String>> {
            Box::pin(async { Err("storage offline".to_string()) })
        }

        fn delete_value<'a>(&'a self, _key: &'a str) -> PrefsStoreFuture<'a, Result<(), String>> {
            Box::pin(async { Err("storage offline".to_string()) })
        }
    }

    #[test]
    fn take_returns_value_once_then_none() {
        let store = DeferredLinkStore::new(Rc::new(MemoryPrefsStore::default()));
        block_on(store.set("/shared/xyz"));

        assert_eq!(block_on(store.take()), Some("/shared/xyz".to_string()));
        assert_eq!(block_on(store.take()), None);
    }

    #[test]
    fn first_launch_flag_starts_false_and_latches_true() {
        let store = DeferredLinkStore::new(Rc::new(MemoryPrefsStore::default()));
        assert!(!block_on(store.is_first_launch_handled()));

        block_on(store.mark_first_launch_handled());
        assert!(block_on(store.is_first_launch_handled()));
    }

    #[test]
    fn storage_errors_read_as_no_value_present() {
        let store = DeferredLinkStore::new(Rc::new(FailingPrefsStore));
        assert_eq!(block_on(store.get()), None);
        assert!(!block_on(store.is_first_launch_handled()));
        // Writes swallow the failure as well.
        block_on(store.set("/shared/xyz"));
        block_on(store.mark_first_launch_handled());
    }

    #[test]
    fn deferred_value_and_flag_use_distinct_keys() {
        let prefs = MemoryPrefsStore::default();
        let store = DeferredLinkStore::new(Rc::new(prefs.clone()));
        block_on(store.set("/shared/xyz"));
        block_on(store.mark_first_launch_handled());

        assert_eq!(
            block_on(prefs.load_value(DEFERRED_LINK_KEY)).expect("load"),
            Some("/shared/xyz".to_string())
        );
        assert_eq!(
            block_on(prefs.load_value(FIRST_LAUNCH_HANDLED_KEY)).expect("load"),
            Some("true".to_string())
        );
    }
}
