//! Push-token persistence: one row per device, upserted on conflict.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Token persistence failure.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// The backing store could not be reached or answered with an error.
    #[error("token store request failed: {0}")]
    Backend(String),
}

/// One registered device's push token.
///
/// Rows are keyed by device identifier, not user, so re-registration from the
/// same device replaces the previous token rather than duplicating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushTokenRecord {
    /// Owning user identifier.
    pub user_id: String,
    /// Stable device identifier (conflict key).
    pub device_id: String,
    /// Current push token for the device.
    pub token: String,
    /// Last registration time, RFC 3339.
    pub updated_at: String,
}

impl PushTokenRecord {
    /// Builds a record stamped with the current time.
    pub fn new(
        user_id: impl Into<String>,
        device_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            device_id: device_id.into(),
            token: token.into(),
            updated_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Persistence seam for device push tokens.
#[async_trait]
pub trait PushTokenStore: Send + Sync {
    /// Returns every push token registered for `user_id`.
    async fn tokens_for_user(&self, user_id: &str) -> Result<Vec<String>, TokenStoreError>;

    /// Inserts or replaces the record for the device in `record`.
    async fn upsert(&self, record: PushTokenRecord) -> Result<(), TokenStoreError>;

    /// Removes the record for `device_id`, if any.
    async fn remove_device(&self, device_id: &str) -> Result<(), TokenStoreError>;
}

#[derive(Debug, Default, Clone)]
/// In-memory token store keyed by device identifier.
pub struct MemoryPushTokenStore {
    rows: Arc<RwLock<HashMap<String, PushTokenRecord>>>,
}

#[async_trait]
impl PushTokenStore for MemoryPushTokenStore {
    async fn tokens_for_user(&self, user_id: &str) -> Result<Vec<String>, TokenStoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| TokenStoreError::Backend("token store lock poisoned".to_string()))?;
        let mut tokens: Vec<String> = rows
            .values()
            .filter(|record| record.user_id == user_id)
            .map(|record| record.token.clone())
            .collect();
        tokens.sort();
        Ok(tokens)
    }

    async fn upsert(&self, record: PushTokenRecord) -> Result<(), TokenStoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| TokenStoreError::Backend("token store lock poisoned".to_string()))?;
        rows.insert(record.device_id.clone(), record);
        Ok(())
    }

    async fn remove_device(&self, device_id: &str) -> Result<(), TokenStoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| TokenStoreError::Backend("token store lock poisoned".to_string()))?;
        rows.remove(device_id);
        Ok(())
    }
}

/// Token store backed by the Supabase PostgREST API.
pub struct RestPushTokenStore {
    client: reqwest::Client,
    base_url: String,
    service_role_key: String,
}

impl RestPushTokenStore {
    /// Creates a store against `base_url` using the service-role key.
    pub fn new(base_url: impl Into<String>, service_role_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: into_trimmed(base_url.into()),
            service_role_key: service_role_key.into(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/push_tokens", self.base_url)
    }
}

fn into_trimmed(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}

#[derive(Debug, Deserialize)]
struct TokenRow {
    token: String,
}

#[async_trait]
impl PushTokenStore for RestPushTokenStore {
    async fn tokens_for_user(&self, user_id: &str) -> Result<Vec<String>, TokenStoreError> {
        let response = self
            .client
            .get(self.table_url())
            .query(&[("user_id", format!("eq.{user_id}")), ("select", "token".to_string())])
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await
            .map_err(|err| TokenStoreError::Backend(err.to_string()))?;
        if !response.status().is_success() {
            return Err(TokenStoreError::Backend(format!(
                "token lookup returned {}",
                response.status()
            )));
        }
        let rows: Vec<TokenRow> = response
            .json()
            .await
            .map_err(|err| TokenStoreError::Backend(err.to_string()))?;
        debug!(user_id, count = rows.len(), "fetched push tokens");
        Ok(rows.into_iter().map(|row| row.token).collect())
    }

    async fn upsert(&self, record: PushTokenRecord) -> Result<(), TokenStoreError> {
        let response = self
            .client
            .post(self.table_url())
            .query(&[("on_conflict", "device_id")])
            .header("apikey", &self.service_role_key)
            .header("Prefer", "resolution=merge-duplicates")
            .bearer_auth(&self.service_role_key)
            .json(&record)
            .send()
            .await
            .map_err(|err| TokenStoreError::Backend(err.to_string()))?;
        if !response.status().is_success() {
            return Err(TokenStoreError::Backend(format!(
                "token upsert returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn remove_device(&self, device_id: &str) -> Result<(), TokenStoreError> {
        let response = self
            .client
            .delete(self.table_url())
            .query(&[("device_id", format!("eq.{device_id}"))])
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await
            .map_err(|err| TokenStoreError::Backend(err.to_string()))?;
        if !response.status().is_success() {
            return Err(TokenStoreError::Backend(format!(
                "token delete returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_replaces_by_device_key_instead_of_duplicating() {
        let store = MemoryPushTokenStore::default();
        store
            .upsert(PushTokenRecord::new("user-1", "device-a", "token-old"))
            .await
            .expect("first upsert");
        store
            .upsert(PushTokenRecord::new("user-1", "device-a", "token-new"))
            .await
            .expect("re-registration");

        assert_eq!(
            store.tokens_for_user("user-1").await.expect("lookup"),
            vec!["token-new".to_string()]
        );
    }

    #[tokio::test]
    async fn lookup_filters_by_user_across_devices() {
        let store = MemoryPushTokenStore::default();
        store
            .upsert(PushTokenRecord::new("user-1", "device-a", "token-a"))
            .await
            .expect("upsert");
        store
            .upsert(PushTokenRecord::new("user-1", "device-b", "token-b"))
            .await
            .expect("upsert");
        store
            .upsert(PushTokenRecord::new("user-2", "device-c", "token-c"))
            .await
            .expect("upsert");

        assert_eq!(
            store.tokens_for_user("user-1").await.expect("lookup"),
            vec!["token-a".to_string(), "token-b".to_string()]
        );
        assert_eq!(
            store.tokens_for_user("user-3").await.expect("lookup"),
            Vec::<String>::new()
        );
    }

    #[tokio::test]
    async fn remove_device_deletes_only_that_device() {
        let store = MemoryPushTokenStore::default();
        store
            .upsert(PushTokenRecord::new("user-1", "device-a", "token-a"))
            .await
            .expect("upsert");
        store
            .upsert(PushTokenRecord::new("user-1", "device-b", "token-b"))
            .await
            .expect("upsert");

        store.remove_device("device-a").await.expect("remove");
        assert_eq!(
            store.tokens_for_user("user-1").await.expect("lookup"),
            vec!["token-b".to_string()]
        );
    }
}
