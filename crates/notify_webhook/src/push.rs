//! Push-delivery seam and the Expo push HTTP API client.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Push delivery failure.
#[derive(Debug, Error)]
pub enum PushDeliveryError {
    /// The delivery endpoint could not be reached or answered with an error.
    #[error("push delivery failed: {0}")]
    Endpoint(String),
}

/// One message handed to the push-delivery API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpoPushMessage {
    /// Recipient push token.
    pub to: String,
    /// Notification sound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    /// Notification title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Notification body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Opaque data forwarded to the tapped app.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Delivery seam toward the third-party push API.
#[async_trait]
pub trait PushDelivery: Send + Sync {
    /// Dispatches one batch of messages, returning the provider's response body.
    async fn send_batch(&self, messages: &[ExpoPushMessage]) -> Result<Value, PushDeliveryError>;
}

/// Expo push HTTP API client.
pub struct ExpoHttpPush {
    client: reqwest::Client,
    endpoint: String,
}

impl ExpoHttpPush {
    /// Creates a client against `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl PushDelivery for ExpoHttpPush {
    async fn send_batch(&self, messages: &[ExpoPushMessage]) -> Result<Value, PushDeliveryError> {
        debug!(count = messages.len(), "dispatching push batch");
        let response = self
            .client
            .post(&self.endpoint)
            .json(messages)
            .send()
            .await
            .map_err(|err| PushDeliveryError::Endpoint(err.to_string()))?;
        response
            .json()
            .await
            .map_err(|err| PushDeliveryError::Endpoint(err.to_string()))
    }
}

#[derive(Default, Clone)]
/// Delivery fake that records batches, for tests.
pub struct RecordingPushDelivery {
    batches: Arc<Mutex<Vec<Vec<ExpoPushMessage>>>>,
    fail_with: Option<String>,
}

impl RecordingPushDelivery {
    /// Creates a fake that fails every batch with `error`.
    pub fn failing(error: impl Into<String>) -> Self {
        Self {
            batches: Arc::default(),
            fail_with: Some(error.into()),
        }
    }

    /// Batches dispatched so far, in order.
    pub fn batches(&self) -> Vec<Vec<ExpoPushMessage>> {
        self.batches.lock().expect("batches lock").clone()
    }
}

#[async_trait]
impl PushDelivery for RecordingPushDelivery {
    async fn send_batch(&self, messages: &[ExpoPushMessage]) -> Result<Value, PushDeliveryError> {
        if let Some(error) = &self.fail_with {
            return Err(PushDeliveryError::Endpoint(error.clone()));
        }
        self.batches
            .lock()
            .expect("batches lock")
            .push(messages.to_vec());
        Ok(serde_json::json!({
            "data": messages.iter().map(|_| serde_json::json!({ "status": "ok" })).collect::<Vec<_>>(),
        }))
    }
}
