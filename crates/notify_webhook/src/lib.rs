//! Database-change webhook that fans push notifications out to registered devices.
//!
//! One endpoint, `POST /send-notification`, receives a database-change payload,
//! resolves the affected user's device push tokens, and dispatches one push
//! message per token through the Expo push HTTP API. Token lookup and delivery
//! sit behind traits so the service runs against in-memory fakes in tests.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod push;
pub mod server;
pub mod tokens;

pub use config::WebhookConfig;
pub use push::{ExpoHttpPush, ExpoPushMessage, PushDelivery, RecordingPushDelivery};
pub use server::{router, AppState};
pub use tokens::{MemoryPushTokenStore, PushTokenRecord, PushTokenStore, RestPushTokenStore};
