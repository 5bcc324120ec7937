//! Notification-tap payload to navigation-target mapping.

use serde_json::Value;
use tracing::warn;

use crate::model::{EDITOR_BASE_URL, MESSAGE_BASE_URL};

/// Maps a tapped notification's data payload to a navigation target.
///
/// `reward_received` opens the editor surface; `message_accepted` opens the
/// shared message identified by `shareId`. Payloads with a missing or unknown
/// `type`, or a `message_accepted` without `shareId`, produce no navigation.
pub fn navigation_url_from_notification(data: &Value) -> Option<String> {
    let Some(kind) = data.get("type").and_then(Value::as_str) else {
        warn!("notification data missing type field");
        return None;
    };

    match kind {
        "reward_received" => Some(EDITOR_BASE_URL.to_string()),
        "message_accepted" => match data.get("shareId").and_then(Value::as_str) {
            Some(share_id) => Some(format!("{MESSAGE_BASE_URL}/{share_id}")),
            None => {
                warn!("message_accepted notification missing shareId");
                None
            }
        },
        other => {
            warn!(kind = other, "unknown notification type");
            None
        }
    }
}
