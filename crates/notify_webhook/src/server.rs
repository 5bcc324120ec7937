//! HTTP surface: the `/send-notification` webhook endpoint.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::push::{ExpoPushMessage, PushDelivery};
use crate::tokens::PushTokenStore;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Token persistence backend.
    pub tokens: Arc<dyn PushTokenStore>,
    /// Push delivery backend.
    pub delivery: Arc<dyn PushDelivery>,
}

/// Database-change payload delivered by the webhook caller.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    /// Change kind (`INSERT`, `UPDATE`, ...). Carried for compatibility.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Originating table. Carried for compatibility.
    #[serde(default)]
    pub table: Option<String>,
    /// Row after the change; the user identifier is read from here.
    #[serde(default)]
    pub record: Value,
    /// Row before the change. Carried for compatibility.
    #[serde(default)]
    pub old_record: Value,
}

fn extract_user_id(record: &Value) -> Option<String> {
    for key in ["id", "user_id"] {
        match record.get(key) {
            Some(Value::String(id)) if !id.is_empty() => return Some(id.clone()),
            Some(Value::Number(id)) => return Some(id.to_string()),
            _ => {}
        }
    }
    None
}

/// Builds the service router over `state`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    Router::new()
        .route("/health", get(health_check))
        .route("/send-notification", post(send_notification))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn send_notification(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("Bearer "))
        .unwrap_or(false);
    if !authorized {
        return reply(
            StatusCode::UNAUTHORIZED,
            json!({ "error": "Missing or invalid authorization" }),
        );
    }

    let payload: WebhookPayload = match serde_json::from_str(&body) {
        Ok(payload) => payload,
        Err(err) => {
            error!(error = %err, "failed to parse webhook payload");
            return reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": format!("invalid payload: {err}") }),
            );
        }
    };

    let Some(user_id) = extract_user_id(&payload.record) else {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "error": "No user_id found in payload" }),
        );
    };

    let tokens = match state.tokens.tokens_for_user(&user_id).await {
        Ok(tokens) => tokens,
        Err(err) => {
            error!(error = %err, user_id = %user_id, "token lookup failed");
            return reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": err.to_string() }),
            );
        }
    };

    if tokens.is_empty() {
        return reply(
            StatusCode::OK,
            json!({ "message": "No push tokens found for user" }),
        );
    }

    let timestamp = Utc::now().to_rfc3339();
    let messages: Vec<ExpoPushMessage> = tokens
        .iter()
        .map(|token| ExpoPushMessage {
            to: token.clone(),
            sound: Some("default".to_string()),
            title: Some("Message Read".to_string()),
            body: Some("Your message has been read for the first time!".to_string()),
            data: Some(json!({ "userId": user_id, "timestamp": timestamp })),
        })
        .collect();

    match state.delivery.send_batch(&messages).await {
        Ok(expo_response) => {
            info!(user_id = %user_id, sent_to = tokens.len(), "dispatched push notifications");
            reply(
                StatusCode::OK,
                json!({
                    "success": true,
                    "sentTo": tokens.len(),
                    "expoResponse": expo_response,
                }),
            )
        }
        Err(err) => {
            error!(error = %err, user_id = %user_id, "push dispatch failed");
            reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": err.to_string() }),
            )
        }
    }
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}
