use std::sync::Arc;

use anyhow::{Context, Result};
use notify_webhook::{router, AppState, ExpoHttpPush, RestPushTokenStore, WebhookConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = WebhookConfig::from_env()?;
    let state = AppState {
        tokens: Arc::new(RestPushTokenStore::new(
            config.supabase_url.clone(),
            config.service_role_key.clone(),
        )),
        delivery: Arc::new(ExpoHttpPush::new(config.push_endpoint.clone())),
    };

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "notify_webhook listening");
    axum::serve(listener, router(state))
        .await
        .context("server terminated")?;
    Ok(())
}
