//! Environment-driven webhook configuration.

use anyhow::{Context, Result};

/// Default Expo push HTTP API endpoint.
pub const DEFAULT_PUSH_ENDPOINT: &str = "https://exp.host/--/api/v2/push/send";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8787";

/// Runtime configuration sourced from the environment.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Socket address the HTTP server binds to.
    pub bind_addr: String,
    /// Base URL of the Supabase project hosting the `push_tokens` table.
    pub supabase_url: String,
    /// Service-role key used for token lookups.
    pub service_role_key: String,
    /// Push delivery endpoint; overridable for staging.
    pub push_endpoint: String,
}

impl WebhookConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when `SUPABASE_URL` or `SUPABASE_SERVICE_ROLE_KEY` is
    /// missing.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_addr: std::env::var("WEBHOOK_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            supabase_url: std::env::var("SUPABASE_URL").context("SUPABASE_URL is not set")?,
            service_role_key: std::env::var("SUPABASE_SERVICE_ROLE_KEY")
                .context("SUPABASE_SERVICE_ROLE_KEY is not set")?,
            push_endpoint: std::env::var("PUSH_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_PUSH_ENDPOINT.to_string()),
        })
    }
}
