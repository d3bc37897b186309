//! Anthropic API health check.
//!
//! Sends a one-token request to the Messages API (`/v1/messages`) with the
//! cheapest model. Without an API key the CLI falls back to its built-in
//! login, so the provider is reported available without probing.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use super::{HealthCheck, ProbeError, probe_client};
use crate::classifier::classify_error;
use crate::types::{ErrorKind, ProviderIdentity, ProviderStatus};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const API_BASE: &str = "https://api.anthropic.com";
const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const PROBE_MODEL: &str = "claude-3-haiku-20240307";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

// ---------------------------------------------------------------------------
// Wire types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ProbeRequest<'a> {
    model: &'a str,
    messages: [ProbeMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ProbeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl ProbeRequest<'static> {
    fn minimal() -> Self {
        Self {
            model: PROBE_MODEL,
            messages: [ProbeMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

pub struct AnthropicHealthCheck {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicHealthCheck {
    /// Create a check with an explicit key. An empty key counts as absent.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, API_BASE.into())
    }

    /// Create a check using `ANTHROPIC_API_KEY` from the environment.
    pub fn from_env() -> Self {
        Self::new(std::env::var(API_KEY_ENV).ok())
    }

    /// Create a check against a custom endpoint (used by tests).
    pub fn with_base_url(api_key: Option<String>, base_url: String) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: probe_client(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn probe(&self, api_key: &str) -> Result<(), ProbeError> {
        let url = format!("{}{MESSAGES_PATH}", self.base_url);
        debug!(url = %url, model = PROBE_MODEL, "probing Anthropic");

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&ProbeRequest::minimal())
            .send()
            .await?;

        if resp.status().is_success() {
            return Ok(());
        }

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        debug!(status = %status, "Anthropic probe returned an error");
        Err(ProbeError::Api(error_text(&body)?))
    }
}

/// Pull the error type (or message) out of an Anthropic error body.
///
/// Only a body that is not JSON at all is an error; any other shape falls
/// back to "Unknown error".
fn error_text(body: &str) -> Result<String, ProbeError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ProbeError::Parse(e.to_string()))?;
    let error = value.get("error");

    let text = string_field(error, "type")
        .or_else(|| string_field(error, "message"))
        .unwrap_or("Unknown error");
    Ok(text.to_string())
}

fn string_field<'a>(error: Option<&'a serde_json::Value>, name: &str) -> Option<&'a str> {
    error?.get(name)?.as_str().filter(|s| !s.is_empty())
}

#[async_trait]
impl HealthCheck for AnthropicHealthCheck {
    fn provider(&self) -> ProviderIdentity {
        ProviderIdentity::Anthropic
    }

    async fn check(&self) -> ProviderStatus {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("no Anthropic API key set; assuming built-in login");
            return ProviderStatus::available(ProviderIdentity::Anthropic);
        };

        match self.probe(api_key).await {
            Ok(()) => ProviderStatus::available(ProviderIdentity::Anthropic),
            Err(ProbeError::Api(text)) => {
                let kind = classify_error(&text, ProviderIdentity::Anthropic);
                info!(error = %text, kind = %kind, "Anthropic unavailable");
                ProviderStatus::unavailable(ProviderIdentity::Anthropic, text, kind)
            }
            // Transport and parse failures are not pattern-matched.
            Err(e) => {
                info!(error = %e, "Anthropic probe failed");
                ProviderStatus::unavailable(ProviderIdentity::Anthropic, e.to_string(), ErrorKind::Other)
            }
        }
    }
}
