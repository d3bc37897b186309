//! Vertex AI health check.
//!
//! Configuration is checked first: without a GCP project there is nothing to
//! probe. Otherwise a bearer token is obtained through a [`TokenSource`] and a
//! one-token `rawPredict` request is sent to the regional endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use relay_core::{AuthMethod, ProviderConfig};

use super::{HealthCheck, ProbeError, TokenSource, probe_client, truncate_message};
use crate::classifier::classify_error;
use crate::types::{ErrorKind, ProviderIdentity, ProviderStatus};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const VERTEX_ANTHROPIC_VERSION: &str = "vertex-2023-10-16";
const PROBE_MODEL: &str = "claude-3-haiku@20240307";

/// Reported when no GCP project is configured.
pub const MISSING_PROJECT_MESSAGE: &str = "No GCP project configured. Run `relay setup` first.";

// ---------------------------------------------------------------------------
// Wire types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct RawPredictRequest<'a> {
    anthropic_version: &'a str,
    messages: [ProbeMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ProbeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl RawPredictRequest<'static> {
    fn minimal() -> Self {
        Self {
            anthropic_version: VERTEX_ANTHROPIC_VERSION,
            messages: [ProbeMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: 1,
        }
    }
}

/// Google API error envelope: `{"error":{"code":429,"message":"...","status":"RESOURCE_EXHAUSTED"}}`.
#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

// ---------------------------------------------------------------------------
// Token source
// ---------------------------------------------------------------------------

/// Obtains access tokens from the `gcloud` CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct GcloudTokenSource;

impl GcloudTokenSource {
    fn command(config: &ProviderConfig) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new("gcloud");
        match (config.auth_method, config.service_account_path.as_deref()) {
            (AuthMethod::ServiceAccount, Some(key_path)) if !key_path.is_empty() => {
                cmd.args(["auth", "print-access-token"]);
                cmd.env("CLOUDSDK_AUTH_CREDENTIAL_FILE_OVERRIDE", key_path);
            }
            _ => {
                cmd.args(["auth", "application-default", "print-access-token"]);
            }
        }
        cmd
    }
}

#[async_trait]
impl TokenSource for GcloudTokenSource {
    async fn access_token(&self, config: &ProviderConfig) -> Result<String, ProbeError> {
        let mut cmd = Self::command(config);
        debug!(command = ?cmd, "requesting access token from gcloud");

        let output = cmd.output().await.map_err(|e| {
            ProbeError::Token(format!("failed to execute `gcloud` (is it installed and on PATH?): {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Token(format!(
                "gcloud exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(ProbeError::Token("gcloud returned an empty token".into()));
        }
        Ok(token)
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

pub struct VertexHealthCheck {
    config: ProviderConfig,
    skip_probe: bool,
    tokens: Arc<dyn TokenSource>,
    base_url: Option<String>,
    client: reqwest::Client,
}

impl VertexHealthCheck {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            skip_probe: false,
            tokens: Arc::new(GcloudTokenSource),
            base_url: None,
            client: probe_client(),
        }
    }

    /// Only validate configuration; never contact the network.
    pub fn skip_probe(mut self, skip: bool) -> Self {
        self.skip_probe = skip;
        self
    }

    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Override the regional endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    fn endpoint(&self) -> String {
        let ProviderConfig {
            project_id, region, ..
        } = &self.config;
        let base = self
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{region}-aiplatform.googleapis.com"));
        format!(
            "{base}/v1/projects/{project_id}/locations/{region}/publishers/anthropic/models/{PROBE_MODEL}:rawPredict"
        )
    }

    async fn probe(&self) -> Result<(), ProbeError> {
        let token = self.tokens.access_token(&self.config).await?;
        let url = self.endpoint();
        debug!(url = %url, "probing Vertex AI");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&RawPredictRequest::minimal())
            .send()
            .await?;

        if resp.status().is_success() {
            return Ok(());
        }

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(ProbeError::Api(error_text(status, &body)))
    }
}

/// The Google error object, from either `{"error":{..}}` or the
/// `[{"error":{..}}]` form `rawPredict` sometimes returns.
fn google_error(body: &str) -> Option<GoogleError> {
    if let Ok(envelope) = serde_json::from_str::<GoogleErrorEnvelope>(body) {
        return Some(envelope.error);
    }
    serde_json::from_str::<Vec<GoogleErrorEnvelope>>(body)
        .ok()?
        .into_iter()
        .next()
        .map(|envelope| envelope.error)
}

/// Render a Vertex error response as `STATUS: message`, or `HTTP <code>: <body>`
/// when the body carries no Google error. The body is kept whole.
fn error_text(status: reqwest::StatusCode, body: &str) -> String {
    match google_error(body) {
        Some(GoogleError {
            message: Some(message),
            status,
        }) => match status.filter(|s| !s.is_empty()) {
            Some(code) => format!("{code}: {message}"),
            None => message,
        },
        Some(GoogleError {
            message: None,
            status: Some(code),
        }) if !code.is_empty() => code,
        _ => format!("HTTP {}: {}", status.as_u16(), body.trim()),
    }
}

#[async_trait]
impl HealthCheck for VertexHealthCheck {
    fn provider(&self) -> ProviderIdentity {
        ProviderIdentity::Vertex
    }

    async fn check(&self) -> ProviderStatus {
        if !self.config.is_configured() {
            return ProviderStatus::unavailable(
                ProviderIdentity::Vertex,
                MISSING_PROJECT_MESSAGE,
                ErrorKind::Config,
            );
        }

        if self.skip_probe {
            debug!("skipping Vertex AI probe");
            return ProviderStatus::available(ProviderIdentity::Vertex);
        }

        match self.probe().await {
            Ok(()) => ProviderStatus::available(ProviderIdentity::Vertex),
            Err(e) => {
                let text = e.to_string();
                let kind = classify_error(&text, ProviderIdentity::Vertex);
                info!(error = %text, kind = %kind, "Vertex AI unavailable");
                ProviderStatus::unavailable(ProviderIdentity::Vertex, truncate_message(&text), kind)
            }
        }
    }
}
