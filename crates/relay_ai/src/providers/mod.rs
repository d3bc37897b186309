//! Provider health checks.
//!
//! Each provider module exposes a struct that implements [`HealthCheck`].
//! Checks never fail: every transport, credential, or API error is folded
//! into the returned [`ProviderStatus`].

pub mod anthropic;
pub mod vertex;

use async_trait::async_trait;

use relay_core::ProviderConfig;

use crate::types::{ProviderIdentity, ProviderStatus};

/// Timeout applied to every probe request.
pub(crate) const PROBE_TIMEOUT_SECS: u64 = 30;

/// Maximum number of characters of an error kept in a status.
const MAX_ERROR_CHARS: usize = 300;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Failures a probe can run into before they are folded into a status.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("{0}")]
    Transport(String),

    /// Error text extracted from a non-success provider response.
    #[error("{0}")]
    Api(String),

    #[error("Failed to parse error response: {0}")]
    Parse(String),

    #[error("Failed to obtain access token: {0}")]
    Token(String),
}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Transport(format!("Request timed out: {e}"))
        } else if e.is_connect() {
            Self::Transport(format!("Connection failed: {e}"))
        } else {
            Self::Transport(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A minimal reachability and credentials probe for one provider.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Which provider this check probes.
    fn provider(&self) -> ProviderIdentity;

    /// Run the probe. Always produces a status.
    async fn check(&self) -> ProviderStatus;
}

/// Source of bearer tokens for Vertex AI requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self, config: &ProviderConfig) -> Result<String, ProbeError>;
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn probe_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(PROBE_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Shorten error text for display. Classify before truncating.
pub(crate) fn truncate_message(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= MAX_ERROR_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX_ERROR_CHARS).collect();
        format!("{head}...")
    }
}
