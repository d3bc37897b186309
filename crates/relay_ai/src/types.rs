//! Shared types for provider health and failover prompts.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Provider identity
// ---------------------------------------------------------------------------

/// The two backends the CLI can route through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderIdentity {
    Vertex,
    Anthropic,
}

impl ProviderIdentity {
    /// Human-readable name used in prompts.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Vertex => "Vertex AI",
            Self::Anthropic => "Anthropic",
        }
    }

    /// The other provider.
    pub fn alternative(self) -> Self {
        match self {
            Self::Vertex => Self::Anthropic,
            Self::Anthropic => Self::Vertex,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Anthropic => "anthropic",
        }
    }
}

impl std::fmt::Display for ProviderIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Error kind
// ---------------------------------------------------------------------------

/// Why a provider is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Billing or quota exhausted.
    Credits,
    /// Invalid or missing credentials.
    Auth,
    /// Required setup missing (Vertex AI only).
    Config,
    /// Unclassified or transient.
    Other,
}

impl ErrorKind {
    /// Only exhausted credits are worth offering a provider switch for.
    pub fn is_switch_worthy(self) -> bool {
        matches!(self, Self::Credits)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Credits => "credits",
            Self::Auth => "auth",
            Self::Config => "config",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Provider status
// ---------------------------------------------------------------------------

/// Result of a single health check.
///
/// An available status never carries an error; an unavailable one always
/// carries both the message and its classification. Construct through
/// [`ProviderStatus::available`] or [`ProviderStatus::unavailable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    provider: ProviderIdentity,
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_type: Option<ErrorKind>,
}

impl ProviderStatus {
    pub fn available(provider: ProviderIdentity) -> Self {
        Self {
            provider,
            available: true,
            error: None,
            error_type: None,
        }
    }

    pub fn unavailable(provider: ProviderIdentity, error: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            provider,
            available: false,
            error: Some(error.into()),
            error_type: Some(kind),
        }
    }

    pub fn provider(&self) -> ProviderIdentity {
        self.provider
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_type
    }

    /// True when the provider failed for a reason a switch could fix.
    pub fn is_switch_worthy(&self) -> bool {
        self.error_type.is_some_and(ErrorKind::is_switch_worthy)
    }
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// One choice offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptOption {
    pub label: String,
    /// A provider id, `subscription`, `retry`, or `cancel`.
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub available: bool,
}

/// Structured question emitted when the active provider ran out of credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    pub prompt_user: bool,
    pub reason: String,
    pub question: String,
    pub options: Vec<PromptOption>,
}

impl PromptResponse {
    /// Single-line JSON for machine consumption.
    pub fn to_json_line(&self) -> String {
        // Plain strings and bools only; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
