use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Model whose pricing is used when a model has no entry of its own.
pub const FALLBACK_PRICING_MODEL: &str = "claude-opus-4-5";

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// How Vertex AI credentials are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMethod {
    /// Application-default credentials (`gcloud auth application-default login`).
    #[default]
    Adc,
    /// A service-account JSON key file.
    ServiceAccount,
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Adc => "adc",
            Self::ServiceAccount => "service-account",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthConfig {
    pub method: AuthMethod,
    pub service_account_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GcpConfig {
    /// Empty means Vertex AI has not been set up yet.
    pub project_id: String,
    pub region: String,
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            region: "us-east5".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// Price of a model in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input: f64,
    pub output: f64,
}

/// Per-model pricing, keyed by model id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PricingTable(HashMap<String, ModelPricing>);

impl Default for PricingTable {
    fn default() -> Self {
        let mut map = HashMap::new();
        map.insert(
            "claude-opus-4-5".to_string(),
            ModelPricing { input: 15.0, output: 75.0 },
        );
        map.insert(
            "claude-sonnet-4".to_string(),
            ModelPricing { input: 3.0, output: 15.0 },
        );
        map.insert(
            "claude-haiku-3-5".to_string(),
            ModelPricing { input: 0.8, output: 4.0 },
        );
        Self(map)
    }
}

impl PricingTable {
    pub fn get(&self, model: &str) -> Option<&ModelPricing> {
        self.0.get(model)
    }

    /// Pricing for `model`, falling back to [`FALLBACK_PRICING_MODEL`].
    pub fn pricing_for(&self, model: &str) -> Option<&ModelPricing> {
        self.0
            .get(model)
            .or_else(|| self.0.get(FALLBACK_PRICING_MODEL))
    }

    /// Cost in USD of a request. Zero when neither the model nor the fallback
    /// model is priced.
    pub fn cost_for(&self, model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
        match self.pricing_for(model) {
            Some(p) => {
                (input_tokens as f64 * p.input + output_tokens as f64 * p.output) / 1_000_000.0
            }
            None => 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// ProviderConfig
// ---------------------------------------------------------------------------

/// The slice of configuration the Vertex AI health check reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub project_id: String,
    pub region: String,
    pub auth_method: AuthMethod,
    pub service_account_path: Option<String>,
}

impl ProviderConfig {
    pub fn is_configured(&self) -> bool {
        !self.project_id.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RelayConfig
// ---------------------------------------------------------------------------

/// Provider configuration stored at `~/.claude/vertex-provider.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelayConfig {
    pub auth: AuthConfig,
    pub gcp: GcpConfig,
    pub default_model: String,
    pub pricing: PricingTable,
    pub active: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            auth: AuthConfig::default(),
            gcp: GcpConfig::default(),
            default_model: "claude-opus-4-5".into(),
            pricing: PricingTable::default(),
            active: false,
        }
    }
}

impl RelayConfig {
    /// Returns the base directory: `~/.claude/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".claude"))
    }

    /// Returns the config file path: `~/.claude/vertex-provider.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("vertex-provider.json"))
    }

    /// Returns the data directory: `~/.claude/vertex-provider/`
    pub fn data_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("vertex-provider"))
    }

    /// Returns the session state path: `~/.claude/vertex-provider/state.json`
    pub fn state_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("state.json"))
    }

    /// Returns the usage database path: `~/.claude/vertex-provider/usage.db`
    pub fn db_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("usage.db"))
    }

    /// Returns the exports directory: `~/.claude/vertex-provider/exports/`
    pub fn exports_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("exports"))
    }

    /// Returns the logs directory: `~/.claude/vertex-provider/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("logs"))
    }

    /// Load config from a specific file path.
    ///
    /// A missing, unreadable, or corrupt file yields the defaults. Fields
    /// absent from the file keep their default values.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read config {}: {e}", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring corrupt config {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Save config to a specific file path, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        !self.gcp.project_id.is_empty()
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            project_id: self.gcp.project_id.clone(),
            region: self.gcp.region.clone(),
            auth_method: self.auth.method,
            service_account_path: self.auth.service_account_path.clone(),
        }
    }
}
