//! Command implementations.
//!
//! Every command returns a [`CommandStatus`] that `main` turns into the
//! process exit code. Unexpected errors propagate as `anyhow::Error`.

pub mod activate;
pub mod check;
pub mod deactivate;
pub mod export;
pub mod record;
pub mod setup;
pub mod stats;
pub mod test_connection;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;

use relay_ai::{ProviderStatus, PromptResponse, remediation_hint};
use relay_core::{AuthMethod, RelayConfig, StateManager, UsageLedger};

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure,
    /// A provider prompt was printed; the caller must ask the user.
    NeedsDecision,
}

impl CommandStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::NeedsDecision => 2,
        }
    }
}

impl From<CommandStatus> for ExitCode {
    fn from(status: CommandStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Locations of the files commands read and write.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config: PathBuf,
    pub state: PathBuf,
    pub db: PathBuf,
    pub exports: PathBuf,
}

impl AppPaths {
    /// The standard layout under `~/.claude`.
    pub fn from_home() -> Result<Self> {
        Ok(Self {
            config: RelayConfig::config_path()?,
            state: RelayConfig::state_path()?,
            db: RelayConfig::db_path()?,
            exports: RelayConfig::exports_dir()?,
        })
    }

    /// The same layout rooted at `dir`.
    #[cfg(test)]
    pub fn in_dir(dir: &std::path::Path) -> Self {
        let data = dir.join("vertex-provider");
        Self {
            config: dir.join("vertex-provider.json"),
            state: data.join("state.json"),
            db: data.join("usage.db"),
            exports: data.join("exports"),
        }
    }

    pub fn load_config(&self) -> RelayConfig {
        RelayConfig::load_from_path(&self.config)
    }

    pub fn open_state(&self) -> Result<StateManager> {
        StateManager::open_at(self.state.clone())
    }

    pub fn open_ledger(&self) -> Result<UsageLedger> {
        UsageLedger::open_at(self.db.clone())
    }
}

/// Print the prompt as the only stdout line.
fn emit_prompt(prompt: &PromptResponse) -> CommandStatus {
    println!("{}", prompt.to_json_line());
    CommandStatus::NeedsDecision
}

/// Report a provider failure and how to fix it on stderr.
fn report_failure(status: &ProviderStatus, auth_method: AuthMethod) {
    eprintln!(
        "❌ {} error: {}",
        status.provider().display_name(),
        status.error().unwrap_or("Unknown error")
    );
    if let Some(hint) = remediation_hint(status, auth_method) {
        eprintln!("   Fix: {hint}");
    }
}
