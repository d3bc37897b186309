use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Running state of the active Vertex AI session.
///
/// Persisted to `~/.claude/vertex-provider/state.json`. The totals mirror the
/// session row in the usage ledger so reports can be drawn without opening
/// the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionState {
    pub active: bool,
    pub session_id: Option<String>,
    pub model: String,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cost: f64,
    pub started_at: Option<DateTime<Utc>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            active: false,
            session_id: None,
            model: "claude-opus-4-5".into(),
            total_input_tokens: 0,
            total_output_tokens: 0,
            total_cost: 0.0,
            started_at: None,
        }
    }
}

impl SessionState {
    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens.saturating_add(self.total_output_tokens)
    }
}

/// Reads and writes [`SessionState`] at a fixed path.
pub struct StateManager {
    path: PathBuf,
}

impl StateManager {
    /// Opens the state file at `path`, creating it with defaults if missing.
    pub fn open_at(path: PathBuf) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        let manager = Self { path };
        if !manager.path.exists() {
            manager.save(&SessionState::default())?;
        }
        Ok(manager)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current state. Returns `Default` if the file is unreadable or corrupt.
    pub fn state(&self) -> SessionState {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        let content = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to save state: {}", self.path.display()))?;
        Ok(())
    }

    /// Starts a fresh session with zeroed totals.
    pub fn activate(&self, session_id: &str, model: &str) -> Result<()> {
        self.save(&SessionState {
            active: true,
            session_id: Some(session_id.to_string()),
            model: model.to_string(),
            total_input_tokens: 0,
            total_output_tokens: 0,
            total_cost: 0.0,
            started_at: Some(Utc::now()),
        })
    }

    /// Adds a request's usage to the running totals.
    pub fn update_tokens(&self, input_tokens: u64, output_tokens: u64, cost: f64) -> Result<()> {
        let mut state = self.state();
        state.total_input_tokens = state.total_input_tokens.saturating_add(input_tokens);
        state.total_output_tokens = state.total_output_tokens.saturating_add(output_tokens);
        state.total_cost += cost;
        self.save(&state)
    }

    pub fn update_model(&self, model: &str) -> Result<()> {
        let mut state = self.state();
        state.model = model.to_string();
        self.save(&state)
    }

    /// Resets to the inactive default state.
    pub fn deactivate(&self) -> Result<()> {
        self.save(&SessionState::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager_in(dir: &TempDir) -> StateManager {
        StateManager::open_at(dir.path().join("state.json")).unwrap()
    }

    #[test]
    fn test_initializes_inactive() {
        let tmp = TempDir::new().unwrap();
        let state = manager_in(&tmp);

        assert!(state.path().exists());
        let current = state.state();
        assert!(!current.active);
        assert!(current.session_id.is_none());
        assert_eq!(current.model, "claude-opus-4-5");
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("state.json");

        let state = StateManager::open_at(path.clone()).unwrap();
        assert!(path.exists());
        assert!(!state.state().active);
    }

    #[test]
    fn test_activate_tracks_session() {
        let tmp = TempDir::new().unwrap();
        let state = manager_in(&tmp);

        state.activate("session-123", "claude-opus-4-5").unwrap();
        let current = state.state();

        assert!(current.active);
        assert_eq!(current.session_id.as_deref(), Some("session-123"));
        assert_eq!(current.model, "claude-opus-4-5");
        assert!(current.started_at.is_some());
    }

    #[test]
    fn test_update_tokens() {
        let tmp = TempDir::new().unwrap();
        let state = manager_in(&tmp);

        state.activate("session-123", "claude-opus-4-5").unwrap();
        state.update_tokens(1000, 500, 0.0525).unwrap();
        let current = state.state();

        assert_eq!(current.total_input_tokens, 1000);
        assert_eq!(current.total_output_tokens, 500);
        assert_eq!(current.total_tokens(), 1500);
        assert!((current.total_cost - 0.0525).abs() < 1e-9);
    }

    #[test]
    fn test_totals_saturate_instead_of_wrapping() {
        let tmp = TempDir::new().unwrap();
        let state = manager_in(&tmp);

        state.activate("session-123", "claude-opus-4-5").unwrap();
        state.update_tokens(u64::MAX, 10, 0.0).unwrap();
        state.update_tokens(5, 0, 0.0).unwrap();
        let current = state.state();

        assert_eq!(current.total_input_tokens, u64::MAX);
        assert_eq!(current.total_tokens(), u64::MAX);
    }

    #[test]
    fn test_update_tokens_accumulates() {
        let tmp = TempDir::new().unwrap();
        let state = manager_in(&tmp);

        state.activate("session-123", "claude-opus-4-5").unwrap();
        state.update_tokens(1000, 500, 0.05).unwrap();
        state.update_tokens(2000, 1000, 0.10).unwrap();
        let current = state.state();

        assert_eq!(current.total_input_tokens, 3000);
        assert_eq!(current.total_output_tokens, 1500);
        assert!((current.total_cost - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_activate_resets_totals() {
        let tmp = TempDir::new().unwrap();
        let state = manager_in(&tmp);

        state.activate("first", "claude-opus-4-5").unwrap();
        state.update_tokens(10, 10, 0.01).unwrap();
        state.activate("second", "claude-sonnet-4").unwrap();

        let current = state.state();
        assert_eq!(current.session_id.as_deref(), Some("second"));
        assert_eq!(current.total_tokens(), 0);
        assert_eq!(current.total_cost, 0.0);
    }

    #[test]
    fn test_update_model() {
        let tmp = TempDir::new().unwrap();
        let state = manager_in(&tmp);

        state.activate("session-123", "claude-opus-4-5").unwrap();
        state.update_model("claude-sonnet-4").unwrap();

        assert_eq!(state.state().model, "claude-sonnet-4");
    }

    #[test]
    fn test_deactivate_clears_session() {
        let tmp = TempDir::new().unwrap();
        let state = manager_in(&tmp);

        state.activate("session-123", "claude-opus-4-5").unwrap();
        state.update_tokens(1000, 500, 0.0525).unwrap();
        state.deactivate().unwrap();
        let current = state.state();

        assert!(!current.active);
        assert!(current.session_id.is_none());
        assert_eq!(current.total_input_tokens, 0);
        assert_eq!(current.total_output_tokens, 0);
        assert!(current.started_at.is_none());
    }

    #[test]
    fn test_persists_across_managers() {
        let tmp = TempDir::new().unwrap();
        let state = manager_in(&tmp);
        state.activate("session-123", "claude-opus-4-5").unwrap();
        state.update_tokens(5000, 2000, 0.25).unwrap();

        let state2 = manager_in(&tmp);
        let current = state2.state();

        assert!(current.active);
        assert_eq!(current.session_id.as_deref(), Some("session-123"));
        assert_eq!(current.total_input_tokens, 5000);
    }

    #[test]
    fn test_corrupt_file_reads_as_default() {
        let tmp = TempDir::new().unwrap();
        let state = manager_in(&tmp);
        std::fs::write(state.path(), "NOT VALID JSON {{{{").unwrap();

        let current = state.state();
        assert!(!current.active);
        assert_eq!(current.total_tokens(), 0);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let state = manager_in(&tmp);
        std::fs::write(state.path(), r#"{ "active": true, "sessionId": "s-9" }"#).unwrap();

        let current = state.state();
        assert!(current.active);
        assert_eq!(current.session_id.as_deref(), Some("s-9"));
        assert_eq!(current.model, "claude-opus-4-5");
    }

    #[test]
    fn test_state_file_uses_camel_case() {
        let tmp = TempDir::new().unwrap();
        let state = manager_in(&tmp);
        state.activate("abc", "claude-opus-4-5").unwrap();

        let raw = std::fs::read_to_string(state.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["sessionId"], "abc");
        assert_eq!(json["totalInputTokens"], 0);
        assert!(json["startedAt"].is_string());
    }
}
