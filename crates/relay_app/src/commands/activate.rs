use anyhow::Result;
use tracing::info;

use relay_ai::{AnthropicHealthCheck, FailoverOutcome, VertexHealthCheck, evaluate_failover};

use super::{AppPaths, CommandStatus, emit_prompt, report_failure};

pub async fn run(paths: &AppPaths, skip_probe: bool) -> Result<CommandStatus> {
    let mut config = paths.load_config();

    if !config.is_configured() {
        eprintln!("❌ No configuration found. Run `relay setup` first.");
        return Ok(CommandStatus::Failure);
    }

    let vertex = VertexHealthCheck::new(config.provider_config()).skip_probe(skip_probe);
    let anthropic = AnthropicHealthCheck::from_env();

    match evaluate_failover(&vertex, &anthropic).await {
        FailoverOutcome::Healthy(_) => {}
        FailoverOutcome::NeedsDecision(prompt) => return Ok(emit_prompt(&prompt)),
        FailoverOutcome::Blocked(status) => {
            report_failure(&status, config.auth.method);
            return Ok(CommandStatus::Failure);
        }
    }

    let ledger = paths.open_ledger()?;
    let state = paths.open_state()?;

    // Close a session left open by an earlier activation.
    if let Some(previous) = state.state().session_id {
        ledger.end_session(&previous)?;
        info!(session_id = %previous, "ended previous session");
    }

    let session = ledger.create_session(&config.default_model)?;
    state.activate(&session.id, &config.default_model)?;

    config.active = true;
    config.save_to_path(&paths.config)?;
    info!(session_id = %session.id, model = %config.default_model, "Vertex AI activated");

    println!("✅ Vertex AI activated");
    println!("   Model: {}", config.default_model);
    println!("   Project: {}", config.gcp.project_id);
    println!("   Region: {}", config.gcp.region);

    Ok(CommandStatus::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::setup::{self, SetupOptions};

    #[tokio::test]
    async fn unconfigured_activation_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::in_dir(tmp.path());

        let status = run(&paths, true).await.unwrap();
        assert_eq!(status, CommandStatus::Failure);
        assert!(!paths.state.exists());
    }

    #[tokio::test]
    async fn skip_probe_activation_starts_session() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::in_dir(tmp.path());
        setup::build_config(SetupOptions {
            project: Some("proj".into()),
            ..Default::default()
        })
        .unwrap()
        .save_to_path(&paths.config)
        .unwrap();

        let status = run(&paths, true).await.unwrap();
        assert_eq!(status, CommandStatus::Success);

        let state = paths.open_state().unwrap().state();
        assert!(state.active);
        let session_id = state.session_id.expect("session id");

        let ledger = paths.open_ledger().unwrap();
        let current = ledger.current_session().unwrap().expect("open session");
        assert_eq!(current.id, session_id);
        assert!(paths.load_config().active);
    }

    #[tokio::test]
    async fn reactivation_closes_previous_session() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::in_dir(tmp.path());
        setup::build_config(SetupOptions {
            project: Some("proj".into()),
            ..Default::default()
        })
        .unwrap()
        .save_to_path(&paths.config)
        .unwrap();

        run(&paths, true).await.unwrap();
        let first = paths.open_state().unwrap().state().session_id.unwrap();
        run(&paths, true).await.unwrap();
        let second = paths.open_state().unwrap().state().session_id.unwrap();
        assert_ne!(first, second);

        let ledger = paths.open_ledger().unwrap();
        assert!(ledger.get_session(&first).unwrap().unwrap().ended_at.is_some());
        assert!(ledger.get_session(&second).unwrap().unwrap().ended_at.is_none());
    }
}
