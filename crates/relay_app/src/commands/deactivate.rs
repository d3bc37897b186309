use anyhow::Result;
use tracing::{info, warn};

use relay_ai::{
    AnthropicHealthCheck, ErrorKind, FailoverOutcome, HealthCheck, VertexHealthCheck,
    evaluate_failover,
};
use relay_core::SessionState;

use super::{AppPaths, CommandStatus, emit_prompt, report_failure};
use crate::report::format_thousands;

pub async fn run(paths: &AppPaths) -> Result<CommandStatus> {
    let anthropic = AnthropicHealthCheck::from_env();
    run_with(paths, &anthropic).await
}

/// Deactivate using `anthropic` as the provider being switched back to.
pub async fn run_with(paths: &AppPaths, anthropic: &dyn HealthCheck) -> Result<CommandStatus> {
    let state = paths.open_state()?;
    let current = state.state();

    if !current.active {
        println!("ℹ️ Vertex AI is not currently active.");
        return Ok(CommandStatus::Success);
    }

    let mut config = paths.load_config();
    let vertex = VertexHealthCheck::new(config.provider_config());

    match evaluate_failover(anthropic, &vertex).await {
        FailoverOutcome::Healthy(_) => {}
        FailoverOutcome::NeedsDecision(prompt) => return Ok(emit_prompt(&prompt)),
        FailoverOutcome::Blocked(status) if status.error_kind() == Some(ErrorKind::Auth) => {
            report_failure(&status, config.auth.method);
            return Ok(CommandStatus::Failure);
        }
        // Transient or unclassified failures do not keep the user on Vertex AI.
        FailoverOutcome::Blocked(status) => {
            warn!(error = ?status.error(), "Anthropic probe failed, switching anyway");
        }
    }

    if let Some(session_id) = current.session_id.as_deref() {
        paths.open_ledger()?.end_session(session_id)?;
        info!(session_id, "session ended");
    }

    print_summary(&current);
    state.deactivate()?;

    config.active = false;
    config.save_to_path(&paths.config)?;

    println!();
    println!("✅ Switched back to Anthropic API");

    Ok(CommandStatus::Success)
}

fn print_summary(state: &SessionState) {
    println!("📊 Session Summary:");
    println!("   Input tokens:  {}", format_thousands(state.total_input_tokens));
    println!("   Output tokens: {}", format_thousands(state.total_output_tokens));
    println!("   Total cost:    ${:.4}", state.total_cost);
}
