use anyhow::Result;
use tracing::debug;

use relay_core::NewRequest;

use super::{AppPaths, CommandStatus};
use crate::report::format_tokens;

/// Maximum prompt preview length stored in the ledger.
const PREVIEW_CHARS: usize = 100;

/// Usage reported for one completed request.
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub model: Option<String>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub prompt_preview: String,
}

pub fn run(paths: &AppPaths, options: RecordOptions) -> Result<CommandStatus> {
    let state = paths.open_state()?;
    let current = state.state();

    let Some(session_id) = current.session_id.filter(|_| current.active) else {
        eprintln!("❌ No active Vertex AI session. Run `relay activate` first.");
        return Ok(CommandStatus::Failure);
    };

    let config = paths.load_config();
    let model = options.model.unwrap_or_else(|| current.model.clone());
    let request = NewRequest {
        model: model.clone(),
        input_tokens: options.input_tokens,
        output_tokens: options.output_tokens,
        prompt_preview: options.prompt_preview.chars().take(PREVIEW_CHARS).collect(),
    };

    let cost = paths
        .open_ledger()?
        .log_request(&session_id, &request, &config.pricing)?;
    state.update_tokens(request.input_tokens, request.output_tokens, cost)?;
    if model != current.model {
        state.update_model(&model)?;
    }
    debug!(session_id = %session_id, model = %model, cost, "request recorded");

    println!(
        "Recorded {} in / {} out on {model}: ${cost:.4}",
        format_tokens(request.input_tokens),
        format_tokens(request.output_tokens)
    );

    Ok(CommandStatus::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::activate;
    use crate::commands::setup::{self, SetupOptions};

    fn options(model: Option<&str>, input: u64, output: u64) -> RecordOptions {
        RecordOptions {
            model: model.map(String::from),
            input_tokens: input,
            output_tokens: output,
            prompt_preview: "explain this function".into(),
        }
    }

    #[test]
    fn record_without_session_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::in_dir(tmp.path());

        let status = run(&paths, options(None, 10, 10)).unwrap();
        assert_eq!(status, CommandStatus::Failure);
    }

    #[tokio::test]
    async fn record_updates_ledger_and_state() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::in_dir(tmp.path());
        setup::build_config(SetupOptions {
            project: Some("proj".into()),
            ..Default::default()
        })
        .unwrap()
        .save_to_path(&paths.config)
        .unwrap();
        activate::run(&paths, true).await.unwrap();

        // Default pricing: opus-4-5 at $15 / $75 per million tokens.
        let status = run(&paths, options(None, 1_000_000, 0)).unwrap();
        assert_eq!(status, CommandStatus::Success);
        run(&paths, options(Some("claude-sonnet-4"), 0, 1_000_000)).unwrap();

        let state = paths.open_state().unwrap().state();
        assert_eq!(state.total_input_tokens, 1_000_000);
        assert_eq!(state.total_output_tokens, 1_000_000);
        assert!((state.total_cost - 30.0).abs() < 1e-9);
        assert_eq!(state.model, "claude-sonnet-4");

        let ledger = paths.open_ledger().unwrap();
        let session = ledger.current_session().unwrap().unwrap();
        assert_eq!(session.total_input_tokens, 1_000_000);
        assert!((session.total_cost - 30.0).abs() < 1e-9);
    }
}
