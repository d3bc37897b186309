use anyhow::Result;

use relay_ai::{AnthropicHealthCheck, HealthCheck, ProviderStatus, VertexHealthCheck, remediation_hint};
use relay_core::AuthMethod;

use super::{AppPaths, CommandStatus};

pub async fn run(paths: &AppPaths, json: bool) -> Result<CommandStatus> {
    let config = paths.load_config();

    // One probe at a time.
    let vertex = VertexHealthCheck::new(config.provider_config()).check().await;
    let anthropic = AnthropicHealthCheck::from_env().check().await;
    let statuses = [vertex, anthropic];

    if json {
        println!("{}", serde_json::to_string(&statuses)?);
    } else {
        for status in &statuses {
            for line in describe(status, config.auth.method) {
                println!("{line}");
            }
        }
    }

    Ok(CommandStatus::Success)
}

/// Human-readable lines for one provider status.
fn describe(status: &ProviderStatus, auth_method: AuthMethod) -> Vec<String> {
    let name = status.provider().display_name();
    if status.is_available() {
        return vec![format!("✅ {name}: available")];
    }

    let kind = status
        .error_kind()
        .map(|k| k.to_string())
        .unwrap_or_else(|| "other".into());
    let mut lines = vec![format!(
        "❌ {name}: {} ({kind})",
        status.error().unwrap_or("Unknown error")
    )];
    if let Some(hint) = remediation_hint(status, auth_method) {
        lines.push(format!("   Fix: {hint}"));
    }
    lines
}
