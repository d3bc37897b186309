use anyhow::Result;
use tracing::info;

use relay_ai::{ErrorKind, GcloudTokenSource, ProviderIdentity, ProviderStatus, TokenSource, remediation_hint};

use super::{AppPaths, CommandStatus};

pub async fn run(paths: &AppPaths) -> Result<CommandStatus> {
    let config = paths.load_config();

    if !config.is_configured() {
        eprintln!("❌ No configuration found. Run `relay setup` first.");
        return Ok(CommandStatus::Failure);
    }

    println!("🔍 Testing Vertex AI connection...");
    println!("   Project: {}", config.gcp.project_id);
    println!("   Region:  {}", config.gcp.region);
    println!("   Auth:    {}", config.auth.method);

    match GcloudTokenSource.access_token(&config.provider_config()).await {
        Ok(_) => {
            info!("Vertex AI credentials obtained");
            println!();
            println!("✅ Authentication successful!");
            println!("   You can now run `relay activate` to use Vertex AI.");
            Ok(CommandStatus::Success)
        }
        Err(e) => {
            eprintln!();
            eprintln!("❌ Authentication failed!");
            eprintln!("   Error: {e}");

            let status = ProviderStatus::unavailable(ProviderIdentity::Vertex, e.to_string(), ErrorKind::Auth);
            if let Some(hint) = remediation_hint(&status, config.auth.method) {
                eprintln!();
                eprintln!("💡 {hint}");
            }
            Ok(CommandStatus::Failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_fails_without_gcloud() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::in_dir(tmp.path());
        assert_eq!(run(&paths).await.unwrap(), CommandStatus::Failure);
    }
}
