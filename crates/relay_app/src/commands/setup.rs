use anyhow::{Result, bail};
use tracing::info;

use relay_core::{AuthMethod, RelayConfig};

use super::{AppPaths, CommandStatus};

/// Values passed to `relay setup`.
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    pub project: Option<String>,
    pub region: Option<String>,
    pub auth: AuthMethod,
    pub service_account_path: Option<String>,
    pub model: Option<String>,
}

/// A fresh default config overlaid with the given options.
pub fn build_config(options: SetupOptions) -> Result<RelayConfig> {
    let mut config = RelayConfig::default();

    if let Some(project) = options.project {
        config.gcp.project_id = project;
    }
    if let Some(region) = options.region {
        config.gcp.region = region;
    }
    config.auth.method = options.auth;
    if options.auth == AuthMethod::ServiceAccount {
        match options.service_account_path {
            Some(path) if !path.is_empty() => config.auth.service_account_path = Some(path),
            _ => bail!("--auth service-account requires --service-account-path"),
        }
    }
    if let Some(model) = options.model {
        config.default_model = model;
    }

    Ok(config)
}

pub fn run(paths: &AppPaths, options: SetupOptions) -> Result<CommandStatus> {
    let config = build_config(options)?;
    config.save_to_path(&paths.config)?;
    info!(path = %paths.config.display(), "configuration saved");

    println!("✅ Configuration saved!");
    println!("   Project: {}", config.gcp.project_id);
    println!("   Region:  {}", config.gcp.region);
    println!("   Auth:    {}", config.auth.method);
    println!("   Model:   {}", config.default_model);

    Ok(CommandStatus::Success)
}
