//! Command routing logic for the CLI

use anyhow::Result;

use crate::args::{Cli, Commands};
use crate::commands::record::RecordOptions;
use crate::commands::setup::SetupOptions;
use crate::commands::{self, AppPaths, CommandStatus};

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli) -> Result<CommandStatus> {
    let paths = AppPaths::from_home()?;

    match cli.command {
        Commands::Setup {
            project,
            region,
            auth,
            service_account_path,
            model,
        } => commands::setup::run(
            &paths,
            SetupOptions {
                project,
                region,
                auth: auth.into(),
                service_account_path,
                model,
            },
        ),
        Commands::Activate { skip_probe } => commands::activate::run(&paths, skip_probe).await,
        Commands::Deactivate => commands::deactivate::run(&paths).await,
        Commands::Check { json } => commands::check::run(&paths, json).await,
        Commands::Record {
            model,
            input_tokens,
            output_tokens,
            prompt_preview,
        } => commands::record::run(
            &paths,
            RecordOptions {
                model,
                input_tokens,
                output_tokens,
                prompt_preview,
            },
        ),
        Commands::Stats { period, graph } => commands::stats::run(&paths, period, graph),
        Commands::Export { from, to } => commands::export::run(&paths, from, to),
        Commands::TestConnection => commands::test_connection::run(&paths).await,
    }
}
