//! `relay`: switch Claude between Vertex AI and the Anthropic API.
//!
//! Exit codes: 0 success, 1 failure, 2 when the active provider ran out of
//! credits and the user must choose another. In that case stdout carries a
//! single JSON line describing the choice.

mod args;
mod commands;
mod report;
mod router;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use relay_core::logging;

use crate::args::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match logging::init_logging() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: file logging disabled: {e:#}");
            None
        }
    };
    info!("Starting relay v{}", env!("CARGO_PKG_VERSION"));

    match router::route(cli).await {
        Ok(status) => status.into(),
        Err(e) => {
            error!("Command failed: {e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
