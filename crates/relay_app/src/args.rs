//! CLI argument definitions using clap
//!
//! - relay setup --project <id>     # Write the Vertex AI configuration
//! - relay activate                 # Route through Vertex AI
//! - relay deactivate               # Switch back to the Anthropic API
//! - relay check                    # Probe both providers
//! - relay stats [period]           # Usage reports

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use relay_core::AuthMethod;

#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(about = "Switch Claude between Vertex AI and the Anthropic API, with usage tracking")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the Vertex AI configuration file
    Setup {
        /// GCP project id
        #[arg(long)]
        project: Option<String>,

        /// Vertex AI region
        #[arg(long)]
        region: Option<String>,

        /// How credentials are obtained
        #[arg(long, value_enum, default_value = "adc")]
        auth: AuthArg,

        /// Service account key file (with --auth service-account)
        #[arg(long)]
        service_account_path: Option<String>,

        /// Default model for new sessions
        #[arg(long)]
        model: Option<String>,
    },

    /// Probe Vertex AI and start a tracked session
    Activate {
        /// Only validate configuration, do not contact Vertex AI
        #[arg(long)]
        skip_probe: bool,
    },

    /// End the session and switch back to the Anthropic API
    Deactivate,

    /// Probe both providers and report their status
    Check {
        /// Print statuses as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a completed request against the active session
    Record {
        /// Model that served the request (defaults to the session model)
        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        input_tokens: u64,

        #[arg(long)]
        output_tokens: u64,

        /// First characters of the prompt, kept for reference
        #[arg(long, default_value = "")]
        prompt_preview: String,
    },

    /// Show usage for the current session or a period
    Stats {
        #[arg(value_enum, default_value = "session")]
        period: Period,

        /// Draw a daily cost graph
        #[arg(long)]
        graph: bool,
    },

    /// Export usage to a JSON file
    Export {
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day to include (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Check that Vertex AI credentials can be obtained
    TestConnection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthArg {
    Adc,
    ServiceAccount,
}

impl From<AuthArg> for AuthMethod {
    fn from(arg: AuthArg) -> Self {
        match arg {
            AuthArg::Adc => AuthMethod::Adc,
            AuthArg::ServiceAccount => AuthMethod::ServiceAccount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Period {
    Session,
    Today,
    Week,
    Month,
}

impl Period {
    /// Inclusive date range ending at `today`; `None` for the session view.
    pub fn date_range(self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let days_back = match self {
            Self::Session => return None,
            Self::Today => 0,
            Self::Week => 7,
            Self::Month => 30,
        };
        Some((today - chrono::Duration::days(days_back), today))
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}
