use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use relay_core::{DailyUsage, ModelUsage, UsageStats};

use super::{AppPaths, CommandStatus};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    exported_at: DateTime<Utc>,
    period: ExportPeriod,
    summary: ExportSummary<'a>,
    daily_breakdown: &'a [DailyUsage],
}

#[derive(Debug, Serialize)]
struct ExportPeriod {
    from: NaiveDate,
    to: NaiveDate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportSummary<'a> {
    total_sessions: u64,
    total_requests: u64,
    total_input_tokens: u64,
    total_output_tokens: u64,
    total_cost: f64,
    by_model: &'a BTreeMap<String, ModelUsage>,
}

impl<'a> ExportDocument<'a> {
    fn new(stats: &'a UsageStats, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            exported_at: Utc::now(),
            period: ExportPeriod { from, to },
            summary: ExportSummary {
                total_sessions: stats.total_sessions,
                total_requests: stats.total_requests,
                total_input_tokens: stats.total_input_tokens,
                total_output_tokens: stats.total_output_tokens,
                total_cost: stats.total_cost,
                by_model: &stats.by_model,
            },
            daily_breakdown: &stats.daily_breakdown,
        }
    }
}

/// Earliest day included when no start date is given.
fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Where an export went and what it covered.
#[derive(Debug)]
pub struct ExportReport {
    pub path: PathBuf,
    pub stats: UsageStats,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Writes usage between `from` and `to` to `exports/usage-<to>.json`.
pub fn export_usage(
    paths: &AppPaths,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<ExportReport> {
    let to = to.unwrap_or_else(|| Utc::now().date_naive());
    let from = from.unwrap_or_else(default_start);

    let stats = paths.open_ledger()?.usage_stats(from, to)?;
    let document = ExportDocument::new(&stats, from, to);

    std::fs::create_dir_all(&paths.exports).with_context(|| {
        format!("Failed to create exports directory: {}", paths.exports.display())
    })?;
    let file_path = paths.exports.join(format!("usage-{}.json", to.format("%Y-%m-%d")));
    let content = serde_json::to_string_pretty(&document)?;
    std::fs::write(&file_path, content)
        .with_context(|| format!("Failed to write export: {}", file_path.display()))?;
    info!(path = %file_path.display(), "usage exported");

    Ok(ExportReport {
        path: file_path,
        stats,
        from,
        to,
    })
}

pub fn run(paths: &AppPaths, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<CommandStatus> {
    let report = export_usage(paths, from, to)?;

    println!("✅ Exported to: {}", report.path.display());
    println!("   Period: {} to {}", report.from, report.to);
    println!("   Sessions: {}", report.stats.total_sessions);
    println!("   Total cost: ${:.2}", report.stats.total_cost);

    Ok(CommandStatus::Success)
}
