use anyhow::Result;
use chrono::Utc;

use relay_core::{SessionState, UsageStats};

use super::{AppPaths, CommandStatus};
use crate::args::Period;
use crate::report::{
    RULE_WIDTH, daily_cost_graph, format_duration, format_tokens, rule, short_model_name,
};

pub fn run(paths: &AppPaths, period: Period, graph: bool) -> Result<CommandStatus> {
    let today = Utc::now().date_naive();
    let lines = match period.date_range(today) {
        None => session_report(&paths.open_state()?.state()),
        Some((from, to)) => {
            let stats = paths.open_ledger()?.usage_stats(from, to)?;
            period_report(period, &stats, graph)
        }
    };

    for line in lines {
        println!("{line}");
    }
    Ok(CommandStatus::Success)
}

fn session_report(state: &SessionState) -> Vec<String> {
    if !state.active {
        return vec![
            "ℹ️ No active Vertex AI session.".into(),
            "   Run `relay activate` to start a session.".into(),
        ];
    }

    let duration = state
        .started_at
        .map(|started| format_duration(Utc::now() - started))
        .unwrap_or_else(|| "unknown".into());

    vec![
        String::new(),
        "📊 Current Session Usage".into(),
        rule(RULE_WIDTH),
        format!("Model:          {}", state.model),
        format!("Duration:       {duration}"),
        String::new(),
        "Tokens:".into(),
        format!("  Input:        {:>10}", format_tokens(state.total_input_tokens)),
        format!("  Output:       {:>10}", format_tokens(state.total_output_tokens)),
        format!("  Total:        {:>10}", format_tokens(state.total_tokens())),
        String::new(),
        format!("Cost:           ${:.4}", state.total_cost),
        rule(RULE_WIDTH),
    ]
}

fn period_report(period: Period, stats: &UsageStats, graph: bool) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!("📊 Usage: {}", period.label()),
        rule(RULE_WIDTH),
        format!("Sessions:       {}", stats.total_sessions),
        format!("Requests:       {}", stats.total_requests),
        format!("Input tokens:   {}", format_tokens(stats.total_input_tokens)),
        format!("Output tokens:  {}", format_tokens(stats.total_output_tokens)),
        format!("Total cost:     ${:.2}", stats.total_cost),
    ];

    if !stats.by_model.is_empty() {
        lines.push(String::new());
        lines.push("By Model:".into());
        for (model, usage) in &stats.by_model {
            lines.push(format!(
                "  {}: {} requests, ${:.2}",
                short_model_name(model),
                usage.requests,
                usage.cost
            ));
        }
    }

    if graph && !stats.daily_breakdown.is_empty() {
        lines.push(String::new());
        lines.extend(daily_cost_graph(&stats.daily_breakdown));
        lines.push(String::new());
        lines.push(format!("Period Total: ${:.2}", stats.total_cost));
    }

    lines.push(rule(RULE_WIDTH));
    lines
}
