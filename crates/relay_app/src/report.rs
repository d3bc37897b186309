//! Plain-text formatting for usage reports.

use relay_core::DailyUsage;

/// Width of a report rule line.
pub const RULE_WIDTH: usize = 40;
const GRAPH_RULE_WIDTH: usize = 45;
const BAR_WIDTH: usize = 16;
/// Floor for the graph scale so days with tiny costs do not fill the bar.
const MIN_GRAPH_SCALE: f64 = 0.01;

pub fn rule(width: usize) -> String {
    "━".repeat(width)
}

/// `1234` -> `1.2k`, `2500000` -> `2.5M`.
pub fn format_tokens(tokens: u64) -> String {
    if tokens >= 1_000_000 {
        format!("{:.1}M", tokens as f64 / 1_000_000.0)
    } else if tokens >= 1_000 {
        format!("{:.1}k", tokens as f64 / 1_000.0)
    } else {
        tokens.to_string()
    }
}

/// `1234567` -> `1,234,567`.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Elapsed time as `2h 5m` or `12m`. Negative spans count as zero.
pub fn format_duration(elapsed: chrono::Duration) -> String {
    let minutes_total = elapsed.num_minutes().max(0);
    let hours = minutes_total / 60;
    let minutes = minutes_total % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// `claude-opus-4-5` -> `opus-4.5`.
pub fn short_model_name(model: &str) -> String {
    model
        .replacen("claude-", "", 1)
        .replacen("-4-5", "-4.5", 1)
        .replacen("-3-5", "-3.5", 1)
}

/// Daily cost bar graph, one line per day, framed by rules.
pub fn daily_cost_graph(days: &[DailyUsage]) -> Vec<String> {
    if days.is_empty() {
        return Vec::new();
    }

    let max_cost = days
        .iter()
        .map(|d| d.cost)
        .fold(MIN_GRAPH_SCALE, f64::max);

    let mut lines = Vec::with_capacity(days.len() + 3);
    lines.push("📈 Daily Cost".to_string());
    lines.push(rule(GRAPH_RULE_WIDTH));
    for day in days {
        let filled = ((day.cost / max_cost) * BAR_WIDTH as f64).round() as usize;
        let filled = filled.min(BAR_WIDTH);
        let bar = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));
        // MM-DD
        let date = day.date.get(5..).unwrap_or(&day.date);
        lines.push(format!("{date} │{bar}│ ${:.2}", day.cost));
    }
    lines.push(rule(GRAPH_RULE_WIDTH));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: &str, cost: f64) -> DailyUsage {
        DailyUsage {
            date: date.into(),
            sessions: 1,
            requests: 1,
            input_tokens: 0,
            output_tokens: 0,
            cost,
        }
    }

    #[test]
    fn tokens_are_abbreviated() {
        assert_eq!(format_tokens(0), "0");
        assert_eq!(format_tokens(999), "999");
        assert_eq!(format_tokens(1_000), "1.0k");
        assert_eq!(format_tokens(1_240), "1.2k");
        assert_eq!(format_tokens(2_500_000), "2.5M");
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_000), "1,000");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(chrono::Duration::minutes(12)), "12m");
        assert_eq!(format_duration(chrono::Duration::minutes(125)), "2h 5m");
        assert_eq!(format_duration(chrono::Duration::seconds(59)), "0m");
        assert_eq!(format_duration(chrono::Duration::minutes(-5)), "0m");
    }

    #[test]
    fn model_names_are_shortened() {
        assert_eq!(short_model_name("claude-opus-4-5"), "opus-4.5");
        assert_eq!(short_model_name("claude-haiku-3-5"), "haiku-3.5");
        assert_eq!(short_model_name("claude-sonnet-4"), "sonnet-4");
        assert_eq!(short_model_name("custom-model"), "custom-model");
    }

    #[test]
    fn graph_is_empty_without_data() {
        assert!(daily_cost_graph(&[]).is_empty());
    }

    #[test]
    fn graph_scales_to_largest_day() {
        let lines = daily_cost_graph(&[day("2025-03-01", 2.0), day("2025-03-02", 1.0), day("2025-03-03", 0.0)]);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[2], format!("03-01 │{}│ $2.00", "█".repeat(16)));
        assert_eq!(lines[3], format!("03-02 │{}{}│ $1.00", "█".repeat(8), "░".repeat(8)));
        assert_eq!(lines[4], format!("03-03 │{}│ $0.00", "░".repeat(16)));
    }

    #[test]
    fn graph_uses_minimum_scale() {
        let lines = daily_cost_graph(&[day("2025-03-01", 0.0025)]);
        // A quarter of the minimum scale.
        assert_eq!(lines[2], format!("03-01 │{}{}│ $0.00", "█".repeat(4), "░".repeat(12)));
    }
}
