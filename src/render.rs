//! Console projections of a finished report. Nothing here adds data.

use colored::{ColoredString, Colorize};
use std::fmt::Write;

use crate::error::AgentError;
use crate::report::{Report, Severity};
use crate::subscription::SubscriptionInfo;

pub fn to_json(report: &Report) -> Result<String, AgentError> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn severity_marker(severity: Severity) -> ColoredString {
    match severity {
        Severity::Critical => "●".red().bold(),
        Severity::High => "●".red(),
        Severity::Medium => "●".yellow(),
        Severity::Low => "●".green(),
    }
}

fn complexity_label(score: i64) -> ColoredString {
    let label = format!("{}/100", score);
    match score {
        s if s >= 80 => label.red().bold(),
        s if s >= 60 => label.yellow().bold(),
        s if s >= 40 => label.cyan().bold(),
        _ => label.green().bold(),
    }
}

/// Human-oriented summary of a normalized report.
pub fn summary(report: &Report) -> String {
    let mut out = String::new();
    let res = &report.resource_usage;

    // Writing to a String cannot fail.
    let _ = writeln!(out, "{}", "Analysis Summary".cyan().bold());
    let _ = writeln!(out, "{}\n", "=".repeat(50).dimmed());

    let _ = writeln!(out, "  {}: {}", "Framework".bold(), report.framework);
    let _ = writeln!(out, "  {}: {}", "Language".bold(), report.language);
    let _ = writeln!(out, "  {}: {}", "Dependencies".bold(), report.dependencies.len());
    let _ = writeln!(out, "  {}: {}", "API Endpoints".bold(), report.api_endpoints);
    let _ = writeln!(
        out,
        "  {}: {}",
        "Background Jobs".bold(),
        report.background_jobs.len()
    );
    if !report.cache_usage.is_empty() {
        let _ = writeln!(out, "  {}: {}", "Caching".bold(), report.cache_usage.join(", "));
    }
    out.push('\n');

    let _ = writeln!(out, "{}", "Resource Requirements".green().bold());
    let _ = writeln!(out, "  Memory: {} MB", res.memory_mb);
    let _ = writeln!(out, "  CPU: {:.1} cores", res.cpu_cores);
    let _ = writeln!(out, "  DB Connections: {}", res.database_connections);
    let _ = writeln!(out, "  Network: {} Mbps", res.network_mbps);
    let _ = writeln!(out, "  Storage: {} GB", res.storage_gb);
    out.push('\n');

    if !report.scaling_bottlenecks.is_empty() {
        let _ = writeln!(out, "{}", "Scaling Bottlenecks".yellow().bold());
        for b in &report.scaling_bottlenecks {
            let _ = writeln!(
                out,
                "  {} {}: {}",
                severity_marker(b.severity),
                b.category.to_string().bold(),
                b.description
            );
        }
        out.push('\n');
    }

    let perf = &report.performance;
    if perf.has_n_plus_one_query || perf.has_large_payloads {
        let _ = writeln!(out, "{}", "Performance Issues".red().bold());
        if perf.has_n_plus_one_query {
            let _ = writeln!(out, "  • N+1 query patterns detected");
        }
        if perf.has_large_payloads {
            let _ = writeln!(out, "  • Large payload responses found");
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "{}: {}",
        "Complexity Score".bold(),
        complexity_label(report.complexity_score)
    );
    let _ = writeln!(
        out,
        "{}: ~{}",
        "Estimated Users".bold(),
        report.estimated_users
    );
    out
}

pub fn subscription_summary(info: &SubscriptionInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Subscription".cyan().bold());
    let _ = writeln!(out, "  Tier: {}", info.tier);
    let _ = writeln!(out, "  Status: {}", info.status);
    let _ = writeln!(out, "  Analyses: {}", info.usage_label());
    if info.is_trialing {
        match info.days_left(chrono::Utc::now()) {
            Some(days) => {
                let _ = writeln!(out, "  Trial: {} days remaining", days);
            }
            None => {
                let _ = writeln!(out, "  Trial: active");
            }
        }
    }
    out
}
