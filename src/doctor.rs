use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use sysinfo::System;

use crate::analysis::runner::find_on_path;
use crate::config::{AgentConfig, AnalysisMode};
use crate::local_llm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub section: &'static str,
    pub name: String,
    pub status: CheckStatus,
    pub detail: Option<String>,
}

impl Check {
    fn new(section: &'static str, name: impl Into<String>, status: CheckStatus) -> Self {
        Self {
            section,
            name: name.into(),
            status,
            detail: None,
        }
    }

    fn hint(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemSummary {
    pub os: String,
    pub arch: &'static str,
    pub cpu_count: usize,
    pub total_ram_gb: f64,
    pub available_ram_gb: f64,
}

pub fn system_summary() -> SystemSummary {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_cpu_all();

    let gib = 1024.0 * 1024.0 * 1024.0;
    SystemSummary {
        os: System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
        arch: std::env::consts::ARCH,
        cpu_count: sys.cpus().len(),
        total_ram_gb: sys.total_memory() as f64 / gib,
        available_ram_gb: sys.available_memory() as f64 / gib,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorReport {
    pub system: SystemSummary,
    pub checks: Vec<Check>,
}

impl DoctorReport {
    pub fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    pub fn healthy(&self) -> bool {
        self.count(CheckStatus::Fail) == 0
    }
}

/// Checks that need no network access.
pub fn static_checks(config: &AgentConfig, tool_found: bool) -> Vec<Check> {
    let mut checks = Vec::new();

    checks.push(
        Check::new(
            "Configuration",
            format!("Analysis mode: {}", config.mode.as_str()),
            CheckStatus::Ok,
        )
        .hint(format!("settings: {}", config.settings_path.display())),
    );

    checks.push(if tool_found {
        Check::new(
            "Dependencies",
            format!("{} CLI installed", config.tool_command),
            CheckStatus::Ok,
        )
    } else {
        Check::new(
            "Dependencies",
            format!("{} CLI not found", config.tool_command),
            CheckStatus::Fail,
        )
        .hint(crate::analysis::runner::install_instructions())
    });

    checks.push(if config.api_key.is_some() {
        Check::new("API", "API key configured", CheckStatus::Ok)
    } else {
        Check::new("API", "No API key configured", CheckStatus::Warn)
            .hint("Run: cloudpork auth login")
    });

    checks
}

pub async fn run_doctor(config: &AgentConfig) -> DoctorReport {
    let tool_found = find_on_path(&config.tool_command).is_some();
    let mut checks = static_checks(config, tool_found);

    if config.mode != AnalysisMode::Cloud {
        if local_llm::is_daemon_healthy(&config.local_url).await {
            checks.push(Check::new(
                "Local Models",
                format!("Model daemon responding at {}", config.local_url),
                CheckStatus::Ok,
            ));
            let model_check = if local_llm::is_model_available(&config.local_url, &config.local_model).await {
                Check::new("Local Models", format!("{} installed", config.local_model), CheckStatus::Ok)
            } else {
                Check::new(
                    "Local Models",
                    format!("{} not installed", config.local_model),
                    CheckStatus::Warn,
                )
                .hint(format!("Run: ollama pull {}", config.local_model))
            };
            checks.push(model_check);
        } else {
            checks.push(
                Check::new(
                    "Local Models",
                    format!("Model daemon not reachable at {}", config.local_url),
                    CheckStatus::Fail,
                )
                .hint("Run: ollama serve"),
            );
        }
    }

    DoctorReport {
        system: system_summary(),
        checks,
    }
}

pub fn render(report: &DoctorReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n", "CloudPork Health Check".cyan().bold());

    let sys = &report.system;
    let _ = writeln!(out, "{}", "System".bold());
    let _ = writeln!(out, "  OS: {} {}", sys.os, sys.arch);
    let _ = writeln!(out, "  CPUs: {}", sys.cpu_count);
    let _ = writeln!(
        out,
        "  RAM: {:.1} GB total, {:.1} GB available",
        sys.total_ram_gb, sys.available_ram_gb
    );

    let mut section = "";
    for check in &report.checks {
        if check.section != section {
            section = check.section;
            let _ = writeln!(out, "\n{}", section.bold());
        }
        let mark = match check.status {
            CheckStatus::Ok => "ok".green(),
            CheckStatus::Warn => "warn".yellow(),
            CheckStatus::Fail => "fail".red().bold(),
        };
        let _ = writeln!(out, "  [{}] {}", mark, check.name);
        if let Some(detail) = &check.detail {
            for line in detail.lines() {
                let _ = writeln!(out, "       {}", line);
            }
        }
    }

    let fails = report.count(CheckStatus::Fail);
    let warns = report.count(CheckStatus::Warn);
    let _ = writeln!(out, "\n{}", "Summary".bold());
    if fails == 0 && warns == 0 {
        let _ = writeln!(out, "  All systems operational. Ready to analyze your codebase.");
    } else {
        if fails > 0 {
            let _ = writeln!(out, "  {} critical issues found", fails);
        }
        if warns > 0 {
            let _ = writeln!(out, "  {} warnings", warns);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PersistentSettings;
    use std::path::PathBuf;

    fn config(api_key: Option<&str>) -> AgentConfig {
        let settings = PersistentSettings {
            api_key: api_key.map(str::to_string),
            ..Default::default()
        };
        AgentConfig::resolve_with_env(PathBuf::from("/tmp/settings.json"), &settings, |_| None)
    }

    #[test]
    fn test_static_checks_missing_tool_fails() {
        let checks = static_checks(&config(Some("key")), false);
        let report = DoctorReport {
            system: system_summary(),
            checks,
        };
        assert!(!report.healthy());
        assert_eq!(report.count(CheckStatus::Fail), 1);
        assert_eq!(report.count(CheckStatus::Warn), 0);
    }

    #[test]
    fn test_static_checks_missing_key_warns() {
        let checks = static_checks(&config(None), true);
        let report = DoctorReport {
            system: system_summary(),
            checks,
        };
        assert!(report.healthy());
        assert_eq!(report.count(CheckStatus::Warn), 1);
    }

    #[test]
    fn test_render_lists_sections() {
        colored::control::set_override(false);
        let report = DoctorReport {
            system: system_summary(),
            checks: static_checks(&config(None), true),
        };
        let text = render(&report);
        assert!(text.contains("Configuration"));
        assert!(text.contains("[ok] claude CLI installed"));
        assert!(text.contains("[warn] No API key configured"));
        assert!(text.contains("1 warnings"));
    }
}
