//! Subcommand handlers. Each takes the resolved configuration and prints to
//! stdout; diagnostics go through `tracing` to stderr.

use chrono::Utc;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::analysis::runner::{self, find_on_path};
use crate::analysis::{Orchestrator, ToolRunner};
use crate::api::{self, ApiClient, TrialRequest};
use crate::config::{
    AgentConfig, AnalysisMode, OutputFormat, DASHBOARD_URL, LOCAL_RUNTIME_COMMAND,
    LOCAL_RUNTIME_DOWNLOAD_URL, PRICING_URL,
};
use crate::doctor;
use crate::error::AgentError;
use crate::local_llm;
use crate::preflight;
use crate::render;
use crate::report::Report;
use crate::settings::{self, PersistentSettings};
use crate::setup::{self, SetupPlan};
use crate::subscription::{check_quota, QuotaDecision};

fn load(config: &AgentConfig) -> PersistentSettings {
    settings::load_settings(&config.settings_path)
}

/// Project id for this run: flag, then environment/settings, then a freshly
/// generated one.
fn resolve_project_id(flag: Option<String>, config: &AgentConfig) -> (String, bool) {
    if let Some(id) = flag.filter(|s| !s.trim().is_empty()) {
        return (id, false);
    }
    match &config.project_id {
        Some(id) => (id.clone(), false),
        None => (settings::generate_project_id(), true),
    }
}

async fn subscription_gate(config: &AgentConfig) -> Result<(), AgentError> {
    let client = ApiClient::from_config(config)?;
    let info = match client.subscription().await {
        Ok(info) => info,
        Err(e) => {
            warn!("Could not verify subscription status: {}", e);
            return Ok(());
        }
    };

    match check_quota(&info, Utc::now()) {
        QuotaDecision::Allowed => Ok(()),
        QuotaDecision::TrialEndingSoon { days_left } => {
            eprintln!(
                "{} Your trial ends in {} days. Upgrade at {}",
                "warning:".yellow().bold(),
                days_left,
                PRICING_URL
            );
            Ok(())
        }
        QuotaDecision::TrialExhausted { days_left } => {
            eprintln!("You've used {} trial analyses.", info.usage_label());
            if let Some(days) = days_left {
                eprintln!("Trial time remaining: {} days", days);
            }
            eprintln!("Upgrade to continue: {}", PRICING_URL);
            Err(AgentError::TrialLimitReached)
        }
    }
}

async fn ensure_local_ready(config: &AgentConfig) -> Result<(), AgentError> {
    if !local_llm::is_daemon_healthy(&config.local_url).await {
        return Err(AgentError::LocalModelUnavailable(config.local_url.clone()));
    }
    if !local_llm::is_model_available(&config.local_url, &config.local_model).await {
        warn!(
            "Model {} is not installed; run `ollama pull {}`",
            config.local_model, config.local_model
        );
    }
    Ok(())
}

fn present(report: &Report, output: OutputFormat) -> Result<(), AgentError> {
    match output {
        OutputFormat::Json => println!("{}", render::to_json(report)?),
        OutputFormat::Dashboard => print!("{}", render::summary(report)),
        OutputFormat::Quiet => {}
    }
    Ok(())
}

pub async fn run_analyze(
    config: &AgentConfig,
    directory: Option<PathBuf>,
    project_id: Option<String>,
    output: OutputFormat,
) -> Result<(), AgentError> {
    let sends = matches!(config.mode, AnalysisMode::Cloud | AnalysisMode::Hybrid);

    if sends {
        config.require_api_key()?;
        subscription_gate(config).await?;
    }

    let dir = preflight::check_directory(directory.as_deref().unwrap_or(Path::new(".")))?;

    let (project_id, generated) = resolve_project_id(project_id, config);
    if generated && output != OutputFormat::Json {
        println!("Generated project ID: {}", project_id);
        println!("Save it with: cloudpork config set project-id {}", project_id);
    }

    if config.mode != AnalysisMode::Cloud {
        ensure_local_ready(config).await?;
    }

    info!(
        "Analyzing {:?} (mode: {}, project: {})",
        dir,
        config.mode.as_str(),
        project_id
    );

    let orchestrator = Orchestrator::new(ToolRunner::from_config(config), dir, project_id);
    let report = match orchestrator.analyze().await {
        Ok(report) => report,
        Err(AgentError::ToolUnavailable(tool)) => {
            eprintln!("{}", runner::install_instructions());
            return Err(AgentError::ToolUnavailable(tool));
        }
        Err(e) => return Err(e),
    };

    present(&report, output)?;

    if sends {
        let client = ApiClient::from_config(config)?;
        client.send_report(&report).await?;
        if output == OutputFormat::Dashboard {
            println!(
                "\n{} View results at {}?project={}",
                "Report sent.".green().bold(),
                DASHBOARD_URL,
                report.project_id
            );
        }
    } else {
        debug!("Mode {} keeps the report local", config.mode.as_str());
    }

    Ok(())
}

/// Print `label` and read one trimmed line.
async fn prompt<R: AsyncBufRead + Unpin>(input: &mut R, label: &str) -> Result<String, AgentError> {
    println!("{}", label);
    let mut line = String::new();
    input.read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

pub async fn run_login(config: &AgentConfig, api_key: Option<String>) -> Result<(), AgentError> {
    let key = match api_key {
        Some(key) => key.trim().to_string(),
        None => {
            let mut stdin = BufReader::new(tokio::io::stdin());
            let label = format!("Enter your CloudPork API key (from {}):", DASHBOARD_URL);
            prompt(&mut stdin, &label).await?
        }
    };
    if key.is_empty() {
        return Err(AgentError::Config("API key cannot be empty".to_string()));
    }

    ApiClient::new(config.api_base_url.clone(), key.clone())?
        .validate_api_key()
        .await?;

    let mut stored = load(config);
    stored.api_key = Some(key);
    settings::save_settings(&config.settings_path, &stored)?;
    println!("{}", "Successfully authenticated with CloudPork.".green());
    Ok(())
}

pub async fn run_signup(
    config: &AgentConfig,
    email: Option<String>,
    name: Option<String>,
    company: Option<String>,
) -> Result<(), AgentError> {
    println!("{}", "Welcome to CloudPork! Let's start your free trial.".cyan().bold());

    let mut stdin = BufReader::new(tokio::io::stdin());
    let email = match email {
        Some(v) => v,
        None => prompt(&mut stdin, "Work email:").await?,
    };
    let name = match name {
        Some(v) => v,
        None => prompt(&mut stdin, "Your name:").await?,
    };
    let company = match company {
        Some(v) => v,
        None => prompt(&mut stdin, "Company (optional):").await?,
    };

    let request = TrialRequest::new(&email, &name, &company)?;
    let account = api::create_trial(&config.api_base_url, &request).await?;

    let mut stored = load(config);
    stored.api_key = Some(account.api_key.clone());
    stored.project_id = Some(account.project_id.clone());
    settings::save_settings(&config.settings_path, &stored)?;

    println!("{}", "Trial activated!".green().bold());
    println!("  Trial ends: {}", account.trial_ends_at.format("%B %-d, %Y"));
    println!("  Analyses remaining: {}", account.analyses_remaining);
    println!("  Project ID: {}", account.project_id);
    println!("\nReady to analyze! Run: cloudpork analyze");
    Ok(())
}

pub fn run_logout(config: &AgentConfig) -> Result<(), AgentError> {
    let mut stored = load(config);
    stored.clear_credentials();
    settings::save_settings(&config.settings_path, &stored)?;
    println!("Logged out of CloudPork.");
    Ok(())
}

pub async fn run_status(config: &AgentConfig) -> Result<(), AgentError> {
    let client = ApiClient::from_config(config)?;
    let info = client.subscription().await?;
    println!("{}", "Authenticated".green().bold());
    print!("{}", render::subscription_summary(&info));
    Ok(())
}

pub fn run_config_set(config: &AgentConfig, key: &str, value: &str) -> Result<(), AgentError> {
    let mut stored = load(config);
    stored.set(key, value)?;
    settings::save_settings(&config.settings_path, &stored)?;
    println!("Set {} = {}", key, value);
    Ok(())
}

pub fn run_config_get(config: &AgentConfig, key: &str) -> Result<(), AgentError> {
    let stored = load(config);
    match stored.get(key)? {
        Some(value) => println!("{}", value),
        None => println!("{} is not set", key),
    }
    Ok(())
}

pub async fn run_setup(
    config: &AgentConfig,
    mode: &str,
    model: Option<&str>,
    skip_validation: bool,
    force: bool,
) -> Result<(), AgentError> {
    let plan = SetupPlan::new(mode, model)?;
    println!("{}", "CloudPork Local AI Setup".cyan().bold());

    if plan.uses_local_model() {
        if !skip_validation {
            match setup::check_hardware(&doctor::system_summary()) {
                Ok(()) => println!("  Hardware check passed"),
                Err(e) if force => warn!("{}; continuing due to --force", e),
                Err(e) => return Err(e),
            }
        }

        if find_on_path(LOCAL_RUNTIME_COMMAND).is_some() {
            println!("  {} installed", LOCAL_RUNTIME_COMMAND);
        } else if force {
            warn!("{} not found on PATH; continuing due to --force", LOCAL_RUNTIME_COMMAND);
        } else {
            eprintln!("Install {} from {}", LOCAL_RUNTIME_COMMAND, LOCAL_RUNTIME_DOWNLOAD_URL);
            return Err(AgentError::ToolUnavailable(LOCAL_RUNTIME_COMMAND.to_string()));
        }

        if !skip_validation {
            if !local_llm::is_daemon_healthy(&config.local_url).await {
                println!("  Model daemon not running. Start it with: ollama serve");
            } else if !local_llm::is_model_available(&config.local_url, &plan.model).await {
                println!("  Model {} not installed. Run: ollama pull {}", plan.model, plan.model);
            } else {
                println!("  Model {} installed", plan.model);
            }
        }
    }

    let mut stored = load(config);
    plan.apply(&mut stored)?;
    settings::save_settings(&config.settings_path, &stored)?;

    println!("\n{}", "Setup complete".green().bold());
    println!("  Mode: {}", plan.mode.as_str());
    if plan.uses_local_model() {
        println!("  Model: {}", plan.model);
    }
    println!("  Config: {}", config.settings_path.display());
    match plan.mode {
        AnalysisMode::Local => println!("\nLocal mode: reports stay on this machine."),
        AnalysisMode::Hybrid => println!("\nHybrid mode: analyzed locally, report sent to CloudPork."),
        AnalysisMode::Cloud => {}
    }
    Ok(())
}

/// Returns false when the check found critical issues.
pub async fn run_doctor(config: &AgentConfig) -> bool {
    let report = doctor::run_doctor(config).await;
    print!("{}", doctor::render(&report));
    report.healthy()
}

pub fn version_string() -> String {
    format!(
        "cloudpork-agent {} ({}/{})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
