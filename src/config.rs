use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::settings::PersistentSettings;

/// CloudPork Agent: cut the pork from your cloud costs.
#[derive(Parser, Debug, Clone)]
#[command(name = "cloudpork", version)]
pub struct CliArgs {
    /// Settings file (default is ~/.cloudpork/settings.json)
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Analyze a codebase for cloud cost optimization
    Analyze {
        /// Directory to analyze (defaults to the current directory)
        directory: Option<PathBuf>,

        /// CloudPork project ID
        #[arg(short = 'p', long = "project-id")]
        project_id: Option<String>,

        /// Output format
        #[arg(short = 'o', long = "output", value_enum, default_value_t = OutputFormat::Dashboard)]
        output: OutputFormat,
    },

    /// Manage CloudPork authentication
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Read or write persistent settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Configure local or hybrid analysis against a local model daemon
    Setup {
        /// Analysis mode: local, hybrid, cloud
        #[arg(long = "mode", default_value = "local")]
        mode: String,

        /// Model to use (defaults to codellama:7b)
        #[arg(long = "model")]
        model: Option<String>,

        /// Skip hardware and daemon checks
        #[arg(long = "skip-validation")]
        skip_validation: bool,

        /// Continue when a check fails
        #[arg(long = "force")]
        force: bool,
    },

    /// Diagnose CloudPork setup and configuration
    Doctor,

    /// Show agent version
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AuthAction {
    /// Store an API key (read from --api-key or stdin)
    Login {
        #[arg(long = "api-key")]
        api_key: Option<String>,
    },
    /// Start a free trial and store the issued credentials
    Signup {
        #[arg(long = "email")]
        email: Option<String>,
        #[arg(long = "name")]
        name: Option<String>,
        #[arg(long = "company")]
        company: Option<String>,
    },
    /// Remove stored credentials
    Logout,
    /// Show subscription status
    Status,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Set a settings key
    Set { key: String, value: String },
    /// Print a settings key
    Get { key: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Dashboard,
    Json,
    Quiet,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    #[default]
    Cloud,
    Local,
    Hybrid,
}

impl AnalysisMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cloud" | "" => Some(AnalysisMode::Cloud),
            "local" => Some(AnalysisMode::Local),
            "hybrid" => Some(AnalysisMode::Hybrid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Cloud => "cloud",
            AnalysisMode::Local => "local",
            AnalysisMode::Hybrid => "hybrid",
        }
    }
}

// Remote service
pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudpork.com";
pub const API_TIMEOUT_SECS: u64 = 30;
pub const SUBSCRIPTION_TIMEOUT_SECS: u64 = 10;
pub const SIGNUP_TIMEOUT_SECS: u64 = 10;
pub const PLATFORM: &str = "cli";
pub const DASHBOARD_URL: &str = "https://cloudpork.com/dashboard";
pub const PRICING_URL: &str = "https://cloudpork.com/pricing";

// Environment overrides
pub const API_KEY_ENV: &str = "CLOUDPORK_API_KEY";
pub const PROJECT_ID_ENV: &str = "CLOUDPORK_PROJECT_ID";
pub const API_URL_ENV: &str = "CLOUDPORK_API_URL";

// External analysis tool
pub const DEFAULT_TOOL_COMMAND: &str = "claude";
pub const DEFAULT_TOOL_ARGS: &[&str] = &["code"];

// Local model daemon
pub const DEFAULT_LOCAL_URL: &str = "http://localhost:11434";
pub const DEFAULT_LOCAL_MODEL: &str = "codellama:7b";
pub const LOCAL_PROBE_TIMEOUT_SECS: u64 = 5;
pub const LOCAL_RUNTIME_COMMAND: &str = "ollama";
pub const LOCAL_RUNTIME_DOWNLOAD_URL: &str = "https://ollama.com/download";

// Minimum host for local analysis
pub const MIN_CPU_CORES: usize = 2;

// Subscription gate
pub const TRIAL_WARNING_DAYS: i64 = 2;

// Files whose presence marks a directory as a code project.
pub const PROJECT_INDICATORS: &[&str] = &[
    "package.json",
    "requirements.txt",
    "go.mod",
    "Cargo.toml",
    "composer.json",
    "Gemfile",
    "pom.xml",
    "build.gradle",
    "Dockerfile",
    ".git",
];

pub const SOURCE_DIRS: &[&str] = &["src", "lib", "app", "components", "pages"];

pub fn user_agent() -> String {
    format!("CloudPork-Agent/{}", env!("CARGO_PKG_VERSION"))
}

/// Effective configuration for one command: settings file, then environment,
/// then flags, later sources winning.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub settings_path: PathBuf,
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    pub api_base_url: String,
    pub mode: AnalysisMode,
    pub local_url: String,
    pub local_model: String,
    pub tool_command: String,
    pub tool_args: Vec<String>,
}

impl AgentConfig {
    pub fn resolve(settings_path: PathBuf, settings: &PersistentSettings) -> Self {
        Self::resolve_with_env(settings_path, settings, |key| {
            std::env::var(key).ok()
        })
    }

    pub fn resolve_with_env<F>(
        settings_path: PathBuf,
        settings: &PersistentSettings,
        env: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let api_key = non_empty(env(API_KEY_ENV)).or_else(|| non_empty(settings.api_key.clone()));
        let project_id =
            non_empty(env(PROJECT_ID_ENV)).or_else(|| non_empty(settings.project_id.clone()));
        let api_base_url = non_empty(env(API_URL_ENV))
            .or_else(|| non_empty(settings.api_base_url.clone()))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let mode = settings
            .llm_mode
            .as_deref()
            .and_then(AnalysisMode::parse)
            .unwrap_or_default();

        let (tool_command, tool_args) = match non_empty(settings.tool_command.clone()) {
            Some(cmdline) => {
                let mut parts = cmdline.split_whitespace().map(str::to_string);
                let command = parts
                    .next()
                    .unwrap_or_else(|| DEFAULT_TOOL_COMMAND.to_string());
                (command, parts.collect())
            }
            None => (
                DEFAULT_TOOL_COMMAND.to_string(),
                DEFAULT_TOOL_ARGS.iter().map(|s| s.to_string()).collect(),
            ),
        };

        AgentConfig {
            settings_path,
            api_key,
            project_id,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            mode,
            local_url: non_empty(settings.local_url.clone())
                .unwrap_or_else(|| DEFAULT_LOCAL_URL.to_string()),
            local_model: non_empty(settings.local_model.clone())
                .unwrap_or_else(|| DEFAULT_LOCAL_MODEL.to_string()),
            tool_command,
            tool_args,
        }
    }

    pub fn require_api_key(&self) -> Result<&str, crate::error::AgentError> {
        self.api_key
            .as_deref()
            .ok_or(crate::error::AgentError::NotAuthenticated)
    }
}
