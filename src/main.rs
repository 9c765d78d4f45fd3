use anyhow::Context;
use clap::Parser;
use tracing::debug;

use cloudpork_agent::commands;
use cloudpork_agent::config::{AgentConfig, AuthAction, CliArgs, Command, ConfigAction};
use cloudpork_agent::settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Logs go to stderr so `--output json` stays machine-readable.
    let default_filter = if args.verbose {
        "cloudpork_agent=debug"
    } else {
        "cloudpork_agent=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings_path = args
        .config
        .clone()
        .unwrap_or_else(settings::default_settings_path);
    let stored = settings::load_settings(&settings_path);
    let config = AgentConfig::resolve(settings_path, &stored);
    debug!("Settings: {:?}, mode: {}", config.settings_path, config.mode.as_str());

    match args.command {
        Command::Analyze {
            directory,
            project_id,
            output,
        } => commands::run_analyze(&config, directory, project_id, output)
            .await
            .context("Analysis failed")?,
        Command::Auth { action } => match action {
            AuthAction::Login { api_key } => commands::run_login(&config, api_key)
                .await
                .context("Authentication failed")?,
            AuthAction::Signup {
                email,
                name,
                company,
            } => commands::run_signup(&config, email, name, company)
                .await
                .context("Failed to create trial")?,
            AuthAction::Logout => commands::run_logout(&config).context("Logout failed")?,
            AuthAction::Status => commands::run_status(&config)
                .await
                .context("Failed to get subscription status")?,
        },
        Command::Config { action } => match action {
            ConfigAction::Set { key, value } => commands::run_config_set(&config, &key, &value)
                .with_context(|| format!("Failed to set {}", key))?,
            ConfigAction::Get { key } => commands::run_config_get(&config, &key)
                .with_context(|| format!("Failed to read {}", key))?,
        },
        Command::Setup {
            mode,
            model,
            skip_validation,
            force,
        } => commands::run_setup(&config, &mode, model.as_deref(), skip_validation, force)
            .await
            .context("Setup failed")?,
        Command::Doctor => {
            if !commands::run_doctor(&config).await {
                std::process::exit(1);
            }
        }
        Command::Version => println!("{}", commands::version_string()),
    }

    Ok(())
}
