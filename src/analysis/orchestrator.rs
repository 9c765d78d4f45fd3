use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};

use super::normalize::normalize;
use super::passes::Pass;
use super::runner::PassRunner;
use crate::error::AgentError;
use crate::report::Report;

/// Drives the four analysis passes over one directory.
pub struct Orchestrator<R> {
    runner: R,
    directory: PathBuf,
    project_id: String,
}

impl<R: PassRunner> Orchestrator<R> {
    pub fn new(runner: R, directory: impl Into<PathBuf>, project_id: impl Into<String>) -> Self {
        Self {
            runner,
            directory: directory.into(),
            project_id: project_id.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Run every pass in order and return the raw, un-normalized report.
    ///
    /// The first runner error ends the run; no partially filled report is
    /// returned.
    pub async fn run_passes(&self) -> Result<Report, AgentError> {
        if !self.runner.is_available() {
            return Err(AgentError::ToolUnavailable(
                self.runner.tool_name().to_string(),
            ));
        }

        let mut report = Report::new(
            self.project_id.clone(),
            self.directory.display().to_string(),
        );

        for (index, pass) in Pass::ALL.iter().enumerate() {
            let started = Instant::now();
            info!("Pass {}/{}: {}", index + 1, Pass::ALL.len(), pass);

            let instruction = pass.instruction(&report);
            let output = match self.runner.run_pass(&instruction, &self.directory).await {
                Ok(output) => output,
                Err(e) => {
                    error!("{} pass failed: {}", pass, e);
                    return Err(e);
                }
            };

            report = pass.apply(report, &output);
            info!(
                "Pass {} done in {:.1}s ({} bytes of output)",
                pass,
                started.elapsed().as_secs_f64(),
                output.len()
            );
        }

        Ok(report)
    }

    /// Full pipeline: passes, then normalization.
    pub async fn analyze(&self) -> Result<Report, AgentError> {
        let report = self.run_passes().await?;
        Ok(normalize(report))
    }
}
