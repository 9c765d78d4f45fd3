use crate::config::{AnalysisMode, DEFAULT_LOCAL_MODEL, DEFAULT_LOCAL_URL, MIN_CPU_CORES};
use crate::doctor::SystemSummary;
use crate::error::AgentError;
use crate::settings::PersistentSettings;

/// What `cloudpork setup` will write.
#[derive(Debug, Clone, PartialEq)]
pub struct SetupPlan {
    pub mode: AnalysisMode,
    pub model: String,
}

impl SetupPlan {
    pub fn new(mode: &str, model: Option<&str>) -> Result<Self, AgentError> {
        let parsed = if mode.trim().is_empty() {
            None
        } else {
            AnalysisMode::parse(mode)
        };
        let mode = parsed.ok_or_else(|| {
            AgentError::Config(format!(
                "invalid mode: {} (must be: local, hybrid, cloud)",
                mode
            ))
        })?;

        let model = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_LOCAL_MODEL)
            .to_string();

        Ok(Self { mode, model })
    }

    pub fn uses_local_model(&self) -> bool {
        self.mode != AnalysisMode::Cloud
    }

    /// Write the plan into `settings`. Cloud mode only changes the mode; an
    /// existing local URL is kept.
    pub fn apply(&self, settings: &mut PersistentSettings) -> Result<(), AgentError> {
        settings.set("llm-mode", self.mode.as_str())?;
        if self.uses_local_model() {
            settings.set("local-model", &self.model)?;
            if settings.local_url.is_none() {
                settings.set("local-url", DEFAULT_LOCAL_URL)?;
            }
        }
        Ok(())
    }
}

/// Minimum host for running a local model.
pub fn check_hardware(system: &SystemSummary) -> Result<(), AgentError> {
    if system.cpu_count < MIN_CPU_CORES {
        return Err(AgentError::InsufficientHardware(format!(
            "insufficient CPU cores: {} (minimum {} required)",
            system.cpu_count, MIN_CPU_CORES
        )));
    }
    Ok(())
}
