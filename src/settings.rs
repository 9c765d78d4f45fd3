use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::AgentError;

const SETTINGS_DIR: &str = ".cloudpork";
const SETTINGS_FILE: &str = "settings.json";

/// Keys accepted by `cloudpork config set/get`.
pub const SETTINGS_KEYS: &[&str] = &[
    "api-key",
    "project-id",
    "api-url",
    "llm-mode",
    "local-url",
    "local-model",
    "tool-command",
];

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct PersistentSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_command: Option<String>,
}

/// Map a user-facing key (dash or underscore form) to its canonical name.
fn canonical_key(key: &str) -> Option<&'static str> {
    match key {
        "api-key" | "api_key" => Some("api-key"),
        "project-id" | "project_id" => Some("project-id"),
        "api-url" | "api_url" => Some("api-url"),
        "llm-mode" | "llm_mode" | "mode" => Some("llm-mode"),
        "local-url" | "local_url" => Some("local-url"),
        "local-model" | "local_model" => Some("local-model"),
        "tool-command" | "tool_command" => Some("tool-command"),
        _ => None,
    }
}

impl PersistentSettings {
    fn slot(&mut self, key: &'static str) -> &mut Option<String> {
        match key {
            "api-key" => &mut self.api_key,
            "project-id" => &mut self.project_id,
            "api-url" => &mut self.api_base_url,
            "llm-mode" => &mut self.llm_mode,
            "local-url" => &mut self.local_url,
            "local-model" => &mut self.local_model,
            _ => &mut self.tool_command,
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<&str>, AgentError> {
        let value = match canonical_key(key).ok_or_else(|| unknown_key(key))? {
            "api-key" => &self.api_key,
            "project-id" => &self.project_id,
            "api-url" => &self.api_base_url,
            "llm-mode" => &self.llm_mode,
            "local-url" => &self.local_url,
            "local-model" => &self.local_model,
            _ => &self.tool_command,
        };
        Ok(value.as_deref())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), AgentError> {
        let key = canonical_key(key).ok_or_else(|| unknown_key(key))?;
        if key == "llm-mode" && crate::config::AnalysisMode::parse(value).is_none() {
            return Err(AgentError::Config(format!(
                "invalid mode: {} (must be: local, hybrid, cloud)",
                value
            )));
        }
        if key == "api-url" {
            url::Url::parse(value)
                .map_err(|e| AgentError::Config(format!("invalid URL {}: {}", value, e)))?;
        }

        let slot = self.slot(key);
        let value = value.trim();
        *slot = if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        };
        Ok(())
    }

    pub fn clear_credentials(&mut self) {
        self.api_key = None;
        self.project_id = None;
    }
}

fn unknown_key(key: &str) -> AgentError {
    AgentError::Config(format!(
        "unknown key '{}' (expected one of: {})",
        key,
        SETTINGS_KEYS.join(", ")
    ))
}

pub fn default_settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(SETTINGS_DIR)
        .join(SETTINGS_FILE)
}

pub fn load_settings(path: &Path) -> PersistentSettings {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring unreadable settings file {:?}: {}", path, e);
            PersistentSettings::default()
        }),
        Err(_) => PersistentSettings::default(),
    }
}

/// Write settings, creating the parent directory. The file holds the API key,
/// so on unix it is restricted to the owner.
pub fn save_settings(path: &Path, settings: &PersistentSettings) -> Result<(), AgentError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

/// New project id of the form `proj_` + 16 hex characters.
pub fn generate_project_id() -> String {
    let id = uuid::Uuid::new_v4();
    format!("proj_{}", hex::encode(&id.as_bytes()[..8]))
}
