#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Analysis tool `{0}` not found on PATH")]
    ToolUnavailable(String),

    #[error("Analysis tool failed ({status})\nOutput: {output}")]
    ToolInvocation { status: String, output: String },

    #[error("Directory does not exist: {0}")]
    DirectoryNotFound(String),

    #[error("No API key found. Run 'cloudpork auth login' to authenticate")]
    NotAuthenticated,

    #[error("Trial limit reached - upgrade to continue")]
    TrialLimitReached,

    #[error("Hardware check failed: {0}")]
    InsufficientHardware(String),

    #[error("Local model daemon not reachable at {0}")]
    LocalModelUnavailable(String),

    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl AgentError {
    /// True for the two kinds that abort an analysis run outright.
    pub fn is_tool_failure(&self) -> bool {
        matches!(
            self,
            AgentError::ToolUnavailable(_) | AgentError::ToolInvocation { .. }
        )
    }
}
