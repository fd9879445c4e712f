use thiserror::Error;

#[derive(Error, Debug)]
pub enum TeamError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Tool error: {tool}: {message}")]
    Tool { tool: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Speaker selection failed: {0}")]
    Selection(String),

    #[error("Termination condition already reached; reset it before checking again")]
    Terminated,

    #[error("{0}")]
    Other(String),
}

impl TeamError {
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn missing_env(var: &str, provider: &str) -> Self {
        Self::Config(format!("Set {var} environment variable for {provider}"))
    }
}

pub type Result<T> = std::result::Result<T, TeamError>;
