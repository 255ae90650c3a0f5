use thiserror::Error;
use voxtask_core::error::CoreError;

#[derive(Error, Debug)]
pub enum AgentError {
    /// Arguments failed their declared schema; nothing was executed.
    #[error("Invalid arguments: {0}")]
    Validation(String),

    #[error("No content in completion response")]
    NoContent,

    #[error("Malformed suggestion: {0}")]
    MalformedSuggestion(String),

    #[error("Completion service error: {0}")]
    Completion(String),

    #[error(transparent)]
    Store(#[from] CoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Stable machine-readable code reported across the bridge.
    pub fn code(&self) -> &'static str {
        match self {
            AgentError::Validation(_) => "VALIDATION_ERROR",
            AgentError::NoContent | AgentError::MalformedSuggestion(_) => {
                "CLASSIFICATION_UNAVAILABLE"
            }
            AgentError::Completion(_) => "COMPLETION_ERROR",
            AgentError::Store(err) => err.code(),
            AgentError::Config(_) => "CONFIG_ERROR",
            AgentError::Io(_) => "IO_ERROR",
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
