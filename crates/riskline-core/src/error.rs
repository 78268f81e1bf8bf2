use thiserror::Error;

#[derive(Error, Debug)]
pub enum RisklineError {
    #[error("git {op} failed: {message}")]
    Git { op: String, message: String },

    #[error("workspace error: {0}")]
    Workspace(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("risk provider error: {0}")]
    Provider(String),

    #[error("watch error: {0}")]
    Watch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RisklineError {
    pub fn git(op: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Git {
            op: op.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RisklineError>;
