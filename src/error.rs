use thiserror::Error;

pub type Result<T> = std::result::Result<T, BoardError>;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Approver not found: {0}")]
    ApproverNotFound(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Session expired or invalid. Log in again.")]
    Unauthorized,

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Other(String),
}

impl BoardError {
    /// True for failures that mean the session must be dropped
    pub fn requires_logout(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
