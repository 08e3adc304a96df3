use serde_json::Error as JsonError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Rate limit error: {0}")]
    RateLimitError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {body}")]
    APIError { status: u16, body: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unknown issue status '{0}' (expected open, closed, in_progress, reopened or done)")]
    InvalidStatus(String),
}

impl From<JsonError> for TrackerError {
    fn from(error: JsonError) -> Self {
        TrackerError::ParseError(format!("JSON serialization error: {}", error))
    }
}

impl From<validator::ValidationErrors> for TrackerError {
    fn from(errors: validator::ValidationErrors) -> Self {
        TrackerError::ValidationError(errors.to_string())
    }
}
