use thiserror::Error;

use crate::api_connection::connection::LookupError;

/// Errors surfaced by the tracker core and its collaborators.
///
/// An unknown nutrient value is never an error; it travels as `None`.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Lookup unavailable: {0}")]
    LookupUnavailable(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl TrackerError {
    pub fn invalid(message: impl Into<String>) -> Self {
        TrackerError::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        TrackerError::NotFound(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TrackerError::NotFound(_))
    }
}

impl From<LookupError> for TrackerError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound(id) => TrackerError::NotFound(format!("food item '{}'", id)),
            other => TrackerError::LookupUnavailable(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
