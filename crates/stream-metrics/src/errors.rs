use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No stream found for activity {activity_id} (user {user_id})")]
    NotFound { activity_id: i64, user_id: Uuid },

    #[error("Malformed stream file {}: {message}", path.display())]
    MalformedStream { path: PathBuf, message: String },

    #[error("GPX parsing error: {0}")]
    GpxParsing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timestamp formatting error: {0}")]
    Format(#[from] time::error::Format),
}

impl MetricsError {
    pub fn validation(message: impl Into<String>) -> Self {
        MetricsError::Validation(message.into())
    }

    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        MetricsError::MalformedStream {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MetricsError::NotFound { .. })
    }
}

pub type Result<T, E = MetricsError> = std::result::Result<T, E>;
