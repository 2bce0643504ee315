use crate::tracker::TrackerError;
use roledb::DbError;
use thiserror::Error;

/// Result type for shift operations.
pub type ShiftResult<T> = Result<T, ShiftError>;

#[derive(Debug, Error)]
pub enum ShiftError {
    /// Required request fields were empty or zero.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid shift payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("vehicle status update failed: {0}")]
    Db(#[from] DbError),

    #[error("tracker failed: {0}")]
    Tracker(#[from] TrackerError),
}

impl ShiftError {
    /// Whether the caller sent a bad request, as opposed to a backend failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingFields(_) | Self::Parse(_))
    }
}
