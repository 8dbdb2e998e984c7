//! Error types for synoptic-chart services.

use crate::level::LevelTag;
use crate::variable::VariableKind;
use thiserror::Error;

/// Result type alias using ChartError.
pub type ChartResult<T> = Result<T, ChartError>;

/// Terminal failure of a single analysis run.
///
/// Every variant is a structured value returned to the caller; the engine
/// never escalates a run failure into a panic.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    #[error("No observations found for level {0}")]
    NoObservationsFound(LevelTag),

    #[error("Insufficient validated {variable} data: {count} samples, need at least 3")]
    InsufficientValidatedData {
        variable: VariableKind,
        count: usize,
    },

    #[error("Interpolation failed: {0}")]
    InterpolationFailure(String),

    #[error("Contour tracing failed: {0}")]
    TracingFailure(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ChartError {
    /// HTTP status the API layer maps this failure to.
    pub fn http_status_code(&self) -> u16 {
        match self {
            ChartError::InvalidTimeFormat(_) => 400,
            ChartError::NoObservationsFound(_) => 404,
            ChartError::InsufficientValidatedData { .. } => 422,
            _ => 500,
        }
    }
}

/// Errors surfaced by a report store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether a bounded retry is worthwhile.
    ///
    /// Query and connection failures are treated as transient, matching the
    /// fetch retry the original pipeline performed; corrupt rows are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Database(_) | StoreError::Unavailable(_))
    }
}
