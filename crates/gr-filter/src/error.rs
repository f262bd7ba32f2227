//! Error types for safety filtering.

use thiserror::Error;

/// Errors that can occur while building or running a safety filter.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Dimension mismatch: {what}")]
    DimensionMismatch { what: String },

    /// Per-step failure to produce a usable control. The harness treats
    /// this as a flagged step, not a fatal error.
    #[error("Degenerate filter output: {what}")]
    Degenerate { what: String },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type FilterResult<T> = Result<T, FilterError>;

impl From<gr_core::GrError> for FilterError {
    fn from(e: gr_core::GrError) -> Self {
        FilterError::Backend {
            message: e.to_string(),
        }
    }
}
