//! Error types for plant models.

use thiserror::Error;

/// Errors raised while constructing or stepping a plant.
#[derive(Error, Debug)]
pub enum PlantError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type PlantResult<T> = Result<T, PlantError>;

impl From<gr_core::GrError> for PlantError {
    fn from(e: gr_core::GrError) -> Self {
        PlantError::Backend {
            message: e.to_string(),
        }
    }
}
