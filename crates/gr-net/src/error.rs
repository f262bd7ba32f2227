//! Error types for the learned projection path.

use std::path::PathBuf;

use gr_filter::FilterError;
use thiserror::Error;

/// Errors raised while building or running the predictor network.
#[derive(Error, Debug)]
pub enum NetError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Dimension mismatch: {what}")]
    DimensionMismatch { what: String },

    /// The feature vector reaching the projection stage is unusable.
    #[error("Degenerate features: {what}")]
    DegenerateFeatures { what: String },

    /// No control satisfies the constraint rows at this state; no
    /// output stage can repair that.
    #[error("Empty feasible interval: lo={lo} exceeds hi={hi}")]
    EmptyFeasibleRegion { lo: f64, hi: f64 },

    #[error("Failed to read checkpoint {path:?}: {source}")]
    CheckpointRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write checkpoint {path:?}: {source}")]
    CheckpointWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed checkpoint: {0}")]
    CheckpointParse(#[from] serde_json::Error),

    #[error("Checkpoint mismatch: {what}")]
    CheckpointMismatch { what: String },
}

pub type NetResult<T> = Result<T, NetError>;

impl From<NetError> for FilterError {
    fn from(e: NetError) -> Self {
        match e {
            NetError::DegenerateFeatures { .. } | NetError::EmptyFeasibleRegion { .. } => {
                FilterError::Degenerate {
                    what: e.to_string(),
                }
            }
            other => FilterError::Backend {
                message: other.to_string(),
            },
        }
    }
}
