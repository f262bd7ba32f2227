//! Error types for the harness layer.

/// Unified error for rollout execution, consumed by the CLI.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("Plant error: {0}")]
    Plant(String),

    #[error("Filter error: {0}")]
    Filter(String),

    #[error("Predictor error: {0}")]
    Net(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Configuration mismatch: {message}")]
    ConfigMismatch { message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

impl From<gr_scenario::ScenarioError> for HarnessError {
    fn from(err: gr_scenario::ScenarioError) -> Self {
        HarnessError::Scenario(err.to_string())
    }
}

impl From<gr_plant::PlantError> for HarnessError {
    fn from(err: gr_plant::PlantError) -> Self {
        HarnessError::Plant(err.to_string())
    }
}

impl From<gr_filter::FilterError> for HarnessError {
    fn from(err: gr_filter::FilterError) -> Self {
        HarnessError::Filter(err.to_string())
    }
}

impl From<gr_net::NetError> for HarnessError {
    fn from(err: gr_net::NetError) -> Self {
        HarnessError::Net(err.to_string())
    }
}

impl From<gr_results::ResultsError> for HarnessError {
    fn from(err: gr_results::ResultsError) -> Self {
        HarnessError::Results(err.to_string())
    }
}

impl From<gr_core::GrError> for HarnessError {
    fn from(err: gr_core::GrError) -> Self {
        HarnessError::InvalidInput(err.to_string())
    }
}
