//! Scenario schema definitions.

use serde::{Deserialize, Serialize};

/// Newest scenario format this build understands.
pub const LATEST_VERSION: u32 = 1;

/// One closed-loop comparison: plant, constraints, nominal signal,
/// and predictor configuration in a single file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub version: u32,
    pub name: String,
    pub rollout: RolloutDef,
    pub dims: DimsDef,
    pub barrier: BarrierDef,
    pub nominal: NominalDef,
    pub predictor: PredictorDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RolloutDef {
    pub steps: usize,
    pub time_step_s: f64,
    pub initial_position: f64,
    pub initial_velocity: f64,
    /// Wall-clock budget per optimization-path solve; exceeding it is
    /// treated like infeasibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qp_deadline_ms: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DimsDef {
    pub input_dim: usize,
    pub context_dim: usize,
    pub output_dim: usize,
    pub constraint_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BarrierDef {
    pub position_bound: f64,
    pub alpha1: f64,
    pub alpha2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_bound: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum NominalDef {
    /// `amplitude * cos(step / period)`, the classic probing signal.
    Cosine { amplitude: f64, period: f64 },
    Constant { value: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictorDef {
    pub hidden_width: usize,
    pub method: ProjectionMethodDef,
    pub weights: WeightsDef,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMethodDef {
    Squash,
    Clamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum WeightsDef {
    /// Kaiming-initialize from the seed; feasible even untrained.
    Fresh { seed: u64 },
    /// Load a JSON checkpoint keyed to this scenario's name.
    Checkpoint { path: String },
}
