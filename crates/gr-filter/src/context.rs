//! Per-step problem inputs and static dimensions.

use gr_core::Real;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Inputs for one filtering decision.
///
/// Rebuilt from scratch every step; consumed, never mutated. Both
/// strategies of a comparison receive the same context.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProblemContext {
    /// Unfiltered control requested by the outer loop
    pub nominal: Real,
    /// Plant position at decision time
    pub position: Real,
    /// Plant velocity at decision time
    pub velocity: Real,
}

impl ProblemContext {
    pub fn new(nominal: Real, position: Real, velocity: Real) -> Self {
        Self {
            nominal,
            position,
            velocity,
        }
    }

    /// Stacked `[nominal, position, velocity]` column, the network input
    /// layout shared with trained checkpoints.
    pub fn input_vector(&self) -> DVector<Real> {
        DVector::from_column_slice(&[self.nominal, self.position, self.velocity])
    }
}

/// Static widths of the per-step problem.
///
/// Fixed at configuration time and shared by both strategies; a filter
/// rejects dimensions it cannot serve at construction, never mid-run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDims {
    /// Width of the objective slice of the network input (the nominal control)
    pub input_dim: usize,
    /// Width of the state context (position, velocity)
    pub context_dim: usize,
    /// Width of the produced control
    pub output_dim: usize,
    /// Number of affine constraint rows
    pub constraint_count: usize,
}

impl ProblemDims {
    /// Total network input width: objective slice plus state context.
    pub fn input_width(&self) -> usize {
        self.input_dim + self.context_dim
    }
}
