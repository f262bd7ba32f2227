//! Output stage that cannot leave the feasible set.
//!
//! The stack's features collapse to one raw score; the head then maps
//! the score into the interval the constraint rows carve out at the
//! current state. `Squash` centers a tanh on the interval, `Clamp`
//! cuts the raw score hard at its edges. Either way the emitted
//! control satisfies the rows, trained weights or not.

use gr_core::Real;
use gr_filter::ConstraintSet;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{NetError, NetResult};
use crate::layer::Affine;

/// How the raw score is mapped into the feasible interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMethod {
    Squash,
    Clamp,
}

/// Final stage of the projection path.
#[derive(Clone, Debug)]
pub struct ProjectionHead {
    collapse: Affine,
    method: ProjectionMethod,
}

impl ProjectionHead {
    pub fn new(collapse: Affine, method: ProjectionMethod) -> NetResult<Self> {
        if collapse.out_dim() != 1 {
            return Err(NetError::DimensionMismatch {
                what: format!(
                    "projection head must collapse to one score, got {}",
                    collapse.out_dim()
                ),
            });
        }
        Ok(Self { collapse, method })
    }

    pub fn method(&self) -> ProjectionMethod {
        self.method
    }

    pub fn in_dim(&self) -> usize {
        self.collapse.in_dim()
    }

    pub(crate) fn collapse(&self) -> &Affine {
        &self.collapse
    }

    /// Map stack features into the feasible interval of `rows`.
    pub fn project(&self, features: &DVector<Real>, rows: &ConstraintSet) -> NetResult<Real> {
        if features.is_empty() {
            return Err(NetError::DegenerateFeatures {
                what: "empty feature vector".to_string(),
            });
        }
        if features.len() != self.collapse.in_dim() {
            return Err(NetError::DimensionMismatch {
                what: format!(
                    "head expects {} features but received {}",
                    self.collapse.in_dim(),
                    features.len()
                ),
            });
        }
        let score = self.collapse.apply(features)[0];
        if !score.is_finite() {
            return Err(NetError::DegenerateFeatures {
                what: format!("non-finite raw score {score}"),
            });
        }
        let (lo, hi) = rows.interval();
        if !(lo <= hi) {
            return Err(NetError::EmptyFeasibleRegion { lo, hi });
        }
        let value = match self.method {
            ProjectionMethod::Squash if lo.is_finite() && hi.is_finite() => {
                let mid = 0.5 * (lo + hi);
                let half = 0.5 * (hi - lo);
                mid + half * score.tanh()
            }
            // An unbounded side leaves no center to squash toward.
            _ => score.clamp(lo, hi),
        };
        Ok(value)
    }
}
