//! Closed-form projection of the nominal control onto the feasible set.
//!
//! With a scalar control every affine row cuts a half-line, so the QP
//!
//!   min (u - u_nom)^2  subject to  A u <= b
//!
//! reduces to clamping the nominal control into the interval the rows
//! carve out. No iterative solver is involved and the output is a pure
//! function of the context.

use gr_core::ensure_finite;

use crate::constraint::BarrierConstraint;
use crate::context::{ProblemContext, ProblemDims};
use crate::error::{FilterError, FilterResult};
use crate::filter::{FilterOutcome, SafetyFilter};

/// Optimization-path safety filter.
#[derive(Clone, Debug)]
pub struct QpFilter {
    constraint: BarrierConstraint,
}

impl QpFilter {
    /// Build the filter, rejecting dimension sets the closed form
    /// cannot serve.
    pub fn new(constraint: BarrierConstraint, dims: &ProblemDims) -> FilterResult<Self> {
        if dims.output_dim != 1 {
            return Err(FilterError::DimensionMismatch {
                what: format!(
                    "closed-form projection needs a scalar control, got output_dim={}",
                    dims.output_dim
                ),
            });
        }
        if dims.constraint_count != constraint.row_count() {
            return Err(FilterError::DimensionMismatch {
                what: format!(
                    "configured constraint_count={} but the barrier emits {} rows",
                    dims.constraint_count,
                    constraint.row_count()
                ),
            });
        }
        Ok(Self { constraint })
    }

    pub fn constraint(&self) -> &BarrierConstraint {
        &self.constraint
    }
}

impl SafetyFilter for QpFilter {
    fn name(&self) -> &'static str {
        "cbf-qp"
    }

    fn filter(&self, ctx: &ProblemContext) -> FilterResult<FilterOutcome> {
        let rows = self.constraint.rows(ctx.position, ctx.velocity);
        let (lo, hi) = rows.interval();
        if lo <= hi {
            let value = ensure_finite(ctx.nominal.clamp(lo, hi), "filtered control")?;
            Ok(FilterOutcome::Optimized {
                value,
                feasible: true,
            })
        } else {
            // Both cuts are finite when they cross; split the difference
            // and let the caller flag the step.
            let value = ensure_finite(0.5 * (lo + hi), "fallback control")?;
            Ok(FilterOutcome::Optimized {
                value,
                feasible: false,
            })
        }
    }
}
