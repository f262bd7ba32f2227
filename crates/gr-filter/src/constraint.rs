//! Affine safety constraints for the double integrator.
//!
//! Keeping |x| <= x_max is enforced through a pair of second-order
//! barrier conditions, one per side of the corridor. For h = x_max - x
//! (and its mirror), requiring (d/dt + a1)(d/dt + a2) h >= 0 along the
//! dynamics collapses each side to a single affine bound on the control:
//!
//!   u <=  a1*a2*(x_max - x) - (a1 + a2)*v
//!   u >= -a1*a2*(x_max + x) - (a1 + a2)*v
//!
//! The two rows always admit a control: their gap is 2*a1*a2*x_max
//! regardless of the state. An optional symmetric force limit adds two
//! more rows and can close the gap.

use gr_core::{Real, Tolerances, ensure_positive};
use nalgebra::{DMatrix, DVector};

use crate::error::{FilterError, FilterResult};

/// Rows `a * u <= b` over a scalar control.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintSet {
    a: DMatrix<Real>,
    b: DVector<Real>,
}

impl ConstraintSet {
    /// Build from `(coefficient, bound)` pairs, one row each.
    pub fn from_rows(rows: &[(Real, Real)]) -> Self {
        let a = DMatrix::from_iterator(rows.len(), 1, rows.iter().map(|r| r.0));
        let b = DVector::from_iterator(rows.len(), rows.iter().map(|r| r.1));
        Self { a, b }
    }

    pub fn len(&self) -> usize {
        self.b.len()
    }

    pub fn is_empty(&self) -> bool {
        self.b.len() == 0
    }

    /// Coefficient column of the row system.
    pub fn a(&self) -> &DMatrix<Real> {
        &self.a
    }

    /// Bound vector of the row system.
    pub fn b(&self) -> &DVector<Real> {
        &self.b
    }

    /// True when every row holds at `control` within the tolerance.
    pub fn satisfied_by(&self, control: Real, tol: Tolerances) -> bool {
        for i in 0..self.len() {
            let lhs = self.a[(i, 0)] * control;
            let rhs = self.b[i];
            let slack = tol.abs + tol.rel * lhs.abs().max(rhs.abs());
            if lhs > rhs + slack {
                return false;
            }
        }
        true
    }

    /// Tightest `(lo, hi)` containing every control that satisfies all
    /// rows. `lo > hi` means the set is empty; either end may be
    /// infinite when no row cuts that side.
    pub fn interval(&self) -> (Real, Real) {
        let mut lo = Real::NEG_INFINITY;
        let mut hi = Real::INFINITY;
        for i in 0..self.len() {
            let a = self.a[(i, 0)];
            let b = self.b[i];
            if a > 0.0 {
                hi = hi.min(b / a);
            } else if a < 0.0 {
                lo = lo.max(b / a);
            } else if b < 0.0 {
                // A zero-coefficient row can only be violated outright.
                return (Real::INFINITY, Real::NEG_INFINITY);
            }
        }
        (lo, hi)
    }
}

/// Position-corridor barrier for the double integrator, with optional
/// force limit.
#[derive(Clone, Debug, PartialEq)]
pub struct BarrierConstraint {
    position_bound: Real,
    alpha1: Real,
    alpha2: Real,
    control_bound: Option<Real>,
}

impl BarrierConstraint {
    /// Create a barrier keeping |x| <= `position_bound` with gains
    /// `alpha1`, `alpha2`, all strictly positive.
    pub fn new(
        position_bound: Real,
        alpha1: Real,
        alpha2: Real,
        control_bound: Option<Real>,
    ) -> FilterResult<Self> {
        ensure_positive(position_bound, "position_bound")?;
        ensure_positive(alpha1, "alpha1")?;
        ensure_positive(alpha2, "alpha2")?;
        if let Some(u_max) = control_bound {
            ensure_positive(u_max, "control_bound")?;
        }
        Ok(Self {
            position_bound,
            alpha1,
            alpha2,
            control_bound,
        })
    }

    pub fn position_bound(&self) -> Real {
        self.position_bound
    }

    pub fn control_bound(&self) -> Option<Real> {
        self.control_bound
    }

    /// Number of rows `rows` will emit: two barrier rows, plus two more
    /// when a force limit is configured.
    pub fn row_count(&self) -> usize {
        if self.control_bound.is_some() { 4 } else { 2 }
    }

    /// Constraint rows at the given plant state.
    pub fn rows(&self, position: Real, velocity: Real) -> ConstraintSet {
        let k = self.alpha1 * self.alpha2;
        let c = self.alpha1 + self.alpha2;
        let mut rows = vec![
            (1.0, k * (self.position_bound - position) - c * velocity),
            (-1.0, k * (self.position_bound + position) + c * velocity),
        ];
        if let Some(u_max) = self.control_bound {
            rows.push((1.0, u_max));
            rows.push((-1.0, u_max));
        }
        ConstraintSet::from_rows(&rows)
    }
}
