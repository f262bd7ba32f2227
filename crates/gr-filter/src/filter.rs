//! The per-step filtering seam shared by both strategies.

use gr_core::Real;

use crate::context::ProblemContext;
use crate::error::FilterResult;

/// Filtered control produced for one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterOutcome {
    /// Constrained projection of the nominal control. `feasible` is
    /// false when the rows admitted no control and `value` is a
    /// best-effort fallback.
    Optimized { value: Real, feasible: bool },
    /// Output of a network stage that is feasible by construction.
    Projected { value: Real },
}

impl FilterOutcome {
    /// The control to stash for the next plant step.
    pub fn value(&self) -> Real {
        match *self {
            FilterOutcome::Optimized { value, .. } => value,
            FilterOutcome::Projected { value } => value,
        }
    }

    /// False only for a fallback produced against an empty feasible set.
    pub fn is_feasible(&self) -> bool {
        match *self {
            FilterOutcome::Optimized { feasible, .. } => feasible,
            FilterOutcome::Projected { .. } => true,
        }
    }
}

/// One filtering decision: map a problem context to a control.
///
/// Implementations hold everything they need across steps (constraints,
/// weights, dimensions) and take each step's state through the context
/// alone, so a rollout can drive both strategies in lockstep.
pub trait SafetyFilter {
    /// Short strategy name for logs and summaries.
    fn name(&self) -> &'static str;

    /// Filter the nominal control in `ctx`.
    ///
    /// A `Degenerate` error means this step produced no usable control;
    /// any other error is a fault in the filter itself.
    fn filter(&self, ctx: &ProblemContext) -> FilterResult<FilterOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_value_and_feasibility() {
        let opt = FilterOutcome::Optimized {
            value: 0.25,
            feasible: true,
        };
        assert_eq!(opt.value(), 0.25);
        assert!(opt.is_feasible());

        let fallback = FilterOutcome::Optimized {
            value: -1.0,
            feasible: false,
        };
        assert!(!fallback.is_feasible());

        let proj = FilterOutcome::Projected { value: 0.5 };
        assert_eq!(proj.value(), 0.5);
        assert!(proj.is_feasible());
    }
}
