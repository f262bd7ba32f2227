//! Safety filters for the guardrail harness.
//!
//! This crate provides the per-step filtering seam and its optimization
//! implementation: affine barrier rows over a scalar control, a
//! feasibility predicate, and a closed-form QP that projects the
//! nominal control onto the feasible interval.

pub mod constraint;
pub mod context;
pub mod error;
pub mod filter;
pub mod qp;

pub use constraint::{BarrierConstraint, ConstraintSet};
pub use context::{ProblemContext, ProblemDims};
pub use error::{FilterError, FilterResult};
pub use filter::{FilterOutcome, SafetyFilter};
pub use qp::QpFilter;
