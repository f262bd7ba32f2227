//! The learned predictor and its safety-filter implementation.

use gr_core::Real;
use gr_filter::{
    BarrierConstraint, FilterOutcome, FilterResult, ProblemContext, ProblemDims, SafetyFilter,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::{NetError, NetResult};
use crate::head::{ProjectionHead, ProjectionMethod};
use crate::layer::{Activation, Affine, BatchNorm, Layer};

/// Learned predictor with a constraint-projection output stage.
///
/// The stack mirrors the trained architecture: affine 3 -> H, ReLU,
/// batch norm, affine H -> H, ReLU, affine H -> H, then the head
/// collapses H -> 1 and lands inside the feasible interval.
#[derive(Debug)]
pub struct Predictor {
    stack: Vec<Layer>,
    head: ProjectionHead,
    constraint: BarrierConstraint,
    dims: ProblemDims,
    hidden: usize,
}

impl Predictor {
    /// Assemble a predictor, rejecting any width break in the chain.
    pub fn new(
        stack: Vec<Layer>,
        head: ProjectionHead,
        constraint: BarrierConstraint,
        dims: ProblemDims,
        hidden: usize,
    ) -> NetResult<Self> {
        if dims.output_dim != 1 {
            return Err(NetError::DimensionMismatch {
                what: format!(
                    "the projection head emits a scalar control, got output_dim={}",
                    dims.output_dim
                ),
            });
        }
        if hidden == 0 {
            return Err(NetError::InvalidArg {
                what: "hidden width must be positive",
            });
        }
        if dims.constraint_count != constraint.row_count() {
            return Err(NetError::DimensionMismatch {
                what: format!(
                    "configured constraint_count={} but the barrier emits {} rows",
                    dims.constraint_count,
                    constraint.row_count()
                ),
            });
        }
        let mut width = dims.input_width();
        for layer in &stack {
            width = layer.forward_width(width)?;
        }
        if width != hidden {
            return Err(NetError::DimensionMismatch {
                what: format!("stack emits width {width} but hidden width is {hidden}"),
            });
        }
        if head.in_dim() != hidden {
            return Err(NetError::DimensionMismatch {
                what: format!(
                    "head expects width {} but the stack emits {hidden}",
                    head.in_dim()
                ),
            });
        }
        Ok(Self {
            stack,
            head,
            constraint,
            dims,
            hidden,
        })
    }

    /// Fresh Kaiming-initialized weights for the standard architecture.
    pub fn fresh(
        dims: ProblemDims,
        hidden: usize,
        constraint: BarrierConstraint,
        method: ProjectionMethod,
        seed: u64,
    ) -> NetResult<Self> {
        if hidden == 0 {
            return Err(NetError::InvalidArg {
                what: "hidden width must be positive",
            });
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let input = dims.input_width();
        let stack = vec![
            Layer::Affine(Affine::kaiming(input, hidden, &mut rng)),
            Layer::Activation(Activation::Relu),
            Layer::Norm(BatchNorm::identity(hidden)),
            Layer::Affine(Affine::kaiming(hidden, hidden, &mut rng)),
            Layer::Activation(Activation::Relu),
            Layer::Affine(Affine::kaiming(hidden, hidden, &mut rng)),
        ];
        let head = ProjectionHead::new(Affine::kaiming(hidden, 1, &mut rng), method)?;
        Self::new(stack, head, constraint, dims, hidden)
    }

    pub fn dims(&self) -> ProblemDims {
        self.dims
    }

    pub fn hidden_width(&self) -> usize {
        self.hidden
    }

    pub fn method(&self) -> ProjectionMethod {
        self.head.method()
    }

    pub(crate) fn stack(&self) -> &[Layer] {
        &self.stack
    }

    pub(crate) fn head(&self) -> &ProjectionHead {
        &self.head
    }

    /// Run the stack on the context and project the score into the
    /// feasible interval at the context's state.
    pub fn infer(&self, ctx: &ProblemContext) -> NetResult<Real> {
        let mut x = ctx.input_vector();
        for layer in &self.stack {
            x = layer.apply(&x);
        }
        let rows = self.constraint.rows(ctx.position, ctx.velocity);
        self.head.project(&x, &rows)
    }
}

impl SafetyFilter for Predictor {
    fn name(&self) -> &'static str {
        "projection-net"
    }

    fn filter(&self, ctx: &ProblemContext) -> FilterResult<FilterOutcome> {
        let value = self.infer(ctx)?;
        Ok(FilterOutcome::Projected { value })
    }
}
