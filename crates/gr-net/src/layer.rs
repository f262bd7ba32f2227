//! Inference stages behind a single dispatch enum.

use gr_core::Real;
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;

use crate::error::{NetError, NetResult};
use crate::init;

/// Dense affine map `W x + b`.
#[derive(Clone, Debug, PartialEq)]
pub struct Affine {
    weight: DMatrix<Real>,
    bias: DVector<Real>,
}

impl Affine {
    pub fn new(weight: DMatrix<Real>, bias: DVector<Real>) -> NetResult<Self> {
        if weight.nrows() != bias.len() {
            return Err(NetError::DimensionMismatch {
                what: format!(
                    "weight has {} rows but bias has {} entries",
                    weight.nrows(),
                    bias.len()
                ),
            });
        }
        Ok(Self { weight, bias })
    }

    /// Kaiming-initialized stage with zero bias.
    pub fn kaiming(in_dim: usize, out_dim: usize, rng: &mut StdRng) -> Self {
        Self {
            weight: init::kaiming_normal(out_dim, in_dim, rng),
            bias: init::zero_bias(out_dim),
        }
    }

    pub fn in_dim(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_dim(&self) -> usize {
        self.weight.nrows()
    }

    pub fn weight(&self) -> &DMatrix<Real> {
        &self.weight
    }

    pub fn bias(&self) -> &DVector<Real> {
        &self.bias
    }

    pub fn apply(&self, x: &DVector<Real>) -> DVector<Real> {
        &self.weight * x + &self.bias
    }
}

/// Elementwise nonlinearity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    Relu,
}

impl Activation {
    pub fn apply(&self, x: &DVector<Real>) -> DVector<Real> {
        match self {
            Activation::Relu => x.map(|v| v.max(0.0)),
        }
    }
}

/// Batch normalization folded to inference form: per-feature shift and
/// scale from frozen statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchNorm {
    mean: DVector<Real>,
    variance: DVector<Real>,
    gamma: DVector<Real>,
    beta: DVector<Real>,
    eps: Real,
}

impl BatchNorm {
    pub fn new(
        mean: DVector<Real>,
        variance: DVector<Real>,
        gamma: DVector<Real>,
        beta: DVector<Real>,
        eps: Real,
    ) -> NetResult<Self> {
        let width = mean.len();
        if variance.len() != width || gamma.len() != width || beta.len() != width {
            return Err(NetError::DimensionMismatch {
                what: format!(
                    "norm statistics disagree on width: mean={}, variance={}, gamma={}, beta={}",
                    width,
                    variance.len(),
                    gamma.len(),
                    beta.len()
                ),
            });
        }
        if !eps.is_finite() || eps <= 0.0 {
            return Err(NetError::InvalidArg {
                what: "norm eps must be positive and finite",
            });
        }
        if variance.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(NetError::InvalidArg {
                what: "norm variance entries must be finite and non-negative",
            });
        }
        Ok(Self {
            mean,
            variance,
            gamma,
            beta,
            eps,
        })
    }

    /// Pass-through statistics (mean 0, variance 1, unit gain), the
    /// state of a freshly initialized stage.
    pub fn identity(width: usize) -> Self {
        Self {
            mean: DVector::zeros(width),
            variance: DVector::from_element(width, 1.0),
            gamma: DVector::from_element(width, 1.0),
            beta: DVector::zeros(width),
            eps: 1e-5,
        }
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &DVector<Real> {
        &self.mean
    }

    pub fn variance(&self) -> &DVector<Real> {
        &self.variance
    }

    pub fn gamma(&self) -> &DVector<Real> {
        &self.gamma
    }

    pub fn beta(&self) -> &DVector<Real> {
        &self.beta
    }

    pub fn eps(&self) -> Real {
        self.eps
    }

    pub fn apply(&self, x: &DVector<Real>) -> DVector<Real> {
        DVector::from_fn(x.len(), |i, _| {
            let scaled = (x[i] - self.mean[i]) / (self.variance[i] + self.eps).sqrt();
            self.gamma[i] * scaled + self.beta[i]
        })
    }
}

/// One stage of the inference stack.
#[derive(Clone, Debug, PartialEq)]
pub enum Layer {
    Affine(Affine),
    Activation(Activation),
    Norm(BatchNorm),
}

impl Layer {
    pub fn apply(&self, x: &DVector<Real>) -> DVector<Real> {
        match self {
            Layer::Affine(l) => l.apply(x),
            Layer::Activation(l) => l.apply(x),
            Layer::Norm(l) => l.apply(x),
        }
    }

    /// Output width for the given input width, or a mismatch error.
    pub fn forward_width(&self, in_width: usize) -> NetResult<usize> {
        match self {
            Layer::Affine(l) => {
                if l.in_dim() == in_width {
                    Ok(l.out_dim())
                } else {
                    Err(NetError::DimensionMismatch {
                        what: format!(
                            "affine stage expects width {} but receives {}",
                            l.in_dim(),
                            in_width
                        ),
                    })
                }
            }
            Layer::Activation(_) => Ok(in_width),
            Layer::Norm(l) => {
                if l.width() == in_width {
                    Ok(in_width)
                } else {
                    Err(NetError::DimensionMismatch {
                        what: format!(
                            "norm stage expects width {} but receives {}",
                            l.width(),
                            in_width
                        ),
                    })
                }
            }
        }
    }
}
