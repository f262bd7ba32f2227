//! Weight initialization.
//!
//! Kaiming/He normal (He et al., 2015), the standard choice ahead of
//! ReLU stages: N(0, sqrt(2 / fan_in)) sampled through the Box-Muller
//! transform on a seeded rng. Biases start at zero.

use gr_core::Real;
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand::rngs::StdRng;

/// Sample an `out_dim x in_dim` weight matrix from N(0, sqrt(2/fan_in)).
pub fn kaiming_normal(out_dim: usize, in_dim: usize, rng: &mut StdRng) -> DMatrix<Real> {
    let std = (2.0 / in_dim as Real).sqrt();
    DMatrix::from_fn(out_dim, in_dim, |_, _| std * standard_normal(rng))
}

/// Zero bias column.
pub fn zero_bias(len: usize) -> DVector<Real> {
    DVector::zeros(len)
}

fn standard_normal(rng: &mut StdRng) -> Real {
    let u1: Real = rng.gen_range(1e-12..1.0);
    let u2: Real = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
