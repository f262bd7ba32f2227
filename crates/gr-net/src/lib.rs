//! Learned constraint-projection predictor for the guardrail harness.
//!
//! Provides:
//! - Inference-only layer stack (affine, ReLU, frozen batch norm)
//! - Kaiming-normal initialization on a seeded rng
//! - Projection head that lands every output inside the feasible interval
//! - JSON weight checkpoints with dimension checking

pub mod checkpoint;
pub mod error;
pub mod head;
pub mod init;
pub mod layer;
pub mod network;

pub use checkpoint::{AffineParams, Checkpoint, LayerParams, NormParams};
pub use error::{NetError, NetResult};
pub use head::{ProjectionHead, ProjectionMethod};
pub use layer::{Activation, Affine, BatchNorm, Layer};
pub use network::Predictor;
