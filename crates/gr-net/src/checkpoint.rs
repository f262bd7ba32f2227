//! JSON checkpoints for predictor weights.
//!
//! A checkpoint records everything needed to rebuild the inference
//! stack: the key of the configuration it was produced for, problem
//! dimensions, hidden width, projection method, and the parameters of
//! every stage in order.

use std::fs;
use std::path::Path;

use gr_core::Real;
use gr_filter::{BarrierConstraint, ProblemDims};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{NetError, NetResult};
use crate::head::{ProjectionHead, ProjectionMethod};
use crate::layer::{Activation, Affine, BatchNorm, Layer};
use crate::network::Predictor;

/// Serialized affine stage, weight stored row-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AffineParams {
    pub rows: usize,
    pub cols: usize,
    pub weight: Vec<Real>,
    pub bias: Vec<Real>,
}

impl AffineParams {
    pub fn from_layer(layer: &Affine) -> Self {
        let rows = layer.out_dim();
        let cols = layer.in_dim();
        let weight = (0..rows)
            .flat_map(|i| (0..cols).map(move |j| layer.weight()[(i, j)]))
            .collect();
        Self {
            rows,
            cols,
            weight,
            bias: layer.bias().iter().copied().collect(),
        }
    }

    pub fn to_layer(&self) -> NetResult<Affine> {
        if self.weight.len() != self.rows * self.cols {
            return Err(NetError::CheckpointMismatch {
                what: format!(
                    "affine stage claims {}x{} but carries {} weights",
                    self.rows,
                    self.cols,
                    self.weight.len()
                ),
            });
        }
        if self.bias.len() != self.rows {
            return Err(NetError::CheckpointMismatch {
                what: format!(
                    "affine stage claims {} rows but carries {} bias entries",
                    self.rows,
                    self.bias.len()
                ),
            });
        }
        Affine::new(
            DMatrix::from_row_slice(self.rows, self.cols, &self.weight),
            DVector::from_column_slice(&self.bias),
        )
    }
}

/// Serialized batch-norm stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormParams {
    pub mean: Vec<Real>,
    pub variance: Vec<Real>,
    pub gamma: Vec<Real>,
    pub beta: Vec<Real>,
    pub eps: Real,
}

impl NormParams {
    pub fn from_layer(layer: &BatchNorm) -> Self {
        Self {
            mean: layer.mean().iter().copied().collect(),
            variance: layer.variance().iter().copied().collect(),
            gamma: layer.gamma().iter().copied().collect(),
            beta: layer.beta().iter().copied().collect(),
            eps: layer.eps(),
        }
    }

    pub fn to_layer(&self) -> NetResult<BatchNorm> {
        BatchNorm::new(
            DVector::from_column_slice(&self.mean),
            DVector::from_column_slice(&self.variance),
            DVector::from_column_slice(&self.gamma),
            DVector::from_column_slice(&self.beta),
            self.eps,
        )
    }
}

/// One serialized stage of the stack.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerParams {
    Affine(AffineParams),
    Relu,
    Norm(NormParams),
}

/// Full predictor parameter set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Name of the configuration the weights belong to
    pub key: String,
    pub dims: ProblemDims,
    pub hidden: usize,
    pub method: ProjectionMethod,
    pub stack: Vec<LayerParams>,
    pub head: AffineParams,
}

impl Checkpoint {
    pub fn load(path: &Path) -> NetResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| NetError::CheckpointRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> NetResult<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| NetError::CheckpointWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Snapshot a predictor's parameters under the given key.
    pub fn from_predictor(predictor: &Predictor, key: &str) -> Self {
        let stack = predictor
            .stack()
            .iter()
            .map(|layer| match layer {
                Layer::Affine(l) => LayerParams::Affine(AffineParams::from_layer(l)),
                Layer::Activation(Activation::Relu) => LayerParams::Relu,
                Layer::Norm(l) => LayerParams::Norm(NormParams::from_layer(l)),
            })
            .collect();
        Self {
            key: key.to_string(),
            dims: predictor.dims(),
            hidden: predictor.hidden_width(),
            method: predictor.method(),
            stack,
            head: AffineParams::from_layer(predictor.head().collapse()),
        }
    }

    /// Rebuild the predictor these parameters describe.
    pub fn into_predictor(self, constraint: BarrierConstraint) -> NetResult<Predictor> {
        let stack = self
            .stack
            .iter()
            .map(|params| {
                Ok(match params {
                    LayerParams::Affine(p) => Layer::Affine(p.to_layer()?),
                    LayerParams::Relu => Layer::Activation(Activation::Relu),
                    LayerParams::Norm(p) => Layer::Norm(p.to_layer()?),
                })
            })
            .collect::<NetResult<Vec<_>>>()?;
        let head = ProjectionHead::new(self.head.to_layer()?, self.method)?;
        Predictor::new(stack, head, constraint, self.dims, self.hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gr_filter::ProblemContext;

    fn dims() -> ProblemDims {
        ProblemDims {
            input_dim: 1,
            context_dim: 2,
            output_dim: 1,
            constraint_count: 2,
        }
    }

    fn corridor() -> BarrierConstraint {
        BarrierConstraint::new(1.0, 1.0, 1.0, None).unwrap()
    }

    #[test]
    fn snapshot_rebuilds_identical_inference() {
        let net = Predictor::fresh(dims(), 12, corridor(), ProjectionMethod::Squash, 99).unwrap();
        let cp = Checkpoint::from_predictor(&net, "demo");
        let rebuilt = cp.into_predictor(corridor()).unwrap();
        let ctx = ProblemContext::new(1.5, 0.8, 0.3);
        assert_eq!(
            net.infer(&ctx).unwrap().to_bits(),
            rebuilt.infer(&ctx).unwrap().to_bits()
        );
    }

    #[test]
    fn file_round_trip_preserves_parameters() {
        let net = Predictor::fresh(dims(), 6, corridor(), ProjectionMethod::Clamp, 4).unwrap();
        let cp = Checkpoint::from_predictor(&net, "demo");
        let path = std::env::temp_dir().join("gr_net_checkpoint_test.json");
        cp.save(&path).unwrap();
        let loaded = Checkpoint::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(cp, loaded);
    }

    #[test]
    fn stage_tags_are_snake_case() {
        let net = Predictor::fresh(dims(), 4, corridor(), ProjectionMethod::Squash, 1).unwrap();
        let cp = Checkpoint::from_predictor(&net, "demo");
        let text = serde_json::to_string(&cp).unwrap();
        assert!(text.contains("\"type\":\"relu\""));
        assert!(text.contains("\"type\":\"affine\""));
        assert!(text.contains("\"type\":\"norm\""));
        assert!(text.contains("\"method\":\"squash\""));
    }

    #[test]
    fn weight_length_lies_are_caught() {
        let net = Predictor::fresh(dims(), 4, corridor(), ProjectionMethod::Squash, 1).unwrap();
        let mut cp = Checkpoint::from_predictor(&net, "demo");
        if let Some(LayerParams::Affine(p)) = cp.stack.first_mut() {
            p.weight.pop();
        }
        let err = cp.into_predictor(corridor()).unwrap_err();
        assert!(matches!(err, NetError::CheckpointMismatch { .. }));
    }

    #[test]
    fn missing_file_reports_read_error() {
        let err = Checkpoint::load(Path::new("/nonexistent/guardrail.json")).unwrap_err();
        assert!(matches!(err, NetError::CheckpointRead { .. }));
    }
}
