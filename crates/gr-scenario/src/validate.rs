//! Scenario validation logic.
//!
//! Everything here is fatal at load time. Dimensional disagreements in
//! particular must never reach a running rollout; a filter built from a
//! loaded scenario can rely on these checks having passed.

use crate::schema::{NominalDef, Scenario, WeightsDef};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Dimension mismatch: {what}")]
    DimensionMismatch { what: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_scenario(scenario: &Scenario) -> Result<(), ValidationError> {
    if scenario.version > crate::schema::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }

    if scenario.name.trim().is_empty() {
        return Err(invalid("name", "", "must not be empty"));
    }

    validate_rollout(scenario)?;
    validate_barrier(scenario)?;
    validate_nominal(&scenario.nominal)?;
    validate_dims(scenario)?;
    validate_predictor(scenario)?;
    Ok(())
}

fn validate_rollout(scenario: &Scenario) -> Result<(), ValidationError> {
    let r = &scenario.rollout;
    ensure_positive("rollout.time_step_s", r.time_step_s)?;
    ensure_finite("rollout.initial_position", r.initial_position)?;
    ensure_finite("rollout.initial_velocity", r.initial_velocity)?;
    if let Some(deadline) = r.qp_deadline_ms {
        ensure_positive("rollout.qp_deadline_ms", deadline)?;
    }
    if r.initial_position.abs() > scenario.barrier.position_bound {
        return Err(invalid(
            "rollout.initial_position",
            &r.initial_position.to_string(),
            "must start inside the barrier corridor",
        ));
    }
    Ok(())
}

fn validate_barrier(scenario: &Scenario) -> Result<(), ValidationError> {
    let b = &scenario.barrier;
    ensure_positive("barrier.position_bound", b.position_bound)?;
    ensure_positive("barrier.alpha1", b.alpha1)?;
    ensure_positive("barrier.alpha2", b.alpha2)?;
    if let Some(u_max) = b.control_bound {
        ensure_positive("barrier.control_bound", u_max)?;
    }
    Ok(())
}

fn validate_nominal(nominal: &NominalDef) -> Result<(), ValidationError> {
    match nominal {
        NominalDef::Cosine { amplitude, period } => {
            ensure_finite("nominal.amplitude", *amplitude)?;
            ensure_positive("nominal.period", *period)?;
        }
        NominalDef::Constant { value } => {
            ensure_finite("nominal.value", *value)?;
        }
    }
    Ok(())
}

fn validate_dims(scenario: &Scenario) -> Result<(), ValidationError> {
    let d = &scenario.dims;
    if d.input_dim != 1 {
        return Err(ValidationError::DimensionMismatch {
            what: format!("input_dim={} but the nominal control is scalar", d.input_dim),
        });
    }
    if d.context_dim != 2 {
        return Err(ValidationError::DimensionMismatch {
            what: format!(
                "context_dim={} but the plant context is position and velocity",
                d.context_dim
            ),
        });
    }
    if d.output_dim != 1 {
        return Err(ValidationError::DimensionMismatch {
            what: format!("output_dim={} but the filtered control is scalar", d.output_dim),
        });
    }
    let expected_rows = if scenario.barrier.control_bound.is_some() {
        4
    } else {
        2
    };
    if d.constraint_count != expected_rows {
        return Err(ValidationError::DimensionMismatch {
            what: format!(
                "constraint_count={} but the barrier emits {} rows",
                d.constraint_count, expected_rows
            ),
        });
    }
    Ok(())
}

fn validate_predictor(scenario: &Scenario) -> Result<(), ValidationError> {
    let p = &scenario.predictor;
    if p.hidden_width == 0 {
        return Err(invalid(
            "predictor.hidden_width",
            "0",
            "must be at least 1",
        ));
    }
    if let WeightsDef::Checkpoint { path } = &p.weights
        && path.trim().is_empty()
    {
        return Err(invalid(
            "predictor.weights.path",
            "",
            "must name a checkpoint file",
        ));
    }
    Ok(())
}

fn invalid(field: &str, value: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn ensure_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, &value.to_string(), "must be finite"))
    }
}

fn ensure_positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, &value.to_string(), "must be positive"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        BarrierDef, DimsDef, PredictorDef, ProjectionMethodDef, RolloutDef, Scenario,
    };

    fn demo() -> Scenario {
        Scenario {
            version: 1,
            name: "corridor-demo".to_string(),
            rollout: RolloutDef {
                steps: 150,
                time_step_s: 0.01,
                initial_position: 0.8,
                initial_velocity: 0.3,
                qp_deadline_ms: None,
            },
            dims: DimsDef {
                input_dim: 1,
                context_dim: 2,
                output_dim: 1,
                constraint_count: 2,
            },
            barrier: BarrierDef {
                position_bound: 1.0,
                alpha1: 1.0,
                alpha2: 1.0,
                control_bound: None,
            },
            nominal: NominalDef::Cosine {
                amplitude: 1.5,
                period: 3.0,
            },
            predictor: PredictorDef {
                hidden_width: 64,
                method: ProjectionMethodDef::Squash,
                weights: WeightsDef::Fresh { seed: 7 },
            },
        }
    }

    #[test]
    fn demo_scenario_is_valid() {
        assert!(validate_scenario(&demo()).is_ok());
    }

    #[test]
    fn zero_step_rollout_is_valid() {
        let mut s = demo();
        s.rollout.steps = 0;
        assert!(validate_scenario(&s).is_ok());
    }

    #[test]
    fn rejects_future_version() {
        let mut s = demo();
        s.version = 99;
        assert!(matches!(
            validate_scenario(&s),
            Err(ValidationError::UnsupportedVersion { version: 99 })
        ));
    }

    #[test]
    fn rejects_non_positive_time_step() {
        let mut s = demo();
        s.rollout.time_step_s = 0.0;
        assert!(validate_scenario(&s).is_err());
        s.rollout.time_step_s = f64::NAN;
        assert!(validate_scenario(&s).is_err());
    }

    #[test]
    fn rejects_start_outside_corridor() {
        let mut s = demo();
        s.rollout.initial_position = 1.5;
        assert!(validate_scenario(&s).is_err());
    }

    #[test]
    fn rejects_wrong_constraint_count() {
        let mut s = demo();
        s.dims.constraint_count = 4;
        let err = validate_scenario(&s).unwrap_err();
        assert!(matches!(err, ValidationError::DimensionMismatch { .. }));

        // With a force limit, four rows are exactly right.
        s.barrier.control_bound = Some(2.0);
        assert!(validate_scenario(&s).is_ok());
    }

    #[test]
    fn rejects_vector_dims() {
        let mut s = demo();
        s.dims.output_dim = 3;
        assert!(validate_scenario(&s).is_err());
        let mut s = demo();
        s.dims.context_dim = 5;
        assert!(validate_scenario(&s).is_err());
    }

    #[test]
    fn rejects_zero_hidden_width() {
        let mut s = demo();
        s.predictor.hidden_width = 0;
        assert!(validate_scenario(&s).is_err());
    }

    #[test]
    fn rejects_empty_checkpoint_path() {
        let mut s = demo();
        s.predictor.weights = WeightsDef::Checkpoint {
            path: "  ".to_string(),
        };
        assert!(validate_scenario(&s).is_err());
    }

    #[test]
    fn rejects_bad_cosine_period() {
        let mut s = demo();
        s.nominal = NominalDef::Cosine {
            amplitude: 1.5,
            period: 0.0,
        };
        assert!(validate_scenario(&s).is_err());
    }
}
