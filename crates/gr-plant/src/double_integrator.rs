//! 1-D double integrator advanced by semi-implicit Euler.

use gr_core::{Real, ensure_finite};

use crate::error::{PlantError, PlantResult};

/// Kinematic state of the plant after the most recent step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlantState {
    /// Position [m]
    pub position: Real,
    /// Velocity [m/s]
    pub velocity: Real,
    /// Simulated time accumulated so far (dt * steps taken)
    pub elapsed: Real,
}

/// Point mass on a line driven by a scalar force.
///
/// Dynamics per step: v += u * dt, then x += v * dt. The velocity update
/// runs first so the position update sees the fresh velocity.
///
/// `advance` takes the control computed during the *previous* step; the
/// caller owns that one-step lag. `None` coasts (zero force), which is
/// also the convention for the first step of a rollout.
#[derive(Clone, Debug)]
pub struct DoubleIntegrator {
    time_step: Real,
    state: PlantState,
}

impl DoubleIntegrator {
    /// Create a plant at the given initial state.
    pub fn new(position: Real, velocity: Real, time_step: Real) -> PlantResult<Self> {
        ensure_finite(position, "initial position")?;
        ensure_finite(velocity, "initial velocity")?;
        if !time_step.is_finite() || time_step <= 0.0 {
            return Err(PlantError::InvalidArg {
                what: "time_step must be positive and finite",
            });
        }
        Ok(Self {
            time_step,
            state: PlantState {
                position,
                velocity,
                elapsed: 0.0,
            },
        })
    }

    pub fn time_step(&self) -> Real {
        self.time_step
    }

    pub fn state(&self) -> PlantState {
        self.state
    }

    pub fn position(&self) -> Real {
        self.state.position
    }

    pub fn velocity(&self) -> Real {
        self.state.velocity
    }

    pub fn elapsed(&self) -> Real {
        self.state.elapsed
    }

    /// Advance one step under the given force and return the new state.
    pub fn advance(&mut self, control: Option<Real>) -> PlantState {
        let u = control.unwrap_or(0.0);
        self.state.velocity += u * self.time_step;
        self.state.position += self.state.velocity * self.time_step;
        self.state.elapsed += self.time_step;
        self.state
    }
}
