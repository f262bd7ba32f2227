//! Plant models for the guardrail harness.
//!
//! Provides:
//! - 1-D double integrator with semi-implicit Euler stepping
//! - Explicit one-step control lag convention (`advance(None)` coasts)

pub mod double_integrator;
pub mod error;

pub use double_integrator::{DoubleIntegrator, PlantState};
pub use error::{PlantError, PlantResult};
