//! Nominal control demand signals.

use gr_core::Real;
use gr_scenario::NominalDef;

/// Step-indexed control demand shared by both lanes of a comparison.
///
/// The signal is a pure function of the step index: it may not read
/// plant state, so the two lanes always answer the same question and
/// their filtered outputs stay comparable point for point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NominalSignal {
    /// `amplitude * cos(step / period)`.
    Cosine { amplitude: Real, period: Real },
    /// Constant demand, useful for rigged scenarios and tests.
    Constant { value: Real },
}

impl NominalSignal {
    pub fn from_def(def: &NominalDef) -> Self {
        match *def {
            NominalDef::Cosine { amplitude, period } => NominalSignal::Cosine { amplitude, period },
            NominalDef::Constant { value } => NominalSignal::Constant { value },
        }
    }

    /// Demand at step `step`.
    pub fn value_at(&self, step: usize) -> Real {
        match *self {
            NominalSignal::Cosine { amplitude, period } => {
                amplitude * ((step as Real) / period).cos()
            }
            NominalSignal::Constant { value } => value,
        }
    }
}
