//! gr-core: stable foundation for guardrail.
//!
//! Contains:
//! - numeric (Real + tolerances + float guards)
//! - error (shared error types)

pub mod error;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use error::{GrError, GrResult};
pub use numeric::*;
