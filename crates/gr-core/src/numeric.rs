use crate::GrError;

/// Floating point type used throughout the harness
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-9,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, GrError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(GrError::NonFinite { what, value: v })
    }
}

/// Finite and strictly greater than zero. Gains, bounds, widths and time
/// steps all share this check.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, GrError> {
    ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(GrError::NonPositive { what, value: v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_abs_and_rel() {
        let tol = Tolerances::default();
        assert!(nearly_equal(2.0, 2.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-10, tol));
        assert!(!nearly_equal(1.0, 1.001, tol));
    }

    #[test]
    fn ensure_finite_rejects_nan_and_inf() {
        assert!(ensure_finite(Real::NAN, "x").is_err());
        assert!(ensure_finite(Real::INFINITY, "x").is_err());
        assert_eq!(ensure_finite(0.5, "x").unwrap(), 0.5);
    }

    #[test]
    fn ensure_positive_rejects_zero() {
        let err = ensure_positive(0.0, "dt").unwrap_err();
        assert!(format!("{err}").contains("Non-positive"));
        assert!(ensure_positive(1e-3, "dt").is_ok());
    }
}
