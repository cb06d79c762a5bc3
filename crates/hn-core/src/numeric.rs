use crate::HnError;

/// Floating point type used throughout system
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
            abs: 1e-12,
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

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, HnError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(HnError::NonFinite { what, value: v })
    }
}

/// Finite and strictly positive.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, HnError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(HnError::NonPositive { what, value: v })
    }
}

/// True for values usable as a physical magnitude (finite and > 0).
pub fn is_usable(v: Real) -> bool {
    v.is_finite() && v > 0.0
}

/// Arithmetic mean; `None` for an empty input.
pub fn mean<I>(values: I) -> Option<Real>
where
    I: IntoIterator<Item = Real>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as Real)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_positive_rejects_zero() {
        assert!(ensure_positive(0.0, "radius").is_err());
        assert!(ensure_positive(-1.0, "radius").is_err());
        assert_eq!(ensure_positive(2.0, "radius").unwrap(), 2.0);
    }

    #[test]
    fn mean_of_values() {
        assert_eq!(mean(Vec::<Real>::new()), None);
        assert_eq!(mean([1.0, 2.0, 3.0]), Some(2.0));
    }

    #[test]
    fn usable_values() {
        assert!(is_usable(1e-9));
        assert!(!is_usable(0.0));
        assert!(!is_usable(Real::INFINITY));
    }

    proptest! {
        #[test]
        fn nearly_equal_is_symmetric(a in -1e9f64..1e9, b in -1e9f64..1e9) {
            let tol = Tolerances::default();
            prop_assert_eq!(nearly_equal(a, b, tol), nearly_equal(b, a, tol));
        }

        #[test]
        fn ensure_positive_agrees_with_is_usable(v in prop::num::f64::ANY) {
            prop_assert_eq!(ensure_positive(v, "v").is_ok(), is_usable(v));
        }
    }
}
