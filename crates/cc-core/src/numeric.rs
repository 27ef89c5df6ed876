use crate::CoreError;

/// Floating point type used throughout the workspace.
pub type Real = f64;

/// Values at or below this are the solver's "not applicable" flag.
pub const SENTINEL_THRESHOLD: Real = -999.0;

/// `v` itself, or an error naming `what` when it is NaN or infinite.
pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

#[inline]
pub fn is_sentinel(v: Real) -> bool {
    v <= SENTINEL_THRESHOLD
}

/// Map sentinel and non-finite values to `None`.
#[inline]
pub fn scrub(v: Real) -> Option<Real> {
    if v.is_finite() && !is_sentinel(v) {
        Some(v)
    } else {
        None
    }
}

/// Same as [`scrub`] for an already optional value.
#[inline]
pub fn scrub_opt(v: Option<Real>) -> Option<Real> {
    v.and_then(scrub)
}

/// `num / den`, with a zero denominator or a non-finite quotient coerced to 0.
#[inline]
pub fn ratio_or_zero(num: Real, den: Real) -> Real {
    if den == 0.0 {
        return 0.0;
    }
    let q = num / den;
    if q.is_finite() { q } else { 0.0 }
}
