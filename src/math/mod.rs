//! Numerical helpers shared by the storage calculators.

pub mod interpolation;

pub use interpolation::{
    ExtrapolationMode, HermiteMonotoneInterpolator, HermiteMonotoneInterpolatorFactory,
    InterpolationError, InterpolationKind, Interpolator, InterpolatorFactory,
    LinearInterpolator, LinearInterpolatorFactory,
};

#[derive(Debug, Clone, PartialEq)]
pub enum MathError {
    NonConvergence,
    NoBracket,
    InvalidInput(&'static str),
}

/// Bisection on a continuous `f` with a sign change on `[lo, hi]`.
///
/// Returns the final bracket `(a, b)`, narrower than `tol`, around the root.
/// `f(a)` keeps the sign of `f(lo)` and `f(b)` the sign of `f(hi)` unless either is an
/// exact root, in which case `a == b`. Callers needing the root on a particular side of
/// the sign change pick the matching end.
pub fn bisection_bracket<F>(
    f: F,
    lo: f64,
    hi: f64,
    tol: f64,
    max_iter: usize,
) -> Result<(f64, f64), MathError>
where
    F: Fn(f64) -> f64,
{
    if tol <= 0.0 {
        return Err(MathError::InvalidInput("tol must be positive"));
    }
    if max_iter == 0 {
        return Err(MathError::InvalidInput("max_iter must be > 0"));
    }
    if !lo.is_finite() || !hi.is_finite() || lo > hi {
        return Err(MathError::InvalidInput("bracket must be finite with lo <= hi"));
    }

    let mut a = lo;
    let mut b = hi;
    let mut fa = f(a);
    let fb = f(b);
    if fa == 0.0 {
        return Ok((a, a));
    }
    if fb == 0.0 {
        return Ok((b, b));
    }
    if fa.signum() == fb.signum() {
        return Err(MathError::NoBracket);
    }

    for _ in 0..max_iter {
        if b - a <= tol {
            return Ok((a, b));
        }
        let mid = 0.5 * (a + b);
        let fm = f(mid);
        if fm == 0.0 {
            return Ok((mid, mid));
        }
        if fm.signum() == fa.signum() {
            a = mid;
            fa = fm;
        } else {
            b = mid;
        }
    }

    Err(MathError::NonConvergence)
}

/// Largest value and the first index at which it occurs.
///
/// NaN entries never win. Returns `None` for an empty slice or all-NaN input.
pub fn max_value_and_index(values: &[f64]) -> Option<(f64, usize)> {
    let mut best: Option<(f64, usize)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((b, _)) if v <= b => {}
            _ => best = Some((v, i)),
        }
    }
    best
}
