//! Floating point comparison helpers, thin wrappers around the `approx` crate. The solver and the
//! population conservation checks compare floats through these functions so that tolerances are
//! spelled the same way everywhere.

use approx::{AbsDiffEq, RelativeEq};

/// Default relative tolerance for population conservation checks.
pub const CONSERVATION_TOLERANCE: f64 = 1e-6;

/// Compares if two floats are close via `approx::abs_diff_eq` using a maximum absolute difference
/// (epsilon) of `acc`.
#[must_use]
pub fn almost_eq(a: f64, b: f64, acc: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a == b;
    }
    a.abs_diff_eq(&b, acc)
}

/// Compares if two floats are close relative to the larger of their magnitudes.
#[must_use]
pub fn relative_eq(a: f64, b: f64, max_relative: f64) -> bool {
    a.relative_eq(&b, f64::EPSILON, max_relative)
}

/// Largest relative deviation of `values` from `expected`. Returns `0.0` for an empty input.
#[must_use]
pub fn max_relative_deviation(values: impl IntoIterator<Item = f64>, expected: f64) -> f64 {
    let scale = expected.abs().max(f64::MIN_POSITIVE);
    values
        .into_iter()
        .map(|value| (value - expected).abs() / scale)
        .fold(0.0, f64::max)
}
