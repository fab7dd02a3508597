/// Asserts that two floats are close, either within an absolute tolerance or, with the
/// `relative = ...` form, within a tolerance relative to their magnitude.
///
/// ```rust
/// use seir_animate::assert_almost_eq;
///
/// assert_almost_eq!(0.1 + 0.2, 0.3, 1e-12);
/// assert_almost_eq!(999.9999, 1000.0, relative = 1e-6);
/// ```
#[macro_export]
macro_rules! assert_almost_eq {
    ($a:expr, $b:expr, relative = $rel:expr $(,)?) => {
        if !$crate::numeric::relative_eq($a, $b, $rel) {
            panic!(
                "assertion failed: `left ~= right` (relative tolerance {:e}), (left: `{}`, right: `{}`)",
                $rel, $a, $b
            );
        }
    };
    ($a:expr, $b:expr, $prec:expr $(,)?) => {
        if !$crate::numeric::almost_eq($a, $b, $prec) {
            panic!(
                "assertion failed: `abs(left - right) < {:e}`, (left: `{}`, right: `{}`)",
                $prec, $a, $b
            );
        }
    };
}
