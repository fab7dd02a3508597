//! Adaptive-step integration of ordinary differential equation systems.
//!
//! The integrator is the Dormand-Prince 5(4) embedded Runge-Kutta pair. The state is advanced
//! with the fifth order solution while the difference to the embedded fourth order solution
//! drives step size control. Output is produced on a caller supplied time grid: internal steps
//! are shortened so that every output time is hit exactly.
//!
//! Runge-Kutta methods preserve linear invariants of the system exactly (up to rounding), so a
//! system whose derivatives sum to zero keeps its total constant across the whole solution.
use crate::error::SeirError;
use crate::log::trace;

/// A system `y' = f(t, y)` with `D` state variables.
pub trait OdeSystem<const D: usize> {
    fn derivative(&self, t: f64, y: &[f64; D]) -> [f64; D];
}

/// Error tolerances for step size control. A step is accepted when the scaled RMS norm of the
/// local error estimate is at most one, where component `i` is scaled by
/// `absolute + relative * max(|y_i|, |y_new_i|)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub relative: f64,
    pub absolute: f64,
}

impl Tolerances {
    #[must_use]
    pub fn new(relative: f64, absolute: f64) -> Self {
        Self { relative, absolute }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::new(1.49e-8, 1.49e-8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorSettings {
    pub tolerances: Tolerances,
    /// Internal step budget for each interval between consecutive output times.
    pub max_steps_per_interval: usize,
    /// Steps shorter than this (relative to `max(|t|, 1)`) mean the solver cannot make progress.
    pub min_step: f64,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            tolerances: Tolerances::default(),
            max_steps_per_interval: 500,
            min_step: 1e-12,
        }
    }
}

/// Counters accumulated over one call to [`integrate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegratorStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub derivative_evaluations: usize,
}

/// Solution sampled at the requested output times.
#[derive(Debug, Clone)]
pub struct Solution<const D: usize> {
    pub times: Vec<f64>,
    pub states: Vec<[f64; D]>,
    pub stats: IntegratorStats,
}

// Dormand-Prince 5(4) tableau.
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// Fifth order weights (also the last stage row, which makes the pair first-same-as-last).
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Fifth minus fourth order weights.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

/// `y + h * sum(coefficient * k)` for the stages that contribute.
fn combine<const D: usize>(y: &[f64; D], h: f64, terms: &[(f64, &[f64; D])]) -> [f64; D] {
    let mut out = *y;
    for (i, value) in out.iter_mut().enumerate() {
        let increment: f64 = terms.iter().map(|(c, k)| c * k[i]).sum();
        *value += h * increment;
    }
    out
}

fn error_norm<const D: usize>(
    y: &[f64; D],
    y_new: &[f64; D],
    error: &[f64; D],
    tolerances: &Tolerances,
) -> f64 {
    let sum: f64 = (0..D)
        .map(|i| {
            let scale = tolerances.absolute + tolerances.relative * y[i].abs().max(y_new[i].abs());
            (error[i] / scale).powi(2)
        })
        .sum();
    (sum / D as f64).sqrt()
}

fn rms_scaled<const D: usize>(v: &[f64; D], y: &[f64; D], tolerances: &Tolerances) -> f64 {
    let sum: f64 = (0..D)
        .map(|i| {
            let scale = tolerances.absolute + tolerances.relative * y[i].abs();
            (v[i] / scale).powi(2)
        })
        .sum();
    (sum / D as f64).sqrt()
}

/// Starting step size estimate from Hairer, Norsett & Wanner (II.4), capped to the first
/// output interval.
fn initial_step<const D: usize>(
    y: &[f64; D],
    f0: &[f64; D],
    interval: f64,
    tolerances: &Tolerances,
) -> f64 {
    let d0 = rms_scaled(y, y, tolerances);
    let d1 = rms_scaled(f0, y, tolerances);
    let h0 = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    };
    h0.min(interval)
}

fn failure(time: f64, reason: impl Into<String>) -> SeirError {
    SeirError::IntegrationFailure {
        time,
        reason: reason.into(),
    }
}

/// Integrates `system` from `y0` at `times[0]` and samples the solution at every entry of
/// `times`.
///
/// # Errors
///
/// Returns `SeirError::InvalidParameter` if `times` is empty or not strictly increasing, and
/// `SeirError::IntegrationFailure` if the solver cannot reach an output time: the step size
/// underflows, the step budget for an interval runs out, or the state stops being finite.
pub fn integrate<S, const D: usize>(
    system: &S,
    y0: [f64; D],
    times: &[f64],
    settings: &IntegratorSettings,
) -> Result<Solution<D>, SeirError>
where
    S: OdeSystem<D> + ?Sized,
{
    let Some(&t0) = times.first() else {
        return Err(SeirError::InvalidParameter(
            "at least one output time is required".to_string(),
        ));
    };
    if times.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(SeirError::InvalidParameter(
            "output times must be strictly increasing".to_string(),
        ));
    }
    if y0.iter().any(|value| !value.is_finite()) {
        return Err(failure(t0, "initial state is not finite"));
    }

    let tolerances = &settings.tolerances;
    let mut stats = IntegratorStats::default();
    let mut states = Vec::with_capacity(times.len());
    states.push(y0);

    let mut t = t0;
    let mut y = y0;
    let mut k1 = system.derivative(t, &y);
    stats.derivative_evaluations += 1;
    let mut h = match times.get(1) {
        Some(&t1) => initial_step(&y, &k1, t1 - t0, tolerances),
        None => 0.0,
    };

    for &t_out in &times[1..] {
        let mut steps = 0;
        while t < t_out {
            if steps >= settings.max_steps_per_interval {
                return Err(failure(
                    t,
                    format!(
                        "exceeded {} steps before reaching t = {t_out}",
                        settings.max_steps_per_interval
                    ),
                ));
            }
            steps += 1;

            let remaining = t_out - t;
            let landing = h >= remaining;
            if landing {
                h = remaining;
            }
            if h < settings.min_step * t.abs().max(1.0) {
                return Err(failure(t, format!("step size underflow (h = {h:e})")));
            }

            let k2 = system.derivative(t + C2 * h, &combine(&y, h, &[(A21, &k1)]));
            let k3 = system.derivative(t + C3 * h, &combine(&y, h, &[(A31, &k1), (A32, &k2)]));
            let k4 = system.derivative(
                t + C4 * h,
                &combine(&y, h, &[(A41, &k1), (A42, &k2), (A43, &k3)]),
            );
            let k5 = system.derivative(
                t + C5 * h,
                &combine(&y, h, &[(A51, &k1), (A52, &k2), (A53, &k3), (A54, &k4)]),
            );
            let k6 = system.derivative(
                t + h,
                &combine(
                    &y,
                    h,
                    &[(A61, &k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)],
                ),
            );
            let y_new = combine(
                &y,
                h,
                &[(B1, &k1), (B3, &k3), (B4, &k4), (B5, &k5), (B6, &k6)],
            );
            let k7 = system.derivative(t + h, &y_new);
            stats.derivative_evaluations += 6;

            if y_new.iter().any(|value| !value.is_finite()) {
                return Err(failure(t, "state is no longer finite"));
            }

            let zero = [0.0; D];
            let error = combine(
                &zero,
                h,
                &[(E1, &k1), (E3, &k3), (E4, &k4), (E5, &k5), (E6, &k6), (E7, &k7)],
            );
            let norm = error_norm(&y, &y_new, &error, tolerances);

            let factor = if norm == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * norm.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
            };

            if norm <= 1.0 {
                stats.accepted_steps += 1;
                t = if landing { t_out } else { t + h };
                y = y_new;
                k1 = k7;
                h *= factor;
            } else {
                stats.rejected_steps += 1;
                trace!("rejected step at t = {t} (h = {h:e}, error norm = {norm:e})");
                h *= factor.min(1.0);
            }
        }
        states.push(y);
    }

    Ok(Solution {
        times: times.to_vec(),
        states,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;

    struct ExponentialDecay {
        rate: f64,
    }

    impl OdeSystem<1> for ExponentialDecay {
        fn derivative(&self, _t: f64, y: &[f64; 1]) -> [f64; 1] {
            [-self.rate * y[0]]
        }
    }

    struct HarmonicOscillator;

    impl OdeSystem<2> for HarmonicOscillator {
        fn derivative(&self, _t: f64, y: &[f64; 2]) -> [f64; 2] {
            [y[1], -y[0]]
        }
    }

    struct Blowup;

    impl OdeSystem<1> for Blowup {
        fn derivative(&self, _t: f64, y: &[f64; 1]) -> [f64; 1] {
            [y[0] * y[0]]
        }
    }

    fn linspace(end: f64, n: usize) -> Vec<f64> {
        (0..n).map(|k| end * k as f64 / (n - 1) as f64).collect()
    }

    #[test]
    fn exponential_decay_matches_closed_form() {
        let times = linspace(5.0, 11);
        let solution = integrate(
            &ExponentialDecay { rate: 0.7 },
            [2.0],
            &times,
            &IntegratorSettings::default(),
        )
        .unwrap();
        assert_eq!(solution.states.len(), times.len());
        for (t, state) in solution.times.iter().zip(&solution.states) {
            assert_almost_eq!(state[0], 2.0 * (-0.7 * t).exp(), 1e-6);
        }
    }

    #[test]
    fn oscillator_returns_after_one_period() {
        let period = 2.0 * std::f64::consts::PI;
        let solution = integrate(
            &HarmonicOscillator,
            [1.0, 0.0],
            &[0.0, period],
            &IntegratorSettings::default(),
        )
        .unwrap();
        let last = solution.states[1];
        assert_almost_eq!(last[0], 1.0, 1e-6);
        assert_almost_eq!(last[1], 0.0, 1e-6);
        assert!(solution.stats.accepted_steps > 1);
    }

    #[test]
    fn first_sample_is_initial_state() {
        let solution = integrate(
            &ExponentialDecay { rate: 3.0 },
            [1.5],
            &[0.0, 1.0],
            &IntegratorSettings::default(),
        )
        .unwrap();
        assert_eq!(solution.states[0], [1.5]);
    }

    #[test]
    fn single_output_time_needs_no_steps() {
        let solution = integrate(
            &ExponentialDecay { rate: 1.0 },
            [1.0],
            &[0.0],
            &IntegratorSettings::default(),
        )
        .unwrap();
        assert_eq!(solution.states, vec![[1.0]]);
        assert_eq!(solution.stats.accepted_steps, 0);
    }

    #[test]
    fn rejects_unordered_times() {
        let result = integrate(
            &ExponentialDecay { rate: 1.0 },
            [1.0],
            &[0.0, 2.0, 1.0],
            &IntegratorSettings::default(),
        );
        assert!(matches!(result, Err(SeirError::InvalidParameter(_))));
        let result = integrate(
            &ExponentialDecay { rate: 1.0 },
            [1.0],
            &[],
            &IntegratorSettings::default(),
        );
        assert!(matches!(result, Err(SeirError::InvalidParameter(_))));
    }

    #[test]
    fn finite_time_blowup_fails_with_time() {
        // y' = y^2, y(0) = 1 has the solution 1 / (1 - t), which diverges at t = 1.
        let result = integrate(&Blowup, [1.0], &[0.0, 2.0], &IntegratorSettings::default());
        match result {
            Err(SeirError::IntegrationFailure { time, .. }) => {
                assert!(time > 0.9 && time < 1.0, "failed at {time}");
            }
            other => panic!("expected an integration failure, got {other:?}"),
        }
    }

    #[test]
    fn step_budget_is_enforced() {
        let settings = IntegratorSettings {
            max_steps_per_interval: 2,
            ..IntegratorSettings::default()
        };
        let result = integrate(&HarmonicOscillator, [1.0, 0.0], &[0.0, 100.0], &settings);
        assert!(matches!(
            result,
            Err(SeirError::IntegrationFailure { .. })
        ));
    }
}
