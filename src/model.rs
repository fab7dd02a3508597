//! The SEIR compartmental model.
//!
//! People move `Susceptible -> Exposed -> Infected -> Recovered`. Exposure happens at rate
//! `beta * I / N` per susceptible person, exposed people become infectious at rate `sigma` and
//! infected people recover at rate `gamma`:
//!
//! ```text
//! dS/dt = -beta * S * I / N
//! dE/dt =  beta * S * I / N - sigma * E
//! dI/dt =  sigma * E - gamma * I
//! dR/dt =  gamma * I
//! ```
use crate::error::SeirError;
use crate::log::debug;
use crate::ode::{integrate, IntegratorSettings, IntegratorStats, OdeSystem};
use crate::parameters::ModelParameters;
use crate::trajectory::Trajectory;

/// Rates of change `(dS, dE, dI, dR)` of the state `(S, E, I, R)`.
///
/// `N` is recomputed from `state` on every call rather than taken from the configured
/// population, so the function only depends on its arguments. The four rates always sum to zero
/// (up to rounding), which is what keeps the population constant during integration.
///
/// `t` is unused: the system is autonomous, but integrators pass the time to every derivative.
/// A state with `S + E + I + R == 0` is outside the domain of this function.
#[must_use]
pub fn derivative(state: &[f64; 4], _t: f64, beta: f64, sigma: f64, gamma: f64) -> [f64; 4] {
    let [s, e, i, r] = *state;
    let n = s + e + i + r;
    let infections = beta * s * i / n;
    let onsets = sigma * e;
    let recoveries = gamma * i;
    [
        -infections,
        infections - onsets,
        onsets - recoveries,
        recoveries,
    ]
}

pub struct SeirModel {
    parameters: ModelParameters,
    times: Vec<f64>,
    settings: IntegratorSettings,
    trajectory: Option<Trajectory>,
    stats: Option<IntegratorStats>,
}

impl SeirModel {
    /// Creates a model after validating `parameters`.
    ///
    /// # Errors
    ///
    /// Returns `SeirError::InvalidParameter` for a degenerate configuration, e.g. an empty
    /// population.
    pub fn new(parameters: ModelParameters) -> Result<Self, SeirError> {
        parameters.validate()?;
        Ok(Self {
            times: parameters.time_grid(),
            parameters,
            settings: IntegratorSettings::default(),
            trajectory: None,
            stats: None,
        })
    }

    /// Replaces the default integrator settings.
    #[must_use]
    pub fn with_settings(mut self, settings: IntegratorSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn parameters(&self) -> &ModelParameters {
        &self.parameters
    }

    /// The output times the trajectory is sampled at.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// The trajectory computed by the last call to [`SeirModel::solve`].
    #[must_use]
    pub fn trajectory(&self) -> Option<&Trajectory> {
        self.trajectory.as_ref()
    }

    /// Integrator counters from the last call to [`SeirModel::solve`].
    #[must_use]
    pub fn stats(&self) -> Option<IntegratorStats> {
        self.stats
    }

    /// Integrates the model over its time grid, caches the trajectory and returns it.
    ///
    /// # Errors
    ///
    /// Returns `SeirError::IntegrationFailure` if the solver cannot reach the end of the grid.
    /// There is no retry: the failure carries the time the solver got stuck at.
    pub fn solve(&mut self) -> Result<&Trajectory, SeirError> {
        let solution = integrate(
            &*self,
            self.parameters.initial_state(),
            &self.times,
            &self.settings,
        )?;
        debug!(
            "Solved SEIR model over {} output times: {} steps accepted, {} rejected, {} derivative evaluations",
            solution.times.len(),
            solution.stats.accepted_steps,
            solution.stats.rejected_steps,
            solution.stats.derivative_evaluations
        );
        self.stats = Some(solution.stats);
        let trajectory = Trajectory::from_samples(
            self.parameters.population,
            &solution.times,
            &solution.states,
        )?;
        Ok(self.trajectory.insert(trajectory))
    }
}

impl OdeSystem<4> for SeirModel {
    fn derivative(&self, t: f64, y: &[f64; 4]) -> [f64; 4] {
        derivative(
            y,
            t,
            self.parameters.beta,
            self.parameters.sigma,
            self.parameters.gamma,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::numeric::CONSERVATION_TOLERANCE;
    use crate::parameters::ModelParametersBuilder;
    use crate::trajectory::Compartments;

    fn reference_model() -> SeirModel {
        SeirModel::new(ModelParameters::with_population(1000.0)).unwrap()
    }

    #[test]
    fn derivative_matches_equations() {
        let rates = derivative(&[900.0, 50.0, 40.0, 10.0], 0.0, 0.5, 0.1, 0.2);
        // beta * S * I / N = 0.5 * 900 * 40 / 1000 = 18
        assert_almost_eq!(rates[0], -18.0, 1e-12);
        assert_almost_eq!(rates[1], 18.0 - 5.0, 1e-12);
        assert_almost_eq!(rates[2], 5.0 - 8.0, 1e-12);
        assert_almost_eq!(rates[3], 8.0, 1e-12);
    }

    #[test]
    fn derivative_sums_to_zero() {
        let states = [
            [999.0, 1.0, 0.0, 0.0],
            [500.0, 120.0, 230.0, 150.0],
            [1.0e-3, 2.5, 7.25, 1.0e6],
            [3.0, 0.0, 0.0, 0.0],
        ];
        for state in &states {
            for (beta, sigma, gamma) in [(0.5, 0.1, 0.1), (3.0, 0.0, 1.0), (0.0, 2.0, 0.01)] {
                let rates = derivative(state, 7.0, beta, sigma, gamma);
                let scale = state.iter().sum::<f64>() * (beta + sigma + gamma);
                assert_almost_eq!(rates.iter().sum::<f64>(), 0.0, 1e-12 * scale.max(1.0));
            }
        }
    }

    #[test]
    fn derivative_uses_state_total() {
        // Same proportions at two different scales give proportional rates.
        let small = derivative(&[90.0, 5.0, 4.0, 1.0], 0.0, 0.5, 0.1, 0.1);
        let large = derivative(&[900.0, 50.0, 40.0, 10.0], 0.0, 0.5, 0.1, 0.1);
        for k in 0..4 {
            assert_almost_eq!(large[k], 10.0 * small[k], 1e-12);
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let result = SeirModel::new(ModelParameters::with_population(0.0));
        assert!(matches!(result, Err(SeirError::InvalidParameter(_))));
    }

    #[test]
    fn trajectory_starts_at_initial_state() {
        let mut model = reference_model();
        let trajectory = model.solve().unwrap();
        assert_eq!(trajectory.len(), 120);
        assert_eq!(
            trajectory.compartments_at(0).unwrap(),
            Compartments::from([999.0, 1.0, 0.0, 0.0])
        );
        assert_eq!(trajectory.times()[119], 120.0);
    }

    #[test]
    fn population_is_conserved() {
        for (beta, sigma, gamma) in [(0.5, 0.1, 0.1), (2.0, 0.5, 0.05), (0.05, 1.0, 0.5)] {
            let parameters = ModelParametersBuilder::default()
                .population(25_000.0)
                .beta(beta)
                .sigma(sigma)
                .gamma(gamma)
                .build()
                .unwrap();
            let mut model = SeirModel::new(parameters).unwrap();
            let trajectory = model.solve().unwrap();
            assert!(trajectory.conservation_error() < CONSERVATION_TOLERANCE);
        }
    }

    #[test]
    fn irreversible_compartments_are_monotone() {
        let mut model = reference_model();
        let trajectory = model.solve().unwrap();
        for pair in trajectory.susceptible().windows(2) {
            assert!(pair[1] <= pair[0] + 1e-9, "S increased: {pair:?}");
        }
        for pair in trajectory.recovered().windows(2) {
            assert!(pair[1] >= pair[0] - 1e-9, "R decreased: {pair:?}");
        }
    }

    #[test]
    fn reference_epidemic_rises_peaks_and_decays() {
        let mut model = reference_model();
        let trajectory = model.solve().unwrap();
        let infected = trajectory.infected();
        let (peak_time, peak) = trajectory.peak_infected().unwrap();

        assert_eq!(infected[0], 0.0);
        assert!(peak_time > 0.0 && peak_time < trajectory.end_time());
        assert!(peak > 150.0, "peak of {peak} is too small");
        assert!(infected[infected.len() - 1] < 0.25 * peak);

        let recovered = trajectory.recovered()[trajectory.len() - 1];
        assert!(recovered > 900.0 && recovered < 1000.0);
        assert!(trajectory.final_size() < 1000.0);
    }

    #[test]
    fn solve_caches_trajectory_and_stats() {
        let mut model = reference_model();
        assert!(model.trajectory().is_none());
        let peak = model.solve().unwrap().peak_infected();
        assert_eq!(model.trajectory().unwrap().peak_infected(), peak);
        let stats = model.stats().unwrap();
        assert!(stats.accepted_steps > 0);
        assert!(stats.derivative_evaluations > stats.accepted_steps);
    }

    #[test]
    fn no_transmission_keeps_everyone_susceptible() {
        let parameters = ModelParameters {
            beta: 0.0,
            ..ModelParameters::with_population(100.0)
        };
        let mut model = SeirModel::new(parameters).unwrap();
        let trajectory = model.solve().unwrap();
        assert!(trajectory
            .susceptible()
            .iter()
            .all(|&s| (s - 99.0).abs() < 1e-9));
    }

    #[test]
    fn exhausted_step_budget_is_an_integration_failure() {
        let settings = IntegratorSettings {
            max_steps_per_interval: 1,
            ..IntegratorSettings::default()
        };
        let parameters = ModelParameters {
            beta: 50.0,
            sigma: 50.0,
            gamma: 50.0,
            time_points: 2,
            ..ModelParameters::default()
        };
        let mut model = SeirModel::new(parameters).unwrap().with_settings(settings);
        assert!(matches!(
            model.solve(),
            Err(SeirError::IntegrationFailure { .. })
        ));
        assert!(model.trajectory().is_none());
    }
}
