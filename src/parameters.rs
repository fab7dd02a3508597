//! Model parameters: population size, rate constants, initial compartments and the output time
//! grid. Parameters can be built in code with [`ModelParametersBuilder`] or read from a JSON file;
//! any field missing from the file takes its default value.
//!
//! ```rust
//! use seir_animate::parameters::ModelParametersBuilder;
//!
//! let parameters = ModelParametersBuilder::default()
//!     .population(10_000.0)
//!     .beta(0.4)
//!     .build()
//!     .unwrap();
//! assert_eq!(parameters.initial_susceptible(), 9_999.0);
//! ```
use std::fs;
use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::SeirError;
use crate::log::trace;

pub const DEFAULT_POPULATION: f64 = 1000.0;
pub const DEFAULT_BETA: f64 = 0.5;
pub const DEFAULT_SIGMA: f64 = 0.1;
pub const DEFAULT_GAMMA: f64 = 0.1;
pub const DEFAULT_TIME_HORIZON: f64 = 120.0;
pub const DEFAULT_TIME_POINTS: usize = 120;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Builder)]
#[builder(default)]
#[serde(default)]
pub struct ModelParameters {
    /// Total population size (N).
    pub population: f64,
    /// Transmission rate.
    pub beta: f64,
    /// Rate at which exposed individuals become infectious (1 / incubation period).
    pub sigma: f64,
    /// Recovery rate (1 / infectious period).
    pub gamma: f64,
    pub initial_exposed: f64,
    pub initial_infected: f64,
    pub initial_recovered: f64,
    /// Last output time. The grid always starts at 0.
    pub time_horizon: f64,
    /// Number of evenly spaced output times, both ends included.
    pub time_points: usize,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            population: DEFAULT_POPULATION,
            beta: DEFAULT_BETA,
            sigma: DEFAULT_SIGMA,
            gamma: DEFAULT_GAMMA,
            initial_exposed: 1.0,
            initial_infected: 0.0,
            initial_recovered: 0.0,
            time_horizon: DEFAULT_TIME_HORIZON,
            time_points: DEFAULT_TIME_POINTS,
        }
    }
}

impl ModelParameters {
    /// Default parameters for a population of `population` people.
    #[must_use]
    pub fn with_population(population: f64) -> Self {
        Self {
            population,
            ..Self::default()
        }
    }

    /// Reads parameters from a JSON object. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a `SeirError` if the file cannot be read or parsed, or if the parameters it
    /// describes are invalid.
    pub fn from_json_file(path: &Path) -> Result<Self, SeirError> {
        trace!("Loading parameters from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let parameters: ModelParameters = serde_json::from_str(&contents)?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Susceptible population at `t = 0`: everyone not seeded into another compartment.
    #[must_use]
    pub fn initial_susceptible(&self) -> f64 {
        self.population - self.initial_exposed - self.initial_infected - self.initial_recovered
    }

    /// Initial state `(S0, E0, I0, R0)`.
    #[must_use]
    pub fn initial_state(&self) -> [f64; 4] {
        [
            self.initial_susceptible(),
            self.initial_exposed,
            self.initial_infected,
            self.initial_recovered,
        ]
    }

    #[must_use]
    pub fn basic_reproduction_number(&self) -> f64 {
        self.beta / self.gamma
    }

    /// Output times `t[k] = k * horizon / (points - 1)`. A single point is `[0.0]` and zero
    /// points give an empty grid.
    #[must_use]
    pub fn time_grid(&self) -> Vec<f64> {
        let Some(last_index) = self.time_points.checked_sub(1) else {
            return Vec::new();
        };
        if last_index == 0 {
            return vec![0.0];
        }
        let last = last_index as f64;
        (0..self.time_points)
            .map(|k| {
                if k == last_index {
                    self.time_horizon
                } else {
                    self.time_horizon * k as f64 / last
                }
            })
            .collect()
    }

    /// Checks that the configuration describes a population that can be integrated.
    ///
    /// # Errors
    ///
    /// Returns `SeirError::InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<(), SeirError> {
        if !(self.population.is_finite() && self.population > 0.0) {
            return Err(SeirError::InvalidParameter(format!(
                "population must be positive, got {}",
                self.population
            )));
        }
        for (name, value) in [
            ("beta", self.beta),
            ("sigma", self.sigma),
            ("gamma", self.gamma),
            ("initial_exposed", self.initial_exposed),
            ("initial_infected", self.initial_infected),
            ("initial_recovered", self.initial_recovered),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SeirError::InvalidParameter(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.initial_susceptible() < 0.0 {
            return Err(SeirError::InvalidParameter(format!(
                "initial compartments exceed the population of {}",
                self.population
            )));
        }
        if !(self.time_horizon.is_finite() && self.time_horizon > 0.0) {
            return Err(SeirError::InvalidParameter(format!(
                "time_horizon must be positive, got {}",
                self.time_horizon
            )));
        }
        if self.time_points < 2 {
            return Err(SeirError::InvalidParameter(format!(
                "time_points must be at least 2, got {}",
                self.time_points
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_seed_one_exposed() {
        let parameters = ModelParameters::with_population(1000.0);
        assert_eq!(parameters.initial_state(), [999.0, 1.0, 0.0, 0.0]);
        assert_almost_eq!(parameters.basic_reproduction_number(), 5.0, 1e-12);
        assert!(parameters.validate().is_ok());
    }

    #[test]
    fn builder_fills_defaults() {
        let parameters = ModelParametersBuilder::default()
            .population(500.0)
            .gamma(0.25)
            .build()
            .unwrap();
        assert_eq!(parameters.beta, DEFAULT_BETA);
        assert_eq!(parameters.gamma, 0.25);
        assert_eq!(parameters.time_points, DEFAULT_TIME_POINTS);
    }

    #[test]
    fn time_grid_includes_both_ends() {
        let grid = ModelParameters::default().time_grid();
        assert_eq!(grid.len(), 120);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[119], 120.0);
        assert_almost_eq!(grid[1] - grid[0], 120.0 / 119.0, 1e-12);
    }

    #[test]
    fn degenerate_time_grids() {
        let empty = ModelParameters {
            time_points: 0,
            ..ModelParameters::default()
        };
        assert!(empty.time_grid().is_empty());

        let single = ModelParameters {
            time_points: 1,
            ..ModelParameters::default()
        };
        assert_eq!(single.time_grid(), vec![0.0]);
    }

    #[test]
    fn zero_population_is_invalid() {
        let parameters = ModelParameters::with_population(0.0);
        assert!(matches!(
            parameters.validate(),
            Err(SeirError::InvalidParameter(_))
        ));
    }

    #[test]
    fn negative_rate_is_invalid() {
        let parameters = ModelParameters {
            sigma: -0.1,
            ..ModelParameters::default()
        };
        match parameters.validate() {
            Err(SeirError::InvalidParameter(message)) => assert!(message.contains("sigma")),
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn oversized_seed_is_invalid() {
        let parameters = ModelParameters {
            population: 10.0,
            initial_infected: 20.0,
            ..ModelParameters::default()
        };
        assert!(parameters.validate().is_err());
    }

    #[test]
    fn single_time_point_is_invalid() {
        let parameters = ModelParameters {
            time_points: 1,
            ..ModelParameters::default()
        };
        assert!(parameters.validate().is_err());
    }

    #[test]
    fn load_partial_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"population": 100, "beta": 0.3}}"#).unwrap();
        let parameters = ModelParameters::from_json_file(file.path()).unwrap();
        assert_eq!(parameters.population, 100.0);
        assert_eq!(parameters.beta, 0.3);
        assert_eq!(parameters.sigma, DEFAULT_SIGMA);
        assert_eq!(parameters.initial_exposed, 1.0);
    }

    #[test]
    fn load_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"population": 0}}"#).unwrap();
        assert!(matches!(
            ModelParameters::from_json_file(file.path()),
            Err(SeirError::InvalidParameter(_))
        ));
    }

    #[test]
    fn load_rejects_malformed_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "population = 100").unwrap();
        assert!(matches!(
            ModelParameters::from_json_file(file.path()),
            Err(SeirError::JsonError(_))
        ));
    }
}
