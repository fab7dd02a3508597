use serde::{Deserialize, Serialize};

use crate::error::SeirError;
use crate::numeric::max_relative_deviation;

/// Compartment sizes at a single point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Compartments {
    pub susceptible: f64,
    pub exposed: f64,
    pub infected: f64,
    pub recovered: f64,
}

impl Compartments {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.susceptible + self.exposed + self.infected + self.recovered
    }
}

impl From<[f64; 4]> for Compartments {
    fn from([susceptible, exposed, infected, recovered]: [f64; 4]) -> Self {
        Self {
            susceptible,
            exposed,
            infected,
            recovered,
        }
    }
}

/// One row of a trajectory, as written by the trajectory report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRow {
    pub t: f64,
    pub susceptible: f64,
    pub exposed: f64,
    pub infected: f64,
    pub recovered: f64,
}

/// The time series produced by integrating the model: four equal-length compartment sequences
/// sharing one sequence of output times.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    population: f64,
    t: Vec<f64>,
    s: Vec<f64>,
    e: Vec<f64>,
    i: Vec<f64>,
    r: Vec<f64>,
}

impl Trajectory {
    /// Builds a trajectory from `(t, [S, E, I, R])` samples.
    ///
    /// # Errors
    ///
    /// Returns `SeirError::InvalidParameter` if `times` and `states` differ in length.
    pub fn from_samples(
        population: f64,
        times: &[f64],
        states: &[[f64; 4]],
    ) -> Result<Self, SeirError> {
        if times.len() != states.len() {
            return Err(SeirError::InvalidParameter(format!(
                "every output time needs exactly one state, got {} times and {} states",
                times.len(),
                states.len()
            )));
        }
        let mut trajectory = Self {
            population,
            t: times.to_vec(),
            s: Vec::with_capacity(states.len()),
            e: Vec::with_capacity(states.len()),
            i: Vec::with_capacity(states.len()),
            r: Vec::with_capacity(states.len()),
        };
        for [s, e, i, r] in states {
            trajectory.s.push(*s);
            trajectory.e.push(*e);
            trajectory.i.push(*i);
            trajectory.r.push(*r);
        }
        Ok(trajectory)
    }

    /// Population the trajectory was integrated with.
    #[must_use]
    pub fn population(&self) -> f64 {
        self.population
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.t.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.t
    }

    #[must_use]
    pub fn susceptible(&self) -> &[f64] {
        &self.s
    }

    #[must_use]
    pub fn exposed(&self) -> &[f64] {
        &self.e
    }

    #[must_use]
    pub fn infected(&self) -> &[f64] {
        &self.i
    }

    #[must_use]
    pub fn recovered(&self) -> &[f64] {
        &self.r
    }

    /// Last output time, or `0.0` for an empty trajectory.
    #[must_use]
    pub fn end_time(&self) -> f64 {
        self.t.last().copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn compartments_at(&self, index: usize) -> Option<Compartments> {
        (index < self.len()).then(|| Compartments {
            susceptible: self.s[index],
            exposed: self.e[index],
            infected: self.i[index],
            recovered: self.r[index],
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = TrajectoryRow> + '_ {
        (0..self.len()).map(|k| TrajectoryRow {
            t: self.t[k],
            susceptible: self.s[k],
            exposed: self.e[k],
            infected: self.i[k],
            recovered: self.r[k],
        })
    }

    /// Largest relative deviation of `S + E + I + R` from the population over all samples.
    #[must_use]
    pub fn conservation_error(&self) -> f64 {
        max_relative_deviation(
            (0..self.len()).map(|k| self.s[k] + self.e[k] + self.i[k] + self.r[k]),
            self.population,
        )
    }

    /// Time and size of the largest infected compartment.
    #[must_use]
    pub fn peak_infected(&self) -> Option<(f64, f64)> {
        self.i
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(k, &value)| (self.t[k], value))
    }

    /// Everyone who left the susceptible compartment by the end of the trajectory.
    #[must_use]
    pub fn final_size(&self) -> f64 {
        self.s
            .last()
            .map_or(0.0, |&remaining| self.population - remaining)
    }
}
