//! The population grid: a fixed 10x10 picture of the population in which every cell stands for
//! one person.
//!
//! Cell counts come from rounding the exposed, infected and recovered compartments; whatever is
//! left of the 100 cells is susceptible. The cells are shuffled uniformly and laid out row-major.
//!
//! Rounded counts can add up to more than 100 cells (the population is larger than the grid, or
//! rounding pushes the sum over). Such counts are rescaled proportionally with the largest
//! remainder method so that exactly 100 cells are drawn and none of them is susceptible.
use rand::seq::SliceRandom;
use rand::Rng;

use crate::trajectory::Compartments;

/// Number of cells along each side of the grid.
pub const GRID_SIDE: usize = 10;
/// Total number of cells in the grid.
pub const GRID_CELLS: usize = GRID_SIDE * GRID_SIDE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellState {
    Susceptible,
    Exposed,
    Infected,
    Recovered,
}

/// How many cells of each state a grid holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellCounts {
    pub susceptible: usize,
    pub exposed: usize,
    pub infected: usize,
    pub recovered: usize,
}

fn rounded_count(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value.round()
    } else {
        0.0
    }
}

impl CellCounts {
    /// Counts for a grid of `capacity` cells showing `compartments`.
    #[must_use]
    pub fn from_compartments(compartments: &Compartments, capacity: usize) -> Self {
        let counts = [
            rounded_count(compartments.exposed),
            rounded_count(compartments.infected),
            rounded_count(compartments.recovered),
        ];
        // Counts stay in f64 until they are known to fit, so huge compartments cannot overflow.
        let occupied: f64 = counts.iter().sum();

        if occupied <= capacity as f64 {
            let occupied = occupied as usize;
            return Self {
                susceptible: capacity - occupied,
                exposed: counts[0] as usize,
                infected: counts[1] as usize,
                recovered: counts[2] as usize,
            };
        }

        // Shares relative to the largest count keep the sum finite.
        let largest = counts.iter().copied().fold(0.0, f64::max);
        let shares = counts.map(|count| count / largest);
        let total_share: f64 = shares.iter().sum();
        let mut scaled = [0usize; 3];
        let mut remainders = [(0.0f64, 0usize); 3];
        for (k, &share) in shares.iter().enumerate() {
            let quota = share * capacity as f64 / total_share;
            scaled[k] = (quota.floor() as usize).min(capacity);
            remainders[k] = (quota - quota.floor(), k);
        }
        let leftover = capacity.saturating_sub(scaled.iter().sum::<usize>());
        // Largest fractional part first; earlier compartments win ties.
        remainders.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        for &(_, k) in remainders.iter().take(leftover) {
            scaled[k] += 1;
        }

        Self {
            susceptible: 0,
            exposed: scaled[0],
            infected: scaled[1],
            recovered: scaled[2],
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.susceptible + self.exposed + self.infected + self.recovered
    }

    #[must_use]
    pub fn get(&self, state: CellState) -> usize {
        match state {
            CellState::Susceptible => self.susceptible,
            CellState::Exposed => self.exposed,
            CellState::Infected => self.infected,
            CellState::Recovered => self.recovered,
        }
    }
}

/// A shuffled layout of cells, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationGrid {
    cells: Vec<CellState>,
}

impl PopulationGrid {
    /// Lays out `counts` in random order.
    pub fn shuffled<R: Rng + ?Sized>(counts: &CellCounts, rng: &mut R) -> Self {
        let mut cells = Vec::with_capacity(counts.total());
        for state in [
            CellState::Susceptible,
            CellState::Exposed,
            CellState::Infected,
            CellState::Recovered,
        ] {
            cells.extend(std::iter::repeat_n(state, counts.get(state)));
        }
        cells.shuffle(rng);
        Self { cells }
    }

    /// The grid for one sample of a trajectory.
    pub fn for_compartments<R: Rng + ?Sized>(compartments: &Compartments, rng: &mut R) -> Self {
        Self::shuffled(
            &CellCounts::from_compartments(compartments, GRID_CELLS),
            rng,
        )
    }

    #[must_use]
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// Rows of `GRID_SIDE` cells, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[CellState]> {
        self.cells.chunks(GRID_SIDE)
    }

    #[must_use]
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&cell| cell == state).count()
    }
}
