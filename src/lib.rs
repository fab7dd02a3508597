//! Deterministic SEIR epidemic trajectories and their animation.
//!
//! The crate integrates the four compartment SEIR model (Susceptible, Exposed, Infected,
//! Recovered) over a fixed time grid and renders the resulting trajectory as frames: a line
//! chart of the compartments next to a 10x10 grid in which every cell is a person. Frames can be
//! kept in memory, written as PNG files, or assembled into an animated GIF.
//!
//! Data flows one way:
//! * [`ModelParameters`] describe the population, the rate constants and the time grid.
//! * [`SeirModel::solve`] integrates the model with an adaptive Runge-Kutta solver (see [`ode`])
//!   and caches the resulting [`Trajectory`].
//! * A [`Renderer`] turns the trajectory into frames and animations.
//!
//! ```rust,no_run
//! use seir_animate::{ModelParameters, RenderOptions, Renderer, SeirModel};
//! use std::path::Path;
//!
//! let parameters = ModelParameters::with_population(100.0);
//! let mut model = SeirModel::new(parameters)?;
//! let trajectory = model.solve()?;
//! println!("{} people infected at the peak", trajectory.peak_infected().unwrap().1);
//!
//! let renderer = Renderer::new(RenderOptions::default());
//! let report = renderer.render_animation(trajectory, 2, Path::new("fig/output/animation.gif"))?;
//! println!("{} frames written", report.frames);
//! # Ok::<(), seir_animate::SeirError>(())
//! ```
pub mod error;
pub mod grid;
pub mod log;
mod macros;
pub mod model;
pub mod numeric;
pub mod ode;
pub mod parameters;
pub mod render;
pub mod report;
pub mod trajectory;

pub use error::SeirError;
pub use model::{derivative, SeirModel};
pub use parameters::{ModelParameters, ModelParametersBuilder};
pub use render::{AnimationReport, FrameOutcome, RenderOptions, Renderer};
pub use report::write_trajectory_csv;
pub use trajectory::{Compartments, Trajectory};
