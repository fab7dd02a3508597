//! Rendering a trajectory as frames and animations.
//!
//! A frame shows the trajectory up to one sample: a line chart of every compartment on the left
//! and a 10x10 [`PopulationGrid`](crate::grid::PopulationGrid) on the right. An animation is a
//! sequence of frames staged as PNG files and assembled into a GIF.
//!
//! ```rust,no_run
//! use seir_animate::model::SeirModel;
//! use seir_animate::parameters::ModelParameters;
//! use seir_animate::render::{RenderOptions, Renderer};
//! use std::path::Path;
//!
//! let mut model = SeirModel::new(ModelParameters::with_population(100.0)).unwrap();
//! let trajectory = model.solve().unwrap();
//! let renderer = Renderer::new(RenderOptions::default());
//! renderer
//!     .render_animation(trajectory, 1, Path::new("fig/output/animation.gif"))
//!     .unwrap();
//! ```
mod animation;
mod frame;

use std::path::{Path, PathBuf};

use rand::rngs::SmallRng;
use rand::SeedableRng;

pub use animation::{assemble_animation, AnimationReport, StagingDir};
pub use frame::{cell_color, FrameWriteFailure, RenderedFrame};

use crate::error::SeirError;
use crate::grid::{CellCounts, PopulationGrid, GRID_CELLS};
use crate::log::{debug, info, warn};
use crate::trajectory::Trajectory;

/// Highest frame index an animation renders.
pub const LAST_FRAME_INDEX: usize = 100;
pub const DEFAULT_STAGING_DIR: &str = "fig/animation_files";
pub const DEFAULT_ANIMATION_PATH: &str = "fig/output/animation.gif";

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Frame size in pixels.
    pub width: u32,
    pub height: u32,
    /// Base seed for the grid shuffle. Frame `i` is shuffled with `seed + i`.
    pub seed: u64,
    /// How long each frame is shown in the animation.
    pub frame_delay_ms: u32,
    pub staging_dir: PathBuf,
    pub last_frame_index: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1400,
            height: 350,
            seed: 0,
            frame_delay_ms: 50,
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            last_frame_index: LAST_FRAME_INDEX,
        }
    }
}

impl RenderOptions {
    /// The grid panel gets two sevenths of the width, the chart the rest.
    #[must_use]
    pub fn grid_width(&self) -> u32 {
        self.width * 2 / 7
    }
}

/// Result of rendering one frame.
#[derive(Debug, Clone)]
pub enum FrameOutcome {
    /// No destination was given; the caller gets the drawing.
    InMemory(RenderedFrame),
    Saved(PathBuf),
    /// The frame was drawn but could not be written. The failure has been logged.
    WriteFailed(FrameWriteFailure),
}

pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    #[must_use]
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Draws frame `index` in memory.
    ///
    /// # Errors
    ///
    /// Returns `SeirError::InvalidParameter` if `index` is past the end of the trajectory and
    /// `SeirError::RenderError` if drawing fails.
    pub fn draw_frame(
        &self,
        trajectory: &Trajectory,
        index: usize,
    ) -> Result<RenderedFrame, SeirError> {
        let compartments = trajectory.compartments_at(index).ok_or_else(|| {
            SeirError::InvalidParameter(format!(
                "frame index {index} is out of range for a trajectory of {} samples",
                trajectory.len()
            ))
        })?;
        let counts = CellCounts::from_compartments(&compartments, GRID_CELLS);
        let mut rng = SmallRng::seed_from_u64(self.options.seed.wrapping_add(index as u64));
        let grid = PopulationGrid::shuffled(&counts, &mut rng);
        let image = frame::draw(
            trajectory,
            index,
            &grid,
            (self.options.width, self.options.height),
            self.options.grid_width(),
        )?;
        Ok(RenderedFrame {
            index,
            counts,
            grid,
            image,
        })
    }

    /// Draws frame `index` and writes it to `destination` if one is given. A failed write is
    /// logged and returned as [`FrameOutcome::WriteFailed`] instead of an error.
    ///
    /// # Errors
    ///
    /// Returns `SeirError::InvalidParameter` if `index` is past the end of the trajectory and
    /// `SeirError::RenderError` if drawing fails.
    pub fn render_frame(
        &self,
        trajectory: &Trajectory,
        index: usize,
        destination: Option<&Path>,
    ) -> Result<FrameOutcome, SeirError> {
        let frame = self.draw_frame(trajectory, index)?;
        let Some(destination) = destination else {
            return Ok(FrameOutcome::InMemory(frame));
        };
        match frame.save(destination) {
            Ok(()) => {
                debug!("Wrote frame {} to {}", index, destination.display());
                Ok(FrameOutcome::Saved(destination.to_path_buf()))
            }
            Err(failure) => {
                warn!(
                    "Skipping frame {}: could not write {}: {}",
                    failure.index,
                    failure.path.display(),
                    failure.reason
                );
                Ok(FrameOutcome::WriteFailed(failure))
            }
        }
    }

    /// Indices of the frames an animation of `trajectory` shows: every `every_nth_frame`-th
    /// index from 0 up to `last_frame_index`, stopping early at the end of the trajectory.
    #[must_use]
    pub fn frame_indices(&self, trajectory: &Trajectory, every_nth_frame: usize) -> Vec<usize> {
        let Some(last_sample) = trajectory.len().checked_sub(1) else {
            return Vec::new();
        };
        let last = self.options.last_frame_index.min(last_sample);
        (0..=last).step_by(every_nth_frame.max(1)).collect()
    }

    /// Renders frames into the staging directory and assembles them into a GIF at
    /// `output_path`. `every_nth_frame = 2` renders every other frame.
    ///
    /// Frames that cannot be written are skipped and listed in the report.
    ///
    /// # Errors
    ///
    /// Returns `SeirError::InvalidParameter` if `every_nth_frame` is zero,
    /// `SeirError::EmptyAnimation` if no frame could be staged, and I/O or image errors from
    /// preparing the staging directory or writing the GIF.
    pub fn render_animation(
        &self,
        trajectory: &Trajectory,
        every_nth_frame: usize,
        output_path: &Path,
    ) -> Result<AnimationReport, SeirError> {
        if every_nth_frame == 0 {
            return Err(SeirError::InvalidParameter(
                "every_nth_frame must be at least 1".to_string(),
            ));
        }
        let staging = StagingDir::acquire(&self.options.staging_dir)?;
        let indices = self.frame_indices(trajectory, every_nth_frame);
        info!(
            "Rendering {} frames into {}",
            indices.len(),
            staging.path().display()
        );

        let mut failed_frames = Vec::new();
        for index in indices {
            let path = staging.frame_path(index);
            if let FrameOutcome::WriteFailed(failure) =
                self.render_frame(trajectory, index, Some(&path))?
            {
                failed_frames.push(failure);
            }
        }

        let frames = assemble_animation(&staging, output_path, self.options.frame_delay_ms)?;
        info!(
            "Wrote {} frames to {} ({} frames skipped)",
            frames,
            output_path.display(),
            failed_frames.len()
        );
        Ok(AnimationReport {
            output: output_path.to_path_buf(),
            frames,
            failed_frames,
        })
    }
}
