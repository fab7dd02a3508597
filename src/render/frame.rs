//! Drawing a single frame: the compartment line chart on the left and the population grid on
//! the right. Frames are drawn into an in-memory RGB buffer; writing them out is a separate step
//! so that a failed write never loses the drawing.
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::SeirError;
use crate::grid::{CellCounts, CellState, PopulationGrid, GRID_SIDE};
use crate::trajectory::Trajectory;

const SUSCEPTIBLE_COLOR: RGBColor = RGBColor(128, 128, 128);
const EXPOSED_COLOR: RGBColor = RGBColor(0xC5, 0x6F, 0xE6);
const INFECTED_COLOR: RGBColor = RGBColor(0xF3, 0x51, 0x62);
const RECOVERED_COLOR: RGBColor = RGBColor(0x2F, 0xCB, 0x8F);

const OPACITY: f64 = 0.8;
const LINE_WIDTH: u32 = 4;
const CELL_BORDER_WIDTH: u32 = 2;
const CHART_MARGIN: i32 = 12;
/// Head room above the population on the y axis.
const Y_HEADROOM: f64 = 1.01;

#[must_use]
pub fn cell_color(state: CellState) -> RGBColor {
    match state {
        CellState::Susceptible => SUSCEPTIBLE_COLOR,
        CellState::Exposed => EXPOSED_COLOR,
        CellState::Infected => INFECTED_COLOR,
        CellState::Recovered => RECOVERED_COLOR,
    }
}

/// A frame that could not be written. The drawing itself succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameWriteFailure {
    pub index: usize,
    pub path: PathBuf,
    pub reason: String,
}

/// A drawn frame held in memory.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub index: usize,
    pub counts: CellCounts,
    pub grid: PopulationGrid,
    pub image: RgbImage,
}

impl RenderedFrame {
    /// Writes the frame as a PNG file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a `FrameWriteFailure` describing the path and the underlying error.
    pub fn save(&self, path: &Path) -> Result<(), FrameWriteFailure> {
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|error| FrameWriteFailure {
                index: self.index,
                path: path.to_path_buf(),
                reason: error.to_string(),
            })
    }
}

/// Draws the first `index` samples of every compartment. The axes span the whole trajectory so
/// consecutive frames line up.
fn draw_chart<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    trajectory: &Trajectory,
    index: usize,
) -> Result<(), SeirError> {
    let x_end = trajectory.end_time().max(f64::EPSILON);
    let y_end = trajectory.population() * Y_HEADROOM;
    let mut chart = ChartBuilder::on(area)
        .margin(CHART_MARGIN)
        .build_cartesian_2d(0f64..x_end, 0f64..y_end)?;

    let axis_style = BLACK.stroke_width(2);
    chart.draw_series([
        PathElement::new(vec![(0.0, 0.0), (x_end, 0.0)], axis_style),
        PathElement::new(vec![(0.0, 0.0), (0.0, y_end)], axis_style),
    ])?;

    let times = &trajectory.times()[..index];
    for (values, color) in [
        (trajectory.susceptible(), SUSCEPTIBLE_COLOR),
        (trajectory.exposed(), EXPOSED_COLOR),
        (trajectory.infected(), INFECTED_COLOR),
        (trajectory.recovered(), RECOVERED_COLOR),
    ] {
        let points = times.iter().copied().zip(values[..index].iter().copied());
        chart.draw_series(LineSeries::new(
            points,
            color.mix(OPACITY).stroke_width(LINE_WIDTH),
        ))?;
    }
    Ok(())
}

fn draw_grid<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    grid: &PopulationGrid,
) -> Result<(), SeirError> {
    let area = area.margin(CHART_MARGIN, CHART_MARGIN, CHART_MARGIN, CHART_MARGIN);
    let cells = area.split_evenly((GRID_SIDE, GRID_SIDE));
    for (cell, state) in cells.iter().zip(grid.cells()) {
        cell.fill(&cell_color(*state).mix(OPACITY))?;
        let (width, height) = cell.dim_in_pixel();
        cell.draw(&Rectangle::new(
            [(0, 0), (width as i32 - 1, height as i32 - 1)],
            BLACK.stroke_width(CELL_BORDER_WIDTH),
        ))?;
    }
    Ok(())
}

/// Draws the composite frame into a `width` x `height` RGB image. The grid panel takes
/// `grid_width` pixels on the right.
pub(crate) fn draw(
    trajectory: &Trajectory,
    index: usize,
    grid: &PopulationGrid,
    (width, height): (u32, u32),
    grid_width: u32,
) -> Result<RgbImage, SeirError> {
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;
        let chart_width = width.saturating_sub(grid_width);
        let (chart_area, grid_area) = root.split_horizontally(chart_width as i32);
        draw_chart(&chart_area, trajectory, index)?;
        draw_grid(&grid_area, grid)?;
        root.present()?;
    }
    RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        SeirError::RenderError(format!("frame buffer does not match {width}x{height}"))
    })
}
