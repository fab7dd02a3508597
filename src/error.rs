use std::fmt::{self, Debug, Display};
use std::io;
use std::path::PathBuf;

use plotters::drawing::DrawingAreaErrorKind;

use crate::render::FrameWriteFailure;

/// Provides `SeirError` and maps to other errors to
/// convert to a `SeirError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SeirError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    ImageError(image::ImageError),
    RenderError(String),
    ReportError(String),
    /// A degenerate configuration detected before integration.
    InvalidParameter(String),
    /// The integrator could not advance past `time`.
    IntegrationFailure {
        time: f64,
        reason: String,
    },
    /// A single frame could not be written. Recovered inside the animation loop.
    FrameWriteFailure(FrameWriteFailure),
    /// The staging directory held no frames to assemble.
    EmptyAnimation(PathBuf),
}

impl From<io::Error> for SeirError {
    fn from(error: io::Error) -> Self {
        SeirError::IoError(error)
    }
}

impl From<serde_json::Error> for SeirError {
    fn from(error: serde_json::Error) -> Self {
        SeirError::JsonError(error)
    }
}

impl From<csv::Error> for SeirError {
    fn from(error: csv::Error) -> Self {
        SeirError::CSVError(error)
    }
}

impl From<image::ImageError> for SeirError {
    fn from(error: image::ImageError) -> Self {
        SeirError::ImageError(error)
    }
}

impl From<FrameWriteFailure> for SeirError {
    fn from(failure: FrameWriteFailure) -> Self {
        SeirError::FrameWriteFailure(failure)
    }
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for SeirError {
    fn from(error: DrawingAreaErrorKind<E>) -> Self {
        SeirError::RenderError(error.to_string())
    }
}

impl std::error::Error for SeirError {}

impl Display for SeirError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SeirError::InvalidParameter(message) => write!(f, "Invalid parameter: {message}"),
            SeirError::IntegrationFailure { time, reason } => {
                write!(f, "Integration failed at t = {time}: {reason}")
            }
            SeirError::FrameWriteFailure(failure) => write!(
                f,
                "Failed to write frame {} to {}: {}",
                failure.index,
                failure.path.display(),
                failure.reason
            ),
            SeirError::EmptyAnimation(dir) => {
                write!(f, "No frames to assemble in {}", dir.display())
            }
            _ => write!(f, "Error: {self:?}"),
        }
    }
}
