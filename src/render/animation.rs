//! Frame staging and GIF assembly.
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};

use crate::error::SeirError;
use crate::log::{debug, trace};
use crate::render::FrameWriteFailure;

/// The directory frames are written to before assembly.
///
/// Acquiring it deletes every file already in it, so stale frames from an earlier, longer run
/// never end up in the animation. The directory and its frames are left in place afterwards.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    /// Creates `path` if needed and removes the files in it.
    ///
    /// # Errors
    ///
    /// Returns `SeirError::IoError` if the directory cannot be created, listed or cleared.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, SeirError> {
        let path = path.into();
        fs::create_dir_all(&path)?;
        let mut removed = 0;
        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        debug!(
            "Cleared {} stale files from staging directory {}",
            removed,
            path.display()
        );
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Zero-padded so lexicographic order of the file names is numeric order.
    #[must_use]
    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.path.join(format!("{index:03}.png"))
    }

    /// Staged PNG files sorted by file name. Directories are never frames, even when their
    /// name ends in `.png`.
    ///
    /// # Errors
    ///
    /// Returns `SeirError::IoError` if the directory cannot be listed.
    pub fn staged_frames(&self) -> Result<Vec<PathBuf>, SeirError> {
        let mut frames = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().is_some_and(|extension| extension == "png") {
                frames.push(path);
            }
        }
        frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(frames)
    }
}

/// What a call to `render_animation` produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationReport {
    pub output: PathBuf,
    /// Frames that made it into the animation.
    pub frames: usize,
    /// Frames that were drawn but could not be written. They are missing from the animation.
    pub failed_frames: Vec<FrameWriteFailure>,
}

/// Assembles every staged frame into a looping GIF at `output`, showing each frame for
/// `frame_delay_ms` milliseconds. Returns the number of frames written.
///
/// # Errors
///
/// Returns `SeirError::EmptyAnimation` without touching `output` if nothing is staged, and
/// `SeirError::IoError` / `SeirError::ImageError` if a frame cannot be read or the GIF cannot be
/// written.
pub fn assemble_animation(
    staging: &StagingDir,
    output: &Path,
    frame_delay_ms: u32,
) -> Result<usize, SeirError> {
    let frames = staging.staged_frames()?;
    if frames.is_empty() {
        return Err(SeirError::EmptyAnimation(staging.path().to_path_buf()));
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut encoder = GifEncoder::new(File::create(output)?);
    encoder.set_repeat(Repeat::Infinite)?;
    let delay = Delay::from_numer_denom_ms(frame_delay_ms, 1);
    for path in &frames {
        trace!("Adding {} to {}", path.display(), output.display());
        let image = image::open(path)?.to_rgba8();
        encoder.encode_frame(Frame::from_parts(image, 0, 0, delay))?;
    }
    Ok(frames.len())
}
