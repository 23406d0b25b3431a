//! Export job parameters.

use std::path::{Path, PathBuf};

use crate::error::SamplerError;

/// Everything needed to sample one video into one output directory.
///
/// Construct with [`ExportJob::new`] and check with
/// [`validate`](ExportJob::validate) before touching the filesystem or the
/// decoder. [`FrameSampler::run`](crate::FrameSampler::run) validates for
/// you.
///
/// # Example
///
/// ```
/// use framesample::ExportJob;
///
/// let job = ExportJob::new("input.mp4", "frames", 640, 360, 50);
/// assert!(job.validate().is_ok());
///
/// let bad = ExportJob::new("input.mp4", "frames", 0, 360, 50);
/// assert!(bad.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    /// Video to sample.
    pub source: PathBuf,
    /// Directory that receives the numbered frames.
    pub output_dir: PathBuf,
    /// Output frame width in pixels.
    pub width: u32,
    /// Output frame height in pixels.
    pub height: u32,
    /// How many frames to sample.
    pub frame_count: u32,
}

impl ExportJob {
    pub fn new<S: AsRef<Path>, O: AsRef<Path>>(
        source: S,
        output_dir: O,
        width: u32,
        height: u32,
        frame_count: u32,
    ) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            width,
            height,
            frame_count,
        }
    }

    /// Reject empty paths and zero dimensions or counts.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::InvalidJob`] naming the first bad field.
    pub fn validate(&self) -> Result<(), SamplerError> {
        if self.source.as_os_str().is_empty() {
            return Err(invalid("source", "must not be empty"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(invalid("output_dir", "must not be empty"));
        }
        if self.width == 0 {
            return Err(invalid("width", "must be greater than zero"));
        }
        if self.height == 0 {
            return Err(invalid("height", "must be greater than zero"));
        }
        if self.frame_count == 0 {
            return Err(invalid("frame_count", "must be greater than zero"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> SamplerError {
    SamplerError::InvalidJob {
        field,
        reason: reason.to_string(),
    }
}
