//! Error types for the `framesample` crate.
//!
//! [`SamplerError`] is returned by every fallible operation. Fatal variants
//! abort a run; per-frame failures are normally reported as
//! [`SkipReason`] values through the observer and only surface here as
//! [`SamplerError::FrameSkipped`] when the strict skip policy is active.

use std::{fmt, io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framesample` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SamplerError {
    /// The source could not be opened (missing file, unsupported codec,
    /// corrupt header, no video stream).
    #[error("Failed to open video at {path}: {reason}")]
    Open {
        /// Path that was passed to the opener.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The source opened but reports no decodable frames.
    #[error("Video at {path} contains no frames")]
    EmptyVideo {
        /// Path of the empty source.
        path: PathBuf,
    },

    /// A job parameter was rejected before any I/O took place.
    #[error("Invalid export job: {field} {reason}")]
    InvalidJob {
        /// Name of the offending parameter.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A frame could not be produced and the skip policy forbids skipping.
    #[error("Frame {sequence} (source index {frame_index}) failed: {reason}")]
    FrameSkipped {
        /// 1-based position within the plan.
        sequence: u32,
        /// Source frame index that was requested.
        frame_index: u64,
        /// What went wrong.
        reason: SkipReason,
    },

    /// The observer asked the export to stop.
    #[error("Export cancelled")]
    Cancelled,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An I/O error while preparing or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),
}

impl From<FfmpegError> for SamplerError {
    fn from(error: FfmpegError) -> Self {
        SamplerError::Ffmpeg(error.to_string())
    }
}

/// Why a single plan entry produced no output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Seeking or decoding raised an error.
    Decode(String),
    /// The decoder ran out of data before reaching the requested frame.
    EmptyFrame,
    /// Resizing the decoded frame failed.
    Resize(String),
    /// Encoding or writing the image file failed.
    Write(String),
}

impl SkipReason {
    /// Whether this skip happened while reading from the source.
    pub fn is_read_failure(&self) -> bool {
        matches!(self, SkipReason::Decode(_) | SkipReason::EmptyFrame)
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Decode(message) => write!(f, "decode failed: {message}"),
            SkipReason::EmptyFrame => f.write_str("no frame returned"),
            SkipReason::Resize(message) => write!(f, "resize failed: {message}"),
            SkipReason::Write(message) => write!(f, "write failed: {message}"),
        }
    }
}
