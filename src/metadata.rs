//! Video metadata snapshot.
//!
//! [`VideoMetadata`] is read once when a source is opened and never changes
//! afterwards. Any property the decoder cannot report is stored as zero.

use std::time::Duration;

/// Properties of the video stream being sampled.
///
/// # Example
///
/// ```
/// use framesample::VideoMetadata;
///
/// let metadata = VideoMetadata::new(1920, 1080, 25.0, 250);
/// assert_eq!(metadata.duration_seconds(), 10.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second, `0.0` when unknown.
    pub frames_per_second: f64,
    /// Number of frames the source reports.
    pub total_frames: u64,
    /// Codec name (e.g. `"h264"`), `"unknown"` when unavailable.
    pub codec: String,
}

impl VideoMetadata {
    /// Build a snapshot with an unknown codec.
    ///
    /// Negative or non-finite frame rates are stored as `0.0`.
    pub fn new(width: u32, height: u32, frames_per_second: f64, total_frames: u64) -> Self {
        let frames_per_second = if frames_per_second.is_finite() && frames_per_second > 0.0 {
            frames_per_second
        } else {
            0.0
        };
        Self {
            width,
            height,
            frames_per_second,
            total_frames,
            codec: "unknown".to_string(),
        }
    }

    /// Attach a codec name.
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = codec.into();
        self
    }

    /// Duration derived from the frame count and rate; zero when the rate is
    /// unknown.
    pub fn duration_seconds(&self) -> f64 {
        if self.frames_per_second > 0.0 {
            self.total_frames as f64 / self.frames_per_second
        } else {
            0.0
        }
    }

    /// [`duration_seconds`](VideoMetadata::duration_seconds) as a [`Duration`].
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_seconds())
    }

    /// Whether the source has at least one frame to sample.
    pub fn has_frames(&self) -> bool {
        self.total_frames > 0
    }
}
