//! Decoder contract.
//!
//! The sampler reads frames through [`VideoSource`] and opens sources
//! through [`SourceOpener`], so the export logic does not depend on FFmpeg.
//! [`FfmpegOpener`](crate::FfmpegOpener) is the production implementation;
//! tests plug in scripted sources.
//!
//! A source is released when it is dropped.

use std::path::Path;

use image::DynamicImage;

use crate::{error::SamplerError, metadata::VideoMetadata};

/// An opened video that can be read frame by frame.
pub trait VideoSource {
    /// Snapshot of the stream properties, taken when the source was opened.
    fn metadata(&self) -> &VideoMetadata;

    /// Seek to `frame_index` and decode that frame.
    ///
    /// Returns `Ok(None)` when the decoder produces no frame for the index.
    ///
    /// # Errors
    ///
    /// Any seek or decode failure. The sampler treats errors and `None`
    /// alike as a skipped frame.
    fn read_frame(&mut self, frame_index: u64) -> Result<Option<DynamicImage>, SamplerError>;
}

/// Opens [`VideoSource`]s by path.
pub trait SourceOpener {
    type Source: VideoSource;

    /// # Errors
    ///
    /// [`SamplerError::Open`] when the path cannot be opened as a video.
    fn open(&self, path: &Path) -> Result<Self::Source, SamplerError>;
}

/// Open `path` and check that it has frames to sample.
///
/// On success the open source is handed back together with a copy of its
/// metadata.
///
/// # Errors
///
/// - [`SamplerError::Open`] from the opener.
/// - [`SamplerError::EmptyVideo`] when the source reports zero frames; the
///   source is released before returning.
pub fn inspect<O: SourceOpener>(
    opener: &O,
    path: &Path,
) -> Result<(O::Source, VideoMetadata), SamplerError> {
    let source = opener.open(path)?;
    let metadata = source.metadata().clone();

    log::debug!(
        "Inspected {}: {}x{}, {} frames at {:.2} fps",
        path.display(),
        metadata.width,
        metadata.height,
        metadata.total_frames,
        metadata.frames_per_second,
    );

    if !metadata.has_frames() {
        drop(source);
        return Err(SamplerError::EmptyVideo {
            path: path.to_path_buf(),
        });
    }

    Ok((source, metadata))
}
