//! Image resizing and encoding.
//!
//! [`FrameWriter`] is the image side of the export: it scales a decoded
//! frame to the target size and writes it to disk. [`ImageFrameWriter`]
//! does both with the `image` crate.

use std::path::Path;

use image::{
    DynamicImage, ImageError, ImageFormat,
    error::{ParameterError, ParameterErrorKind},
    imageops::FilterType,
};

use crate::error::SamplerError;

/// Resizes and writes frames.
pub trait FrameWriter {
    /// Scale `frame` to exactly `width` × `height`.
    ///
    /// # Errors
    ///
    /// Any failure; the sampler records it as a skipped frame.
    fn resize(
        &self,
        frame: DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, SamplerError>;

    /// Encode `frame` to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Any failure; the sampler records it as a skipped frame.
    fn write(&self, frame: &DynamicImage, path: &Path) -> Result<(), SamplerError>;
}

/// [`FrameWriter`] backed by the `image` crate.
///
/// Resizing ignores the source aspect ratio, matching the requested
/// dimensions exactly.
#[derive(Debug, Clone, Copy)]
pub struct ImageFrameWriter {
    format: ImageFormat,
    filter: FilterType,
}

impl ImageFrameWriter {
    pub fn new(format: ImageFormat, filter: FilterType) -> Self {
        Self { format, filter }
    }
}

impl Default for ImageFrameWriter {
    fn default() -> Self {
        Self::new(ImageFormat::Png, FilterType::Triangle)
    }
}

impl FrameWriter for ImageFrameWriter {
    fn resize(
        &self,
        frame: DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, SamplerError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(SamplerError::Image(ImageError::Parameter(
                ParameterError::from_kind(ParameterErrorKind::DimensionMismatch),
            )));
        }
        if frame.width() == width && frame.height() == height {
            return Ok(frame);
        }
        Ok(frame.resize_exact(width, height, self.filter))
    }

    fn write(&self, frame: &DynamicImage, path: &Path) -> Result<(), SamplerError> {
        // JPEG has no alpha channel.
        if self.format == ImageFormat::Jpeg && frame.color().has_alpha() {
            DynamicImage::ImageRgb8(frame.to_rgb8()).save_with_format(path, self.format)?;
        } else {
            frame.save_with_format(path, self.format)?;
        }
        Ok(())
    }
}
