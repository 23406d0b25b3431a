//! Sampler configuration.
//!
//! [`SamplerOptions`] is a builder for the knobs that shape a run without
//! being part of the job itself: what to do when a frame fails, which image
//! format to write, how to resize, and how plan indices are rounded.
//!
//! # Example
//!
//! ```
//! use framesample::{PlanRounding, SamplerOptions, SkipPolicy};
//! use image::{ImageFormat, imageops::FilterType};
//!
//! let options = SamplerOptions::new()
//!     .with_image_format(ImageFormat::Jpeg)
//!     .with_filter(FilterType::Lanczos3)
//!     .with_rounding(PlanRounding::Floor)
//!     .with_skip_policy(SkipPolicy::Abort);
//! assert_eq!(options.extension(), "jpg");
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};

use image::{ImageFormat, imageops::FilterType};

use crate::plan::PlanRounding;

/// What the export loop does when a frame cannot be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkipPolicy {
    /// Log a warning, count the skip and move on. This is the default.
    #[default]
    Continue,
    /// Stop at the first failed frame with
    /// [`SamplerError::FrameSkipped`](crate::SamplerError::FrameSkipped).
    Abort,
}

/// Operational settings for [`FrameSampler`](crate::FrameSampler).
///
/// Defaults: PNG output, triangle (bilinear) filtering, round-to-nearest
/// plan, tolerate per-frame failures.
#[derive(Clone)]
pub struct SamplerOptions {
    pub(crate) skip_policy: SkipPolicy,
    pub(crate) image_format: ImageFormat,
    pub(crate) filter: FilterType,
    pub(crate) rounding: PlanRounding,
}

impl Debug for SamplerOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SamplerOptions")
            .field("skip_policy", &self.skip_policy)
            .field("extension", &self.extension())
            .field("filter", &self.filter)
            .field("rounding", &self.rounding)
            .finish()
    }
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplerOptions {
    pub fn new() -> Self {
        Self {
            skip_policy: SkipPolicy::Continue,
            image_format: ImageFormat::Png,
            filter: FilterType::Triangle,
            rounding: PlanRounding::Nearest,
        }
    }

    #[must_use]
    pub fn with_skip_policy(mut self, policy: SkipPolicy) -> Self {
        self.skip_policy = policy;
        self
    }

    /// Set the format every frame of the run is written in.
    #[must_use]
    pub fn with_image_format(mut self, format: ImageFormat) -> Self {
        self.image_format = format;
        self
    }

    /// Set the resampling filter used when resizing frames.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_rounding(mut self, rounding: PlanRounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn skip_policy(&self) -> SkipPolicy {
        self.skip_policy
    }

    pub fn image_format(&self) -> ImageFormat {
        self.image_format
    }

    pub fn filter(&self) -> FilterType {
        self.filter
    }

    pub fn rounding(&self) -> PlanRounding {
        self.rounding
    }

    /// File extension used for output frames, without the leading dot.
    pub fn extension(&self) -> &'static str {
        self.image_format
            .extensions_str()
            .first()
            .copied()
            .unwrap_or("img")
    }
}
