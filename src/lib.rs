//! # framesample
//!
//! Sample a fixed number of evenly spaced still frames from a video, resize
//! them, and write them as a numbered image sequence.
//!
//! Given a video with `N` frames and a request for `K` frames, `framesample`
//! plans `K` indices spread linearly over `0..=N-1` (so the first and last
//! frames are always included), decodes each one with FFmpeg via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next), scales it with the
//! [`image`](https://crates.io/crates/image) crate, and writes
//! `frame_0001.png` … `frame_{K:04}.png`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use framesample::{ExportJob, FfmpegOpener, FrameSampler, LogObserver};
//!
//! let sampler = FrameSampler::default();
//! let job = ExportJob::new("input.mp4", "frames", 320, 180, 24);
//! let summary = sampler.run(&job, &FfmpegOpener, &mut LogObserver).unwrap();
//! assert_eq!(summary.attempted(), 24);
//! ```
//!
//! ## Behaviour
//!
//! - **Partial failure tolerance**: a frame that fails to decode, resize or
//!   write is logged and skipped; the run continues. Set
//!   [`SkipPolicy::Abort`] to fail instead.
//! - **Stable names**: sequence numbers follow plan positions, so a skipped
//!   frame leaves a gap rather than shifting later files.
//! - **Clean output**: regular files already in the output directory are
//!   removed first; subdirectories are kept.
//! - **Observer hooks**: log lines and per-frame progress go through
//!   [`SamplerObserver`]; breaking out of `on_progress` cancels the run.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod configuration;
pub mod error;
pub mod ffmpeg;
pub mod job;
pub mod metadata;
pub mod output;
pub mod plan;
pub mod progress;
pub mod sampler;
pub mod source;
mod utilities;
pub mod writer;

pub use configuration::{SamplerOptions, SkipPolicy};
pub use error::{SamplerError, SkipReason};
pub use ffmpeg::{FfmpegOpener, FfmpegSource, set_ffmpeg_log_level};
pub use job::ExportJob;
pub use metadata::VideoMetadata;
pub use output::{frame_file_name, frame_path, prepare_output};
pub use plan::{PlanRounding, SamplingPlan, build_plan};
pub use progress::{
    FnObserver, FrameResult, LogObserver, NoOpObserver, ProgressInfo, SamplerObserver,
    observer_fn,
};
pub use sampler::{ExportSummary, FrameSampler};
pub use source::{SourceOpener, VideoSource, inspect};
pub use writer::{FrameWriter, ImageFrameWriter};
