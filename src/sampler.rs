//! The frame sampling pipeline.
//!
//! [`FrameSampler`] ties the pieces together: it validates an
//! [`ExportJob`], opens and inspects the source, builds a
//! [`SamplingPlan`], clears the output directory and then reads, resizes and
//! writes one frame per plan entry.
//!
//! A frame that cannot be read, resized or written is logged and skipped;
//! its sequence number is still consumed, so output names always match plan
//! positions. The source is moved into [`FrameSampler::export`] and dropped
//! before it returns, on every path.
//!
//! # Example
//!
//! ```no_run
//! use framesample::{ExportJob, FfmpegOpener, FrameSampler, LogObserver, SamplerError};
//!
//! let sampler = FrameSampler::default();
//! let job = ExportJob::new("input.mp4", "frames", 640, 360, 50);
//! let summary = sampler.run(&job, &FfmpegOpener, &mut LogObserver)?;
//! println!("{} written, {} skipped", summary.written, summary.skipped);
//! # Ok::<(), SamplerError>(())
//! ```

use std::{
    ops::ControlFlow,
    path::{Path, PathBuf},
};

use log::Level;

use crate::{
    configuration::{SamplerOptions, SkipPolicy},
    error::{SamplerError, SkipReason},
    job::ExportJob,
    metadata::VideoMetadata,
    output::{frame_path, prepare_output},
    plan::{SamplingPlan, build_plan},
    progress::{FrameResult, ProgressTracker, SamplerObserver},
    source::{SourceOpener, VideoSource, inspect},
    writer::{FrameWriter, ImageFrameWriter},
};

/// Totals for one export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct ExportSummary {
    /// Frames written to disk.
    pub written: u32,
    /// Plan entries that produced no file.
    pub skipped: u32,
    /// Sequence numbers of the skipped entries, ascending.
    pub skipped_sequences: Vec<u32>,
    /// Directory the frames were written to.
    pub output_dir: PathBuf,
}

impl ExportSummary {
    /// Attempts made, written or skipped.
    pub fn attempted(&self) -> u32 {
        self.written + self.skipped
    }
}

/// Samples evenly spaced frames from a video into a numbered image sequence.
///
/// Generic over the [`FrameWriter`] so tests and embedders can replace the
/// image encoding; [`FrameSampler::new`] uses [`ImageFrameWriter`] set up
/// from the options.
#[derive(Debug, Clone)]
pub struct FrameSampler<W = ImageFrameWriter> {
    options: SamplerOptions,
    writer: W,
}

impl FrameSampler<ImageFrameWriter> {
    pub fn new(options: SamplerOptions) -> Self {
        let writer = ImageFrameWriter::new(options.image_format, options.filter);
        Self { options, writer }
    }
}

impl Default for FrameSampler<ImageFrameWriter> {
    fn default() -> Self {
        Self::new(SamplerOptions::default())
    }
}

impl<W: FrameWriter> FrameSampler<W> {
    /// Use a custom writer. The options still decide the file extension,
    /// plan rounding and skip policy.
    pub fn with_writer(options: SamplerOptions, writer: W) -> Self {
        Self { options, writer }
    }

    pub fn options(&self) -> &SamplerOptions {
        &self.options
    }

    /// Open `path` and make sure it has frames.
    ///
    /// # Errors
    ///
    /// [`SamplerError::Open`] or [`SamplerError::EmptyVideo`].
    pub fn inspect<O: SourceOpener>(
        &self,
        opener: &O,
        path: &Path,
    ) -> Result<(O::Source, VideoMetadata), SamplerError> {
        inspect(opener, path)
    }

    /// Plan `frame_count` evenly spaced indices with the configured rounding.
    ///
    /// # Errors
    ///
    /// [`SamplerError::InvalidJob`] when either count is zero.
    pub fn build_plan(
        &self,
        total_frames: u64,
        frame_count: u32,
    ) -> Result<SamplingPlan, SamplerError> {
        build_plan(total_frames, frame_count, self.options.rounding)
    }

    /// Create `output_dir` or remove the files already in it.
    ///
    /// # Errors
    ///
    /// [`SamplerError::Io`] when the directory cannot be created or listed.
    pub fn prepare_output(&self, output_dir: &Path) -> Result<usize, SamplerError> {
        Ok(prepare_output(output_dir)?)
    }

    /// Run the whole pipeline for `job`.
    ///
    /// Nothing is opened or created until the job has been validated.
    ///
    /// # Errors
    ///
    /// - [`SamplerError::InvalidJob`] before any I/O.
    /// - [`SamplerError::Open`] / [`SamplerError::EmptyVideo`] from the source.
    /// - [`SamplerError::Io`] when the output directory cannot be prepared.
    /// - Anything [`export`](FrameSampler::export) returns.
    pub fn run<O, B>(
        &self,
        job: &ExportJob,
        opener: &O,
        observer: &mut B,
    ) -> Result<ExportSummary, SamplerError>
    where
        O: SourceOpener,
        B: SamplerObserver + ?Sized,
    {
        job.validate()?;

        let (source, metadata) = self.inspect(opener, &job.source)?;
        log_video_info(observer, &metadata);

        let plan = self.build_plan(metadata.total_frames, job.frame_count)?;

        self.prepare_output(&job.output_dir)?;
        observer.on_log(
            Level::Info,
            &format!("Cleared output directory {}", job.output_dir.display()),
        );

        self.export(job, source, &plan, observer)
    }

    /// Read, resize and write every plan entry in order.
    ///
    /// The observer gets a log line for each written file or skip and one
    /// progress report per attempt. `source` is dropped before this returns.
    ///
    /// # Errors
    ///
    /// - [`SamplerError::InvalidJob`] if `job` does not validate.
    /// - [`SamplerError::FrameSkipped`] on the first failed frame under
    ///   [`SkipPolicy::Abort`].
    /// - [`SamplerError::Cancelled`] when the observer breaks out of
    ///   [`on_progress`](SamplerObserver::on_progress).
    pub fn export<S, B>(
        &self,
        job: &ExportJob,
        mut source: S,
        plan: &SamplingPlan,
        observer: &mut B,
    ) -> Result<ExportSummary, SamplerError>
    where
        S: VideoSource,
        B: SamplerObserver + ?Sized,
    {
        job.validate()?;
        let outcome = self.export_frames(job, &mut source, plan, observer);
        drop(source);

        if let Ok(summary) = &outcome {
            observer.on_log(
                Level::Info,
                &format!(
                    "Export complete: {} written, {} skipped",
                    summary.written, summary.skipped
                ),
            );
        }
        outcome
    }

    fn export_frames<S, B>(
        &self,
        job: &ExportJob,
        source: &mut S,
        plan: &SamplingPlan,
        observer: &mut B,
    ) -> Result<ExportSummary, SamplerError>
    where
        S: VideoSource,
        B: SamplerObserver + ?Sized,
    {
        let extension = self.options.extension();
        let total = u32::try_from(plan.len()).unwrap_or(u32::MAX);
        let mut tracker = ProgressTracker::new(total);
        let mut summary = ExportSummary {
            output_dir: job.output_dir.clone(),
            ..ExportSummary::default()
        };

        for (sequence, frame_index) in plan.sequenced() {
            let result = self.attempt(job, source, sequence, frame_index, extension);

            let mut failure = None;
            match &result {
                FrameResult::Written { path, .. } => {
                    summary.written += 1;
                    observer.on_log(Level::Info, &format!("Saved {}", path.display()));
                }
                FrameResult::Skipped { reason, .. } => {
                    summary.skipped += 1;
                    summary.skipped_sequences.push(sequence);
                    let action = if matches!(reason, SkipReason::Write(_)) {
                        "write"
                    } else {
                        "read"
                    };
                    observer.on_log(
                        Level::Warn,
                        &format!("Failed to {action} frame {frame_index}: {reason}"),
                    );
                    if self.options.skip_policy == SkipPolicy::Abort {
                        failure = Some(reason.clone());
                    }
                }
            }

            let info = tracker.advance(result);
            let flow = observer.on_progress(&info);

            if let Some(reason) = failure {
                return Err(SamplerError::FrameSkipped {
                    sequence,
                    frame_index,
                    reason,
                });
            }
            if let ControlFlow::Break(()) = flow {
                observer.on_log(
                    Level::Warn,
                    &format!("Export cancelled after {} of {total} frames", info.done),
                );
                return Err(SamplerError::Cancelled);
            }
        }

        Ok(summary)
    }

    /// One plan entry: read, resize, write.
    fn attempt<S: VideoSource>(
        &self,
        job: &ExportJob,
        source: &mut S,
        sequence: u32,
        frame_index: u64,
        extension: &str,
    ) -> FrameResult {
        let skip = |reason| FrameResult::Skipped {
            sequence,
            frame_index,
            reason,
        };

        let frame = match source.read_frame(frame_index) {
            Ok(Some(frame)) => frame,
            Ok(None) => return skip(SkipReason::EmptyFrame),
            Err(error) => return skip(SkipReason::Decode(error.to_string())),
        };

        let resized = match self.writer.resize(frame, job.width, job.height) {
            Ok(resized) => resized,
            Err(error) => return skip(SkipReason::Resize(error.to_string())),
        };

        let path = frame_path(&job.output_dir, sequence, extension);
        match self.writer.write(&resized, &path) {
            Ok(()) => FrameResult::Written {
                sequence,
                frame_index,
                path,
            },
            Err(error) => skip(SkipReason::Write(error.to_string())),
        }
    }
}

fn log_video_info<B: SamplerObserver + ?Sized>(observer: &mut B, metadata: &VideoMetadata) {
    let lines = [
        "Video info:".to_string(),
        format!("  Original size: {}x{}", metadata.width, metadata.height),
        format!("  Total frames: {}", metadata.total_frames),
        format!("  FPS: {:.2}", metadata.frames_per_second),
        format!("  Duration: {:.2} seconds", metadata.duration_seconds()),
    ];
    for line in &lines {
        observer.on_log(Level::Info, line);
    }
}
