//! Log and progress reporting.
//!
//! The sampler never prints anything itself. Every log line and every
//! per-frame progress update goes through a [`SamplerObserver`], which lets
//! the embedding application decide how to present them. The progress hook
//! is also the cancellation point: returning [`ControlFlow::Break`] stops
//! the export before the next frame.
//!
//! # Example
//!
//! ```
//! use std::ops::ControlFlow;
//!
//! use framesample::{ProgressInfo, SamplerObserver};
//! use log::Level;
//!
//! struct PrintProgress;
//!
//! impl SamplerObserver for PrintProgress {
//!     fn on_log(&mut self, _level: Level, line: &str) {
//!         println!("{line}");
//!     }
//!
//!     fn on_progress(&mut self, info: &ProgressInfo) -> ControlFlow<()> {
//!         println!("{}/{} ({:.1}%)", info.done, info.total, info.percentage);
//!         ControlFlow::Continue(())
//!     }
//! }
//! ```

use std::{
    ops::ControlFlow,
    path::PathBuf,
    time::{Duration, Instant},
};

use log::Level;

use crate::error::SkipReason;

/// Outcome of one attempt in the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameResult {
    /// The frame was decoded, resized and written.
    Written {
        sequence: u32,
        frame_index: u64,
        path: PathBuf,
    },
    /// No file was produced for this sequence number.
    Skipped {
        sequence: u32,
        frame_index: u64,
        reason: SkipReason,
    },
}

impl FrameResult {
    /// 1-based position within the plan.
    pub fn sequence(&self) -> u32 {
        match self {
            FrameResult::Written { sequence, .. } | FrameResult::Skipped { sequence, .. } => {
                *sequence
            }
        }
    }

    /// Source frame index that was requested.
    pub fn frame_index(&self) -> u64 {
        match self {
            FrameResult::Written { frame_index, .. }
            | FrameResult::Skipped { frame_index, .. } => *frame_index,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, FrameResult::Written { .. })
    }
}

/// A snapshot taken after each attempt, written or skipped.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Attempts finished so far, including skips.
    pub done: u32,
    /// Attempts in the plan.
    pub total: u32,
    /// Completion percentage (0.0 – 100.0).
    pub percentage: f32,
    /// Wall-clock time since the export loop started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on throughput so far.
    pub estimated_remaining: Option<Duration>,
    /// What happened to the attempt that triggered this report.
    pub result: FrameResult,
}

impl ProgressInfo {
    /// Progress as a fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            f64::from(self.done) / f64::from(self.total)
        }
    }
}

/// Receives log lines and progress from a running export.
///
/// Both hooks are called on the thread that runs the export, in order.
pub trait SamplerObserver {
    /// A human-readable log line.
    fn on_log(&mut self, level: Level, line: &str);

    /// Called once after every attempt. Return [`ControlFlow::Break`] to
    /// cancel the export.
    fn on_progress(&mut self, info: &ProgressInfo) -> ControlFlow<()> {
        let _ = info;
        ControlFlow::Continue(())
    }
}

impl<T: SamplerObserver + ?Sized> SamplerObserver for &mut T {
    fn on_log(&mut self, level: Level, line: &str) {
        (**self).on_log(level, line);
    }

    fn on_progress(&mut self, info: &ProgressInfo) -> ControlFlow<()> {
        (**self).on_progress(info)
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpObserver;

impl SamplerObserver for NoOpObserver {
    fn on_log(&mut self, _level: Level, _line: &str) {}
}

/// Forwards log lines to the [`log`] facade and progress to `log::debug!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SamplerObserver for LogObserver {
    fn on_log(&mut self, level: Level, line: &str) {
        log::log!(level, "{line}");
    }

    fn on_progress(&mut self, info: &ProgressInfo) -> ControlFlow<()> {
        log::debug!("progress {}/{}", info.done, info.total);
        ControlFlow::Continue(())
    }
}

/// Observer built from two closures. See [`observer_fn`].
pub struct FnObserver<L, P> {
    on_log: L,
    on_progress: P,
}

/// Build an observer from a log closure and a progress closure.
///
/// ```
/// use std::ops::ControlFlow;
///
/// let mut lines = Vec::new();
/// let observer = framesample::observer_fn(
///     |_level, line: &str| lines.push(line.to_string()),
///     |_info| ControlFlow::Continue(()),
/// );
/// # drop(observer);
/// ```
pub fn observer_fn<L, P>(on_log: L, on_progress: P) -> FnObserver<L, P>
where
    L: FnMut(Level, &str),
    P: FnMut(&ProgressInfo) -> ControlFlow<()>,
{
    FnObserver {
        on_log,
        on_progress,
    }
}

impl<L, P> SamplerObserver for FnObserver<L, P>
where
    L: FnMut(Level, &str),
    P: FnMut(&ProgressInfo) -> ControlFlow<()>,
{
    fn on_log(&mut self, level: Level, line: &str) {
        (self.on_log)(level, line);
    }

    fn on_progress(&mut self, info: &ProgressInfo) -> ControlFlow<()> {
        (self.on_progress)(info)
    }
}

/// Counts attempts and timing for one export loop.
pub(crate) struct ProgressTracker {
    total: u32,
    done: u32,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(total: u32) -> Self {
        Self {
            total,
            done: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one finished attempt and build the snapshot to report.
    pub(crate) fn advance(&mut self, result: FrameResult) -> ProgressInfo {
        self.done += 1;
        let elapsed = self.start_time.elapsed();

        let percentage = if self.total > 0 {
            (self.done as f32 / self.total as f32) * 100.0
        } else {
            100.0
        };

        let remaining = self.total.saturating_sub(self.done);
        let estimated_remaining = (self.done > 0).then(|| (elapsed / self.done) * remaining);

        ProgressInfo {
            done: self.done,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            result,
        }
    }
}
