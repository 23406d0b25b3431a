//! Scripted collaborators shared by the integration tests.
//!
//! `ScriptedSource` stands in for a decoder: it returns solid-colour frames
//! and fails on chosen read calls. `RecordingObserver` keeps everything the
//! sampler reports.

#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    ops::ControlFlow,
    path::{Path, PathBuf},
    rc::Rc,
};

use framesample::{
    FrameResult, ProgressInfo, SamplerError, SamplerObserver, SourceOpener, VideoMetadata,
    VideoSource,
};
use image::{DynamicImage, Rgb, RgbImage};
use log::Level;

/// Shared counters that outlive the source they observe.
#[derive(Debug, Default, Clone)]
pub struct SourceLog {
    pub opens: Rc<Cell<usize>>,
    pub released: Rc<Cell<usize>>,
    pub requested: Rc<RefCell<Vec<u64>>>,
}

/// What a scripted read call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadScript {
    Frame,
    Missing,
    Error,
}

pub struct ScriptedSource {
    metadata: VideoMetadata,
    /// 1-based read call number → scripted outcome. Unlisted calls succeed.
    script: Vec<(usize, ReadScript)>,
    reads: usize,
    log: SourceLog,
}

impl VideoSource for ScriptedSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn read_frame(&mut self, frame_index: u64) -> Result<Option<DynamicImage>, SamplerError> {
        self.reads += 1;
        self.log.requested.borrow_mut().push(frame_index);

        let outcome = self
            .script
            .iter()
            .find(|(call, _)| *call == self.reads)
            .map_or(ReadScript::Frame, |(_, outcome)| *outcome);

        match outcome {
            ReadScript::Frame => Ok(Some(solid_frame(
                self.metadata.width,
                self.metadata.height,
                frame_index,
            ))),
            ReadScript::Missing => Ok(None),
            ReadScript::Error => Err(SamplerError::Ffmpeg(format!(
                "scripted decode failure at frame {frame_index}"
            ))),
        }
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.log.released.set(self.log.released.get() + 1);
    }
}

/// Opens `ScriptedSource`s that all share one script and one log.
pub struct ScriptedOpener {
    pub metadata: VideoMetadata,
    pub script: Vec<(usize, ReadScript)>,
    pub fail_open: bool,
    pub log: SourceLog,
}

impl ScriptedOpener {
    pub fn new(metadata: VideoMetadata) -> Self {
        Self {
            metadata,
            script: Vec::new(),
            fail_open: false,
            log: SourceLog::default(),
        }
    }

    pub fn with_script(mut self, call: usize, outcome: ReadScript) -> Self {
        self.script.push((call, outcome));
        self
    }

    pub fn failing() -> Self {
        let mut opener = Self::new(VideoMetadata::new(0, 0, 0.0, 0));
        opener.fail_open = true;
        opener
    }

    pub fn source(&self) -> ScriptedSource {
        ScriptedSource {
            metadata: self.metadata.clone(),
            script: self.script.clone(),
            reads: 0,
            log: self.log.clone(),
        }
    }
}

impl SourceOpener for ScriptedOpener {
    type Source = ScriptedSource;

    fn open(&self, path: &Path) -> Result<ScriptedSource, SamplerError> {
        self.log.opens.set(self.log.opens.get() + 1);
        if self.fail_open {
            return Err(SamplerError::Open {
                path: path.to_path_buf(),
                reason: "scripted open failure".to_string(),
            });
        }
        Ok(self.source())
    }
}

/// A 100-frame, 25 fps, 64x48 source.
pub fn sample_metadata() -> VideoMetadata {
    VideoMetadata::new(64, 48, 25.0, 100).with_codec("scripted")
}

/// Frame whose red channel encodes the frame index.
pub fn solid_frame(width: u32, height: u32, frame_index: u64) -> DynamicImage {
    let shade = (frame_index % 256) as u8;
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([shade, 64, 128])))
}

#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub lines: Vec<(Level, String)>,
    pub progress: Vec<ProgressInfo>,
    /// Break out of `on_progress` once this many attempts are done.
    pub cancel_after: Option<u32>,
}

impl RecordingObserver {
    pub fn warnings(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|(level, _)| *level == Level::Warn)
            .map(|(_, line)| line.as_str())
            .collect()
    }

    pub fn results(&self) -> Vec<&FrameResult> {
        self.progress.iter().map(|info| &info.result).collect()
    }

    pub fn has_line(&self, needle: &str) -> bool {
        self.lines.iter().any(|(_, line)| line.contains(needle))
    }
}

impl SamplerObserver for RecordingObserver {
    fn on_log(&mut self, level: Level, line: &str) {
        self.lines.push((level, line.to_string()));
    }

    fn on_progress(&mut self, info: &ProgressInfo) -> ControlFlow<()> {
        self.progress.push(info.clone());
        match self.cancel_after {
            Some(limit) if info.done >= limit => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    }
}

/// Sorted file names directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to list directory")
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn output_dir(root: &Path) -> PathBuf {
    root.join("frames")
}
