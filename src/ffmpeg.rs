//! FFmpeg-backed video source.
//!
//! [`FfmpegSource`] implements [`VideoSource`] on top of
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next). Each read seeks to
//! the nearest keyframe at or before the requested frame and decodes forward
//! until it reaches it.
//!
//! FFmpeg also prints its own diagnostics to stderr. Use
//! [`set_ffmpeg_log_level`] to keep them in step with the `log` filter.

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::log::Level as FfmpegLevel,
};
use image::{DynamicImage, RgbImage};
use log::LevelFilter;

use crate::{
    error::SamplerError,
    metadata::VideoMetadata,
    source::{SourceOpener, VideoSource},
    utilities,
};

/// FFmpeg's `AV_NOPTS_VALUE`.
const NO_TIMESTAMP: i64 = i64::MIN;

/// Match FFmpeg's own console verbosity to a `log` level filter.
pub fn set_ffmpeg_log_level(filter: LevelFilter) {
    let level = match filter {
        LevelFilter::Off => FfmpegLevel::Quiet,
        LevelFilter::Error => FfmpegLevel::Error,
        LevelFilter::Warn => FfmpegLevel::Warning,
        LevelFilter::Info => FfmpegLevel::Info,
        LevelFilter::Debug => FfmpegLevel::Verbose,
        LevelFilter::Trace => FfmpegLevel::Debug,
    };
    ffmpeg_next::util::log::set_level(level);
}

/// Opens [`FfmpegSource`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegOpener;

impl SourceOpener for FfmpegOpener {
    type Source = FfmpegSource;

    fn open(&self, path: &Path) -> Result<FfmpegSource, SamplerError> {
        FfmpegSource::open(path)
    }
}

/// Maps decoded frames back to frame indices.
#[derive(Debug, Clone, Copy)]
struct FrameClock {
    frames_per_second: f64,
    time_base: Rational,
    start_pts: i64,
}

impl FrameClock {
    /// Frame index of a decoded frame. Without a usable frame rate the
    /// decode ordinal since the last seek is used instead.
    fn position_of(&self, frame: &VideoFrame, ordinal: u64) -> Option<u64> {
        if self.frames_per_second <= 0.0 {
            return Some(ordinal);
        }
        frame.timestamp().or(frame.pts()).map(|pts| {
            utilities::pts_to_frame_index(
                pts - self.start_pts,
                self.time_base,
                self.frames_per_second,
            )
        })
    }
}

/// An open video file and its best video stream.
///
/// The demuxer is released when the source is dropped.
pub struct FfmpegSource {
    input: Input,
    stream_index: usize,
    clock: FrameClock,
    metadata: VideoMetadata,
    path: PathBuf,
}

impl FfmpegSource {
    /// Open `path` and read the video stream's metadata.
    ///
    /// Properties FFmpeg cannot report are stored as zero. The frame count
    /// is the stream's declared count when present, otherwise the container
    /// duration times the frame rate.
    ///
    /// # Errors
    ///
    /// [`SamplerError::Open`] if the file cannot be opened, has no video
    /// stream, or its codec cannot be set up.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SamplerError> {
        let path = path.as_ref();
        let open_error = |reason: String| SamplerError::Open {
            path: path.to_path_buf(),
            reason,
        };

        log::debug!("Opening video: {}", path.display());

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;
        let container_seconds = utilities::container_duration_seconds(input.duration());

        let (stream_index, time_base, start_pts, metadata) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or_else(|| open_error("no video stream found".to_string()))?;

            let decoder = CodecContext::from_parameters(stream.parameters())
                .and_then(|context| context.decoder().video())
                .map_err(|error| open_error(format!("cannot set up video decoder: {error}")))?;

            let time_base = stream.time_base();
            let frames_per_second = utilities::rational_to_f64(stream.avg_frame_rate())
                .or_else(|| utilities::rational_to_f64(stream.rate()))
                .unwrap_or(0.0);

            let duration_seconds = if container_seconds > 0.0 {
                container_seconds
            } else if stream.duration() > 0 && time_base.denominator() != 0 {
                utilities::pts_to_seconds(stream.duration(), time_base)
            } else {
                0.0
            };

            let declared_frames = stream.frames();
            let total_frames = if declared_frames > 0 {
                declared_frames as u64
            } else if frames_per_second > 0.0 {
                (duration_seconds * frames_per_second) as u64
            } else {
                0
            };

            let codec = decoder
                .codec()
                .map(|codec| codec.name().to_string())
                .unwrap_or_else(|| "unknown".to_string());

            let start_pts = match stream.start_time() {
                NO_TIMESTAMP => 0,
                start => start,
            };

            let metadata =
                VideoMetadata::new(decoder.width(), decoder.height(), frames_per_second, total_frames)
                    .with_codec(codec);

            (stream.index(), time_base, start_pts, metadata)
        };

        let clock = FrameClock {
            frames_per_second: metadata.frames_per_second,
            time_base,
            start_pts,
        };

        Ok(Self {
            input,
            stream_index,
            clock,
            metadata,
            path: path.to_path_buf(),
        })
    }

    /// Path this source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VideoSource for FfmpegSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn read_frame(&mut self, frame_index: u64) -> Result<Option<DynamicImage>, SamplerError> {
        let stream = self
            .input
            .stream(self.stream_index)
            .ok_or_else(|| SamplerError::Ffmpeg("video stream is no longer available".to_string()))?;
        let mut decoder = CodecContext::from_parameters(stream.parameters())?
            .decoder()
            .video()?;

        let seek_timestamp =
            utilities::frame_index_to_seek_timestamp(frame_index, self.metadata.frames_per_second);
        log::trace!("Seeking to frame {frame_index} (ts {seek_timestamp})");
        self.input.seek(seek_timestamp, ..seek_timestamp)?;

        let stream_index = self.stream_index;
        let clock = self.clock;
        let mut decoded = VideoFrame::empty();
        let mut ordinal = 0_u64;
        let mut located = None;

        'packets: for (stream, packet) in self.input.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;

            while decoder.receive_frame(&mut decoded).is_ok() {
                let position = clock.position_of(&decoded, ordinal);
                ordinal += 1;
                // A frame without a timestamp after a seek is taken as the target.
                if position.is_none_or(|position| position >= frame_index) {
                    located = Some(frame_to_image(&decoded)?);
                    break 'packets;
                }
            }
        }

        if located.is_none() {
            decoder.send_eof()?;
            while decoder.receive_frame(&mut decoded).is_ok() {
                let position = clock.position_of(&decoded, ordinal);
                ordinal += 1;
                if position.is_none_or(|position| position >= frame_index) {
                    located = Some(frame_to_image(&decoded)?);
                    break;
                }
            }
        }

        Ok(located)
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        log::debug!("Releasing video: {}", self.path.display());
    }
}

/// Convert a decoded frame of any pixel format to an RGB image at its own size.
fn frame_to_image(decoded: &VideoFrame) -> Result<DynamicImage, SamplerError> {
    let width = decoded.width();
    let height = decoded.height();

    let mut scaler = ScalingContext::get(
        decoded.format(),
        width,
        height,
        Pixel::RGB24,
        width,
        height,
        ScalingFlags::BILINEAR,
    )?;
    let mut rgb_frame = VideoFrame::empty();
    scaler.run(decoded, &mut rgb_frame)?;

    let pixels = packed_rgb_rows(rgb_frame.data(0), rgb_frame.stride(0), width, height);
    let image = RgbImage::from_raw(width, height, pixels).ok_or_else(|| {
        SamplerError::Ffmpeg("decoded frame does not match its reported size".to_string())
    })?;
    Ok(DynamicImage::ImageRgb8(image))
}

/// Drop the per-row padding FFmpeg adds past `width * 3` bytes.
///
/// A plane too short for `height` rows yields a short buffer, which
/// `RgbImage::from_raw` then rejects.
fn packed_rgb_rows(plane: &[u8], stride: usize, width: u32, height: u32) -> Vec<u8> {
    let row_bytes = width as usize * 3;
    plane
        .chunks(stride.max(1))
        .take(height as usize)
        .flat_map(|row| row.get(..row_bytes).unwrap_or(row))
        .copied()
        .collect()
}
