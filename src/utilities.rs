//! Internal helpers for FFmpeg timestamp arithmetic.

use ffmpeg_next::Rational;

/// FFmpeg's `AV_TIME_BASE`: container-level timestamps are in microseconds.
const MICROSECONDS_PER_SECOND: f64 = 1_000_000.0;

/// A positive rational as `f64`, or `None` when it is zero or undefined.
pub(crate) fn rational_to_f64(rational: Rational) -> Option<f64> {
    if rational.denominator() == 0 || rational.numerator() <= 0 {
        return None;
    }
    Some(f64::from(rational.numerator()) / f64::from(rational.denominator()))
}

/// Seek target for `frame_index`, in container time base (microseconds).
pub(crate) fn frame_index_to_seek_timestamp(frame_index: u64, frames_per_second: f64) -> i64 {
    if frames_per_second <= 0.0 {
        return 0;
    }
    let seconds = frame_index as f64 / frames_per_second;
    (seconds * MICROSECONDS_PER_SECOND) as i64
}

/// Container duration in microseconds to seconds; non-positive means unknown.
pub(crate) fn container_duration_seconds(duration: i64) -> f64 {
    if duration > 0 {
        duration as f64 / MICROSECONDS_PER_SECOND
    } else {
        0.0
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * f64::from(time_base.numerator()) / f64::from(time_base.denominator())
}

/// Frame index a PTS falls on, rounded so exact frame times never land one
/// frame early.
pub(crate) fn pts_to_frame_index(pts: i64, time_base: Rational, frames_per_second: f64) -> u64 {
    let seconds = pts_to_seconds(pts, time_base).max(0.0);
    (seconds * frames_per_second).round() as u64
}
