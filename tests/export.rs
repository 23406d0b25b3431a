//! End-to-end export tests against scripted sources.

mod common;

use std::fs;

use common::{
    ReadScript, RecordingObserver, ScriptedOpener, file_names, output_dir, sample_metadata,
};
use framesample::{
    ExportJob, FrameResult, FrameSampler, FrameWriter, ImageFrameWriter, SamplerError,
    SamplerOptions, SkipPolicy, SkipReason, VideoMetadata,
};
use image::{DynamicImage, GenericImageView};
use log::Level;

fn job_in(root: &std::path::Path, count: u32) -> ExportJob {
    ExportJob::new("scripted.mp4", output_dir(root), 32, 24, count)
}

// ── Happy path ─────────────────────────────────────────────────────

#[test]
fn writes_one_file_per_plan_entry() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let opener = ScriptedOpener::new(sample_metadata());
    let mut observer = RecordingObserver::default();
    let job = job_in(temporary_directory.path(), 5);

    let summary = FrameSampler::default()
        .run(&job, &opener, &mut observer)
        .expect("Export failed");

    assert_eq!(summary.written, 5);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.attempted(), 5);
    assert_eq!(
        file_names(&job.output_dir),
        [
            "frame_0001.png",
            "frame_0002.png",
            "frame_0003.png",
            "frame_0004.png",
            "frame_0005.png",
        ]
    );
    assert_eq!(*opener.log.requested.borrow(), [0, 25, 50, 74, 99]);
}

#[test]
fn written_frames_have_target_dimensions() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let opener = ScriptedOpener::new(sample_metadata());
    let job = job_in(temporary_directory.path(), 3);

    FrameSampler::default()
        .run(&job, &opener, &mut RecordingObserver::default())
        .expect("Export failed");

    for name in file_names(&job.output_dir) {
        let image = image::open(job.output_dir.join(&name)).expect("Failed to read frame");
        assert_eq!(image.dimensions(), (32, 24), "{name} has wrong size");
    }
}

#[test]
fn logs_video_info_and_completion() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let opener = ScriptedOpener::new(sample_metadata());
    let mut observer = RecordingObserver::default();

    FrameSampler::default()
        .run(&job_in(temporary_directory.path(), 2), &opener, &mut observer)
        .expect("Export failed");

    assert!(observer.has_line("Original size: 64x48"));
    assert!(observer.has_line("Total frames: 100"));
    assert!(observer.has_line("FPS: 25.00"));
    assert!(observer.has_line("Duration: 4.00 seconds"));
    assert!(observer.has_line("Cleared output directory"));
    assert!(observer.has_line("frame_0002.png"));

    let (_, last) = observer.lines.last().expect("No log lines");
    assert_eq!(last, "Export complete: 2 written, 0 skipped");
}

#[test]
fn progress_reports_every_attempt_in_order() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let opener = ScriptedOpener::new(sample_metadata()).with_script(2, ReadScript::Error);
    let mut observer = RecordingObserver::default();

    FrameSampler::default()
        .run(&job_in(temporary_directory.path(), 4), &opener, &mut observer)
        .expect("Export failed");

    let pairs: Vec<(u32, u32)> = observer
        .progress
        .iter()
        .map(|info| (info.done, info.total))
        .collect();
    assert_eq!(pairs, [(1, 4), (2, 4), (3, 4), (4, 4)]);

    let last = observer.progress.last().expect("No progress");
    assert_eq!(last.fraction(), 1.0);
    assert!((last.percentage - 100.0).abs() < f32::EPSILON);
    assert_eq!(last.estimated_remaining, Some(std::time::Duration::ZERO));

    let sequences: Vec<u32> = observer.results().iter().map(|r| r.sequence()).collect();
    assert_eq!(sequences, [1, 2, 3, 4]);
}

// ── Partial failure ────────────────────────────────────────────────

#[test]
fn decode_failure_leaves_a_gap() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let opener = ScriptedOpener::new(sample_metadata()).with_script(3, ReadScript::Error);
    let mut observer = RecordingObserver::default();
    let job = job_in(temporary_directory.path(), 5);

    let summary = FrameSampler::default()
        .run(&job, &opener, &mut observer)
        .expect("Export failed");

    assert_eq!(summary.written, 4);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.skipped_sequences, [3]);
    assert_eq!(
        file_names(&job.output_dir),
        [
            "frame_0001.png",
            "frame_0002.png",
            "frame_0004.png",
            "frame_0005.png",
        ]
    );

    let warnings = observer.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(
        warnings[0].starts_with("Failed to read frame 50"),
        "Unexpected warning: {}",
        warnings[0]
    );
    assert_eq!(observer.progress.len(), 5);
}

#[test]
fn missing_frame_is_skipped() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let opener = ScriptedOpener::new(sample_metadata()).with_script(1, ReadScript::Missing);
    let mut observer = RecordingObserver::default();

    let summary = FrameSampler::default()
        .run(&job_in(temporary_directory.path(), 2), &opener, &mut observer)
        .expect("Export failed");

    assert_eq!(summary.skipped_sequences, [1]);
    match observer.results()[0] {
        FrameResult::Skipped { reason, .. } => assert_eq!(*reason, SkipReason::EmptyFrame),
        other => panic!("Expected a skip, got {other:?}"),
    }
}

/// Writer that fails resizing or writing on chosen calls.
struct FlakyWriter {
    inner: ImageFrameWriter,
    fail_resize_on: Option<u32>,
    fail_write_on: Option<u32>,
    resizes: std::cell::Cell<u32>,
    writes: std::cell::Cell<u32>,
}

impl FlakyWriter {
    fn new(fail_resize_on: Option<u32>, fail_write_on: Option<u32>) -> Self {
        Self {
            inner: ImageFrameWriter::default(),
            fail_resize_on,
            fail_write_on,
            resizes: Default::default(),
            writes: Default::default(),
        }
    }
}

impl FrameWriter for FlakyWriter {
    fn resize(
        &self,
        frame: DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, SamplerError> {
        self.resizes.set(self.resizes.get() + 1);
        if self.fail_resize_on == Some(self.resizes.get()) {
            return Err(SamplerError::Ffmpeg("scripted resize failure".to_string()));
        }
        self.inner.resize(frame, width, height)
    }

    fn write(&self, frame: &DynamicImage, path: &std::path::Path) -> Result<(), SamplerError> {
        self.writes.set(self.writes.get() + 1);
        if self.fail_write_on == Some(self.writes.get()) {
            return Err(SamplerError::Io(std::io::Error::other("disk full")));
        }
        self.inner.write(frame, path)
    }
}

#[test]
fn resize_failure_is_skipped_like_a_read_failure() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let opener = ScriptedOpener::new(sample_metadata());
    let mut observer = RecordingObserver::default();
    let sampler = FrameSampler::with_writer(SamplerOptions::new(), FlakyWriter::new(Some(2), None));
    let job = job_in(temporary_directory.path(), 3);

    let summary = sampler
        .run(&job, &opener, &mut observer)
        .expect("Export failed");

    assert_eq!((summary.written, summary.skipped), (2, 1));
    assert_eq!(file_names(&job.output_dir), ["frame_0001.png", "frame_0003.png"]);
    assert!(observer.warnings()[0].starts_with("Failed to read frame"));
}

#[test]
fn write_failure_is_skipped() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let opener = ScriptedOpener::new(sample_metadata());
    let mut observer = RecordingObserver::default();
    let sampler = FrameSampler::with_writer(SamplerOptions::new(), FlakyWriter::new(None, Some(1)));
    let job = job_in(temporary_directory.path(), 3);

    let summary = sampler
        .run(&job, &opener, &mut observer)
        .expect("Export failed");

    assert_eq!(summary.skipped_sequences, [1]);
    assert_eq!(file_names(&job.output_dir), ["frame_0002.png", "frame_0003.png"]);
    assert!(observer.warnings()[0].starts_with("Failed to write frame 0"));
    assert!(observer.warnings()[0].contains("disk full"));
}

#[test]
fn abort_policy_stops_at_first_skip() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let opener = ScriptedOpener::new(sample_metadata()).with_script(2, ReadScript::Error);
    let mut observer = RecordingObserver::default();
    let sampler = FrameSampler::new(SamplerOptions::new().with_skip_policy(SkipPolicy::Abort));
    let job = job_in(temporary_directory.path(), 5);

    let error = sampler
        .run(&job, &opener, &mut observer)
        .expect_err("Expected strict export to fail");

    match error {
        SamplerError::FrameSkipped {
            sequence,
            frame_index,
            reason,
        } => {
            assert_eq!(sequence, 2);
            assert_eq!(frame_index, 25);
            assert!(matches!(reason, SkipReason::Decode(_)));
        }
        other => panic!("Expected FrameSkipped, got: {other}"),
    }
    assert_eq!(file_names(&job.output_dir), ["frame_0001.png"]);
    assert_eq!(opener.log.released.get(), 1);
    assert!(!observer.has_line("Export complete"));
}

// ── Release and cancellation ───────────────────────────────────────

#[test]
fn source_released_after_successful_export() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let opener = ScriptedOpener::new(sample_metadata());

    FrameSampler::default()
        .run(
            &job_in(temporary_directory.path(), 3),
            &opener,
            &mut RecordingObserver::default(),
        )
        .expect("Export failed");

    assert_eq!(opener.log.opens.get(), 1);
    assert_eq!(opener.log.released.get(), 1);
}

#[test]
fn cancelling_from_progress_stops_and_releases() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let opener = ScriptedOpener::new(sample_metadata());
    let mut observer = RecordingObserver {
        cancel_after: Some(2),
        ..RecordingObserver::default()
    };
    let job = job_in(temporary_directory.path(), 6);

    let result = FrameSampler::default().run(&job, &opener, &mut observer);

    assert!(matches!(result, Err(SamplerError::Cancelled)));
    assert_eq!(observer.progress.len(), 2);
    assert_eq!(opener.log.requested.borrow().len(), 2);
    assert_eq!(opener.log.released.get(), 1);
    assert_eq!(file_names(&job.output_dir), ["frame_0001.png", "frame_0002.png"]);
    assert!(observer.has_line("Export cancelled after 2 of 6 frames"));
}

#[test]
fn export_accepts_an_already_open_source() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let opener = ScriptedOpener::new(sample_metadata());
    let sampler = FrameSampler::default();
    let job = job_in(temporary_directory.path(), 3);

    let plan = sampler.build_plan(100, 3).expect("Failed to plan");
    sampler
        .prepare_output(&job.output_dir)
        .expect("Failed to prepare output");
    let summary = sampler
        .export(&job, opener.source(), &plan, &mut RecordingObserver::default())
        .expect("Export failed");

    assert_eq!(summary.written, 3);
    assert_eq!(opener.log.released.get(), 1);
    assert_eq!(*opener.log.requested.borrow(), [0, 50, 99]);
}

// ── Fatal errors ───────────────────────────────────────────────────

#[test]
fn invalid_job_is_rejected_before_opening() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let opener = ScriptedOpener::new(sample_metadata());
    let job = ExportJob::new("scripted.mp4", output_dir(temporary_directory.path()), 0, 24, 5);

    let error = FrameSampler::default()
        .run(&job, &opener, &mut RecordingObserver::default())
        .expect_err("Expected invalid job");

    assert!(matches!(error, SamplerError::InvalidJob { field: "width", .. }));
    assert_eq!(opener.log.opens.get(), 0);
    assert!(!job.output_dir.exists());
}

#[test]
fn empty_video_is_distinct_from_open_failure() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let job = job_in(temporary_directory.path(), 5);

    let empty = ScriptedOpener::new(VideoMetadata::new(64, 48, 25.0, 0));
    let error = FrameSampler::default()
        .run(&job, &empty, &mut RecordingObserver::default())
        .expect_err("Expected empty video");
    assert!(matches!(error, SamplerError::EmptyVideo { .. }), "got {error}");
    assert_eq!(empty.log.released.get(), 1);
    assert!(!job.output_dir.exists());

    let broken = ScriptedOpener::failing();
    let error = FrameSampler::default()
        .run(&job, &broken, &mut RecordingObserver::default())
        .expect_err("Expected open failure");
    assert!(matches!(error, SamplerError::Open { .. }), "got {error}");
}

// ── Output directory handling ──────────────────────────────────────

#[test]
fn stale_frames_are_removed_before_export() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let job = job_in(temporary_directory.path(), 2);
    fs::create_dir_all(job.output_dir.join("keep")).expect("Failed to create subdir");
    fs::write(job.output_dir.join("frame_0009.png"), b"stale").expect("Failed to write");
    fs::write(job.output_dir.join("notes.txt"), b"stale").expect("Failed to write");

    FrameSampler::default()
        .run(
            &job,
            &ScriptedOpener::new(sample_metadata()),
            &mut RecordingObserver::default(),
        )
        .expect("Export failed");

    assert_eq!(file_names(&job.output_dir), ["frame_0001.png", "frame_0002.png"]);
    assert!(job.output_dir.join("keep").is_dir());
}

#[test]
fn rerunning_the_same_job_is_idempotent() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let opener = ScriptedOpener::new(sample_metadata()).with_script(3, ReadScript::Error);
    let sampler = FrameSampler::default();
    let job = job_in(temporary_directory.path(), 5);

    let read_all = || {
        file_names(&job.output_dir)
            .into_iter()
            .map(|name| {
                let bytes = fs::read(job.output_dir.join(&name)).expect("Failed to read");
                (name, bytes)
            })
            .collect::<Vec<_>>()
    };

    let first_summary = sampler
        .run(&job, &opener, &mut RecordingObserver::default())
        .expect("First export failed");
    let first = read_all();

    // The script counts reads per source, so the second run fails at the same place.
    let second_summary = sampler
        .run(&job, &opener, &mut RecordingObserver::default())
        .expect("Second export failed");
    let second = read_all();

    assert_eq!(first_summary, second_summary);
    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
}

#[test]
fn jpeg_output_uses_jpg_extension() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let sampler = FrameSampler::new(
        SamplerOptions::new().with_image_format(image::ImageFormat::Jpeg),
    );
    let job = job_in(temporary_directory.path(), 2);

    sampler
        .run(
            &job,
            &ScriptedOpener::new(sample_metadata()),
            &mut RecordingObserver::default(),
        )
        .expect("Export failed");

    assert_eq!(file_names(&job.output_dir), ["frame_0001.jpg", "frame_0002.jpg"]);
}

#[test]
fn warnings_are_logged_at_warn_level() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let opener = ScriptedOpener::new(sample_metadata()).with_script(1, ReadScript::Error);
    let mut observer = RecordingObserver::default();

    FrameSampler::default()
        .run(&job_in(temporary_directory.path(), 2), &opener, &mut observer)
        .expect("Export failed");

    let warn_lines: Vec<_> = observer
        .lines
        .iter()
        .filter(|(level, _)| *level == Level::Warn)
        .collect();
    assert_eq!(warn_lines.len(), 1);
    assert!(warn_lines[0].1.contains("scripted decode failure"));
}
