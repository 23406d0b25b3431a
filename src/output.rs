//! Output directory handling and frame file naming.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// File name for the frame at 1-based `sequence`, e.g. `frame_0007.png`.
///
/// ```
/// assert_eq!(framesample::frame_file_name(7, "png"), "frame_0007.png");
/// ```
pub fn frame_file_name(sequence: u32, extension: &str) -> String {
    format!("frame_{sequence:04}.{extension}")
}

/// Full output path for the frame at 1-based `sequence`.
pub fn frame_path(output_dir: &Path, sequence: u32, extension: &str) -> PathBuf {
    output_dir.join(frame_file_name(sequence, extension))
}

/// Make `output_dir` exist and empty it of regular files.
///
/// Subdirectories are left untouched. A symlink to a file is removed (the
/// link, not its target); a symlink to a directory is kept. Files that
/// cannot be removed are skipped so a stubborn leftover never blocks a new
/// run. Returns how many files were removed.
///
/// # Errors
///
/// Fails if the directory cannot be created or listed, or if `output_dir`
/// exists but is not a directory.
pub fn prepare_output(output_dir: &Path) -> io::Result<usize> {
    fs::create_dir_all(output_dir)?;

    let mut removed = 0;
    for entry in fs::read_dir(output_dir)? {
        let Ok(entry) = entry else {
            continue;
        };
        let path = entry.path();
        // Follows symlinks, so a link to a file counts as a file.
        let is_file = fs::metadata(&path).is_ok_and(|metadata| metadata.is_file());
        if !is_file {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(error) => {
                log::debug!("Leaving {} in place: {error}", path.display());
            }
        }
    }

    log::debug!(
        "Cleared {removed} file(s) from {}",
        output_dir.display()
    );
    Ok(removed)
}
