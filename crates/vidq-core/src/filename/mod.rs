//! Output path derivation for downloaded media.
//!
//! A job's file lands in the download root (or a sub-directory named after
//! its playlist) as `<title>.<container>`, sanitized, truncated and made
//! unique against files already in the directory.

mod sanitize;

use std::path::{Path, PathBuf};

use crate::error::{StartError, ValidationError};
use crate::model::{require_non_blank, ScheduledDownload};

pub use sanitize::{
    create_safe_file_name, make_valid_file_name, truncate_file_name, DEFAULT_MAX_FILE_NAME_LEN,
    MAX_FILE_NAME_BYTES, MAX_FILE_NAME_LEN_LIMIT,
};

/// Safe name for `name` in `dir` that no existing file uses, as a full path.
/// Collisions get ` (1)`, ` (2)`, … before the extension.
pub fn create_unique_safe_file_name(
    dir: &Path,
    name: &str,
    max_len: usize,
) -> Result<PathBuf, ValidationError> {
    create_unique_safe_file_name_with(dir, name, max_len, |p| p.exists())
}

/// Like [`create_unique_safe_file_name`] with a caller-supplied notion of
/// "taken", e.g. to also skip paths reserved by downloads still in flight.
pub fn create_unique_safe_file_name_with(
    dir: &Path,
    name: &str,
    max_len: usize,
    is_taken: impl Fn(&Path) -> bool,
) -> Result<PathBuf, ValidationError> {
    require_non_blank(&dir.to_string_lossy(), "directory")?;
    let safe = create_safe_file_name(name, max_len)?;
    let mut path = dir.join(&safe);
    let mut n = 1;
    while is_taken(&path) {
        path = dir.join(sanitize::numbered(&safe, n));
        n += 1;
    }
    Ok(path)
}

/// Directory a job's file is written to: the download root, joined with the
/// playlist title when the job belongs to one. The playlist component obeys
/// the same length limits as file names.
pub fn output_dir(
    download_root: &Path,
    job: &ScheduledDownload,
    max_len: usize,
) -> Result<PathBuf, ValidationError> {
    match job.playlist() {
        Some(playlist) => Ok(download_root.join(create_safe_file_name(playlist.title(), max_len)?)),
        None => Ok(download_root.to_path_buf()),
    }
}

/// Creates the job's output directory, returning it.
pub fn prepare_output_dir(
    download_root: &Path,
    job: &ScheduledDownload,
    max_len: usize,
) -> Result<PathBuf, StartError> {
    let dir = output_dir(download_root, job, max_len)?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Picks a free `<title>.<container>` path in `dir`. Touches the filesystem
/// only to check for existing files.
pub fn unique_output_path(
    dir: &Path,
    job: &ScheduledDownload,
    max_len: usize,
    is_taken: impl Fn(&Path) -> bool,
) -> Result<PathBuf, ValidationError> {
    let media = job.media_file();
    let raw = format!("{}.{}", media.title(), media.stream().container());
    create_unique_safe_file_name_with(dir, &raw, max_len, |p| p.exists() || is_taken(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DownloadingType, MediaFile, MediaStream, PlayList, StreamType, Timing};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn job(title: &str, playlist: Option<&str>) -> ScheduledDownload {
        let stream = MediaStream::new(10, "mp4", "720p", StreamType::Mixed).unwrap();
        let file =
            MediaFile::new("abc", "https://v/abc", title, "", "", Duration::ZERO, None, stream)
                .unwrap();
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let job = ScheduledDownload::new(
            DownloadingType::Instant,
            Timing::for_date_fixed_only(d, d),
            file,
        );
        match playlist {
            Some(t) => job.with_playlist(PlayList::new("PL", "https://p/PL", t, "", None).unwrap()),
            None => job,
        }
    }

    #[test]
    fn unique_name_counts_up() {
        let dir = tempfile::tempdir().unwrap();
        let first = create_unique_safe_file_name(dir.path(), "video.mp4", 220).unwrap();
        assert_eq!(first, dir.path().join("video.mp4"));

        std::fs::write(dir.path().join("video.mp4"), b"x").unwrap();
        let second = create_unique_safe_file_name(dir.path(), "video.mp4", 220).unwrap();
        assert_eq!(second, dir.path().join("video (1).mp4"));

        std::fs::write(dir.path().join("video (1).mp4"), b"x").unwrap();
        let third = create_unique_safe_file_name(dir.path(), "video.mp4", 220).unwrap();
        assert_eq!(third, dir.path().join("video (2).mp4"));
    }

    #[test]
    fn unique_name_is_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let p = create_unique_safe_file_name(dir.path(), "a:b.mp4", 220).unwrap();
        assert_eq!(p, dir.path().join("a_b.mp4"));
    }

    fn output_path(
        root: &Path,
        job: &ScheduledDownload,
        is_taken: impl Fn(&Path) -> bool,
    ) -> PathBuf {
        let dir = prepare_output_dir(root, job, 220).unwrap();
        unique_output_path(&dir, job, 220, is_taken).unwrap()
    }

    #[test]
    fn output_path_uses_playlist_subdir() {
        let root = tempfile::tempdir().unwrap();
        let p = output_path(root.path(), &job("Clip", Some("My/Mix")), |_| false);
        assert_eq!(p, root.path().join("My_Mix").join("Clip.mp4"));
        assert!(root.path().join("My_Mix").is_dir());
    }

    #[test]
    fn output_path_skips_reserved_paths() {
        let root = tempfile::tempdir().unwrap();
        let reserved = root.path().join("Clip.mp4");
        let p = output_path(root.path(), &job("Clip", None), |q| q == reserved);
        assert_eq!(p, root.path().join("Clip (1).mp4"));
    }

    #[test]
    fn unique_output_path_creates_nothing() {
        let root = tempfile::tempdir().unwrap();
        let job = job("Clip", Some("Mix"));
        let dir = output_dir(root.path(), &job, 220).unwrap();
        let p = unique_output_path(&dir, &job, 220, |_| false).unwrap();
        assert_eq!(p, root.path().join("Mix").join("Clip.mp4"));
        assert!(!dir.exists());
    }

    #[test]
    fn long_playlist_title_is_truncated() {
        let root = tempfile::tempdir().unwrap();
        let job = job("Clip", Some("m".repeat(300).as_str()));
        let dir = prepare_output_dir(root.path(), &job, 220).unwrap();
        let name = dir.file_name().unwrap().to_str().unwrap();
        assert_eq!(name, "m".repeat(220));
        assert!(dir.is_dir());
    }

    #[test]
    fn wide_playlist_title_fits_filesystem_limit() {
        let root = tempfile::tempdir().unwrap();
        let job = job("Clip", Some("字".repeat(220).as_str()));
        let dir = prepare_output_dir(root.path(), &job, 220).unwrap();
        assert!(dir.file_name().unwrap().len() <= MAX_FILE_NAME_BYTES);
        assert!(dir.is_dir());
        let p = unique_output_path(&dir, &job, 220, |_| false).unwrap();
        std::fs::write(&p, b"x").unwrap();
    }
}
