//! Filesystem snapshot store.
//!
//! Snapshots are JPEG files named `motion_<YYYYMMDD_HHMMSS>.jpg`. Names sort
//! lexicographically in capture order. When two snapshots land in the same
//! second the later one gets a `_<n>` suffix; existing files are never
//! overwritten.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, Utc};
use image::codecs::jpeg::JpegEncoder;

use super::SnapshotStore;
use crate::error::SnapshotError;
use crate::frame::Frame;

pub const SNAPSHOT_PREFIX: &str = "motion_";
pub const SNAPSHOT_EXTENSION: &str = "jpg";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const DEFAULT_JPEG_QUALITY: u8 = 95;
const MAX_COLLISION_SUFFIX: u32 = 999;

pub struct DirectorySnapshotStore {
    dir: PathBuf,
    quality: u8,
    utc: bool,
}

impl DirectorySnapshotStore {
    /// Store writing into `dir`, created on first write if absent.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quality: DEFAULT_JPEG_QUALITY,
            utc: false,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Name files in UTC instead of local time.
    pub fn with_utc(mut self, utc: bool) -> Self {
        self.utc = utc;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File stem for a snapshot taken at `at`, without collision suffix.
    pub fn stem_for(&self, at: SystemTime) -> String {
        let stamp = if self.utc {
            DateTime::<Utc>::from(at).format(TIMESTAMP_FORMAT).to_string()
        } else {
            DateTime::<Local>::from(at).format(TIMESTAMP_FORMAT).to_string()
        };
        format!("{SNAPSHOT_PREFIX}{stamp}")
    }

    fn ensure_dir(&self) -> Result<(), SnapshotError> {
        fs::create_dir_all(&self.dir).map_err(|source| SnapshotError::CreateDir {
            path: self.dir.clone(),
            source,
        })
    }

    /// Reserve a fresh file for `stem`, appending `_<n>` on collision.
    fn create_unique(&self, stem: &str) -> Result<(PathBuf, File), SnapshotError> {
        for n in 0..=MAX_COLLISION_SUFFIX {
            let name = if n == 0 {
                format!("{stem}.{SNAPSHOT_EXTENSION}")
            } else {
                format!("{stem}_{n}.{SNAPSHOT_EXTENSION}")
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(SnapshotError::Write { path, source }),
            }
        }
        Err(SnapshotError::NameExhausted(stem.to_string()))
    }
}

impl SnapshotStore for DirectorySnapshotStore {
    fn persist_snapshot(
        &mut self,
        frame: &Frame,
        at: SystemTime,
    ) -> Result<PathBuf, SnapshotError> {
        self.ensure_dir()?;
        let (path, file) = self.create_unique(&self.stem_for(at))?;

        let mut writer = BufWriter::new(file);
        let encoded = JpegEncoder::new_with_quality(&mut writer, self.quality)
            .encode_image(frame.image())
            .map_err(|source| SnapshotError::Encode {
                path: path.clone(),
                source,
            });
        let flushed = encoded.and_then(|()| {
            writer.flush().map_err(|source| SnapshotError::Write {
                path: path.clone(),
                source,
            })
        });

        if let Err(e) = flushed {
            drop(writer);
            discard_partial(&path);
            return Err(e);
        }
        Ok(path)
    }
}

/// Remove a truncated snapshot. Returns false (and logs) if it could not be removed.
fn discard_partial(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("failed to remove partial snapshot {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::time::Duration;

    // 2024-03-05 14:07:09 UTC
    const T0: u64 = 1_709_647_629;

    fn at(secs: u64, millis: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs) + Duration::from_millis(millis)
    }

    fn frame() -> Frame {
        Frame::new(RgbImage::from_pixel(16, 12, Rgb([120, 80, 40])), 1)
    }

    #[test]
    fn stem_uses_second_resolution_timestamp() {
        let store = DirectorySnapshotStore::new("unused").with_utc(true);
        assert_eq!(store.stem_for(at(T0, 0)), "motion_20240305_140709");
        assert_eq!(store.stem_for(at(T0, 999)), "motion_20240305_140709");
    }

    #[test]
    fn creates_directory_and_writes_decodable_jpeg() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().join("photos").join("nested");
        let mut store = DirectorySnapshotStore::new(&dir).with_utc(true);

        let path = store.persist_snapshot(&frame(), at(T0, 0)).unwrap();
        assert_eq!(path, dir.join("motion_20240305_140709.jpg"));

        let decoded = image::open(&path).expect("decode").to_rgb8();
        assert_eq!(decoded.dimensions(), (16, 12));
    }

    #[test]
    fn same_second_snapshots_do_not_overwrite() {
        let root = tempfile::tempdir().expect("tempdir");
        let mut store = DirectorySnapshotStore::new(root.path()).with_utc(true);

        let first = store.persist_snapshot(&frame(), at(T0, 100)).unwrap();
        let second = store.persist_snapshot(&frame(), at(T0, 600)).unwrap();
        let third = store.persist_snapshot(&frame(), at(T0, 900)).unwrap();

        assert_eq!(first.file_name().unwrap(), "motion_20240305_140709.jpg");
        assert_eq!(second.file_name().unwrap(), "motion_20240305_140709_1.jpg");
        assert_eq!(third.file_name().unwrap(), "motion_20240305_140709_2.jpg");
    }

    #[test]
    fn partial_snapshot_cleanup() {
        let root = tempfile::tempdir().expect("tempdir");
        let partial = root.path().join("motion_20240305_140709.jpg");
        std::fs::write(&partial, b"\xff\xd8").unwrap();

        assert!(discard_partial(&partial));
        assert!(!partial.exists());
        // Already gone: reported, not panicking.
        assert!(!discard_partial(&partial));
    }

    #[test]
    fn unusable_directory_is_reported() {
        let root = tempfile::tempdir().expect("tempdir");
        let blocker = root.path().join("not_a_dir");
        std::fs::write(&blocker, b"file").unwrap();

        let mut store = DirectorySnapshotStore::new(blocker.join("photos"));
        let err = store.persist_snapshot(&frame(), at(T0, 0)).unwrap_err();
        assert!(matches!(err, SnapshotError::CreateDir { .. }));
    }
}
