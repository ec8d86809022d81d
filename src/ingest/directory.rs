//! Local still-image directory source.
//!
//! Replays JPEG/PNG files from a local directory in lexicographic order. The
//! first image fixes the frame size for the run; a differently sized image is
//! a format mismatch. Reaching the end of the directory exhausts the source.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{FrameSource, SourceStats};
use crate::error::AcquisitionError;
use crate::frame::Frame;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub struct DirectorySource {
    dir: PathBuf,
    warmup: Duration,
    pending: Vec<PathBuf>,
    cursor: usize,
    frame_size: Option<(u32, u32)>,
    frame_count: u64,
    connected: bool,
    closed: bool,
}

impl DirectorySource {
    pub fn new(dir: impl AsRef<Path>, warmup: Duration) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            warmup,
            pending: Vec::new(),
            cursor: 0,
            frame_size: None,
            frame_count: 0,
            connected: false,
            closed: false,
        }
    }

    fn list_images(&self) -> Result<Vec<PathBuf>, AcquisitionError> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_image {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl FrameSource for DirectorySource {
    fn connect(&mut self) -> Result<(), AcquisitionError> {
        if self.closed {
            return Err(AcquisitionError::Closed);
        }
        self.pending = self.list_images()?;
        self.cursor = 0;
        if self.pending.is_empty() {
            return Err(AcquisitionError::Device(format!(
                "no images found in {}",
                self.dir.display()
            )));
        }
        self.connected = true;
        log::info!(
            "DirectorySource: connected to {} ({} images)",
            self.dir.display(),
            self.pending.len()
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame, AcquisitionError> {
        if self.closed {
            return Err(AcquisitionError::Closed);
        }
        if !self.connected {
            return Err(AcquisitionError::NotConnected);
        }
        let Some(path) = self.pending.get(self.cursor).cloned() else {
            return Err(AcquisitionError::Exhausted {
                frames: self.frame_count,
            });
        };
        self.cursor += 1;

        let image = image::open(&path)
            .map_err(|source| AcquisitionError::Decode {
                path: path.clone(),
                source,
            })?
            .to_rgb8();

        let (width, height) = image.dimensions();
        match self.frame_size {
            None => self.frame_size = Some((width, height)),
            Some((expected_width, expected_height))
                if (expected_width, expected_height) != (width, height) =>
            {
                return Err(AcquisitionError::FormatMismatch {
                    expected_width,
                    expected_height,
                    width,
                    height,
                });
            }
            Some(_) => {}
        }

        self.frame_count += 1;
        Ok(Frame::new(image, self.frame_count))
    }

    fn close(&mut self) {
        if !self.closed {
            log::info!(
                "DirectorySource: closed {} after {} frames",
                self.dir.display(),
                self.frame_count
            );
        }
        self.closed = true;
        self.connected = false;
        self.pending.clear();
    }

    fn is_healthy(&self) -> bool {
        self.connected && !self.closed && self.cursor < self.pending.len()
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: self.dir.display().to_string(),
        }
    }

    fn warmup(&self) -> Duration {
        self.warmup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32, value: u8) {
        RgbImage::from_pixel(width, height, Rgb([value, value, value]))
            .save(dir.join(name))
            .expect("write png");
    }

    #[test]
    fn replays_images_in_name_order_then_exhausts() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_png(dir.path(), "b.png", 8, 6, 200);
        write_png(dir.path(), "a.png", 8, 6, 10);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = DirectorySource::new(dir.path(), Duration::ZERO);
        source.connect().unwrap();

        let first = source.next_frame().unwrap();
        assert_eq!(first.image().get_pixel(0, 0), &Rgb([10, 10, 10]));
        let second = source.next_frame().unwrap();
        assert_eq!(second.sequence, 2);
        assert_eq!(second.image().get_pixel(0, 0), &Rgb([200, 200, 200]));

        assert!(matches!(
            source.next_frame(),
            Err(AcquisitionError::Exhausted { frames: 2 })
        ));
    }

    #[test]
    fn size_change_is_a_format_mismatch() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_png(dir.path(), "0001.png", 8, 6, 10);
        write_png(dir.path(), "0002.png", 4, 4, 10);

        let mut source = DirectorySource::new(dir.path(), Duration::ZERO);
        source.connect().unwrap();
        source.next_frame().unwrap();
        assert!(matches!(
            source.next_frame(),
            Err(AcquisitionError::FormatMismatch { width: 4, height: 4, .. })
        ));
    }

    #[test]
    fn empty_directory_fails_to_connect() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut source = DirectorySource::new(dir.path(), Duration::ZERO);
        assert!(matches!(source.connect(), Err(AcquisitionError::Device(_))));
    }
}
