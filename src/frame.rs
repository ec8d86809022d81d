//! Frame types flowing through the pipeline.
//!
//! - `Frame`: raw RGB capture, owned by the iteration that captured it.
//! - `IntensityMap`: smoothed single-channel derivative, owned by the detector.
//!
//! A `Frame` is never mutated after capture. The snapshot sink receives the
//! original frame, not the intensity map.

use image::{GrayImage, RgbImage};

/// Raw RGB capture from a frame source.
///
/// There is no `Clone`: a frame is handed by reference to the detector and the
/// snapshot sink, then dropped at the end of its iteration.
#[derive(Debug)]
pub struct Frame {
    image: RgbImage,
    /// Capture sequence number assigned by the source (1-based).
    pub sequence: u64,
}

impl Frame {
    pub fn new(image: RgbImage, sequence: u64) -> Self {
        Self { image, sequence }
    }

    /// Build a frame from packed RGB24 bytes.
    ///
    /// Returns `None` when the buffer length does not match `width * height * 3`.
    pub fn from_rgb24(width: u32, height: u32, pixels: Vec<u8>, sequence: u64) -> Option<Self> {
        RgbImage::from_raw(width, height, pixels).map(|image| Self { image, sequence })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

/// Smoothed grayscale representation of a frame.
#[derive(Clone, Debug)]
pub struct IntensityMap {
    map: GrayImage,
}

impl IntensityMap {
    pub(crate) fn new(map: GrayImage) -> Self {
        Self { map }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.map.dimensions()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgb24_validates_length() {
        assert!(Frame::from_rgb24(2, 2, vec![0u8; 12], 1).is_some());
        assert!(Frame::from_rgb24(2, 2, vec![0u8; 11], 1).is_none());
    }

    #[test]
    fn frame_reports_dimensions() {
        let frame = Frame::new(RgbImage::new(640, 480), 7);
        assert_eq!(frame.dimensions(), (640, 480));
        assert_eq!(frame.width(), 640);
        assert_eq!(frame.height(), 480);
        assert_eq!(frame.sequence, 7);
    }
}
