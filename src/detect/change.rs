use image::imageops;

use crate::detect::backend::MotionDetector;
use crate::detect::contour::max_contour_area;
use crate::detect::mask::{dilate, threshold_difference};
use crate::detect::result::ChangeReport;
use crate::frame::{Frame, IntensityMap};

/// Default spatial-extent threshold (contour area in pixels).
pub const DEFAULT_AREA_THRESHOLD: f64 = 50_000.0;
/// Default per-pixel intensity delta above which a pixel counts as changed.
pub const DEFAULT_PIXEL_DELTA: u8 = 25;
/// Sigma equivalent to a 21x21 Gaussian kernel.
pub const DEFAULT_BLUR_SIGMA: f32 = 3.5;
/// Default number of 3x3 dilation passes.
pub const DEFAULT_DILATE_ITERATIONS: u32 = 2;

/// Tuning for `ChangeDetector`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorSettings {
    /// Motion is reported when the largest region area is strictly greater.
    pub area_threshold: f64,
    pub pixel_delta: u8,
    /// Gaussian sigma for noise suppression. 0 disables smoothing.
    pub blur_sigma: f32,
    pub dilate_iterations: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            area_threshold: DEFAULT_AREA_THRESHOLD,
            pixel_delta: DEFAULT_PIXEL_DELTA,
            blur_sigma: DEFAULT_BLUR_SIGMA,
            dilate_iterations: DEFAULT_DILATE_ITERATIONS,
        }
    }
}

/// Frame-differencing motion detector.
///
/// Each frame is reduced to a smoothed intensity map and compared against the
/// map of the immediately preceding frame. The reference is replaced on every
/// call, whether or not motion was reported; there is no background model.
pub struct ChangeDetector {
    settings: DetectorSettings,
    reference: Option<IntensityMap>,
}

impl ChangeDetector {
    pub fn new(settings: DetectorSettings) -> Self {
        Self {
            settings,
            reference: None,
        }
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Grayscale conversion followed by Gaussian smoothing.
    pub fn intensity_map(&self, frame: &Frame) -> IntensityMap {
        let gray = imageops::grayscale(frame.image());
        if self.settings.blur_sigma > 0.0 {
            IntensityMap::new(imageops::blur(&gray, self.settings.blur_sigma))
        } else {
            IntensityMap::new(gray)
        }
    }

    pub fn observe(&mut self, frame: &Frame) -> ChangeReport {
        let current = self.intensity_map(frame);

        let report = match self.reference.take() {
            None => ChangeReport::baseline(),
            Some(reference) if reference.dimensions() != current.dimensions() => {
                log::warn!(
                    "frame size changed from {:?} to {:?}; resetting reference",
                    reference.dimensions(),
                    current.dimensions()
                );
                ChangeReport::baseline()
            }
            Some(reference) => {
                let mask = threshold_difference(
                    current.as_gray(),
                    reference.as_gray(),
                    self.settings.pixel_delta,
                );
                let mask = dilate(&mask, self.settings.dilate_iterations);
                let (max_area, regions) = max_contour_area(&mask);
                ChangeReport::from_area(max_area, regions, self.settings.area_threshold)
            }
        };

        self.reference = Some(current);
        report
    }

    pub fn reset(&mut self) {
        self.reference = None;
    }
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new(DetectorSettings::default())
    }
}

impl MotionDetector for ChangeDetector {
    fn name(&self) -> &'static str {
        "frame-diff"
    }

    fn observe(&mut self, frame: &Frame) -> ChangeReport {
        ChangeDetector::observe(self, frame)
    }

    fn reset(&mut self) {
        ChangeDetector::reset(self)
    }
}
