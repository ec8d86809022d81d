//! Scene-change detection.
//!
//! Pipeline per frame: grayscale -> Gaussian smoothing -> absolute difference
//! against the previous map -> binary threshold -> 3x3 dilation -> external
//! contours -> largest contour area compared with the area threshold.

mod backend;
mod change;
pub mod contour;
pub mod mask;
mod result;

pub use backend::MotionDetector;
pub use change::{
    ChangeDetector, DetectorSettings, DEFAULT_AREA_THRESHOLD, DEFAULT_BLUR_SIGMA,
    DEFAULT_DILATE_ITERATIONS, DEFAULT_PIXEL_DELTA,
};
pub use result::ChangeReport;
