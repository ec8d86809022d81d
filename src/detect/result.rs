/// Outcome of observing one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChangeReport {
    /// Did any single changed region exceed the area threshold?
    pub motion_detected: bool,
    /// Largest contiguous changed area (pixels), 0 when nothing changed.
    pub max_region_area: f64,
    /// Number of changed regions found.
    pub regions: usize,
}

impl ChangeReport {
    /// Report for a frame that could not be compared (no reference yet).
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Build a report from the largest region area.
    ///
    /// Motion requires the area to be strictly greater than `threshold`.
    pub fn from_area(max_region_area: f64, regions: usize, threshold: f64) -> Self {
        Self {
            motion_detected: max_region_area > threshold,
            max_region_area,
            regions,
        }
    }
}
