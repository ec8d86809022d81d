use crate::detect::result::ChangeReport;
use crate::frame::Frame;

/// Motion detector seam used by the pipeline.
///
/// Implementations keep whatever temporal state they need (for
/// `ChangeDetector`, the previous intensity map) as owned fields. The pipeline
/// is the only caller and never shares a detector across threads.
pub trait MotionDetector: Send {
    /// Detector identifier, used in logs.
    fn name(&self) -> &'static str;

    /// Compare `frame` against the detector's reference and update it.
    fn observe(&mut self, frame: &Frame) -> ChangeReport;

    /// Forget the reference so the next frame becomes the new baseline.
    fn reset(&mut self);
}
