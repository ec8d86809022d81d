#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use roomwatch::ingest::{SyntheticConfig, SyntheticSource};
use roomwatch::{
    ChangeReport, EventPublisher, Frame, MotionDetector, PublishError, SnapshotError,
    SnapshotStore,
};

/// Detector that reports motion on every frame, or on none.
pub struct FixedDetector {
    pub motion: bool,
}

impl MotionDetector for FixedDetector {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn observe(&mut self, _frame: &Frame) -> ChangeReport {
        if self.motion {
            ChangeReport::from_area(60_000.0, 1, 50_000.0)
        } else {
            ChangeReport::baseline()
        }
    }

    fn reset(&mut self) {}
}

#[derive(Default)]
pub struct RecordingStore {
    pub fail: bool,
    pub attempts: Vec<SystemTime>,
}

impl SnapshotStore for RecordingStore {
    fn persist_snapshot(&mut self, frame: &Frame, at: SystemTime) -> Result<PathBuf, SnapshotError> {
        self.attempts.push(at);
        if self.fail {
            return Err(SnapshotError::Unavailable("read-only filesystem".into()));
        }
        Ok(PathBuf::from(format!("frame_{}.jpg", frame.sequence)))
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    pub fail: bool,
    pub attempts: Vec<(String, String, SystemTime)>,
}

impl EventPublisher for RecordingPublisher {
    fn publish_event(
        &mut self,
        topic: &str,
        payload: &str,
        at: SystemTime,
    ) -> Result<(), PublishError> {
        self.attempts.push((topic.to_string(), payload.to_string(), at));
        if self.fail {
            return Err(PublishError::Disconnected);
        }
        Ok(())
    }
}

/// Static scene with no noise; frame content is irrelevant to `FixedDetector`.
pub fn flat_source(frame_limit: Option<u64>) -> SyntheticSource {
    SyntheticSource::new(SyntheticConfig {
        url: "stub://flat".into(),
        width: 16,
        height: 12,
        period: 0,
        noise: 0,
        frame_limit,
        ..SyntheticConfig::default()
    })
}

pub fn secs(t: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(t)
}
