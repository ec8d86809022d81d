//! Side effects triggered by the debounce gates.
//!
//! - `SnapshotStore`: persist the raw frame that triggered a fire.
//! - `EventPublisher`: send a short notification to a remote endpoint.
//!
//! The two sinks are independent. The pipeline calls each one behind its own
//! gate and logs failures without stopping the loop.

pub mod snapshot;

use std::path::PathBuf;
use std::time::SystemTime;

pub use snapshot::DirectorySnapshotStore;

use crate::error::{PublishError, SnapshotError};
use crate::frame::Frame;

pub trait SnapshotStore {
    /// Write `frame` as an image artifact named after `at`.
    fn persist_snapshot(&mut self, frame: &Frame, at: SystemTime)
        -> Result<PathBuf, SnapshotError>;
}

pub trait EventPublisher {
    /// Deliver `payload` to `topic`. One attempt, no retry.
    fn publish_event(
        &mut self,
        topic: &str,
        payload: &str,
        at: SystemTime,
    ) -> Result<(), PublishError>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Box<T> {
    fn persist_snapshot(
        &mut self,
        frame: &Frame,
        at: SystemTime,
    ) -> Result<PathBuf, SnapshotError> {
        (**self).persist_snapshot(frame, at)
    }
}

impl<T: EventPublisher + ?Sized> EventPublisher for Box<T> {
    fn publish_event(
        &mut self,
        topic: &str,
        payload: &str,
        at: SystemTime,
    ) -> Result<(), PublishError> {
        (**self).publish_event(topic, payload, at)
    }
}

/// Publisher for deployments without a broker. Accepts and drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPublisher;

impl EventPublisher for NullPublisher {
    fn publish_event(
        &mut self,
        topic: &str,
        payload: &str,
        _at: SystemTime,
    ) -> Result<(), PublishError> {
        log::debug!("publishing disabled; dropped {}={}", topic, payload);
        Ok(())
    }
}
