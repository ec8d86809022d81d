//! Error taxonomy for the capture/act boundaries.
//!
//! - `AcquisitionError`: the frame source is unusable. Fatal for the pipeline.
//! - `SnapshotError`: a snapshot could not be persisted. Recoverable.
//! - `PublishError`: a notification could not be delivered. Recoverable.
//!
//! Recoverable errors are logged by the pipeline and never retried; the next
//! detection event (subject to its gate) is the retry opportunity.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Frame source failures. The pipeline stops after releasing the source.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("frame source is not connected")]
    NotConnected,
    #[error("frame source is closed")]
    Closed,
    #[error("frame source exhausted after {frames} frames")]
    Exhausted { frames: u64 },
    #[error("frame format mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    FormatMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },
    #[error("frame decode failed for {}: {}", .path.display(), .source)]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("frame device error: {0}")]
    Device(String),
    #[error("frame source io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Snapshot persistence failures.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("failed to create snapshot directory {}: {}", .path.display(), .source)]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write snapshot {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode snapshot {}: {}", .path.display(), .source)]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("no free snapshot filename for stem {0}")]
    NameExhausted(String),
    #[error("snapshot store unavailable: {0}")]
    Unavailable(String),
}

/// Notification delivery failures.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("invalid broker endpoint: {0}")]
    Endpoint(String),
    #[error("broker connection failed: {0}")]
    Connection(#[from] rumqttc::v5::ConnectionError),
    #[error("broker client request failed: {0}")]
    Client(#[from] rumqttc::v5::ClientError),
    #[error("broker did not confirm publish within {0:?}")]
    Timeout(Duration),
    #[error("broker connection closed before publish completed")]
    Disconnected,
}
