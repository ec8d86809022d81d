//! Frame ingestion sources.
//!
//! This module provides sources of raw frames:
//! - Synthetic scenes (`stub://` URLs) for demos and tests
//! - Local directories of still images (JPEG/PNG), replayed in name order
//!
//! Every source produces owned `Frame`s of a fixed size. A source is a lazy,
//! non-restartable sequence: each `next_frame` call advances it irreversibly.
//! Any `AcquisitionError` is fatal for the pipeline, which then calls `close`.

pub mod directory;
pub mod synthetic;

use std::time::Duration;

pub use directory::DirectorySource;
pub use synthetic::{SyntheticConfig, SyntheticSource};

use crate::error::AcquisitionError;
use crate::frame::Frame;

/// Configuration shared by all frame sources.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceSettings {
    /// `stub://<name>` for a synthetic scene, otherwise a local directory path.
    pub url: String,
    /// Frame width (synthetic sources only; directories use the first image).
    pub width: u32,
    /// Frame height (synthetic sources only; directories use the first image).
    pub height: u32,
    /// Settling time before the first capture, waited on the pipeline clock.
    pub warmup: Duration,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            url: "stub://server_room".to_string(),
            width: 640,
            height: 480,
            warmup: Duration::from_secs(2),
        }
    }
}

/// Capture-side contract consumed by the pipeline.
pub trait FrameSource {
    /// Prepare the device. Called once before the first capture.
    fn connect(&mut self) -> Result<(), AcquisitionError>;

    /// Block until the next frame is available.
    fn next_frame(&mut self) -> Result<Frame, AcquisitionError>;

    /// Release the device. Safe to call more than once.
    fn close(&mut self);

    fn is_healthy(&self) -> bool;

    fn stats(&self) -> SourceStats;

    /// Settling time the caller waits after `connect` before the first
    /// capture. Sources never sleep themselves.
    fn warmup(&self) -> Duration {
        Duration::ZERO
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn connect(&mut self) -> Result<(), AcquisitionError> {
        (**self).connect()
    }

    fn next_frame(&mut self) -> Result<Frame, AcquisitionError> {
        (**self).next_frame()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_healthy(&self) -> bool {
        (**self).is_healthy()
    }

    fn stats(&self) -> SourceStats {
        (**self).stats()
    }

    fn warmup(&self) -> Duration {
        (**self).warmup()
    }
}

/// Statistics for a frame source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub source: String,
}

/// Open the source named by `settings.url`.
pub fn open_source(settings: &SourceSettings) -> Result<Box<dyn FrameSource>, AcquisitionError> {
    if settings.url.trim().is_empty() {
        return Err(AcquisitionError::Device("frame source url is empty".into()));
    }
    if settings.url.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(SyntheticConfig::from_settings(
            settings,
        ))));
    }
    if !is_local_path(&settings.url) {
        return Err(AcquisitionError::Device(format!(
            "unsupported frame source '{}': expected stub:// or a local directory",
            settings.url
        )));
    }
    Ok(Box::new(DirectorySource::new(
        settings.url.trim_start_matches("file://"),
        settings.warmup,
    )))
}

fn is_local_path(url: &str) -> bool {
    url.starts_with("file://") || !url.contains("://")
}
