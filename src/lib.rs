//! roomwatch: frame-differencing motion watcher.
//!
//! A single-threaded pipeline captures frames, compares each one with the
//! previous frame, and on motion triggers two independently debounced
//! actions: a JPEG snapshot on disk and a short MQTT notification.
//!
//! # Architecture
//!
//! Two invariants hold by construction:
//!
//! 1. **Independent gates**: the snapshot and publish cooldowns never
//!    influence each other, and a failing action never suppresses the other.
//! 2. **Stateless outside the loop**: the only state carried between
//!    iterations is the reference intensity map and the two gate timestamps.
//!
//! # Module Structure
//!
//! - `frame`: Owned RGB frames and derived intensity maps
//! - `ingest`: Frame sources (synthetic `stub://` scenes, image directories)
//! - `detect`: Frame differencing, dilation and contour measurement
//! - `gate`: Cooldown-based debounce gates
//! - `sink`: Snapshot store and event publisher contracts
//! - `transport`: MQTT endpoint parsing and the one-shot publisher
//! - `pipeline`: The capture -> detect -> gate -> act loop
//! - `config`: File and environment configuration

pub mod clock;
pub mod config;
pub mod detect;
pub mod error;
pub mod frame;
pub mod gate;
pub mod ingest;
pub mod pipeline;
pub mod sink;
pub mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RoomwatchConfig;
pub use detect::{ChangeDetector, ChangeReport, DetectorSettings, MotionDetector};
pub use error::{AcquisitionError, PublishError, SnapshotError};
pub use frame::{Frame, IntensityMap};
pub use gate::DebounceGate;
pub use ingest::{open_source, DirectorySource, FrameSource, SourceSettings, SyntheticSource};
pub use pipeline::{CancelToken, Pipeline, PipelineSettings, RunSummary};
pub use sink::{DirectorySnapshotStore, EventPublisher, NullPublisher, SnapshotStore};
pub use transport::{MqttPublisher, MqttSettings};
