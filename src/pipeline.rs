//! Capture -> detect -> gate -> act loop.
//!
//! One iteration fully completes before the next capture begins:
//!
//! 1. Capture a frame from the `FrameSource`.
//! 2. Run the detector against the previous frame.
//! 3. If motion was detected, try the snapshot gate and the publish gate
//!    independently; each successful fire triggers its sink.
//! 4. Sleep the poll interval.
//!
//! Sink failures are logged and counted; they never stop the loop or touch
//! gate state. An `AcquisitionError` is fatal. The source is closed on every
//! exit path, including unwinding.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::Result;

use crate::clock::Clock;
use crate::detect::{ChangeReport, MotionDetector};
use crate::error::AcquisitionError;
use crate::frame::Frame;
use crate::gate::DebounceGate;
use crate::ingest::FrameSource;
use crate::sink::{EventPublisher, SnapshotStore};

/// Payload published while motion is active.
pub const MOTION_PAYLOAD: &str = "1";
pub const DEFAULT_TOPIC: &str = "server-room/motion";

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineSettings {
    pub snapshot_cooldown: Duration,
    pub publish_cooldown: Duration,
    /// Pause between iterations; also the resolution of both cooldowns.
    pub poll_interval: Duration,
    pub topic: String,
    pub payload: String,
    /// How often to log a health line. Zero disables it.
    pub health_log_interval: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            snapshot_cooldown: Duration::from_secs(5),
            publish_cooldown: Duration::from_secs(2),
            poll_interval: Duration::from_millis(100),
            topic: DEFAULT_TOPIC.to_string(),
            payload: MOTION_PAYLOAD.to_string(),
            health_log_interval: Duration::from_secs(60),
        }
    }
}

/// Cooperative cancellation flag, checked once per iteration.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// What happened to one action in one iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActionOutcome {
    /// No motion, the gate was not consulted.
    #[default]
    Idle,
    /// Motion, but the gate was still cooling down.
    Suppressed,
    Succeeded,
    /// The gate fired but the sink failed. The failure was logged.
    Failed,
}

impl ActionOutcome {
    /// True when the gate fired, whatever the sink did.
    pub fn fired(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepOutcome {
    pub captured_at: Option<SystemTime>,
    pub report: ChangeReport,
    pub snapshot: ActionOutcome,
    pub publish: ActionOutcome,
}

/// Counters for one pipeline run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: u64,
    pub motion_frames: u64,
    pub snapshots: u64,
    pub snapshot_failures: u64,
    pub publishes: u64,
    pub publish_failures: u64,
}

pub struct Pipeline<S, D, K, P, C>
where
    S: FrameSource,
    D: MotionDetector,
    K: SnapshotStore,
    P: EventPublisher,
    C: Clock,
{
    source: S,
    detector: D,
    snapshots: K,
    publisher: P,
    clock: C,
    settings: PipelineSettings,
    snapshot_gate: DebounceGate,
    publish_gate: DebounceGate,
    summary: RunSummary,
    connected: bool,
    closed: bool,
    last_health_log: Option<SystemTime>,
}

impl<S, D, K, P, C> Pipeline<S, D, K, P, C>
where
    S: FrameSource,
    D: MotionDetector,
    K: SnapshotStore,
    P: EventPublisher,
    C: Clock,
{
    pub fn new(
        source: S,
        detector: D,
        snapshots: K,
        publisher: P,
        clock: C,
        settings: PipelineSettings,
    ) -> Self {
        let snapshot_gate = DebounceGate::new("snapshot", settings.snapshot_cooldown);
        let publish_gate = DebounceGate::new("publish", settings.publish_cooldown);
        Self {
            source,
            detector,
            snapshots,
            publisher,
            clock,
            settings,
            snapshot_gate,
            publish_gate,
            summary: RunSummary::default(),
            connected: false,
            closed: false,
            last_health_log: None,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn snapshot_gate(&self) -> &DebounceGate {
        &self.snapshot_gate
    }

    pub fn publish_gate(&self) -> &DebounceGate {
        &self.publish_gate
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn snapshots(&self) -> &K {
        &self.snapshots
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Run one capture/detect/gate/act iteration. Does not sleep.
    pub fn step(&mut self) -> Result<StepOutcome, AcquisitionError> {
        if self.closed {
            return Err(AcquisitionError::Closed);
        }
        if !self.connected {
            self.source.connect()?;
            self.connected = true;
            let warmup = self.source.warmup();
            if !warmup.is_zero() {
                log::info!("waiting {:?} for the frame source to settle", warmup);
                self.clock.sleep(warmup);
            }
        }

        let frame = self.source.next_frame()?;
        let now = self.clock.now();
        let report = self.detector.observe(&frame);
        self.summary.iterations += 1;

        let mut outcome = StepOutcome {
            captured_at: Some(now),
            report,
            ..StepOutcome::default()
        };
        if !report.motion_detected {
            return Ok(outcome);
        }
        self.summary.motion_frames += 1;
        log::debug!(
            "motion on frame {} (area={:.0}, regions={})",
            frame.sequence,
            report.max_region_area,
            report.regions
        );

        outcome.snapshot = if self.snapshot_gate.try_fire(now) {
            self.persist(&frame, now, &report)
        } else {
            ActionOutcome::Suppressed
        };
        outcome.publish = if self.publish_gate.try_fire(now) {
            self.publish(now)
        } else {
            ActionOutcome::Suppressed
        };

        Ok(outcome)
    }

    /// Loop until `cancel` is set or the source fails, then close the source.
    pub fn run(&mut self, cancel: &CancelToken) -> Result<RunSummary> {
        log::info!(
            "pipeline running: detector={}, snapshot cooldown={:?}, publish cooldown={:?}, poll={:?}, topic={}",
            self.detector.name(),
            self.settings.snapshot_cooldown,
            self.settings.publish_cooldown,
            self.settings.poll_interval,
            self.settings.topic
        );

        let result = self.run_loop(cancel);
        self.close();

        log::info!(
            "pipeline stopped: {} frames, {} with motion, {} snapshots ({} failed), {} publishes ({} failed)",
            self.summary.iterations,
            self.summary.motion_frames,
            self.summary.snapshots,
            self.summary.snapshot_failures,
            self.summary.publishes,
            self.summary.publish_failures
        );

        result?;
        Ok(self.summary)
    }

    /// Release the frame source. Safe to call repeatedly.
    pub fn close(&mut self) {
        if !self.closed {
            self.source.close();
            self.closed = true;
            self.connected = false;
        }
    }

    fn run_loop(&mut self, cancel: &CancelToken) -> Result<(), AcquisitionError> {
        loop {
            if cancel.is_cancelled() {
                log::info!("shutdown requested, stopping pipeline");
                return Ok(());
            }
            if let Err(e) = self.step() {
                log::error!("frame acquisition failed: {}", e);
                return Err(e);
            }
            self.maybe_log_health();
            self.clock.sleep(self.settings.poll_interval);
        }
    }

    fn persist(&mut self, frame: &Frame, now: SystemTime, report: &ChangeReport) -> ActionOutcome {
        match self.snapshots.persist_snapshot(frame, now) {
            Ok(path) => {
                self.summary.snapshots += 1;
                log::info!(
                    "snapshot saved: {} (area={:.0})",
                    path.display(),
                    report.max_region_area
                );
                ActionOutcome::Succeeded
            }
            Err(e) => {
                self.summary.snapshot_failures += 1;
                log::error!("snapshot failed: {}", e);
                ActionOutcome::Failed
            }
        }
    }

    fn publish(&mut self, now: SystemTime) -> ActionOutcome {
        let topic = &self.settings.topic;
        let payload = &self.settings.payload;
        match self.publisher.publish_event(topic, payload, now) {
            Ok(()) => {
                self.summary.publishes += 1;
                log::info!("published {} = {}", topic, payload);
                ActionOutcome::Succeeded
            }
            Err(e) => {
                self.summary.publish_failures += 1;
                log::error!("publish to {} failed: {}", topic, e);
                ActionOutcome::Failed
            }
        }
    }

    fn maybe_log_health(&mut self) {
        if self.settings.health_log_interval.is_zero() {
            return;
        }
        let now = self.clock.now();
        let due = match self.last_health_log {
            None => {
                self.last_health_log = Some(now);
                false
            }
            Some(last) => now
                .duration_since(last)
                .map(|elapsed| elapsed >= self.settings.health_log_interval)
                .unwrap_or(false),
        };
        if due {
            let stats = self.source.stats();
            log::info!(
                "health: source={} healthy={} captured={} motion_frames={} snapshots={} publishes={}",
                stats.source,
                self.source.is_healthy(),
                stats.frames_captured,
                self.summary.motion_frames,
                self.summary.snapshots,
                self.summary.publishes
            );
            self.last_health_log = Some(now);
        }
    }
}

impl<S, D, K, P, C> Drop for Pipeline<S, D, K, P, C>
where
    S: FrameSource,
    D: MotionDetector,
    K: SnapshotStore,
    P: EventPublisher,
    C: Clock,
{
    fn drop(&mut self) {
        self.close();
    }
}
