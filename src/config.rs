use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::detect::{
    DetectorSettings, DEFAULT_AREA_THRESHOLD, DEFAULT_BLUR_SIGMA, DEFAULT_DILATE_ITERATIONS,
    DEFAULT_PIXEL_DELTA,
};
use crate::ingest::SourceSettings;
use crate::pipeline::{PipelineSettings, DEFAULT_TOPIC, MOTION_PAYLOAD};
use crate::transport::{DEFAULT_CLIENT_ID, DEFAULT_PUBLISH_TIMEOUT};

const DEFAULT_SNAPSHOT_DIR: &str = "motion_photos";
const DEFAULT_SNAPSHOT_COOLDOWN_SECS: u64 = 5;
const DEFAULT_MQTT_BROKER: &str = "localhost:1883";
const DEFAULT_PUBLISH_COOLDOWN_SECS: u64 = 2;
const DEFAULT_SOURCE_URL: &str = "stub://server_room";
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
const DEFAULT_WARMUP_MS: u64 = 2_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_HEALTH_LOG_SECS: u64 = 60;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RoomwatchConfigFile {
    detector: Option<DetectorConfigFile>,
    snapshots: Option<SnapshotConfigFile>,
    mqtt: Option<MqttConfigFile>,
    source: Option<SourceConfigFile>,
    poll_interval_ms: Option<u64>,
    health_log_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectorConfigFile {
    threshold: Option<f64>,
    pixel_delta: Option<u8>,
    blur_sigma: Option<f32>,
    dilate_iterations: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SnapshotConfigFile {
    dir: Option<PathBuf>,
    cooldown_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct MqttConfigFile {
    enabled: Option<bool>,
    broker: Option<String>,
    username: Option<String>,
    password: Option<String>,
    topic: Option<String>,
    client_id: Option<String>,
    cooldown_secs: Option<u64>,
    timeout_secs: Option<u64>,
    tls_ca_path: Option<PathBuf>,
    tls_client_cert_path: Option<PathBuf>,
    tls_client_key_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SourceConfigFile {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    warmup_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RoomwatchConfig {
    pub detector: DetectorSettings,
    pub snapshots: SnapshotSettings,
    pub mqtt: MqttConfig,
    pub source: SourceSettings,
    pub poll_interval: Duration,
    pub health_log_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct SnapshotSettings {
    pub dir: PathBuf,
    pub cooldown: Duration,
}

#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// When false the daemon runs without a broker and drops notifications.
    pub enabled: bool,
    pub broker: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topic: String,
    pub client_id: String,
    pub cooldown: Duration,
    pub timeout: Duration,
    pub tls_ca_path: Option<PathBuf>,
    pub tls_client_cert_path: Option<PathBuf>,
    pub tls_client_key_path: Option<PathBuf>,
}

impl Default for RoomwatchConfig {
    fn default() -> Self {
        Self::from_file(RoomwatchConfigFile::default())
    }
}

impl RoomwatchConfig {
    /// Load from `path` (or `ROOMWATCH_CONFIG`), then apply `ROOMWATCH_*`
    /// overrides, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let cfg = Self::load_unvalidated(path)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Like `load` but skips validation, for callers that apply further
    /// overrides (CLI flags) and validate afterwards.
    pub fn load_unvalidated(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var("ROOMWATCH_CONFIG")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let file_cfg = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => read_config_file(&path)?,
            None => RoomwatchConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        Ok(cfg)
    }

    fn from_file(file: RoomwatchConfigFile) -> Self {
        let detector = file.detector.unwrap_or_default();
        let detector = DetectorSettings {
            area_threshold: detector.threshold.unwrap_or(DEFAULT_AREA_THRESHOLD),
            pixel_delta: detector.pixel_delta.unwrap_or(DEFAULT_PIXEL_DELTA),
            blur_sigma: detector.blur_sigma.unwrap_or(DEFAULT_BLUR_SIGMA),
            dilate_iterations: detector
                .dilate_iterations
                .unwrap_or(DEFAULT_DILATE_ITERATIONS),
        };

        let snapshots = file.snapshots.unwrap_or_default();
        let snapshots = SnapshotSettings {
            dir: snapshots
                .dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_DIR)),
            cooldown: Duration::from_secs(
                snapshots
                    .cooldown_secs
                    .unwrap_or(DEFAULT_SNAPSHOT_COOLDOWN_SECS),
            ),
        };

        let mqtt = file.mqtt.unwrap_or_default();
        let mqtt = MqttConfig {
            enabled: mqtt.enabled.unwrap_or(true),
            broker: mqtt
                .broker
                .unwrap_or_else(|| DEFAULT_MQTT_BROKER.to_string()),
            username: mqtt.username,
            password: mqtt.password,
            topic: mqtt.topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
            client_id: mqtt
                .client_id
                .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            cooldown: Duration::from_secs(
                mqtt.cooldown_secs
                    .unwrap_or(DEFAULT_PUBLISH_COOLDOWN_SECS),
            ),
            timeout: mqtt
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_PUBLISH_TIMEOUT),
            tls_ca_path: mqtt.tls_ca_path,
            tls_client_cert_path: mqtt.tls_client_cert_path,
            tls_client_key_path: mqtt.tls_client_key_path,
        };

        let source = file.source.unwrap_or_default();
        let source = SourceSettings {
            url: source
                .url
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            width: source.width.unwrap_or(DEFAULT_SOURCE_WIDTH),
            height: source.height.unwrap_or(DEFAULT_SOURCE_HEIGHT),
            warmup: Duration::from_millis(source.warmup_ms.unwrap_or(DEFAULT_WARMUP_MS)),
        };

        Self {
            detector,
            snapshots,
            mqtt,
            source,
            poll_interval: Duration::from_millis(
                file.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
            health_log_interval: Duration::from_secs(
                file.health_log_secs.unwrap_or(DEFAULT_HEALTH_LOG_SECS),
            ),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(url) = env_string("ROOMWATCH_SOURCE_URL") {
            self.source.url = url;
        }
        if let Some(dir) = env_string("ROOMWATCH_SNAPSHOT_DIR") {
            self.snapshots.dir = PathBuf::from(dir);
        }
        if let Some(broker) = env_string("ROOMWATCH_MQTT_BROKER") {
            self.mqtt.broker = broker;
        }
        if let Some(username) = env_string("ROOMWATCH_MQTT_USERNAME") {
            self.mqtt.username = Some(username);
        }
        if let Some(password) = env_string("ROOMWATCH_MQTT_PASSWORD") {
            self.mqtt.password = Some(password);
        }
        if let Some(topic) = env_string("ROOMWATCH_MQTT_TOPIC") {
            self.mqtt.topic = topic;
        }
        if let Some(threshold) = env_string("ROOMWATCH_THRESHOLD") {
            self.detector.area_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("ROOMWATCH_THRESHOLD must be a number"))?;
        }
        if let Some(interval) = env_string("ROOMWATCH_POLL_INTERVAL_MS") {
            let millis: u64 = interval.parse().map_err(|_| {
                anyhow!("ROOMWATCH_POLL_INTERVAL_MS must be an integer number of milliseconds")
            })?;
            self.poll_interval = Duration::from_millis(millis);
        }
        Ok(())
    }

    /// Check invariants. Called by `load`; call after applying overrides to
    /// a `load_unvalidated` config.
    pub fn validate(&self) -> Result<()> {
        if self.snapshots.cooldown.is_zero() {
            return Err(anyhow!("snapshot cooldown must be greater than zero"));
        }
        if self.mqtt.cooldown.is_zero() {
            return Err(anyhow!("publish cooldown must be greater than zero"));
        }
        if self.poll_interval.is_zero() {
            return Err(anyhow!("poll interval must be greater than zero"));
        }
        if self.mqtt.timeout.is_zero() {
            return Err(anyhow!("mqtt timeout must be greater than zero"));
        }
        validate_topic(&self.mqtt.topic)?;
        if self.source.url.trim().is_empty() {
            return Err(anyhow!("source url must not be empty"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!(
                "frame size must be non-zero, got {}x{}",
                self.source.width,
                self.source.height
            ));
        }
        if !self.detector.blur_sigma.is_finite() || self.detector.blur_sigma < 0.0 {
            return Err(anyhow!("blur sigma must be a finite value >= 0"));
        }
        if !self.detector.area_threshold.is_finite() || self.detector.area_threshold < 0.0 {
            return Err(anyhow!("area threshold must be a finite value >= 0"));
        }
        if self.snapshots.dir.as_os_str().is_empty() {
            return Err(anyhow!("snapshot directory must not be empty"));
        }
        Ok(())
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            snapshot_cooldown: self.snapshots.cooldown,
            publish_cooldown: self.mqtt.cooldown,
            poll_interval: self.poll_interval,
            topic: self.mqtt.topic.clone(),
            payload: MOTION_PAYLOAD.to_string(),
            health_log_interval: self.health_log_interval,
        }
    }
}

/// Publish topics must be concrete: no wildcards, no empty string.
pub fn validate_topic(topic: &str) -> Result<()> {
    if topic.trim().is_empty() {
        return Err(anyhow!("mqtt topic must not be empty"));
    }
    if topic.contains(['+', '#']) {
        return Err(anyhow!("mqtt topic must not contain wildcards: {}", topic));
    }
    if topic.contains('\0') {
        return Err(anyhow!("mqtt topic must not contain NUL"));
    }
    Ok(())
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_config_file(path: &Path) -> Result<RoomwatchConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
