//! roomwatchd - motion watcher daemon
//!
//! This daemon:
//! 1. Captures frames from the configured source (synthetic or image directory)
//! 2. Compares every frame with the previous one
//! 3. On motion, saves a JPEG snapshot (debounced by the snapshot cooldown)
//! 4. On motion, publishes a notification to MQTT (debounced independently)
//!
//! Stop with Ctrl-C; the source is released and a run summary is logged.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use roomwatch::config::validate_topic;
use roomwatch::sink::{EventPublisher, NullPublisher};
use roomwatch::transport::{parse_mqtt_endpoint, TlsMaterials};
use roomwatch::{
    open_source, CancelToken, ChangeDetector, DirectorySnapshotStore, MqttPublisher, MqttSettings,
    Pipeline, RoomwatchConfig, SystemClock,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Watch a camera for motion, save snapshots and notify over MQTT")]
struct Args {
    /// JSON config file.
    #[arg(long, env = "ROOMWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Frame source: stub://<name> or a directory of images.
    #[arg(long)]
    source: Option<String>,

    /// Directory for motion snapshots.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// MQTT broker address (host:port, mqtt://, mqtts://).
    #[arg(long)]
    mqtt_broker: Option<String>,

    /// MQTT username.
    #[arg(long)]
    mqtt_username: Option<String>,

    /// MQTT password.
    #[arg(long)]
    mqtt_password: Option<String>,

    /// Topic for motion notifications.
    #[arg(long)]
    mqtt_topic: Option<String>,

    /// Minimum changed-region area for motion.
    #[arg(long)]
    threshold: Option<f64>,

    /// Run without a broker; notifications are dropped.
    #[arg(long)]
    no_publish: bool,
}

impl Args {
    fn apply(self, cfg: &mut RoomwatchConfig) {
        if let Some(source) = self.source {
            cfg.source.url = source;
        }
        if let Some(dir) = self.snapshot_dir {
            cfg.snapshots.dir = dir;
        }
        if let Some(broker) = self.mqtt_broker {
            cfg.mqtt.broker = broker;
        }
        if let Some(username) = self.mqtt_username {
            cfg.mqtt.username = Some(username);
        }
        if let Some(password) = self.mqtt_password {
            cfg.mqtt.password = Some(password);
        }
        if let Some(topic) = self.mqtt_topic {
            cfg.mqtt.topic = topic;
        }
        if let Some(threshold) = self.threshold {
            cfg.detector.area_threshold = threshold;
        }
        if self.no_publish {
            cfg.mqtt.enabled = false;
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = RoomwatchConfig::load_unvalidated(args.config.as_deref())?;
    args.apply(&mut cfg);
    cfg.validate()?;

    let publisher = build_publisher(&cfg)?;
    let source = open_source(&cfg.source)
        .with_context(|| format!("failed to open frame source {}", cfg.source.url))?;
    let detector = ChangeDetector::new(cfg.detector.clone());
    let snapshots = DirectorySnapshotStore::new(&cfg.snapshots.dir);

    log::info!("roomwatchd {} starting", env!("CARGO_PKG_VERSION"));
    log::info!(
        "source={} ({}x{}), snapshots in {}",
        cfg.source.url,
        cfg.source.width,
        cfg.source.height,
        cfg.snapshots.dir.display()
    );
    log::info!(
        "threshold={} pixel_delta={} blur_sigma={} dilate={}",
        cfg.detector.area_threshold,
        cfg.detector.pixel_delta,
        cfg.detector.blur_sigma,
        cfg.detector.dilate_iterations
    );

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("error setting Ctrl-C handler")?;

    let mut pipeline = Pipeline::new(
        source,
        detector,
        snapshots,
        publisher,
        SystemClock,
        cfg.pipeline_settings(),
    );
    let summary = pipeline.run(&cancel)?;

    log::info!(
        "roomwatchd stopped; {} snapshots saved to {}",
        summary.snapshots,
        cfg.snapshots.dir.display()
    );
    Ok(())
}

fn build_publisher(cfg: &RoomwatchConfig) -> Result<Box<dyn EventPublisher>> {
    if !cfg.mqtt.enabled {
        log::warn!("MQTT publishing disabled; motion notifications will be dropped");
        return Ok(Box::new(NullPublisher));
    }
    validate_topic(&cfg.mqtt.topic)?;
    let endpoint = parse_mqtt_endpoint(&cfg.mqtt.broker)?;
    let tls = TlsMaterials::load(
        cfg.mqtt.tls_ca_path.as_deref(),
        cfg.mqtt.tls_client_cert_path.as_deref(),
        cfg.mqtt.tls_client_key_path.as_deref(),
    )?;
    let transport = tls.build_transport(&endpoint)?;
    if cfg.mqtt.username.is_none() {
        log::warn!("MQTT username not set; connecting anonymously");
    }
    log::info!("publishing motion to {} on {}", cfg.mqtt.topic, endpoint);

    Ok(Box::new(MqttPublisher::new(
        MqttSettings {
            endpoint,
            client_id: cfg.mqtt.client_id.clone(),
            username: cfg.mqtt.username.clone(),
            password: cfg.mqtt.password.clone(),
            timeout: cfg.mqtt.timeout,
        },
        transport,
    )))
}
