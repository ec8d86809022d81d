use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use roomwatch::config::RoomwatchConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "ROOMWATCH_CONFIG",
        "ROOMWATCH_SOURCE_URL",
        "ROOMWATCH_SNAPSHOT_DIR",
        "ROOMWATCH_MQTT_BROKER",
        "ROOMWATCH_MQTT_USERNAME",
        "ROOMWATCH_MQTT_PASSWORD",
        "ROOMWATCH_MQTT_TOPIC",
        "ROOMWATCH_THRESHOLD",
        "ROOMWATCH_POLL_INTERVAL_MS",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    file
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"{
            "detector": {
                "threshold": 12000,
                "pixel_delta": 30,
                "blur_sigma": 2.0,
                "dilate_iterations": 1
            },
            "snapshots": {
                "dir": "/var/lib/roomwatch/photos",
                "cooldown_secs": 10
            },
            "mqtt": {
                "broker": "mqtt://broker.lan:1884",
                "username": "admin",
                "password": "adminpass",
                "topic": "lab/motion",
                "cooldown_secs": 3
            },
            "source": {
                "url": "stub://lab",
                "width": 320,
                "height": 240,
                "warmup_ms": 0
            },
            "poll_interval_ms": 250
        }"#,
    );

    std::env::set_var("ROOMWATCH_CONFIG", file.path());
    std::env::set_var("ROOMWATCH_MQTT_TOPIC", "server-room/motion");
    std::env::set_var("ROOMWATCH_THRESHOLD", "20000");

    let cfg = RoomwatchConfig::load(None).expect("load config");

    assert_eq!(cfg.detector.area_threshold, 20_000.0);
    assert_eq!(cfg.detector.pixel_delta, 30);
    assert_eq!(cfg.detector.blur_sigma, 2.0);
    assert_eq!(cfg.detector.dilate_iterations, 1);
    assert_eq!(
        cfg.snapshots.dir,
        std::path::PathBuf::from("/var/lib/roomwatch/photos")
    );
    assert_eq!(cfg.snapshots.cooldown, Duration::from_secs(10));
    assert_eq!(cfg.mqtt.broker, "mqtt://broker.lan:1884");
    assert_eq!(cfg.mqtt.username.as_deref(), Some("admin"));
    assert_eq!(cfg.mqtt.topic, "server-room/motion");
    assert_eq!(cfg.mqtt.cooldown, Duration::from_secs(3));
    assert_eq!(cfg.source.url, "stub://lab");
    assert_eq!((cfg.source.width, cfg.source.height), (320, 240));
    assert_eq!(cfg.source.warmup, Duration::ZERO);
    assert_eq!(cfg.poll_interval, Duration::from_millis(250));

    clear_env();
}

#[test]
fn explicit_path_wins_over_env_path() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let env_file = write_config(r#"{ "source": { "url": "stub://from_env" } }"#);
    let arg_file = write_config(r#"{ "source": { "url": "stub://from_arg" } }"#);
    std::env::set_var("ROOMWATCH_CONFIG", env_file.path());

    let cfg = RoomwatchConfig::load(Some(arg_file.path())).expect("load config");
    assert_eq!(cfg.source.url, "stub://from_arg");

    clear_env();
}

#[test]
fn defaults_without_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = RoomwatchConfig::load(None).expect("defaults");
    assert_eq!(cfg.mqtt.broker, "localhost:1883");
    assert_eq!(cfg.mqtt.topic, "server-room/motion");
    assert!(cfg.mqtt.enabled);
    assert_eq!(cfg.snapshots.cooldown, Duration::from_secs(5));
    assert_eq!(cfg.mqtt.cooldown, Duration::from_secs(2));
}

#[test]
fn rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let zero_cooldown = write_config(r#"{ "snapshots": { "cooldown_secs": 0 } }"#);
    assert!(RoomwatchConfig::load(Some(zero_cooldown.path())).is_err());

    let wildcard = write_config(r#"{ "mqtt": { "topic": "server-room/#" } }"#);
    assert!(RoomwatchConfig::load(Some(wildcard.path())).is_err());

    let unknown = write_config(r#"{ "detectr": {} }"#);
    let err = RoomwatchConfig::load(Some(unknown.path())).unwrap_err();
    assert!(err.to_string().contains("invalid config file"));

    std::env::set_var("ROOMWATCH_THRESHOLD", "lots");
    assert!(RoomwatchConfig::load(None).is_err());

    clear_env();
}

#[test]
fn overrides_applied_before_validation_can_fix_file_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(r#"{ "mqtt": { "topic": "server-room/#" } }"#);
    assert!(RoomwatchConfig::load(Some(file.path())).is_err());

    let mut cfg = RoomwatchConfig::load_unvalidated(Some(file.path())).expect("parse only");
    assert_eq!(cfg.mqtt.topic, "server-room/#");
    assert!(cfg.validate().is_err());

    cfg.mqtt.topic = "server-room/motion".to_string();
    cfg.validate().expect("override makes config valid");

    clear_env();
}
