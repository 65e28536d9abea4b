use std::sync::Mutex;

use tempfile::NamedTempFile;

use color_teleop::{Palette, TeleopConfig};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "TELEOP_CONFIG",
        "TELEOP_BROKER_ADDR",
        "TELEOP_CLIENT_ID",
        "TELEOP_MQTT_USERNAME",
        "TELEOP_MQTT_PASSWORD",
        "TELEOP_CAMERA",
        "TELEOP_FRAME_WIDTH",
        "TELEOP_FRAME_HEIGHT",
        "TELEOP_TARGET_FPS",
        "TELEOP_RED_WRAPAROUND",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = TeleopConfig::load().expect("load config");
    assert_eq!(cfg.broker.addr, "localhost:1883");
    assert_eq!(cfg.broker.client_id, "server_client");
    assert_eq!(cfg.camera.device, "/dev/video2");
    assert_eq!(cfg.camera.target_fps, 30);
    assert!(!cfg.red_wraparound);

    let endpoint = cfg.broker_endpoint().expect("endpoint");
    assert_eq!(endpoint.host, "localhost");
    assert_eq!(endpoint.port, 1883);
    assert!(!endpoint.use_tls);
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "broker": {
            "addr": "mqtt://broker.lan:1884",
            "client_id": "bench_station",
            "username": "operator"
        },
        "camera": {
            "device": "0",
            "width": 320,
            "height": 240,
            "target_fps": 15
        },
        "detector": {
            "red_wraparound": true
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("TELEOP_CONFIG", file.path());
    std::env::set_var("TELEOP_CAMERA", "stub://bench");
    std::env::set_var("TELEOP_MQTT_PASSWORD", "hunter2");
    std::env::set_var("TELEOP_TARGET_FPS", "10");

    let cfg = TeleopConfig::load().expect("load config");

    assert_eq!(cfg.broker.addr, "mqtt://broker.lan:1884");
    assert_eq!(cfg.broker.client_id, "bench_station");
    assert_eq!(cfg.broker.username.as_deref(), Some("operator"));
    assert_eq!(cfg.broker.password.as_deref(), Some("hunter2"));
    assert_eq!(cfg.camera.device, "stub://bench");
    assert_eq!((cfg.camera.width, cfg.camera.height), (320, 240));
    assert_eq!(cfg.camera.target_fps, 10);
    assert!(cfg.red_wraparound);
    assert_eq!(cfg.palette(), Palette::with_red_wraparound());

    let endpoint = cfg.broker_endpoint().expect("endpoint");
    assert_eq!((endpoint.host.as_str(), endpoint.port), ("broker.lan", 1884));

    clear_env();
}

#[test]
fn unknown_fields_are_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, br#"{ "broker": { "hostname": "x" } }"#)
        .expect("write config");

    let err = TeleopConfig::load_from(Some(file.path())).unwrap_err();
    assert!(err.to_string().contains("invalid config file"));
}

#[test]
fn bad_env_values_are_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("TELEOP_FRAME_WIDTH", "wide");
    assert!(TeleopConfig::load().is_err());
    clear_env();

    std::env::set_var("TELEOP_FRAME_HEIGHT", "0");
    assert!(TeleopConfig::load().is_err());
    clear_env();

    std::env::set_var("TELEOP_RED_WRAPAROUND", "sometimes");
    assert!(TeleopConfig::load().is_err());
    clear_env();

    std::env::set_var("TELEOP_BROKER_ADDR", ":1883");
    assert!(TeleopConfig::load().is_err());
    clear_env();
}
