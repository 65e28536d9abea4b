//! Settings for the `color_teleop` process.
//!
//! Layering, lowest to highest:
//! 1. Built-in defaults (broker `localhost:1883`, client id `server_client`,
//!    camera index 2 at 640x480 and 30 fps, red wraparound off)
//! 2. JSON file named by `TELEOP_CONFIG` (unknown fields are rejected)
//! 3. `TELEOP_*` environment overrides
//!
//! The merged result is validated before it is returned. Command-line flags
//! in the binary apply on top of it.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::detect::Palette;
use crate::ingest::camera::{device_path, CameraConfig};
use crate::transport::mqtt::{parse_mqtt_endpoint, MqttEndpoint, DEFAULT_BROKER_ADDR};

const DEFAULT_CLIENT_ID: &str = "server_client";
const DEFAULT_CAMERA: &str = "2";
const DEFAULT_FRAME_WIDTH: u32 = 640;
const DEFAULT_FRAME_HEIGHT: u32 = 480;
const DEFAULT_TARGET_FPS: u32 = 30;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TeleopConfigFile {
    broker: Option<BrokerConfigFile>,
    camera: Option<CameraConfigFile>,
    detector: Option<DetectorConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct BrokerConfigFile {
    addr: Option<String>,
    client_id: Option<String>,
    username: Option<String>,
    password: Option<String>,
    tls_ca_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectorConfigFile {
    red_wraparound: Option<bool>,
}

/// Settings for the `color_teleop` process.
#[derive(Debug, Clone)]
pub struct TeleopConfig {
    pub broker: BrokerSettings,
    pub camera: CameraConfig,
    /// Also match red hues near the top of the hue circle (170..=180).
    pub red_wraparound: bool,
}

#[derive(Debug, Clone)]
pub struct BrokerSettings {
    pub addr: String,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls_ca_path: Option<PathBuf>,
}

impl TeleopConfig {
    /// Defaults, then the JSON file named by `TELEOP_CONFIG`, then env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("TELEOP_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Like `load`, with an explicit config file path.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => TeleopConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: TeleopConfigFile) -> Self {
        let broker = file.broker.unwrap_or_default();
        let camera = file.camera.unwrap_or_default();
        Self {
            broker: BrokerSettings {
                addr: broker
                    .addr
                    .unwrap_or_else(|| DEFAULT_BROKER_ADDR.to_string()),
                client_id: broker
                    .client_id
                    .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
                username: broker.username,
                password: broker.password,
                tls_ca_path: broker.tls_ca_path,
            },
            camera: CameraConfig {
                device: device_path(camera.device.as_deref().unwrap_or(DEFAULT_CAMERA)),
                width: camera.width.unwrap_or(DEFAULT_FRAME_WIDTH),
                height: camera.height.unwrap_or(DEFAULT_FRAME_HEIGHT),
                target_fps: camera.target_fps.unwrap_or(DEFAULT_TARGET_FPS),
            },
            red_wraparound: file
                .detector
                .and_then(|detector| detector.red_wraparound)
                .unwrap_or(false),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(addr) = non_empty_env("TELEOP_BROKER_ADDR") {
            self.broker.addr = addr;
        }
        if let Some(client_id) = non_empty_env("TELEOP_CLIENT_ID") {
            self.broker.client_id = client_id;
        }
        if let Some(username) = non_empty_env("TELEOP_MQTT_USERNAME") {
            self.broker.username = Some(username);
        }
        if let Some(password) = non_empty_env("TELEOP_MQTT_PASSWORD") {
            self.broker.password = Some(password);
        }
        if let Some(camera) = non_empty_env("TELEOP_CAMERA") {
            self.camera.device = device_path(&camera);
        }
        if let Some(width) = parse_env_u32("TELEOP_FRAME_WIDTH")? {
            self.camera.width = width;
        }
        if let Some(height) = parse_env_u32("TELEOP_FRAME_HEIGHT")? {
            self.camera.height = height;
        }
        if let Some(fps) = parse_env_u32("TELEOP_TARGET_FPS")? {
            self.camera.target_fps = fps;
        }
        if let Some(flag) = non_empty_env("TELEOP_RED_WRAPAROUND") {
            self.red_wraparound = parse_bool(&flag).ok_or_else(|| {
                anyhow!("TELEOP_RED_WRAPAROUND must be true/false, got {}", flag)
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.broker_endpoint()?;
        if self.broker.client_id.trim().is_empty() {
            return Err(anyhow!("broker client_id must not be empty"));
        }
        if self.camera.device.is_empty() {
            return Err(anyhow!("camera device must not be empty"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!(
                "camera frame size must be non-zero, got {}x{}",
                self.camera.width,
                self.camera.height
            ));
        }
        Ok(())
    }

    pub fn broker_endpoint(&self) -> Result<MqttEndpoint> {
        parse_mqtt_endpoint(&self.broker.addr, false)
    }

    pub fn palette(&self) -> Palette {
        if self.red_wraparound {
            Palette::with_red_wraparound()
        } else {
            Palette::standard()
        }
    }
}

fn read_config_file(path: &Path) -> Result<TeleopConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn parse_env_u32(key: &str) -> Result<Option<u32>> {
    match non_empty_env(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} must be a non-negative integer", key)),
        None => Ok(None),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_reference_defaults() {
        let cfg = TeleopConfig::from_file(TeleopConfigFile::default());
        assert_eq!(cfg.broker.addr, "localhost:1883");
        assert_eq!(cfg.broker.client_id, "server_client");
        assert_eq!(cfg.camera.device, "/dev/video2");
        assert_eq!((cfg.camera.width, cfg.camera.height), (640, 480));
        assert!(!cfg.red_wraparound);
        assert_eq!(cfg.palette(), Palette::standard());
    }

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
