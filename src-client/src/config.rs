//! Configuration management for Attendo.
//!
//! Handles loading and saving user configuration to platform-standard config directories:
//! - Linux: `~/.config/attendo/config.json`
//! - macOS: `~/Library/Application Support/attendo/config.json`
//! - Windows: `%APPDATA%\attendo\config.json`

use attendo_common::validation::{validate_base_url, ValidationError};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::capture::{
    CameraSpec, CaptureSettings, SnapshotOptions, DEFAULT_CAMERA_HEIGHT, DEFAULT_CAMERA_WIDTH,
    DEFAULT_FRAME_COUNT, DEFAULT_FRAME_INTERVAL, DEFAULT_GUIDE_RATIO, DEFAULT_JPEG_QUALITY,
};

/// Environment variable overriding the configured backend URL.
pub const API_URL_ENV: &str = "ATTENDO_API_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,
    #[error("Failed to write config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Camera selection and target resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraConfig {
    /// `auto`, `synthetic`, `file:<path>` or `v4l2:<index>`.
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_device() -> String {
    "auto".to_string()
}

fn default_width() -> u32 {
    DEFAULT_CAMERA_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_CAMERA_HEIGHT
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            width: DEFAULT_CAMERA_WIDTH,
            height: DEFAULT_CAMERA_HEIGHT,
        }
    }
}

impl CameraConfig {
    /// The configured camera, or `auto` when the value is unrecognised.
    pub fn spec(&self) -> CameraSpec {
        CameraSpec::parse(&self.device).unwrap_or_else(|| {
            warn!("Unknown camera device {:?}, using auto", self.device);
            CameraSpec::Auto
        })
    }
}

/// Capture loop tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureConfig {
    #[serde(default = "default_frame_count")]
    pub frame_count: u32,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Face guide size as a fraction of the frame; 0 disables it.
    #[serde(default = "default_guide_ratio")]
    pub guide_ratio: f32,
}

fn default_frame_count() -> u32 {
    DEFAULT_FRAME_COUNT
}

fn default_frame_interval_ms() -> u64 {
    DEFAULT_FRAME_INTERVAL.as_millis() as u64
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_guide_ratio() -> f32 {
    DEFAULT_GUIDE_RATIO
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_count: DEFAULT_FRAME_COUNT,
            frame_interval_ms: default_frame_interval_ms(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            guide_ratio: DEFAULT_GUIDE_RATIO,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl AppConfig {
    /// Backend URL, with the environment override applied.
    pub fn resolve_base_url(&self) -> String {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => self.server.base_url.clone(),
        }
    }

    /// Settings for one capture attempt.
    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            camera_width: self.camera.width,
            camera_height: self.camera.height,
            frame_count: self.capture.frame_count,
            frame_interval: Duration::from_millis(self.capture.frame_interval_ms),
            snapshot: SnapshotOptions {
                jpeg_quality: self.capture.jpeg_quality.clamp(1, 100),
                guide_ratio: self.capture.guide_ratio,
                ..SnapshotOptions::default()
            },
        }
    }

    /// Change the backend URL after validating it.
    pub fn set_server(&mut self, url: &str) -> Result<(), ConfigError> {
        let url = url.trim();
        validate_base_url(url)?;
        self.server.base_url = url.trim_end_matches('/').to_string();
        Ok(())
    }
}

/// Get the path to the config file.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs = ProjectDirs::from("", "", "attendo").ok_or(ConfigError::NoConfigDir)?;
    Ok(proj_dirs.config_dir().join("config.json"))
}

/// Load configuration from disk.
/// Returns default config if the file doesn't exist or is invalid.
pub fn load_config() -> AppConfig {
    match config_path() {
        Ok(path) => load_config_from(&path),
        Err(e) => {
            warn!("Failed to get config path: {}", e);
            AppConfig::default()
        }
    }
}

/// Load configuration from an explicit path, falling back to defaults.
pub fn load_config_from(path: &Path) -> AppConfig {
    if !path.exists() {
        debug!("No config file at {:?}, using defaults", path);
        return AppConfig::default();
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
            Ok(config) => {
                debug!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                warn!("Failed to parse config file: {}. Using defaults.", e);
                AppConfig::default()
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}. Using defaults.", e);
            AppConfig::default()
        }
    }
}

/// Save configuration to the platform config directory.
pub fn save_config(config: &AppConfig) -> Result<PathBuf, ConfigError> {
    let path = config_path()?;
    save_config_to(config, &path)?;
    Ok(path)
}

/// Save configuration to an explicit path, creating parent directories.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    info!("Saved config to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.base_url, "http://localhost:8000/api");
        assert_eq!(config.camera.device, "auto");
        assert_eq!((config.camera.width, config.camera.height), (640, 480));
        assert_eq!(config.capture.frame_count, 20);
        assert_eq!(config.capture.frame_interval_ms, 100);
    }

    #[test]
    fn test_backward_compatible_partial_config() {
        let json = r#"{"server": {"base_url": "https://school.example/api"}}"#;
        let parsed: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.server.base_url, "https://school.example/api");
        assert_eq!(parsed.server.timeout_secs, 15);
        assert_eq!(parsed.capture, CaptureConfig::default());
    }

    #[test]
    fn test_capture_settings_follow_config() {
        let mut config = AppConfig::default();
        config.capture.frame_count = 5;
        config.capture.frame_interval_ms = 250;
        config.capture.jpeg_quality = 0;
        config.camera.width = 320;

        let settings = config.capture_settings();
        assert_eq!(settings.frame_count, 5);
        assert_eq!(settings.frame_interval, Duration::from_millis(250));
        assert_eq!(settings.snapshot.jpeg_quality, 1);
        assert_eq!(settings.camera_width, 320);
    }

    #[test]
    fn test_camera_spec_fallback() {
        let mut config = CameraConfig::default();
        assert_eq!(config.spec(), CameraSpec::Auto);
        config.device = "synthetic".to_string();
        assert_eq!(config.spec(), CameraSpec::Synthetic);
        config.device = "potato".to_string();
        assert_eq!(config.spec(), CameraSpec::Auto);
    }

    #[test]
    fn test_set_server_validates() {
        let mut config = AppConfig::default();
        config.set_server("https://school.example/api/").unwrap();
        assert_eq!(config.server.base_url, "https://school.example/api");

        assert!(config.set_server("ftp://nope").is_err());
        assert_eq!(config.server.base_url, "https://school.example/api");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.camera.device = "file:/tmp/face.png".to_string();
        save_config_to(&config, &path).unwrap();

        assert_eq!(load_config_from(&path), config);
    }

    #[test]
    fn test_invalid_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(load_config_from(&path), AppConfig::default());
        assert_eq!(
            load_config_from(&dir.path().join("missing.json")),
            AppConfig::default()
        );
    }
}
