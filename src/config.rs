//! Configuration management for CrabSnap
//!
//! Provides loading, saving and validation of session defaults, preview
//! surface sizing and snapshot options.

use crate::errors::CameraError;
use crate::types::FacingMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CrabSnapConfig {
    pub session: SessionConfig,
    pub display: DisplayConfig,
    pub capture: CaptureConfig,
}

/// Session defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Facing mode a new session starts with
    pub facing_mode: FacingMode,
}

/// Preview surface configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Preview width in pixels
    pub width: u32,
    /// Preview height in pixels; 0 derives it from width at 4:3
    pub height: u32,
    /// Mirror the preview and snapshots when facing the user
    pub mirror_user_facing: bool,
}

/// Snapshot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Play the shutter cue on capture, when one is attached
    pub play_shutter_sound: bool,
    /// MIME type of the snapshot data URL
    pub image_format: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::User,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 0,
            mirror_user_facing: true,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            play_shutter_sound: true,
            image_format: "image/png".to_string(),
        }
    }
}

impl DisplayConfig {
    /// Width and height with the 4:3 fallback applied
    pub fn resolved_size(&self) -> (u32, u32) {
        let width = if self.width == 0 { 640 } else { self.width };
        let height = if self.height == 0 {
            (u64::from(width) * 3 / 4) as u32
        } else {
            self.height
        };
        (width, height)
    }
}

impl CrabSnapConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CameraError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: CrabSnapConfig = toml::from_str(&contents)
            .map_err(|e| CameraError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    CameraError::ConfigError(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| CameraError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| CameraError::ConfigError(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("crabsnap.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.display.width > 8192 || self.display.height > 8192 {
            return Err("Display size must not exceed 8192 pixels".to_string());
        }
        if self.capture.image_format != "image/png" {
            return Err(format!(
                "Unsupported snapshot format '{}' (only image/png)",
                self.capture.image_format
            ));
        }
        Ok(())
    }
}
