//! Core value types shared by the session, the host seams and the commands
//!
//! Wire shapes follow the browser media API (`videoinput`, `facingMode`,
//! `deviceId: { exact }`) so the types can cross the Tauri boundary unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which way the requested camera should face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FacingMode {
    /// Front camera, pointed at the user
    #[default]
    #[serde(rename = "user")]
    User,
    /// Rear camera, pointed away from the user
    #[serde(rename = "environment", alias = "enviroment")]
    Environment,
}

impl FacingMode {
    /// The other facing mode
    pub fn toggle(self) -> Self {
        match self {
            FacingMode::User => FacingMode::Environment,
            FacingMode::Environment => FacingMode::User,
        }
    }

    /// Label fragment a device of this facing is expected to carry
    pub fn label_hint(self) -> &'static str {
        match self {
            FacingMode::User => "front",
            FacingMode::Environment => "back",
        }
    }

    /// Mirror transform for display and capture of this facing
    pub fn mirror(self) -> MirrorTransform {
        match self {
            FacingMode::User => MirrorTransform::Horizontal,
            FacingMode::Environment => MirrorTransform::Identity,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(FacingMode::User),
            "environment" | "enviroment" => Ok(FacingMode::Environment),
            other => Err(format!("Unknown facing mode: {}", other)),
        }
    }
}

/// Horizontal transform applied to the preview and to captured frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MirrorTransform {
    Identity,
    Horizontal,
}

impl MirrorTransform {
    /// CSS transform value for a display element
    pub fn css(&self) -> &'static str {
        match self {
            MirrorTransform::Identity => "scale(1,1)",
            MirrorTransform::Horizontal => "scale(-1,1)",
        }
    }

    pub fn scale_x(&self) -> f64 {
        match self {
            MirrorTransform::Identity => 1.0,
            MirrorTransform::Horizontal => -1.0,
        }
    }

    pub fn is_mirrored(&self) -> bool {
        matches!(self, MirrorTransform::Horizontal)
    }
}

/// Media device kind as reported by device enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::VideoInput => "videoinput",
            DeviceKind::AudioInput => "audioinput",
            DeviceKind::AudioOutput => "audiooutput",
        }
    }
}

/// Metadata for one capture device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub device_id: String,
    pub label: String,
    pub kind: DeviceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl DeviceDescriptor {
    pub fn new(device_id: impl Into<String>, label: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
            kind,
            group_id: None,
        }
    }

    pub fn video_input(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(device_id, label, DeviceKind::VideoInput)
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn is_video_input(&self) -> bool {
        self.kind == DeviceKind::VideoInput
    }

    /// Case-insensitive label match used for facing heuristics
    pub fn label_contains(&self, needle: &str) -> bool {
        self.label.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// `{ "exact": value }` constraint wrapper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exact<T> {
    pub exact: T,
}

/// Video part of a stream request; exactly one selector is present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VideoConstraints {
    DeviceId {
        #[serde(rename = "deviceId")]
        device_id: Exact<String>,
    },
    FacingMode {
        #[serde(rename = "facingMode")]
        facing_mode: FacingMode,
    },
}

/// Constraints handed to the host when requesting a stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub video: VideoConstraints,
    pub audio: bool,
}

impl MediaConstraints {
    pub fn by_facing_mode(facing_mode: FacingMode) -> Self {
        Self {
            video: VideoConstraints::FacingMode { facing_mode },
            audio: false,
        }
    }

    pub fn by_device_id(device_id: impl Into<String>) -> Self {
        Self {
            video: VideoConstraints::DeviceId {
                device_id: Exact {
                    exact: device_id.into(),
                },
            },
            audio: false,
        }
    }

    pub fn facing_mode(&self) -> Option<FacingMode> {
        match &self.video {
            VideoConstraints::FacingMode { facing_mode } => Some(*facing_mode),
            VideoConstraints::DeviceId { .. } => None,
        }
    }

    pub fn device_id(&self) -> Option<&str> {
        match &self.video {
            VideoConstraints::DeviceId { device_id } => Some(device_id.exact.as_str()),
            VideoConstraints::FacingMode { .. } => None,
        }
    }
}

/// Result of starting a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    /// Preview is live with this facing mode
    Streaming(FacingMode),
    /// Permission granted and a device chosen, preview not started
    Selected(Option<String>),
}

/// Lifecycle of a single media track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackState {
    Live,
    Ended,
}

/// Serializable view of a session for the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub facing_mode: FacingMode,
    pub selected_device_id: Option<String>,
    pub devices: Vec<DeviceDescriptor>,
    pub is_streaming: bool,
    pub has_stream: bool,
    pub transform: MirrorTransform,
}
