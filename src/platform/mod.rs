//! Native host backed by `nokhwa`
//!
//! Device ids are the `nokhwa` camera index rendered as a string. Every
//! native camera is reported as a `videoinput` device labelled with its
//! human-readable name.

pub mod preview;
pub mod stream;

pub use preview::PreviewSurface;
pub use stream::{FrameFeed, NativeStream, NativeTrack};

use crate::errors::CameraError;
use crate::host::MediaDevices;
use crate::permissions::check_permission_detailed;
use crate::session::match_facing;
use crate::types::{DeviceDescriptor, MediaConstraints};
use async_trait::async_trait;
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, CameraInfo, RequestedFormat, RequestedFormatType},
    CallbackCamera,
};

/// Camera access through the OS capture backend
#[derive(Debug, Clone, Copy)]
pub struct NativeMediaDevices {
    backend: ApiBackend,
}

impl NativeMediaDevices {
    pub fn new(backend: ApiBackend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> ApiBackend {
        self.backend
    }
}

impl Default for NativeMediaDevices {
    fn default() -> Self {
        Self::new(ApiBackend::Auto)
    }
}

/// Device id string for a `nokhwa` index
pub fn device_id_of(index: &CameraIndex) -> String {
    match index {
        CameraIndex::Index(i) => i.to_string(),
        CameraIndex::String(s) => s.clone(),
    }
}

/// `nokhwa` index for a device id string
pub fn index_of(device_id: &str) -> CameraIndex {
    match device_id.parse::<u32>() {
        Ok(i) => CameraIndex::Index(i),
        Err(_) => CameraIndex::String(device_id.to_string()),
    }
}

fn describe(info: &CameraInfo) -> DeviceDescriptor {
    DeviceDescriptor::video_input(device_id_of(info.index()), info.human_name())
}

fn list_video_inputs(backend: ApiBackend) -> Result<Vec<DeviceDescriptor>, CameraError> {
    let cameras = query(backend)
        .map_err(|e| CameraError::EnumerationError(format!("Failed to query cameras: {}", e)))?;
    Ok(cameras.iter().map(describe).collect())
}

/// Map a backend failure, keeping refusals distinguishable
fn open_error(err: nokhwa::NokhwaError) -> CameraError {
    let message = err.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("permission") || lowered.contains("denied") || lowered.contains("not authorized") {
        CameraError::PermissionDenied(message)
    } else {
        CameraError::StreamError(format!("Failed to open camera: {}", message))
    }
}

fn open_stream_blocking(
    backend: ApiBackend,
    constraints: &MediaConstraints,
) -> Result<NativeStream, CameraError> {
    let devices = list_video_inputs(backend)?;

    let device = match constraints.device_id() {
        Some(device_id) => devices
            .iter()
            .find(|d| d.device_id == device_id)
            .ok_or_else(|| CameraError::DeviceNotFound(device_id.to_string()))?,
        // Facing mode is a preference: fall back to the first camera
        None => {
            let facing_mode = constraints.facing_mode().unwrap_or_default();
            match_facing(&devices, facing_mode)
                .or_else(|| devices.first())
                .ok_or(CameraError::NoDevices)?
        }
    };

    log::info!("Opening camera {} ({})", device.device_id, device.label);

    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
    let mut camera = CallbackCamera::new(index_of(&device.device_id), requested, |_| {})
        .map_err(open_error)?;
    camera.open_stream().map_err(open_error)?;

    Ok(NativeStream::new(device.clone(), camera))
}

#[async_trait]
impl MediaDevices for NativeMediaDevices {
    type Stream = NativeStream;

    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<NativeStream, CameraError> {
        if constraints.audio {
            log::warn!("Audio capture requested but not supported, ignoring");
        }

        let permission = check_permission_detailed();
        if !permission.status.allows_request() {
            log::warn!("Camera permission {}: {}", permission.status, permission.message);
            return Err(CameraError::PermissionDenied(permission.message));
        }

        let backend = self.backend;
        let constraints = constraints.clone();
        tokio::task::spawn_blocking(move || open_stream_blocking(backend, &constraints))
            .await
            .map_err(|e| CameraError::StreamError(format!("Task join error: {}", e)))?
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, CameraError> {
        let backend = self.backend;
        tokio::task::spawn_blocking(move || list_video_inputs(backend))
            .await
            .map_err(|e| CameraError::EnumerationError(format!("Task join error: {}", e)))?
    }
}
