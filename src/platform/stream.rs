use crate::host::{MediaStream, MediaTrack};
use crate::types::{DeviceDescriptor, TrackState};
use image::RgbaImage;
use nokhwa::{pixel_format::RgbFormat, CallbackCamera};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Shared read handle on an open camera, used by the preview
#[derive(Clone)]
pub struct FrameFeed {
    camera: Arc<Mutex<CallbackCamera>>,
    live: Arc<AtomicBool>,
}

impl FrameFeed {
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Poll and decode one frame. `None` once the track has been stopped.
    pub fn poll(&self) -> Option<RgbaImage> {
        if !self.is_live() {
            return None;
        }
        let mut camera = self.camera.lock().ok()?;
        let buffer = match camera.poll_frame() {
            Ok(buffer) => buffer,
            Err(e) => {
                log::debug!("Failed to poll frame: {}", e);
                return None;
            }
        };
        let decoded = match buffer.decode_image::<RgbFormat>() {
            Ok(decoded) => decoded,
            Err(e) => {
                log::debug!("Failed to decode frame: {}", e);
                return None;
            }
        };
        let (width, height) = (decoded.width(), decoded.height());
        let rgb = image::RgbImage::from_raw(width, height, decoded.into_raw())?;
        Some(image::DynamicImage::ImageRgb8(rgb).to_rgba8())
    }
}

/// Video track of a native camera
pub struct NativeTrack {
    id: String,
    label: String,
    camera: Arc<Mutex<CallbackCamera>>,
    live: Arc<AtomicBool>,
}

impl NativeTrack {
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl MediaTrack for NativeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop(&mut self) {
        if !self.live.swap(false, Ordering::AcqRel) {
            return;
        }
        match self.camera.lock() {
            Ok(mut camera) => {
                if let Err(e) = camera.stop_stream() {
                    log::warn!("Failed to stop camera track {}: {}", self.id, e);
                } else {
                    log::debug!("Camera track {} stopped", self.id);
                }
            }
            Err(_) => log::warn!("Camera track {} lock poisoned, not stopped cleanly", self.id),
        }
    }

    fn state(&self) -> TrackState {
        if self.live.load(Ordering::Acquire) {
            TrackState::Live
        } else {
            TrackState::Ended
        }
    }
}

/// An open native camera feed
pub struct NativeStream {
    id: String,
    device: DeviceDescriptor,
    tracks: Vec<NativeTrack>,
}

impl NativeStream {
    pub fn new(device: DeviceDescriptor, camera: CallbackCamera) -> Self {
        let track = NativeTrack {
            id: Uuid::new_v4().to_string(),
            label: device.label.clone(),
            camera: Arc::new(Mutex::new(camera)),
            live: Arc::new(AtomicBool::new(true)),
        };
        Self {
            id: Uuid::new_v4().to_string(),
            device,
            tracks: vec![track],
        }
    }

    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }

    /// Frame access for the first video track
    pub fn feed(&self) -> Option<FrameFeed> {
        self.tracks.first().map(|track| FrameFeed {
            camera: track.camera.clone(),
            live: track.live.clone(),
        })
    }
}

impl MediaStream for NativeStream {
    type Track = NativeTrack;

    fn id(&self) -> &str {
        &self.id
    }

    fn tracks(&self) -> &[NativeTrack] {
        &self.tracks
    }

    fn tracks_mut(&mut self) -> &mut [NativeTrack] {
        &mut self.tracks
    }
}

impl Drop for NativeStream {
    fn drop(&mut self) {
        self.stop_all();
    }
}
