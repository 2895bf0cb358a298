use crate::canvas::{RasterCanvas, SnapshotLink};
use crate::config::CrabSnapConfig;
use crate::platform::{NativeMediaDevices, PreviewSurface};
use crate::session::CameraSession;
use crate::types::{DeviceDescriptor, FacingMode, SessionState, StartOutcome};
use std::sync::Arc;
use tauri::command;
use tokio::sync::Mutex;

pub type NativeSession = CameraSession<NativeMediaDevices, PreviewSurface>;

/// The app-wide session plus the surface its snapshots are drawn on
pub struct SessionSlot {
    pub session: NativeSession,
    pub canvas: RasterCanvas,
    pub link: SnapshotLink,
}

impl SessionSlot {
    fn new(config: CrabSnapConfig) -> Self {
        let preview = PreviewSurface::from_config(&config.display);
        Self {
            session: CameraSession::new(NativeMediaDevices::default(), preview, config),
            canvas: RasterCanvas::default(),
            link: SnapshotLink::new(),
        }
    }
}

lazy_static::lazy_static! {
    static ref SESSION: Arc<Mutex<Option<SessionSlot>>> = Arc::new(Mutex::new(None));
}

fn ensure(slot: &mut Option<SessionSlot>) -> &mut SessionSlot {
    slot.get_or_insert_with(|| {
        log::info!("Creating camera session");
        SessionSlot::new(crate::commands::config::current_config())
    })
}

/// Push a new configuration into the live session, if any
pub async fn apply_config(config: CrabSnapConfig) {
    let mut guard = SESSION.lock().await;
    if let Some(slot) = guard.as_mut() {
        let (width, height) = config.display.resolved_size();
        slot.session.video_mut().set_size(width, height);
        slot.session.set_config(config);
        log::debug!("Session config updated, preview {}x{}", width, height);
    }
}

/// Request access, pick a camera and optionally start the preview
#[command]
pub async fn start_camera(begin_streaming: Option<bool>) -> Result<StartOutcome, String> {
    let begin_streaming = begin_streaming.unwrap_or(true);
    log::info!("Starting camera (begin_streaming: {})", begin_streaming);

    let mut guard = SESSION.lock().await;
    let slot = ensure(&mut guard);
    match slot.session.try_start(begin_streaming).await {
        Ok(outcome) => {
            log::info!("Camera started: {:?}", outcome);
            Ok(outcome)
        }
        Err(e) => {
            log::error!("Failed to start camera: {}", e);
            Err(format!("Failed to start camera: {}", e))
        }
    }
}

/// List video input devices
#[command]
pub async fn list_cameras() -> Result<Vec<DeviceDescriptor>, String> {
    let mut guard = SESSION.lock().await;
    let slot = ensure(&mut guard);
    slot.session.try_list_devices().await.map_err(|e| {
        log::error!("Failed to list cameras: {}", e);
        format!("Failed to list cameras: {}", e)
    })
}

/// Switch between front and back camera
///
/// With `restart` set and a session running, the preview is reopened on the
/// newly selected camera.
#[command]
pub async fn flip_camera(restart: Option<bool>) -> Result<SessionState, String> {
    let mut guard = SESSION.lock().await;
    let slot = ensure(&mut guard);
    slot.session.flip();

    if restart.unwrap_or(false) && slot.session.is_streaming() {
        slot.session.try_stream().await.map_err(|e| {
            log::error!("Failed to restart preview after flip: {}", e);
            format!("Failed to restart preview: {}", e)
        })?;
    }
    Ok(slot.session.state())
}

#[command]
pub async fn set_facing_mode(facing_mode: FacingMode) -> Result<SessionState, String> {
    let mut guard = SESSION.lock().await;
    let slot = ensure(&mut guard);
    slot.session.set_facing_mode(facing_mode);
    slot.session.select_device();
    Ok(slot.session.state())
}

/// Stop every track and release the camera
#[command]
pub async fn stop_camera() -> Result<SessionState, String> {
    let mut guard = SESSION.lock().await;
    let slot = ensure(&mut guard);
    slot.session.stop();
    log::info!("Camera stopped");
    Ok(slot.session.state())
}

/// Capture the current preview frame as a PNG data URL
#[command]
pub async fn capture_snapshot() -> Result<String, String> {
    let mut guard = SESSION.lock().await;
    let slot = ensure(&mut guard);
    if !slot.session.is_streaming() {
        log::warn!("Capturing while the camera is idle, frame may be blank or stale");
    }

    let SessionSlot {
        session,
        canvas,
        link,
    } = slot;
    session
        .try_capture_frame(Some(canvas), Some(link))
        .map_err(|e| {
            log::error!("Failed to capture snapshot: {}", e);
            format!("Failed to capture snapshot: {}", e)
        })
}

/// Blank the snapshot surface
#[command]
pub async fn clear_snapshot() -> Result<(), String> {
    let mut guard = SESSION.lock().await;
    if let Some(slot) = guard.as_mut() {
        slot.session.clear_capture(Some(&mut slot.canvas));
        slot.link = SnapshotLink::new();
    }
    Ok(())
}

#[command]
pub async fn get_session_state() -> Result<SessionState, String> {
    let mut guard = SESSION.lock().await;
    Ok(ensure(&mut guard).session.state())
}
