use crate::canvas::RasterCanvas;
use crate::errors::CameraError;
use crate::host::{
    AudioCue, DrawingSurface, MediaDevices, MediaStream, MediaTrack, VideoFrameSource,
    VideoSurface,
};
use crate::types::{DeviceDescriptor, MediaConstraints, MirrorTransform, TrackState};
use async_trait::async_trait;
use image::RgbaImage;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct HostState {
    devices: Vec<DeviceDescriptor>,
    frame: Option<RgbaImage>,
    deny_permission: bool,
    fail_enumeration: bool,
    requests: Vec<MediaConstraints>,
    issued: Vec<Arc<AtomicBool>>,
    live_at_request: Vec<usize>,
    tracks_per_stream: usize,
}

impl HostState {
    fn live_count(&self) -> usize {
        self.issued
            .iter()
            .filter(|live| live.load(Ordering::Acquire))
            .count()
    }
}

/// Scriptable host. Clones share state, so a test can keep one handle while
/// the session owns another.
#[derive(Clone, Default)]
pub struct FakeMediaDevices {
    state: Arc<Mutex<HostState>>,
}

impl FakeMediaDevices {
    pub fn new(devices: Vec<DeviceDescriptor>) -> Self {
        let host = Self::default();
        host.set_devices(devices);
        host
    }

    /// Front and back camera, ids "a" and "b"
    pub fn front_and_back() -> Self {
        Self::new(vec![
            DeviceDescriptor::video_input("a", "Front Camera"),
            DeviceDescriptor::video_input("b", "Back Camera"),
        ])
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_devices(&self, devices: Vec<DeviceDescriptor>) {
        self.lock().devices = devices;
    }

    /// Frame shown by every stream opened from now on
    pub fn set_frame(&self, frame: RgbaImage) {
        self.lock().frame = Some(frame);
    }

    pub fn deny_permission(&self, deny: bool) {
        self.lock().deny_permission = deny;
    }

    pub fn fail_enumeration(&self, fail: bool) {
        self.lock().fail_enumeration = fail;
    }

    /// Number of tracks in each stream opened from now on (at least one)
    pub fn set_tracks_per_stream(&self, count: usize) {
        self.lock().tracks_per_stream = count.max(1);
    }

    /// Live track count seen by each stream request as it arrived
    pub fn live_tracks_at_requests(&self) -> Vec<usize> {
        self.lock().live_at_request.clone()
    }

    /// Constraints of every stream request, in order
    pub fn requests(&self) -> Vec<MediaConstraints> {
        self.lock().requests.clone()
    }

    /// State of every track ever handed out
    pub fn issued_track_states(&self) -> Vec<TrackState> {
        self.lock()
            .issued
            .iter()
            .map(|live| {
                if live.load(Ordering::Acquire) {
                    TrackState::Live
                } else {
                    TrackState::Ended
                }
            })
            .collect()
    }

    pub fn live_track_count(&self) -> usize {
        self.lock().live_count()
    }
}

#[async_trait]
impl MediaDevices for FakeMediaDevices {
    type Stream = FakeStream;

    async fn get_user_media(&self, constraints: &MediaConstraints) -> Result<FakeStream, CameraError> {
        let mut state = self.lock();
        let live = state.live_count();
        state.live_at_request.push(live);
        state.requests.push(constraints.clone());

        if state.deny_permission {
            return Err(CameraError::PermissionDenied("Permission denied by user".to_string()));
        }
        let video_inputs: Vec<&DeviceDescriptor> =
            state.devices.iter().filter(|d| d.is_video_input()).collect();
        if video_inputs.is_empty() {
            return Err(CameraError::NoDevices);
        }
        if let Some(device_id) = constraints.device_id() {
            if !video_inputs.iter().any(|d| d.device_id == device_id) {
                return Err(CameraError::DeviceNotFound(device_id.to_string()));
            }
        }

        let stream_number = state.requests.len();
        let track_count = state.tracks_per_stream.max(1);
        let mut tracks = Vec::with_capacity(track_count);
        for index in 0..track_count {
            let live = Arc::new(AtomicBool::new(true));
            state.issued.push(live.clone());
            tracks.push(FakeTrack {
                id: format!("track-{}-{}", stream_number, index),
                live,
            });
        }

        Ok(FakeStream {
            id: format!("stream-{}", stream_number),
            tracks,
            frame: state.frame.clone(),
        })
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, CameraError> {
        let state = self.lock();
        if state.fail_enumeration {
            return Err(CameraError::EnumerationError("enumerateDevices rejected".to_string()));
        }
        Ok(state.devices.clone())
    }
}

pub struct FakeTrack {
    id: String,
    live: Arc<AtomicBool>,
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop(&mut self) {
        self.live.store(false, Ordering::Release);
    }

    fn state(&self) -> TrackState {
        if self.live.load(Ordering::Acquire) {
            TrackState::Live
        } else {
            TrackState::Ended
        }
    }
}

pub struct FakeStream {
    id: String,
    tracks: Vec<FakeTrack>,
    frame: Option<RgbaImage>,
}

impl MediaStream for FakeStream {
    type Track = FakeTrack;

    fn id(&self) -> &str {
        &self.id
    }

    fn tracks(&self) -> &[FakeTrack] {
        &self.tracks
    }

    fn tracks_mut(&mut self) -> &mut [FakeTrack] {
        &mut self.tracks
    }
}

/// Display surface that remembers what it was told
pub struct FakeVideoSurface {
    pub size: (u32, u32),
    pub attached: Option<String>,
    pub transform: Option<MirrorTransform>,
    pub playing: bool,
    pub play_count: usize,
    frame: Option<RgbaImage>,
}

impl FakeVideoSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            attached: None,
            transform: None,
            playing: false,
            play_count: 0,
            frame: None,
        }
    }
}

impl Default for FakeVideoSurface {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

impl VideoFrameSource for FakeVideoSurface {
    fn current_frame(&self) -> Option<RgbaImage> {
        self.frame.clone()
    }
}

impl VideoSurface<FakeStream> for FakeVideoSurface {
    fn attach(&mut self, stream: &FakeStream) {
        self.attached = Some(stream.id.clone());
        self.frame = stream.frame.clone();
        self.playing = false;
    }

    fn detach(&mut self) {
        self.attached = None;
        self.playing = false;
    }

    fn set_transform(&mut self, transform: MirrorTransform) {
        self.transform = Some(transform);
    }

    fn play(&mut self) -> Result<(), CameraError> {
        if self.attached.is_none() {
            return Err(CameraError::StreamError("No stream attached".to_string()));
        }
        self.playing = true;
        self.play_count += 1;
        Ok(())
    }

    fn rendered_size(&self) -> (u32, u32) {
        self.size
    }
}

/// One call made on a [`RecordingCanvas`]
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasOp {
    Resize(u32, u32),
    ClearRect(f64, f64, f64, f64),
    Translate(f64, f64),
    Scale(f64, f64),
    DrawImage(f64, f64, f64, f64),
}

/// Raster canvas that also logs each call
#[derive(Default)]
pub struct RecordingCanvas {
    pub canvas: RasterCanvas,
    pub ops: Vec<CanvasOp>,
}

impl RecordingCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RasterCanvas::new(width, height),
            ops: Vec::new(),
        }
    }
}

impl DrawingSurface for RecordingCanvas {
    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.ops.push(CanvasOp::Resize(width, height));
        self.canvas.resize(width, height);
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(CanvasOp::ClearRect(x, y, width, height));
        self.canvas.clear_rect(x, y, width, height);
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.ops.push(CanvasOp::Translate(x, y));
        self.canvas.translate(x, y);
    }

    fn scale(&mut self, x: f64, y: f64) {
        self.ops.push(CanvasOp::Scale(x, y));
        self.canvas.scale(x, y);
    }

    fn draw_image(
        &mut self,
        source: &dyn VideoFrameSource,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
    ) -> Result<(), CameraError> {
        self.ops.push(CanvasOp::DrawImage(dx, dy, dw, dh));
        self.canvas.draw_image(source, dx, dy, dw, dh)
    }

    fn to_data_url(&self, mime_type: &str) -> Result<String, CameraError> {
        self.canvas.to_data_url(mime_type)
    }
}

/// Shutter cue counting its plays
#[derive(Clone, Default)]
pub struct FakeCue {
    plays: Arc<AtomicUsize>,
    fail: bool,
}

impl FakeCue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            plays: Arc::new(AtomicUsize::new(0)),
            fail: true,
        }
    }

    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::Acquire)
    }
}

impl AudioCue for FakeCue {
    fn play(&mut self) -> Result<(), CameraError> {
        self.plays.fetch_add(1, Ordering::AcqRel);
        if self.fail {
            return Err(CameraError::CaptureError("play() rejected".to_string()));
        }
        Ok(())
    }
}
