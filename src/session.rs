//! Camera session: permission, device selection, preview and snapshots
//!
//! A [`CameraSession`] owns at most one stream at a time. Every acquisition
//! releases the previous stream first, so a session can never keep two feeds
//! of the same camera open.
//!
//! The plain operations (`start`, `list_devices`, `stream`, `capture_frame`)
//! never return errors: failures are logged and the call yields `None`. The
//! `try_*` variants expose the underlying [`CameraError`].

use crate::config::CrabSnapConfig;
use crate::errors::CameraError;
use crate::host::{AudioCue, DrawingSurface, LinkSink, MediaDevices, MediaStream, VideoSurface};
use crate::types::{
    DeviceDescriptor, FacingMode, MediaConstraints, MirrorTransform, SessionState, StartOutcome,
};
use uuid::Uuid;

/// First device whose label hints at `facing_mode`
pub fn match_facing(devices: &[DeviceDescriptor], facing_mode: FacingMode) -> Option<&DeviceDescriptor> {
    let hint = facing_mode.label_hint();
    devices
        .iter()
        .filter(|d| d.is_video_input())
        .find(|d| d.label_contains(hint))
}

pub struct CameraSession<D, V>
where
    D: MediaDevices,
    V: VideoSurface<D::Stream>,
{
    id: Uuid,
    devices: D,
    video: V,
    shutter: Option<Box<dyn AudioCue>>,
    config: CrabSnapConfig,
    facing_mode: FacingMode,
    webcams: Vec<DeviceDescriptor>,
    current_stream: Option<D::Stream>,
    selected_device_id: Option<String>,
    streaming: bool,
}

impl<D, V> CameraSession<D, V>
where
    D: MediaDevices,
    V: VideoSurface<D::Stream>,
{
    pub fn new(devices: D, video: V, config: CrabSnapConfig) -> Self {
        let id = Uuid::new_v4();
        log::debug!("[session {}] created, facing {}", id, config.session.facing_mode);
        Self {
            id,
            devices,
            video,
            shutter: None,
            facing_mode: config.session.facing_mode,
            config,
            webcams: Vec::new(),
            current_stream: None,
            selected_device_id: None,
            streaming: false,
        }
    }

    /// Attach a shutter cue played on capture
    pub fn with_shutter(mut self, cue: Box<dyn AudioCue>) -> Self {
        self.shutter = Some(cue);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn facing_mode(&self) -> FacingMode {
        self.facing_mode
    }

    pub fn set_facing_mode(&mut self, facing_mode: FacingMode) {
        self.facing_mode = facing_mode;
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.webcams
    }

    pub fn device_count(&self) -> usize {
        self.webcams.len()
    }

    pub fn selected_device_id(&self) -> Option<&str> {
        self.selected_device_id.as_deref()
    }

    pub fn has_stream(&self) -> bool {
        self.current_stream.is_some()
    }

    pub fn video(&self) -> &V {
        &self.video
    }

    pub fn video_mut(&mut self) -> &mut V {
        &mut self.video
    }

    pub fn host(&self) -> &D {
        &self.devices
    }

    pub fn config(&self) -> &CrabSnapConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect on the next operation.
    pub fn set_config(&mut self, config: CrabSnapConfig) {
        self.config = config;
    }

    /// Transform for the current facing mode
    pub fn mirror(&self) -> MirrorTransform {
        if self.config.display.mirror_user_facing {
            self.facing_mode.mirror()
        } else {
            MirrorTransform::Identity
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            session_id: self.id.to_string(),
            facing_mode: self.facing_mode,
            selected_device_id: self.selected_device_id.clone(),
            devices: self.webcams.clone(),
            is_streaming: self.streaming,
            has_stream: self.current_stream.is_some(),
            transform: self.mirror(),
        }
    }

    /// Constraints for the next stream request
    ///
    /// Requests by exact device id once one is selected, otherwise by facing
    /// mode. Audio is never requested.
    pub fn build_constraints(&self) -> MediaConstraints {
        match &self.selected_device_id {
            Some(device_id) => MediaConstraints::by_device_id(device_id.clone()),
            None => MediaConstraints::by_facing_mode(self.facing_mode),
        }
    }

    /// Pick the first enumerated camera whose label matches the facing mode
    ///
    /// Leaves the selection alone when no label matches.
    pub fn select_device(&mut self) {
        match match_facing(&self.webcams, self.facing_mode) {
            Some(device) => {
                log::debug!(
                    "[session {}] selected {} ({}) for facing {}",
                    self.id,
                    device.device_id,
                    device.label,
                    self.facing_mode
                );
                self.selected_device_id = Some(device.device_id.clone());
            }
            None => {
                log::debug!(
                    "[session {}] no camera label matches '{}', keeping selection {:?}",
                    self.id,
                    self.facing_mode.label_hint(),
                    self.selected_device_id
                );
            }
        }
    }

    /// Toggle facing mode, update the preview transform and reselect
    pub fn flip(&mut self) {
        self.facing_mode = self.facing_mode.toggle();
        log::info!("[session {}] flipped to {}", self.id, self.facing_mode);
        self.video.set_transform(self.mirror());
        self.select_device();
    }

    /// Release the held stream and mark the session idle
    ///
    /// Safe to call at any time.
    pub fn stop(&mut self) {
        if self.release_stream() {
            self.video.detach();
        }
        self.streaming = false;
    }

    /// Request access, enumerate, select, and optionally start the preview
    pub async fn start(&mut self, begin_streaming: bool) -> Option<StartOutcome> {
        match self.try_start(begin_streaming).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                log::error!("[session {}] failed to start camera: {}", self.id, e);
                None
            }
        }
    }

    pub async fn try_start(&mut self, begin_streaming: bool) -> Result<StartOutcome, CameraError> {
        self.stop();

        let result = self.start_inner(begin_streaming).await;
        if result.is_err() {
            self.stop();
        }
        result
    }

    async fn start_inner(&mut self, begin_streaming: bool) -> Result<StartOutcome, CameraError> {
        let constraints = self.build_constraints();
        log::info!("[session {}] requesting camera access: {:?}", self.id, constraints);
        let stream = self.devices.get_user_media(&constraints).await?;
        self.hold_stream(stream);

        // Device labels are only reliable once access has been granted
        self.try_list_devices().await?;
        if self.webcams.is_empty() {
            return Err(CameraError::NoDevices);
        }
        self.select_device();
        self.streaming = true;

        if begin_streaming {
            let facing_mode = self.try_stream().await?;
            Ok(StartOutcome::Streaming(facing_mode))
        } else {
            Ok(StartOutcome::Selected(self.selected_device_id.clone()))
        }
    }

    /// Enumerate video inputs
    ///
    /// A host with exactly one camera is assumed to have a front camera, so
    /// the facing mode is forced to `user` in that case.
    pub async fn list_devices(&mut self) -> Option<Vec<DeviceDescriptor>> {
        match self.try_list_devices().await {
            Ok(devices) => Some(devices),
            Err(e) => {
                log::error!("[session {}] failed to enumerate devices: {}", self.id, e);
                None
            }
        }
    }

    pub async fn try_list_devices(&mut self) -> Result<Vec<DeviceDescriptor>, CameraError> {
        let all = self.devices.enumerate_devices().await?;
        self.webcams = all.into_iter().filter(|d| d.is_video_input()).collect();

        if self.webcams.len() == 1 {
            self.facing_mode = FacingMode::User;
        }

        if let Some(selected) = &self.selected_device_id {
            if !self.webcams.iter().any(|d| &d.device_id == selected) {
                log::warn!(
                    "[session {}] selected camera {} disappeared, falling back to facing mode",
                    self.id,
                    selected
                );
                self.selected_device_id = None;
            }
        }

        log::info!("[session {}] found {} cameras", self.id, self.webcams.len());
        for device in &self.webcams {
            log::debug!("Camera: {} - {}", device.device_id, device.label);
        }
        Ok(self.webcams.clone())
    }

    /// Open a fresh stream and bind it to the preview
    pub async fn stream(&mut self) -> Option<FacingMode> {
        match self.try_stream().await {
            Ok(facing_mode) => Some(facing_mode),
            Err(e) => {
                log::error!("[session {}] failed to stream camera: {}", self.id, e);
                None
            }
        }
    }

    pub async fn try_stream(&mut self) -> Result<FacingMode, CameraError> {
        let constraints = self.build_constraints();
        if self.release_stream() {
            self.video.detach();
        }

        // The old preview is gone either way
        let stream = match self.devices.get_user_media(&constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                self.streaming = false;
                return Err(e);
            }
        };
        self.video.attach(&stream);
        self.hold_stream(stream);
        self.video.set_transform(self.mirror());
        self.video.play()?;

        log::info!("[session {}] streaming with facing {}", self.id, self.facing_mode);
        Ok(self.facing_mode)
    }

    /// Draw the current preview frame onto `canvas` and encode it
    ///
    /// The data URL is handed to `link` when one is given and returned either
    /// way. Capturing while idle yields a blank or stale frame.
    pub fn capture_frame(
        &mut self,
        canvas: Option<&mut dyn DrawingSurface>,
        link: Option<&mut dyn LinkSink>,
    ) -> Option<String> {
        match self.try_capture_frame(canvas, link) {
            Ok(data_url) => Some(data_url),
            Err(e) => {
                log::error!("[session {}] {}", self.id, e);
                None
            }
        }
    }

    pub fn try_capture_frame(
        &mut self,
        canvas: Option<&mut dyn DrawingSurface>,
        link: Option<&mut dyn LinkSink>,
    ) -> Result<String, CameraError> {
        let canvas = canvas.ok_or(CameraError::MissingSurface("Canvas"))?;

        if self.config.capture.play_shutter_sound {
            if let Some(cue) = self.shutter.as_mut() {
                if let Err(e) = cue.play() {
                    log::warn!("[session {}] shutter cue failed: {}", self.id, e);
                }
            }
        }

        let (width, height) = self.video.rendered_size();
        canvas.resize(width, height);

        let mirror = self.mirror();
        if mirror.is_mirrored() {
            canvas.translate(width as f64, 0.0);
        } else {
            canvas.translate(0.0, 0.0);
        }
        canvas.scale(mirror.scale_x(), 1.0);

        canvas.clear_rect(0.0, 0.0, width as f64, height as f64);
        canvas.draw_image(&self.video, 0.0, 0.0, width as f64, height as f64)?;

        let data_url = canvas.to_data_url(&self.config.capture.image_format)?;
        if let Some(link) = link {
            link.set_href(data_url.clone());
        }

        log::debug!(
            "[session {}] captured {}x{} snapshot ({} bytes encoded)",
            self.id,
            width,
            height,
            data_url.len()
        );
        Ok(data_url)
    }

    /// Wipe a snapshot surface without drawing
    pub fn clear_capture(&self, canvas: Option<&mut dyn DrawingSurface>) {
        if let Some(canvas) = canvas {
            let (width, height) = (canvas.width() as f64, canvas.height() as f64);
            canvas.clear_rect(0.0, 0.0, width, height);
        }
    }

    fn hold_stream(&mut self, stream: D::Stream) {
        if self.release_stream() {
            self.video.detach();
        }
        log::debug!("[session {}] holding stream {}", self.id, stream.id());
        self.current_stream = Some(stream);
    }

    /// Stop and drop the held stream. Returns whether there was one.
    fn release_stream(&mut self) -> bool {
        match self.current_stream.take() {
            Some(mut stream) => {
                log::debug!("[session {}] releasing stream {}", self.id, stream.id());
                stream.stop_all();
                true
            }
            None => false,
        }
    }
}

impl<D, V> Drop for CameraSession<D, V>
where
    D: MediaDevices,
    V: VideoSurface<D::Stream>,
{
    fn drop(&mut self) {
        self.release_stream();
    }
}
