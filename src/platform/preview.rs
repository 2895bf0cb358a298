use super::stream::{FrameFeed, NativeStream};
use crate::config::DisplayConfig;
use crate::errors::CameraError;
use crate::host::{VideoFrameSource, VideoSurface};
use crate::types::MirrorTransform;
use image::RgbaImage;
use std::sync::Mutex;

/// Preview surface fed by a native stream
///
/// Keeps the last decoded frame so a snapshot taken after the stream stops
/// shows the stale image rather than nothing.
pub struct PreviewSurface {
    width: u32,
    height: u32,
    transform: MirrorTransform,
    playing: bool,
    feed: Option<FrameFeed>,
    last_frame: Mutex<Option<RgbaImage>>,
}

impl PreviewSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            transform: MirrorTransform::Identity,
            playing: false,
            feed: None,
            last_frame: Mutex::new(None),
        }
    }

    pub fn from_config(display: &DisplayConfig) -> Self {
        let (width, height) = display.resolved_size();
        Self::new(width, height)
    }

    pub fn transform(&self) -> MirrorTransform {
        self.transform
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

impl VideoFrameSource for PreviewSurface {
    fn current_frame(&self) -> Option<RgbaImage> {
        let mut last = self.last_frame.lock().ok()?;
        if self.playing {
            if let Some(frame) = self.feed.as_ref().and_then(FrameFeed::poll) {
                *last = Some(frame);
            }
        }
        last.clone()
    }
}

impl VideoSurface<NativeStream> for PreviewSurface {
    fn attach(&mut self, stream: &NativeStream) {
        self.feed = stream.feed();
        self.playing = false;
    }

    fn detach(&mut self) {
        self.feed = None;
        self.playing = false;
    }

    fn set_transform(&mut self, transform: MirrorTransform) {
        self.transform = transform;
    }

    fn play(&mut self) -> Result<(), CameraError> {
        match &self.feed {
            Some(feed) if feed.is_live() => {
                self.playing = true;
                Ok(())
            }
            Some(_) => Err(CameraError::StreamError("Attached stream has ended".to_string())),
            None => Err(CameraError::StreamError("No stream attached to preview".to_string())),
        }
    }

    fn rendered_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
