//! Seams to the host environment
//!
//! A session never talks to a camera directly. It asks a [`MediaDevices`]
//! implementation for streams and device lists, binds streams to a
//! [`VideoSurface`], and draws snapshots onto a [`DrawingSurface`]. The native
//! implementations live in [`crate::platform`] and [`crate::canvas`]; in-memory
//! fakes live in [`crate::testing`].

use crate::errors::CameraError;
use crate::types::{DeviceDescriptor, MediaConstraints, MirrorTransform, TrackState};
use async_trait::async_trait;
use image::RgbaImage;

/// Permission, stream acquisition and device enumeration
#[async_trait]
pub trait MediaDevices: Send + Sync {
    type Stream: MediaStream;

    /// Ask for access and open a stream matching `constraints`
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Self::Stream, CameraError>;

    /// Every media device the host knows about, of any kind
    async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, CameraError>;
}

/// One constituent track of a stream
pub trait MediaTrack: Send {
    fn id(&self) -> &str;

    /// Release the underlying hardware. Stopping twice is a no-op.
    fn stop(&mut self);

    fn state(&self) -> TrackState;
}

/// A live feed made of one or more tracks
pub trait MediaStream: Send {
    type Track: MediaTrack;

    fn id(&self) -> &str;

    fn tracks(&self) -> &[Self::Track];

    fn tracks_mut(&mut self) -> &mut [Self::Track];

    /// Stop every track of the stream
    fn stop_all(&mut self) {
        for track in self.tracks_mut() {
            track.stop();
        }
    }

    fn is_active(&self) -> bool {
        self.tracks().iter().any(|t| t.state() == TrackState::Live)
    }
}

/// Anything that can hand out the frame it is currently showing
pub trait VideoFrameSource {
    fn current_frame(&self) -> Option<RgbaImage>;
}

/// Element that displays a stream
pub trait VideoSurface<S: MediaStream>: VideoFrameSource + Send {
    fn attach(&mut self, stream: &S);

    fn detach(&mut self);

    fn set_transform(&mut self, transform: MirrorTransform);

    fn play(&mut self) -> Result<(), CameraError>;

    /// Size the surface is rendered at, in pixels
    fn rendered_size(&self) -> (u32, u32);
}

/// 2D drawing target for snapshots
pub trait DrawingSurface: Send {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Resize the backing store. This resets the transform and clears pixels.
    fn resize(&mut self, width: u32, height: u32);

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn translate(&mut self, x: f64, y: f64);

    fn scale(&mut self, x: f64, y: f64);

    fn draw_image(
        &mut self,
        source: &dyn VideoFrameSource,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
    ) -> Result<(), CameraError>;

    fn to_data_url(&self, mime_type: &str) -> Result<String, CameraError>;
}

/// Shutter sound or similar cue
pub trait AudioCue: Send {
    fn play(&mut self) -> Result<(), CameraError>;
}

/// Receives the encoded snapshot, like a download link's href
pub trait LinkSink: Send {
    fn set_href(&mut self, href: String);
}
