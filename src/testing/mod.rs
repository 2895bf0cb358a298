//! Testing utilities for CrabSnap
//!
//! In-memory stand-ins for every host seam, so sessions can be exercised
//! without camera hardware or a webview.

pub mod fakes;
pub mod logs;
pub mod synthetic_data;

pub use fakes::{CanvasOp, FakeCue, FakeMediaDevices, FakeStream, FakeTrack, FakeVideoSurface, RecordingCanvas};
pub use logs::LogCapture;
pub use synthetic_data::{split_frame, synthetic_video_frame};
