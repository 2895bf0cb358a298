//! CrabSnap: webcam sessions and snapshot capture for Tauri applications
//!
//! This crate wraps camera access behind a small session object:
//! ask for permission, list cameras, pick the front or back camera, bind the
//! feed to a preview, and copy a single frame to a PNG data URL.
//!
//! # Features
//! - Front/back camera selection from device labels
//! - Mirrored preview and snapshots for user-facing cameras
//! - One held stream per session, released before every new request
//! - Host seams as traits, with a native `nokhwa` backend and in-memory fakes
//!
//! # Usage
//! ```rust,ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(crabsnap::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! Outside Tauri, build a [`CameraSession`] over any [`host::MediaDevices`]:
//! ```rust,ignore
//! let mut session = CameraSession::new(
//!     NativeMediaDevices::default(),
//!     PreviewSurface::new(640, 480),
//!     CrabSnapConfig::default(),
//! );
//! session.start(true).await;
//! let mut canvas = RasterCanvas::default();
//! let png_url = session.capture_frame(Some(&mut canvas), None);
//! ```
pub mod canvas;
pub mod commands;
pub mod config;
pub mod errors;
pub mod host;
pub mod permissions;
pub mod platform;
pub mod session;
pub mod types;

// Testing utilities - in-memory host for offline testing
pub mod testing;

// Re-exports for convenience
pub use canvas::{RasterCanvas, SnapshotLink};
pub use config::CrabSnapConfig;
pub use errors::CameraError;
pub use platform::{NativeMediaDevices, PreviewSurface};
pub use session::CameraSession;
pub use types::{DeviceDescriptor, DeviceKind, FacingMode, MediaConstraints, MirrorTransform, StartOutcome};

use tauri::{
    plugin::{Builder, TauriPlugin},
    Runtime,
};

/// Initialize the CrabSnap plugin with all commands
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("crabsnap")
        .invoke_handler(tauri::generate_handler![
            // Session commands
            commands::session::start_camera,
            commands::session::list_cameras,
            commands::session::flip_camera,
            commands::session::set_facing_mode,
            commands::session::stop_camera,
            commands::session::capture_snapshot,
            commands::session::clear_snapshot,
            commands::session::get_session_state,
            // Permission commands
            commands::permissions::request_camera_permission,
            commands::permissions::check_camera_permission_status,
            // Configuration commands
            commands::config::get_config,
            commands::config::update_config,
            commands::config::reset_config,
        ])
        .build()
}

/// Initialize logging for the camera system
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabsnap=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        queried_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub queried_at: String,
}
