use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("Permission denied error: {0}")]
    PermissionDenied(String),
    #[error("No video input devices found")]
    NoDevices,
    #[error("Camera device not found: {0}")]
    DeviceNotFound(String),
    #[error("Device enumeration error: {0}")]
    EnumerationError(String),
    #[error("Stream error: {0}")]
    StreamError(String),
    #[error("Capture error: {0}")]
    CaptureError(String),
    #[error("{0} element is not set")]
    MissingSurface(&'static str),
    #[error("Encoding error: {0}")]
    EncodingError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CameraError {
    /// Whether the host refused access rather than failing to deliver it
    pub fn is_permission_error(&self) -> bool {
        matches!(self, CameraError::PermissionDenied(_))
    }
}

impl From<image::ImageError> for CameraError {
    fn from(err: image::ImageError) -> Self {
        CameraError::EncodingError(err.to_string())
    }
}
