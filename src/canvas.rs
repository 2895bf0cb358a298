//! In-memory snapshot surface
//!
//! [`RasterCanvas`] behaves like a browser 2D canvas restricted to what a
//! snapshot needs: translate/scale transforms, clearing, drawing a video frame
//! and PNG data URL export.

use crate::errors::CameraError;
use crate::host::{DrawingSurface, LinkSink, VideoFrameSource};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

pub const PNG_MIME: &str = "image/png";
const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Axis-aligned affine transform: device = translate + scale * user
#[derive(Debug, Clone, Copy, PartialEq)]
struct Transform {
    sx: f64,
    sy: f64,
    tx: f64,
    ty: f64,
}

impl Transform {
    const IDENTITY: Transform = Transform {
        sx: 1.0,
        sy: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Device-space rectangle covered by a user-space rectangle
    fn map_rect(&self, x: f64, y: f64, w: f64, h: f64) -> (f64, f64, f64, f64) {
        let x0 = self.tx + self.sx * x;
        let x1 = self.tx + self.sx * (x + w);
        let y0 = self.ty + self.sy * y;
        let y1 = self.ty + self.sy * (y + h);
        (x0.min(x1), y0.min(y1), (x1 - x0).abs(), (y1 - y0).abs())
    }
}

pub struct RasterCanvas {
    image: RgbaImage,
    transform: Transform,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            transform: Transform::IDENTITY,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x < self.image.width() && y < self.image.height() {
            Some(*self.image.get_pixel(x, y))
        } else {
            None
        }
    }

    /// Whether a transform other than identity is active
    pub fn is_transformed(&self) -> bool {
        self.transform != Transform::IDENTITY
    }

    /// Encoded PNG bytes of the current contents
    pub fn to_png(&self) -> Result<Vec<u8>, CameraError> {
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(self.image.clone())
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
        Ok(buffer)
    }

    /// Clip a device-space rectangle to the canvas bounds
    fn clip(&self, x: f64, y: f64, w: f64, h: f64) -> Option<(u32, u32, u32, u32)> {
        let left = x.round().max(0.0);
        let top = y.round().max(0.0);
        let right = (x + w).round().min(self.image.width() as f64);
        let bottom = (y + h).round().min(self.image.height() as f64);
        if right <= left || bottom <= top {
            return None;
        }
        Some((left as u32, top as u32, right as u32, bottom as u32))
    }
}

impl Default for RasterCanvas {
    fn default() -> Self {
        Self::new(300, 150)
    }
}

impl DrawingSurface for RasterCanvas {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width, height);
        self.transform = Transform::IDENTITY;
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let (dx, dy, dw, dh) = self.transform.map_rect(x, y, width, height);
        if let Some((left, top, right, bottom)) = self.clip(dx, dy, dw, dh) {
            for py in top..bottom {
                for px in left..right {
                    self.image.put_pixel(px, py, Rgba([0, 0, 0, 0]));
                }
            }
        }
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.transform.tx += self.transform.sx * x;
        self.transform.ty += self.transform.sy * y;
    }

    fn scale(&mut self, x: f64, y: f64) {
        self.transform.sx *= x;
        self.transform.sy *= y;
    }

    fn draw_image(
        &mut self,
        source: &dyn VideoFrameSource,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
    ) -> Result<(), CameraError> {
        // Nothing is drawn until the video has a frame, as in a browser
        let Some(frame) = source.current_frame() else {
            log::debug!("Video source has no frame yet, nothing drawn");
            return Ok(());
        };

        let (x, y, w, h) = self.transform.map_rect(dx, dy, dw, dh);
        let (target_w, target_h) = (w.round() as u32, h.round() as u32);
        if target_w == 0 || target_h == 0 {
            return Ok(());
        }

        let mut scaled = if frame.dimensions() == (target_w, target_h) {
            frame
        } else {
            imageops::resize(&frame, target_w, target_h, imageops::FilterType::Triangle)
        };
        if self.transform.sx < 0.0 {
            imageops::flip_horizontal_in_place(&mut scaled);
        }
        if self.transform.sy < 0.0 {
            imageops::flip_vertical_in_place(&mut scaled);
        }

        imageops::overlay(&mut self.image, &scaled, x.round() as i64, y.round() as i64);
        Ok(())
    }

    fn to_data_url(&self, mime_type: &str) -> Result<String, CameraError> {
        if mime_type != PNG_MIME {
            log::warn!("Unsupported snapshot type {}, encoding as PNG", mime_type);
        }
        if self.image.width() == 0 || self.image.height() == 0 {
            return Ok("data:,".to_string());
        }
        let png = self.to_png()?;
        Ok(format!("{}{}", DATA_URL_PREFIX, STANDARD.encode(png)))
    }
}

/// Output sink that keeps the last snapshot URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotLink {
    pub href: Option<String>,
}

impl SnapshotLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the held data URL back into PNG bytes
    pub fn png_bytes(&self) -> Result<Vec<u8>, CameraError> {
        let href = self
            .href
            .as_deref()
            .ok_or_else(|| CameraError::CaptureError("No snapshot has been taken".to_string()))?;
        decode_data_url(href)
    }
}

impl LinkSink for SnapshotLink {
    fn set_href(&mut self, href: String) {
        self.href = Some(href);
    }
}

/// Decode a base64 PNG data URL
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, CameraError> {
    let payload = url
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| CameraError::EncodingError("Not a base64 PNG data URL".to_string()))?;
    STANDARD
        .decode(payload)
        .map_err(|e| CameraError::EncodingError(format!("Invalid base64 payload: {}", e)))
}
