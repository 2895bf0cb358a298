//! Synthetic frames for offline testing

use image::{Rgba, RgbaImage};

/// Gradient frame that changes with `frame_number`
pub fn synthetic_video_frame(frame_number: u64, width: u32, height: u32) -> RgbaImage {
    let base = (frame_number % 256) as u8;
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            base.wrapping_add((x % 256) as u8),
            base.wrapping_add((y % 256) as u8),
            base.wrapping_add(((x + y) % 256) as u8),
            255,
        ])
    })
}

/// Left half red, right half blue. Makes mirroring visible.
pub fn split_frame(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 255, 255])
        }
    })
}
