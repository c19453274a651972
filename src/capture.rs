use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use egui::Rect;
use image::{DynamicImage, RgbaImage};
use log::{debug, info};
use screenshots::Screen;

pub const JPEG_QUALITY: u8 = 90;
pub const MAX_UPLOAD_DIMENSION: u32 = 3072;

/// Logical-to-device scale of the overlay's monitor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceTransform {
    pub scale_x: f32,
    pub scale_y: f32,
}

impl DeviceTransform {
    pub fn uniform(pixels_per_point: f32) -> Self {
        Self {
            scale_x: pixels_per_point,
            scale_y: pixels_per_point,
        }
    }
}

impl Default for DeviceTransform {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Origin and size are scaled separately, so a selection that was only
    /// moved keeps its pixel size.
    pub fn from_logical(rect: Rect, transform: DeviceTransform) -> Self {
        Self {
            x: (rect.min.x * transform.scale_x).round() as i32,
            y: (rect.min.y * transform.scale_y).round() as i32,
            width: (rect.width() * transform.scale_x).round().max(0.0) as u32,
            height: (rect.height() * transform.scale_y).round().max(0.0) as u32,
        }
    }

    pub fn clamp_to(&self, width: u32, height: u32) -> Option<PixelRect> {
        let left = i64::from(self.x).clamp(0, i64::from(width));
        let top = i64::from(self.y).clamp(0, i64::from(height));
        let right = (i64::from(self.x) + i64::from(self.width)).clamp(0, i64::from(width));
        let bottom = (i64::from(self.y) + i64::from(self.height)).clamp(0, i64::from(height));

        if right <= left || bottom <= top {
            return None;
        }

        Some(PixelRect {
            x: left as i32,
            y: top as i32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }
}

/// A finished selection, ready to be grabbed from the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRequest {
    /// Top-left of the overlay's monitor in device pixels.
    pub monitor_origin: (i32, i32),
    /// Selection in device pixels, relative to `monitor_origin`.
    pub region: PixelRect,
}

impl CaptureRequest {
    pub fn new(selection: Rect, monitor_origin: (i32, i32), transform: DeviceTransform) -> Self {
        Self {
            monitor_origin,
            region: PixelRect::from_logical(selection, transform),
        }
    }
}

pub fn capture_region(request: &CaptureRequest) -> Result<DynamicImage> {
    let (origin_x, origin_y) = request.monitor_origin;
    let screen = Screen::from_point(origin_x, origin_y)
        .with_context(|| format!("no screen found at {origin_x},{origin_y}"))?;

    let image = screen.capture().context("screen capture failed")?;
    let bytes = image.to_vec();
    let image = RgbaImage::from_raw(image.width(), image.height(), bytes)
        .context("screenshot buffer has unexpected size")?;

    let region = request
        .region
        .clamp_to(image.width(), image.height())
        .with_context(|| {
            format!(
                "selection {:?} lies outside the {}x{} screen",
                request.region,
                image.width(),
                image.height()
            )
        })?;

    debug!(
        "Capturing area at {},{} with size {}x{}",
        region.x, region.y, region.width, region.height
    );

    let cropped = DynamicImage::ImageRgba8(image).crop_imm(
        region.x as u32,
        region.y as u32,
        region.width,
        region.height,
    );

    info!("Captured screenshot of size {}x{}", region.width, region.height);
    Ok(cropped)
}

/// JPEG-encodes the image as base64, shrinking it first when its longest
/// side exceeds `max_dim`.
pub fn encode_jpeg_base64(image: &DynamicImage, max_dim: u32, quality: u8) -> Result<String> {
    let (w, h) = (image.width(), image.height());

    let resized = if w > max_dim || h > max_dim {
        let scale = max_dim as f32 / w.max(h) as f32;
        let new_w = ((w as f32 * scale).round() as u32).max(1);
        let new_h = ((h as f32 * scale).round() as u32).max(1);
        image.resize_exact(new_w, new_h, image::imageops::FilterType::Lanczos3)
    } else {
        image.clone()
    };

    let rgb = resized.to_rgb8();
    let mut buf = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .context("jpeg encoding failed")?;

    Ok(STANDARD.encode(&buf))
}
