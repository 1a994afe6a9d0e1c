//! Snapshot encoding.
//!
//! Each captured frame is scaled to fit the upload bounds, overlaid with the
//! face guide rectangle, and encoded as a JPEG `data:` URI for the frame
//! endpoint.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{Rgb, RgbImage};

use super::error::SnapshotError;

/// JPEG quality for uploaded frames (0-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Guide rectangle size as a fraction of the frame width and height.
pub const DEFAULT_GUIDE_RATIO: f32 = 0.6;

/// Outline thickness of the guide rectangle in pixels.
const GUIDE_THICKNESS: u32 = 2;

const GUIDE_COLOR: Rgb<u8> = Rgb([0, 200, 83]);

const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Parameters for encoding snapshots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotOptions {
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
    /// Zero disables the overlay
    pub guide_ratio: f32,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            max_width: 640,
            max_height: 480,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            guide_ratio: DEFAULT_GUIDE_RATIO,
        }
    }
}

/// An encoded frame ready for upload.
#[derive(Debug, Clone)]
pub struct Snapshot {
    data_uri: String,
    pub width: u32,
    pub height: u32,
}

impl Snapshot {
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    /// The base64 payload without the `data:` prefix.
    pub fn base64(&self) -> &str {
        &self.data_uri[DATA_URI_PREFIX.len()..]
    }
}

/// Centered rectangle drawn over every frame as a positioning aid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuideRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Compute the guide rectangle for a frame.
pub fn guide_rect(width: u32, height: u32, ratio: f32) -> GuideRect {
    let ratio = ratio.clamp(0.0, 1.0);
    let w = ((width as f32) * ratio).round() as u32;
    let h = ((height as f32) * ratio).round() as u32;
    GuideRect {
        x: (width - w) / 2,
        y: (height - h) / 2,
        width: w,
        height: h,
    }
}

/// Encode a frame as a JPEG data URI.
pub fn encode_snapshot(frame: &RgbImage, options: &SnapshotOptions) -> Result<Snapshot, SnapshotError> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(SnapshotError::Encode("empty frame".to_string()));
    }

    let (width, height) = calculate_scaled_dimensions(
        frame.width(),
        frame.height(),
        options.max_width,
        options.max_height,
    );

    let mut canvas = if (width, height) == frame.dimensions() {
        frame.clone()
    } else {
        image::imageops::resize(frame, width, height, image::imageops::FilterType::Triangle)
    };

    if options.guide_ratio > 0.0 {
        draw_guide(&mut canvas, guide_rect(width, height, options.guide_ratio));
    }

    let mut jpeg_bytes: Vec<u8> = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_bytes, options.jpeg_quality);
    encoder
        .encode_image(&canvas)
        .map_err(|e| SnapshotError::Encode(e.to_string()))?;

    let mut data_uri = String::with_capacity(DATA_URI_PREFIX.len() + jpeg_bytes.len() * 4 / 3 + 4);
    data_uri.push_str(DATA_URI_PREFIX);
    STANDARD.encode_string(&jpeg_bytes, &mut data_uri);

    Ok(Snapshot {
        data_uri,
        width,
        height,
    })
}

fn draw_guide(img: &mut RgbImage, rect: GuideRect) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let right = rect.x + rect.width - 1;
    let bottom = rect.y + rect.height - 1;

    for t in 0..GUIDE_THICKNESS.min(rect.width).min(rect.height) {
        for x in rect.x..=right {
            img.put_pixel(x, rect.y + t, GUIDE_COLOR);
            img.put_pixel(x, bottom - t, GUIDE_COLOR);
        }
        for y in rect.y..=bottom {
            img.put_pixel(rect.x + t, y, GUIDE_COLOR);
            img.put_pixel(right - t, y, GUIDE_COLOR);
        }
    }
}

/// Calculate scaled dimensions that fit within max bounds while preserving aspect ratio.
fn calculate_scaled_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 || max_width == 0 || max_height == 0 {
        return (width.max(1), height.max(1));
    }

    let width_ratio = max_width as f64 / width as f64;
    let height_ratio = max_height as f64 / height as f64;
    let scale = width_ratio.min(height_ratio).min(1.0); // Don't upscale

    let scaled_width = ((width as f64) * scale).round() as u32;
    let scaled_height = ((height as f64) * scale).round() as u32;

    (scaled_width.max(1), scaled_height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([10, 20, 30]))
    }

    #[test]
    fn test_guide_rect_is_centered_sixty_percent() {
        let rect = guide_rect(640, 480, DEFAULT_GUIDE_RATIO);
        assert_eq!(
            rect,
            GuideRect {
                x: 128,
                y: 96,
                width: 384,
                height: 288
            }
        );
    }

    #[test]
    fn test_guide_rect_clamps_ratio() {
        let rect = guide_rect(100, 50, 1.5);
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (0, 0, 100, 50));
    }

    #[test]
    fn test_scaled_dimensions() {
        assert_eq!(calculate_scaled_dimensions(1280, 720, 640, 480), (640, 360));
        assert_eq!(calculate_scaled_dimensions(320, 240, 640, 480), (320, 240));
    }

    #[test]
    fn test_encode_produces_jpeg_data_uri() {
        let snapshot = encode_snapshot(&solid(64, 48), &SnapshotOptions::default()).unwrap();
        assert!(snapshot.data_uri().starts_with("data:image/jpeg;base64,"));
        assert_eq!((snapshot.width, snapshot.height), (64, 48));

        let bytes = STANDARD.decode(snapshot.base64()).unwrap();
        // JPEG SOI marker
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn test_encode_downscales_large_frames() {
        let options = SnapshotOptions {
            max_width: 320,
            max_height: 240,
            ..SnapshotOptions::default()
        };
        let snapshot = encode_snapshot(&solid(1280, 960), &options).unwrap();
        assert_eq!((snapshot.width, snapshot.height), (320, 240));
    }

    #[test]
    fn test_guide_outline_is_drawn() {
        let mut img = solid(100, 100);
        draw_guide(&mut img, guide_rect(100, 100, 0.6));
        assert_eq!(*img.get_pixel(20, 20), GUIDE_COLOR);
        assert_eq!(*img.get_pixel(79, 79), GUIDE_COLOR);
        assert_eq!(*img.get_pixel(50, 50), Rgb([10, 20, 30]));
        assert_eq!(*img.get_pixel(5, 5), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let empty = RgbImage::new(0, 0);
        assert!(encode_snapshot(&empty, &SnapshotOptions::default()).is_err());
    }
}
