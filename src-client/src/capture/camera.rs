//! Camera sources.
//!
//! A [`CameraSource`] describes a device; opening it yields an exclusively
//! owned [`CameraStream`] that must be stopped when the capture ends.

use image::{Rgb, RgbImage};
use std::path::PathBuf;
use tracing::{debug, info};

use super::error::CameraError;

/// Something that can be opened into a live frame stream.
pub trait CameraSource: Send + Sync {
    /// Acquire the device at the requested target resolution.
    fn open(&self, width: u32, height: u32) -> Result<Box<dyn CameraStream>, CameraError>;

    /// Human-readable description for logs and status output.
    fn describe(&self) -> String;
}

/// An acquired camera.
pub trait CameraStream: Send {
    /// Grab the current frame.
    fn grab(&mut self) -> Result<RgbImage, CameraError>;

    /// Release the device. Called exactly once by the capture loop.
    fn stop(&mut self);
}

/// Which camera to use, as written in config files and on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraSpec {
    /// The first V4L2 device when built with camera support
    Auto,
    /// Generated frames, for demos and dry runs
    Synthetic,
    /// Replays a still image file
    File(PathBuf),
    /// `/dev/video<N>`
    V4l2(usize),
}

impl CameraSpec {
    /// Parse `auto`, `synthetic`, `file:<path>`, `v4l2:<index>` or a bare index.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "" | "auto" | "default" => return Some(CameraSpec::Auto),
            "synthetic" | "fake" => return Some(CameraSpec::Synthetic),
            _ => {}
        }
        if let Some(path) = s.strip_prefix("file:") {
            if path.is_empty() {
                return None;
            }
            return Some(CameraSpec::File(PathBuf::from(path)));
        }
        let index = s.strip_prefix("v4l2:").unwrap_or(s);
        index.parse().ok().map(CameraSpec::V4l2)
    }

    /// Build the camera source for this spec.
    pub fn into_source(self) -> Box<dyn CameraSource> {
        match self {
            CameraSpec::Synthetic => Box::new(SyntheticCamera::new()),
            CameraSpec::File(path) => Box::new(StillImageCamera::new(path)),
            CameraSpec::Auto => v4l2_source(0),
            CameraSpec::V4l2(index) => v4l2_source(index),
        }
    }
}

impl std::fmt::Display for CameraSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraSpec::Auto => write!(f, "auto"),
            CameraSpec::Synthetic => write!(f, "synthetic"),
            CameraSpec::File(path) => write!(f, "file:{}", path.display()),
            CameraSpec::V4l2(index) => write!(f, "v4l2:{}", index),
        }
    }
}

#[cfg(all(feature = "v4l2", target_os = "linux"))]
fn v4l2_source(index: usize) -> Box<dyn CameraSource> {
    Box::new(super::v4l2::V4l2Camera::new(index))
}

#[cfg(not(all(feature = "v4l2", target_os = "linux")))]
fn v4l2_source(index: usize) -> Box<dyn CameraSource> {
    Box::new(UnavailableCamera {
        reason: format!(
            "/dev/video{}: this build has no webcam support (rebuild with --features v4l2, or use file:<path>)",
            index
        ),
    })
}

/// A source that always refuses to open.
pub struct UnavailableCamera {
    reason: String,
}

impl UnavailableCamera {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl CameraSource for UnavailableCamera {
    fn open(&self, _width: u32, _height: u32) -> Result<Box<dyn CameraStream>, CameraError> {
        Err(CameraError::Unavailable(self.reason.clone()))
    }

    fn describe(&self) -> String {
        "unavailable camera".to_string()
    }
}

/// Generates a moving gradient.
#[derive(Debug, Default)]
pub struct SyntheticCamera;

impl SyntheticCamera {
    pub fn new() -> Self {
        Self
    }
}

impl CameraSource for SyntheticCamera {
    fn open(&self, width: u32, height: u32) -> Result<Box<dyn CameraStream>, CameraError> {
        if width == 0 || height == 0 {
            return Err(CameraError::Unavailable(format!(
                "invalid resolution {}x{}",
                width, height
            )));
        }
        info!("Opened synthetic camera at {}x{}", width, height);
        Ok(Box::new(SyntheticStream {
            width,
            height,
            tick: 0,
            stopped: false,
        }))
    }

    fn describe(&self) -> String {
        "synthetic camera".to_string()
    }
}

struct SyntheticStream {
    width: u32,
    height: u32,
    tick: u32,
    stopped: bool,
}

impl CameraStream for SyntheticStream {
    fn grab(&mut self) -> Result<RgbImage, CameraError> {
        if self.stopped {
            return Err(CameraError::Frame("stream stopped".to_string()));
        }
        let tick = self.tick;
        self.tick = self.tick.wrapping_add(1);
        let (w, h) = (self.width, self.height);
        Ok(RgbImage::from_fn(w, h, |x, y| {
            let shifted = x.wrapping_add(tick.wrapping_mul(8)) % w;
            let r = (shifted * 255 / w) as u8;
            let g = (y * 255 / h) as u8;
            Rgb([r, g, 128])
        }))
    }

    fn stop(&mut self) {
        self.stopped = true;
        debug!("Synthetic camera stopped after {} frames", self.tick);
    }
}

/// Serves the same still image, resized to the requested resolution, on every grab.
#[derive(Debug)]
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CameraSource for StillImageCamera {
    fn open(&self, width: u32, height: u32) -> Result<Box<dyn CameraStream>, CameraError> {
        let image = image::open(&self.path)
            .map_err(|e| CameraError::Unavailable(format!("{}: {}", self.path.display(), e)))?
            .to_rgb8();

        let frame = if width > 0 && height > 0 && image.dimensions() != (width, height) {
            image::imageops::resize(&image, width, height, image::imageops::FilterType::Triangle)
        } else {
            image
        };

        info!("Opened still image camera {}", self.path.display());
        Ok(Box::new(StillImageStream { frame: Some(frame) }))
    }

    fn describe(&self) -> String {
        format!("still image {}", self.path.display())
    }
}

struct StillImageStream {
    frame: Option<RgbImage>,
}

impl CameraStream for StillImageStream {
    fn grab(&mut self) -> Result<RgbImage, CameraError> {
        self.frame
            .clone()
            .ok_or_else(|| CameraError::Frame("stream stopped".to_string()))
    }

    fn stop(&mut self) {
        self.frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_specs() {
        assert_eq!(CameraSpec::parse("auto"), Some(CameraSpec::Auto));
        assert_eq!(CameraSpec::parse(""), Some(CameraSpec::Auto));
        assert_eq!(CameraSpec::parse("Synthetic"), Some(CameraSpec::Synthetic));
        assert_eq!(
            CameraSpec::parse("file:/tmp/face.jpg"),
            Some(CameraSpec::File(PathBuf::from("/tmp/face.jpg")))
        );
        assert_eq!(CameraSpec::parse("v4l2:2"), Some(CameraSpec::V4l2(2)));
        assert_eq!(CameraSpec::parse("1"), Some(CameraSpec::V4l2(1)));
        assert_eq!(CameraSpec::parse("file:"), None);
        assert_eq!(CameraSpec::parse("webcam"), None);
    }

    #[test]
    fn test_spec_display_round_trips() {
        for spec in ["auto", "synthetic", "file:/x/y.png", "v4l2:3"] {
            assert_eq!(CameraSpec::parse(spec).unwrap().to_string(), spec);
        }
    }

    #[test]
    fn test_synthetic_frames_have_requested_size() {
        let mut stream = SyntheticCamera::new().open(32, 24).unwrap();
        let a = stream.grab().unwrap();
        let b = stream.grab().unwrap();
        assert_eq!(a.dimensions(), (32, 24));
        assert_ne!(a, b);
        stream.stop();
        assert!(stream.grab().is_err());
    }

    #[test]
    fn test_still_image_missing_file_is_unavailable() {
        let result = StillImageCamera::new("/definitely/not/here.png").open(64, 48);
        assert!(matches!(result, Err(CameraError::Unavailable(_))));
    }

    #[test]
    fn test_still_image_is_resized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        RgbImage::from_pixel(10, 10, Rgb([200, 100, 50])).save(&path).unwrap();

        let mut stream = StillImageCamera::new(&path).open(40, 30).unwrap();
        assert_eq!(stream.grab().unwrap().dimensions(), (40, 30));
        stream.stop();
        assert!(stream.grab().is_err());
    }

    #[test]
    fn test_unavailable_camera_refuses() {
        let source = UnavailableCamera::new("denied");
        assert!(matches!(source.open(1, 1), Err(CameraError::Unavailable(msg)) if msg == "denied"));
    }
}
