//! Webcam capture through Video4Linux2.
//!
//! Frames are requested as MJPEG and decoded with `image`; most USB webcams
//! offer MJPEG at 640x480 and above.

use image::{ImageFormat, RgbImage};
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream as _;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use super::camera::{CameraSource, CameraStream};
use super::error::CameraError;

/// Number of kernel buffers to queue.
const BUFFER_COUNT: u32 = 4;

/// `/dev/video<index>`.
#[derive(Debug, Clone, Copy)]
pub struct V4l2Camera {
    index: usize,
}

impl V4l2Camera {
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    fn unavailable(&self, what: &str, err: impl std::fmt::Display) -> CameraError {
        CameraError::Unavailable(format!("/dev/video{}: {}: {}", self.index, what, err))
    }
}

impl CameraSource for V4l2Camera {
    fn open(&self, width: u32, height: u32) -> Result<Box<dyn CameraStream>, CameraError> {
        let device = Device::new(self.index).map_err(|e| self.unavailable("open failed", e))?;

        let mjpg = FourCC::new(b"MJPG");
        let mut format = device
            .format()
            .map_err(|e| self.unavailable("query format", e))?;
        format.width = width;
        format.height = height;
        format.fourcc = mjpg;
        let format = device
            .set_format(&format)
            .map_err(|e| self.unavailable("set format", e))?;
        if format.fourcc != mjpg {
            return Err(self.unavailable("unsupported pixel format", format.fourcc));
        }
        if (format.width, format.height) != (width, height) {
            warn!(
                "Camera negotiated {}x{} instead of {}x{}",
                format.width, format.height, width, height
            );
        }

        let stream = Stream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)
            .map_err(|e| self.unavailable("start stream", e))?;

        info!(
            "Opened /dev/video{} at {}x{} MJPEG",
            self.index, format.width, format.height
        );
        Ok(Box::new(V4l2Stream {
            stream: Some(stream),
            _device: device,
        }))
    }

    fn describe(&self) -> String {
        format!("/dev/video{}", self.index)
    }
}

struct V4l2Stream {
    // Field order matters: the stream must drop before the device.
    stream: Option<Stream<'static>>,
    _device: Device,
}

impl CameraStream for V4l2Stream {
    fn grab(&mut self) -> Result<RgbImage, CameraError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| CameraError::Frame("stream stopped".to_string()))?;
        let (buf, meta) = stream
            .next()
            .map_err(|e| CameraError::Frame(e.to_string()))?;
        let used = (meta.bytesused as usize).min(buf.len());
        let frame = image::load_from_memory_with_format(&buf[..used], ImageFormat::Jpeg)
            .map_err(|e| CameraError::Frame(e.to_string()))?;
        Ok(frame.to_rgb8())
    }

    fn stop(&mut self) {
        if self.stream.take().is_some() {
            debug!("V4L2 stream stopped");
        }
    }
}
