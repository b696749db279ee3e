use crate::{CameraSource, DisplaySurface, Error, Frame, Key, PixelFormat, Result};
use opencv::prelude::*;
use opencv::{core, highgui, imgproc, videoio};
use time::OffsetDateTime;
use tracing::debug;

pub struct OpenCvCamera {
    cap: videoio::VideoCapture,
}

impl CameraSource for OpenCvCamera {
    fn open(spec: &str) -> Result<Self> {
        // Parse spec as index if numeric, else try to open as path
        let cap = if let Ok(idx) = spec.parse::<i32>() {
            videoio::VideoCapture::new(idx, videoio::CAP_ANY)
                .map_err(|e| Error::Backend(e.to_string()))?
        } else {
            videoio::VideoCapture::from_file(spec, videoio::CAP_ANY)
                .map_err(|e| Error::Backend(e.to_string()))?
        };
        let opened =
            videoio::VideoCapture::is_opened(&cap).map_err(|e| Error::Backend(e.to_string()))?;
        if !opened {
            return Err(Error::NotFound(spec.to_string()));
        }
        Ok(Self { cap })
    }

    fn read(&mut self) -> Result<Frame> {
        let mut mat = core::Mat::default();
        let grabbed = self
            .cap
            .read(&mut mat)
            .map_err(|e| Error::FrameRead(e.to_string()))?;
        if !grabbed || mat.empty() {
            return Err(Error::FrameRead("empty frame".into()));
        }
        if mat.channels() != 3 {
            return Err(Error::FrameRead(format!(
                "expected 3 channels, got {}",
                mat.channels()
            )));
        }

        let width = mat.cols() as u32;
        let height = mat.rows() as u32;
        // Frames stay in the capture's native BGR order
        let data = mat
            .data_bytes()
            .map_err(|e| Error::Backend(e.to_string()))?
            .to_vec();
        Ok(Frame {
            width,
            height,
            pixel_format: PixelFormat::Bgr8,
            data,
            ts: Some(OffsetDateTime::now_utc()),
        })
    }

    fn release(&mut self) {
        if let Err(e) = self.cap.release() {
            debug!("camera release failed: {e}");
        }
    }
}

const CAPTION_ORIGIN: (i32, i32) = (50, 30);
const CAPTION_SCALE: f64 = 0.7;
const CAPTION_THICKNESS: i32 = 2;

/// HighGUI window with a green Hershey caption drawn on each frame.
#[derive(Default)]
pub struct HighGuiDisplay;

impl HighGuiDisplay {
    pub fn new() -> Self {
        Self
    }
}

impl DisplaySurface for HighGuiDisplay {
    fn show(&mut self, window: &str, frame: &Frame, caption: &str) -> Result<()> {
        if frame.pixel_format != PixelFormat::Bgr8 || !frame.is_consistent() {
            return Err(Error::Unsupported("display expects a BGR8 frame"));
        }
        let flat = core::Mat::from_slice(&frame.data).map_err(|e| Error::Backend(e.to_string()))?;
        let shaped = flat
            .reshape(3, frame.height as i32)
            .map_err(|e| Error::Backend(e.to_string()))?;
        let mut canvas = shaped
            .try_clone()
            .map_err(|e| Error::Backend(e.to_string()))?;
        imgproc::put_text(
            &mut canvas,
            caption,
            core::Point::new(CAPTION_ORIGIN.0, CAPTION_ORIGIN.1),
            imgproc::FONT_HERSHEY_SIMPLEX,
            CAPTION_SCALE,
            core::Scalar::new(0.0, 255.0, 0.0, 0.0),
            CAPTION_THICKNESS,
            imgproc::LINE_8,
            false,
        )
        .map_err(|e| Error::Backend(e.to_string()))?;
        highgui::imshow(window, &canvas).map_err(|e| Error::Backend(e.to_string()))?;
        Ok(())
    }

    fn poll_key(&mut self, timeout_ms: i32) -> Result<Option<Key>> {
        let code = highgui::wait_key(timeout_ms).map_err(|e| Error::Backend(e.to_string()))?;
        Ok((code >= 0).then(|| Key::from_code(code)))
    }

    fn close(&mut self) {
        if let Err(e) = highgui::destroy_all_windows() {
            debug!("destroying windows failed: {e}");
        }
    }
}
