use std::fs;
use std::path::Path;

use image::{ColorType, DynamicImage, ImageFormat};
use tracing::debug;

use crate::{Error, Frame, ImageStore, PixelFormat, Result};

/// Reads and writes PNG files on the local filesystem.
#[derive(Debug, Default, Clone)]
pub struct FsImageStore;

impl FsImageStore {
    pub fn new() -> Self {
        Self
    }
}

impl ImageStore for FsImageStore {
    fn load_image(&self, path: &Path) -> Result<Frame> {
        if !path.exists() {
            return Err(Error::GuideMissing {
                path: path.to_path_buf(),
            });
        }
        let img = image::open(path).map_err(|e| Error::GuideDecode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), color = ?img.color(), "decoded image");
        Ok(frame_from_dynamic(img))
    }

    fn save_image(&mut self, path: &Path, frame: &Frame) -> Result<()> {
        write_png(path, frame)
    }

    fn ensure_dir(&mut self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|e| Error::Io(format!("{}: {e}", dir.display())))
    }
}

/// Convert a decoded image to a [`Frame`], keeping alpha only when the source has it.
pub fn frame_from_dynamic(img: DynamicImage) -> Frame {
    let (width, height) = (img.width(), img.height());
    let (pixel_format, data) = match img.color() {
        ColorType::L8 | ColorType::L16 => (PixelFormat::Gray8, img.into_luma8().into_raw()),
        c if c.has_alpha() => {
            let mut data = img.into_rgba8().into_raw();
            data.chunks_exact_mut(4).for_each(|p| p.swap(0, 2));
            (PixelFormat::Bgra8, data)
        }
        _ => {
            let mut data = img.into_rgb8().into_raw();
            data.chunks_exact_mut(3).for_each(|p| p.swap(0, 2));
            (PixelFormat::Bgr8, data)
        }
    };
    Frame {
        width,
        height,
        pixel_format,
        data,
        ts: None,
    }
}

/// Encode `frame` as PNG, swapping BGR(A) back to RGB(A) for the codec.
pub fn write_png(path: &Path, frame: &Frame) -> Result<()> {
    let write_err = |reason: String| Error::CaptureWrite {
        path: path.to_path_buf(),
        reason,
    };
    if !frame.is_consistent() {
        return Err(write_err("frame buffer does not match its dimensions".into()));
    }
    let (data, color) = match frame.pixel_format {
        PixelFormat::Bgr8 => (swap_red_blue(&frame.data, 3), ColorType::Rgb8),
        PixelFormat::Bgra8 => (swap_red_blue(&frame.data, 4), ColorType::Rgba8),
        PixelFormat::Rgb8 => (frame.data.clone(), ColorType::Rgb8),
        PixelFormat::Gray8 => (frame.data.clone(), ColorType::L8),
    };
    image::save_buffer_with_format(
        path,
        &data,
        frame.width,
        frame.height,
        color,
        ImageFormat::Png,
    )
    .map_err(|e| write_err(e.to_string()))
}

fn swap_red_blue(data: &[u8], channels: usize) -> Vec<u8> {
    let mut out = data.to_vec();
    out.chunks_exact_mut(channels).for_each(|p| p.swap(0, 2));
    out
}
