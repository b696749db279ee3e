//! Guide images: decoded assets promoted to BGRA and resized to the overlay size.

use image::{imageops, ImageBuffer, Rgba};

use crate::{Error, Frame, PixelFormat, Result};

/// A BGRA overlay ready to be blended. Immutable once prepared.
#[derive(Clone, Debug)]
pub struct GuideImage {
    frame: Frame,
}

impl GuideImage {
    /// Promote `raw` to four channels (opaque alpha where none exists) and resize it to
    /// `width` x `height` with bilinear filtering.
    pub fn prepare(raw: Frame, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Unsupported("guide size must be non-zero"));
        }
        let bgra = to_bgra(raw)?;
        // Resampling is channel-agnostic, so BGRA bytes travel through an RGBA buffer untouched.
        let buf: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_raw(bgra.width, bgra.height, bgra.data)
                .ok_or_else(|| Error::Backend("guide buffer does not match its dimensions".into()))?;
        let resized = if buf.width() == width && buf.height() == height {
            buf
        } else {
            imageops::resize(&buf, width, height, imageops::FilterType::Triangle)
        };
        Ok(Self {
            frame: Frame {
                width,
                height,
                pixel_format: PixelFormat::Bgra8,
                data: resized.into_raw(),
                ts: bgra.ts,
            },
        })
    }

    pub fn width(&self) -> u32 {
        self.frame.width
    }

    pub fn height(&self) -> u32 {
        self.frame.height
    }

    pub fn as_frame(&self) -> &Frame {
        &self.frame
    }
}

/// Convert any supported layout to BGRA, adding an opaque alpha channel when missing.
pub fn to_bgra(raw: Frame) -> Result<Frame> {
    if !raw.is_consistent() {
        return Err(Error::Backend(
            "image buffer does not match its dimensions".to_string(),
        ));
    }
    let data = match raw.pixel_format {
        PixelFormat::Bgra8 => return Ok(raw),
        PixelFormat::Bgr8 => raw
            .data
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        PixelFormat::Rgb8 => raw
            .data
            .chunks_exact(3)
            .flat_map(|p| [p[2], p[1], p[0], 255])
            .collect(),
        PixelFormat::Gray8 => raw.data.iter().flat_map(|&v| [v, v, v, 255]).collect(),
    };
    Ok(Frame {
        width: raw.width,
        height: raw.height,
        pixel_format: PixelFormat::Bgra8,
        data,
        ts: raw.ts,
    })
}
