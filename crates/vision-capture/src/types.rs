use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PixelFormat {
    Bgr8,
    Bgra8,
    Rgb8,
    Gray8,
}

impl PixelFormat {
    /// Interleaved channels per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Bgr8 | PixelFormat::Rgb8 => 3,
            PixelFormat::Bgra8 => 4,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// Row-major, interleaved 8-bit image with its origin at the top-left corner.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    pub data: Vec<u8>,
    pub ts: Option<OffsetDateTime>,
}

impl Frame {
    /// A frame with every pixel set to `pixel`. `pixel` must hold one value per channel.
    pub fn filled(width: u32, height: u32, pixel_format: PixelFormat, pixel: &[u8]) -> Self {
        let channels = pixel_format.channels();
        let mut data = Vec::with_capacity(width as usize * height as usize * channels);
        for _ in 0..(width as usize * height as usize) {
            data.extend(pixel.iter().copied().chain(std::iter::repeat(0)).take(channels));
        }
        Self {
            width,
            height,
            pixel_format,
            data,
            ts: None,
        }
    }

    pub fn channels(&self) -> usize {
        self.pixel_format.channels()
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels()
    }

    /// Whether `data` is exactly large enough for the declared geometry.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.stride() * self.height as usize
    }

    /// Channel values of the pixel at (x, y), or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let c = self.channels();
        let start = y as usize * self.stride() + x as usize * c;
        self.data.get(start..start + c)
    }
}

/// Operator input recognised by the capture loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Key {
    /// Space bar: save the current frame.
    Capture,
    /// `q`: stop the session.
    Quit,
    /// Anything else; ignored by the capture loop.
    Other(u8),
}

impl Key {
    /// Map a raw key code as returned by HighGUI style polling. Only the low byte is significant.
    pub fn from_code(code: i32) -> Self {
        match (code & 0xFF) as u8 {
            b' ' => Key::Capture,
            b'q' => Key::Quit,
            other => Key::Other(other),
        }
    }
}
