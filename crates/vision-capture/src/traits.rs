use std::path::Path;

use crate::{Frame, Key, Result};

pub trait CameraSource {
    /// Open a camera source by device index or path string.
    fn open(spec: &str) -> Result<Self>
    where
        Self: Sized;

    /// Read a single frame. An error is a transient read failure; the caller decides
    /// whether to retry.
    fn read(&mut self) -> Result<Frame>;

    /// Release the underlying device. Further reads may fail.
    fn release(&mut self) {}
}

/// A window that shows frames and reports key presses.
pub trait DisplaySurface {
    /// Draw `caption` over `frame` and present it in the window named `window`.
    fn show(&mut self, window: &str, frame: &Frame, caption: &str) -> Result<()>;

    /// Wait up to `timeout_ms` for a key press.
    fn poll_key(&mut self, timeout_ms: i32) -> Result<Option<Key>>;

    /// Close every window opened by this surface.
    fn close(&mut self) {}
}

/// Image codec and file access used for guide assets and captured frames.
pub trait ImageStore {
    /// Decode the image at `path` as-is (no channel conversion, no resize).
    ///
    /// Returns [`crate::Error::GuideMissing`] when nothing exists at `path` and
    /// [`crate::Error::GuideDecode`] when the bytes cannot be decoded.
    fn load_image(&self, path: &Path) -> Result<Frame>;

    /// Encode `frame` to `path`.
    fn save_image(&mut self, path: &Path, frame: &Frame) -> Result<()>;

    /// Create `dir` (and parents) if absent.
    fn ensure_dir(&mut self, _dir: &Path) -> Result<()> {
        Ok(())
    }
}
