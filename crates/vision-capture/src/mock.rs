use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use crate::{CameraSource, DisplaySurface, Error, Frame, ImageStore, Key, PixelFormat, Result};

/// One scripted outcome of [`MockCamera::read`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MockRead {
    Frame,
    Fail,
}

/// Camera producing a BGR ramp. Reads follow the script first, then always succeed.
pub struct MockCamera {
    width: u32,
    height: u32,
    counter: u64,
    script: VecDeque<MockRead>,
    released: bool,
}

impl MockCamera {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            counter: 0,
            script: VecDeque::new(),
            released: false,
        }
    }

    /// Queue read outcomes consumed before the camera falls back to always succeeding.
    pub fn script(mut self, reads: impl IntoIterator<Item = MockRead>) -> Self {
        self.script.extend(reads);
        self
    }

    /// Number of successful reads so far.
    pub fn frames_read(&self) -> u64 {
        self.counter
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl CameraSource for MockCamera {
    fn open(_spec: &str) -> Result<Self> {
        Ok(Self::with_size(640, 480))
    }

    fn read(&mut self) -> Result<Frame> {
        if self.released {
            return Err(Error::FrameRead("camera released".into()));
        }
        if let Some(MockRead::Fail) = self.script.pop_front() {
            return Err(Error::FrameRead("scripted failure".into()));
        }
        self.counter += 1;
        // Produce a simple ramp image, shifted per frame so consecutive frames differ
        let (width, height) = (self.width, self.height);
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((u64::from(x + y) + self.counter) % 256) as u8;
                data.extend_from_slice(&[v, v / 2, 255 - v]);
            }
        }
        Ok(Frame {
            width,
            height,
            pixel_format: PixelFormat::Bgr8,
            data,
            ts: Some(OffsetDateTime::now_utc()),
        })
    }

    fn release(&mut self) {
        self.released = true;
    }
}

/// Display that records what it was asked to show and replays scripted keys.
///
/// Once the key script runs dry it reports [`Key::Quit`], so a session driven by it always ends.
#[derive(Default)]
pub struct MockDisplay {
    keys: VecDeque<Option<Key>>,
    captions: Vec<String>,
    shown: Vec<Frame>,
    close_count: u32,
}

impl MockDisplay {
    pub fn new(keys: impl IntoIterator<Item = Option<Key>>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Captions in presentation order.
    pub fn captions(&self) -> &[String] {
        &self.captions
    }

    /// Frames in presentation order, as composited.
    pub fn shown(&self) -> &[Frame] {
        &self.shown
    }

    pub fn close_count(&self) -> u32 {
        self.close_count
    }
}

impl DisplaySurface for MockDisplay {
    fn show(&mut self, _window: &str, frame: &Frame, caption: &str) -> Result<()> {
        self.captions.push(caption.to_string());
        self.shown.push(frame.clone());
        Ok(())
    }

    fn poll_key(&mut self, _timeout_ms: i32) -> Result<Option<Key>> {
        Ok(self.keys.pop_front().unwrap_or(Some(Key::Quit)))
    }

    fn close(&mut self) {
        self.close_count += 1;
    }
}

/// In-memory image storage. Loading a path registered as corrupt yields a decode error.
#[derive(Default)]
pub struct MemoryStore {
    images: HashMap<PathBuf, Frame>,
    corrupt: Vec<PathBuf>,
    saved: Vec<(PathBuf, Frame)>,
    dirs: Vec<PathBuf>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, frame: Frame) {
        self.images.insert(path.into(), frame);
    }

    pub fn insert_corrupt(&mut self, path: impl Into<PathBuf>) {
        self.corrupt.push(path.into());
    }

    /// Make every subsequent save fail.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn saved(&self) -> &[(PathBuf, Frame)] {
        &self.saved
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl ImageStore for MemoryStore {
    fn load_image(&self, path: &Path) -> Result<Frame> {
        if self.corrupt.iter().any(|p| p == path) {
            return Err(Error::GuideDecode {
                path: path.to_path_buf(),
                reason: "corrupt test image".into(),
            });
        }
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| Error::GuideMissing {
                path: path.to_path_buf(),
            })
    }

    fn save_image(&mut self, path: &Path, frame: &Frame) -> Result<()> {
        if self.fail_writes {
            return Err(Error::CaptureWrite {
                path: path.to_path_buf(),
                reason: "writes disabled".into(),
            });
        }
        self.saved.push((path.to_path_buf(), frame.clone()));
        Ok(())
    }

    fn ensure_dir(&mut self, dir: &Path) -> Result<()> {
        self.dirs.push(dir.to_path_buf());
        Ok(())
    }
}
