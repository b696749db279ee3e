use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("camera not found: {0}")]
    NotFound(String),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("guide image missing: {}", path.display())]
    GuideMissing { path: PathBuf },
    #[error("failed to decode guide image {}: {reason}", path.display())]
    GuideDecode { path: PathBuf, reason: String },
    #[error("frame read failed: {0}")]
    FrameRead(String),
    #[error("invalid overlay: expected 4 channels, got {channels}")]
    InvalidOverlay { channels: usize },
    #[error("failed to write capture {}: {reason}", path.display())]
    CaptureWrite { path: PathBuf, reason: String },
}
