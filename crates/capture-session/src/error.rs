use thiserror::Error;

pub type Result<T, E = SessionError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no camera opened on any of the probed indices {probed:?}")]
    DeviceUnavailable { probed: Vec<i32> },
    #[error("timestamp formatting failed: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error(transparent)]
    Vision(#[from] vision_capture::Error),
}
