use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Fixed parameters of a capture session. `Default` is the only configuration the
/// binary uses.
#[derive(Debug, Clone, Serialize)]
pub struct SessionConfig {
    /// Guide width and height after resizing.
    pub overlay_size: (u32, u32),
    /// Requested top-left corner of the guide, clamped per frame.
    pub overlay_origin: (i64, i64),
    /// Consecutive read failures tolerated within one slot.
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub poll_timeout_ms: i32,
    pub window_name: String,
    pub assets_dir: PathBuf,
    pub output_dir: PathBuf,
    pub probe_indices: Vec<i32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            overlay_size: (400, 400),
            overlay_origin: (150, 100),
            max_retries: 5,
            retry_backoff: Duration::from_secs(2),
            poll_timeout_ms: 1,
            window_name: "Car Inspection Camera".to_string(),
            assets_dir: PathBuf::from("assets"),
            output_dir: PathBuf::from("captured_images"),
            probe_indices: vec![0, 1, 2],
        }
    }
}
