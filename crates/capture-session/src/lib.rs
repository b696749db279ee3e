//! capture-session: guided vehicle photo capture over pluggable camera, display and storage

mod error;
pub use error::{Result, SessionError};

mod config;
pub use config::SessionConfig;

mod slots;
pub use slots::{default_slots, GuideSlot};

pub mod naming;

mod probe;
pub use probe::probe_camera;

mod state;
pub use state::{CapturedImage, QuitReason, SessionReport, SessionState, SkippedSlot};

mod session;
pub use session::CaptureSession;
