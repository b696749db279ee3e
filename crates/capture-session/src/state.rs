use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Why a session stopped before running through every slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuitReason {
    /// The operator pressed the quit key.
    Operator,
    /// The camera failed `max_retries` consecutive reads within one slot.
    CameraUnresponsive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    LoadingGuide { slot: usize },
    AwaitingInput { slot: usize, retries: u32 },
    Captured { slot: usize },
    Quit(QuitReason),
    Finished,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Quit(_) | SessionState::Finished)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::LoadingGuide { slot } => write!(f, "loading guide {slot}"),
            SessionState::AwaitingInput { slot, retries } => {
                write!(f, "awaiting input on slot {slot} (retries {retries})")
            }
            SessionState::Captured { slot } => write!(f, "captured slot {slot}"),
            SessionState::Quit(reason) => write!(f, "quit ({reason:?})"),
            SessionState::Finished => write!(f, "finished"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedImage {
    pub label: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSlot {
    pub label: String,
    pub reason: String,
}

/// Outcome of a completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub outcome: SessionState,
    pub captured: Vec<CapturedImage>,
    pub skipped: Vec<SkippedSlot>,
}

impl SessionReport {
    pub fn is_success(&self) -> bool {
        matches!(
            self.outcome,
            SessionState::Finished | SessionState::Quit(QuitReason::Operator)
        )
    }
}
