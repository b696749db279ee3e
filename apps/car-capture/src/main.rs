//! Guided vehicle photo capture: left, right, front and rear, one guide at a time.
//!
//! Space saves the current frame, `q` quits. Guides are read from `assets/`, captures are
//! written to `captured_images/`, both relative to the working directory.

use std::process::ExitCode;

use anyhow::{Context, Result};
use capture_session::SessionConfig;
use tracing::{debug, error};
use vision_capture::io::FsImageStore;
use vision_capture::ImageStore;

fn main() -> ExitCode {
    setup_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn setup_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn run() -> Result<ExitCode> {
    let config = SessionConfig::default();
    debug!(config = %serde_json::to_string(&config)?, "session configuration");

    let mut store = FsImageStore::new();
    store
        .ensure_dir(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;

    capture(config, store)
}

#[cfg(feature = "opencv")]
fn capture(config: SessionConfig, store: FsImageStore) -> Result<ExitCode> {
    use capture_session::{default_slots, probe_camera, CaptureSession};
    use tracing::info;
    use vision_capture::{HighGuiDisplay, OpenCvCamera};

    let (index, camera) = match probe_camera::<OpenCvCamera>(&config.probe_indices) {
        Ok(found) => found,
        Err(err) => {
            error!("No available camera detected! Exiting... ({err})");
            return Ok(ExitCode::FAILURE);
        }
    };
    debug!(index, "using camera");

    let slots = default_slots(&config.assets_dir);
    let mut session = CaptureSession::new(config, slots, camera, HighGuiDisplay::new(), store);
    let report = session.run().context("capture session failed")?;
    info!(report = %serde_json::to_string(&report)?, "session report");

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(not(feature = "opencv"))]
fn capture(_config: SessionConfig, _store: FsImageStore) -> Result<ExitCode> {
    error!("OpenCV backend not enabled at compile time; rebuild with --features opencv");
    Ok(ExitCode::FAILURE)
}
