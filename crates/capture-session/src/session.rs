//! The guided capture loop.
//!
//! Each slot is entered through [`SessionState::LoadingGuide`]; a guide that cannot be
//! loaded drops the slot. While [`SessionState::AwaitingInput`] the controller reads one
//! frame per step, shows it with the guide blended in, and reacts to the polled key.
//! Only read failures count against the retry budget, and the budget is fresh for every
//! slot. The frame written to storage is always the one read from the camera, never the
//! composited preview.

use std::thread;

use tracing::{error, info, warn};
use vision_capture::{
    compositor, CameraSource, DisplaySurface, Error as VisionError, Frame, GuideImage,
    ImageStore, Key,
};

use crate::naming::{capture_path, capture_time};
use crate::state::{CapturedImage, QuitReason, SessionReport, SessionState, SkippedSlot};
use crate::{GuideSlot, Result, SessionConfig};

pub struct CaptureSession<C, D, S> {
    config: SessionConfig,
    slots: Vec<GuideSlot>,
    camera: C,
    display: D,
    store: S,
    state: SessionState,
    guide: Option<GuideImage>,
    captured: Vec<CapturedImage>,
    skipped: Vec<SkippedSlot>,
    released: bool,
}

impl<C, D, S> CaptureSession<C, D, S>
where
    C: CameraSource,
    D: DisplaySurface,
    S: ImageStore,
{
    pub fn new(config: SessionConfig, slots: Vec<GuideSlot>, camera: C, display: D, store: S) -> Self {
        Self {
            config,
            slots,
            camera,
            display,
            store,
            state: SessionState::LoadingGuide { slot: 0 },
            guide: None,
            captured: Vec::new(),
            skipped: Vec::new(),
            released: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Perform one transition and return the new state. Terminal states are absorbing;
    /// reaching one releases the camera and display.
    pub fn step(&mut self) -> Result<SessionState> {
        let next = match self.state {
            SessionState::LoadingGuide { slot } => self.load_guide(slot),
            SessionState::AwaitingInput { slot, retries } => self.await_input(slot, retries)?,
            SessionState::Captured { slot } => {
                self.guide = None;
                SessionState::LoadingGuide { slot: slot + 1 }
            }
            terminal => terminal,
        };
        self.state = next;
        if next.is_terminal() {
            self.release();
        }
        Ok(next)
    }

    /// Drive the session until it finishes or quits.
    ///
    /// Errors from the display or timestamping abort the session; resources are released
    /// before the error is returned.
    pub fn run(&mut self) -> Result<SessionReport> {
        while !self.state.is_terminal() {
            if let Err(err) = self.step() {
                error!("capture session aborted: {err}");
                self.release();
                return Err(err);
            }
        }
        if self.state == SessionState::Finished {
            info!(
                captured = self.captured.len(),
                skipped = self.skipped.len(),
                "All images captured successfully!"
            );
        }
        Ok(self.report())
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            outcome: self.state,
            captured: self.captured.clone(),
            skipped: self.skipped.clone(),
        }
    }

    fn load_guide(&mut self, slot: usize) -> SessionState {
        let Some(entry) = self.slots.get(slot) else {
            return SessionState::Finished;
        };
        let (width, height) = self.config.overlay_size;
        let loaded = self
            .store
            .load_image(&entry.path)
            .and_then(|raw| GuideImage::prepare(raw, width, height));
        match loaded {
            Ok(guide) => {
                info!(label = %entry.label, path = %entry.path.display(), "guide loaded");
                self.guide = Some(guide);
                SessionState::AwaitingInput { slot, retries: 0 }
            }
            Err(err) => {
                match &err {
                    VisionError::GuideMissing { path } => {
                        warn!("Missing overlay file: {}", path.display())
                    }
                    _ => warn!("Failed to load overlay {}: {err}", entry.path.display()),
                }
                self.skipped.push(SkippedSlot {
                    label: entry.label.clone(),
                    reason: err.to_string(),
                });
                SessionState::LoadingGuide { slot: slot + 1 }
            }
        }
    }

    fn await_input(&mut self, slot: usize, retries: u32) -> Result<SessionState> {
        let frame = match self.camera.read() {
            Ok(frame) => frame,
            Err(err) => return Ok(self.read_failed(slot, retries, &err)),
        };
        let Some(guide) = self.guide.as_ref() else {
            return Ok(SessionState::LoadingGuide { slot });
        };
        let label = self.slots[slot].label.clone();

        let (x, y) = compositor::clamp_position(
            (frame.width, frame.height),
            (guide.width(), guide.height()),
            self.config.overlay_origin,
        );
        let preview = compositor::blend(frame.clone(), guide.as_frame(), x.into(), y.into());
        let caption = format!("Align the {label} side of the car with the frame");
        self.display
            .show(&self.config.window_name, &preview, &caption)?;

        match self.display.poll_key(self.config.poll_timeout_ms)? {
            Some(Key::Capture) => {
                self.persist(&label, &frame)?;
                Ok(SessionState::Captured { slot })
            }
            Some(Key::Quit) => {
                info!(label = %label, "capture stopped by operator");
                Ok(SessionState::Quit(QuitReason::Operator))
            }
            _ => Ok(SessionState::AwaitingInput { slot, retries }),
        }
    }

    fn read_failed(&self, slot: usize, retries: u32, err: &VisionError) -> SessionState {
        let attempt = retries + 1;
        warn!(
            "Camera feed error. Retrying... ({attempt}/{}): {err}",
            self.config.max_retries
        );
        if !self.config.retry_backoff.is_zero() {
            thread::sleep(self.config.retry_backoff);
        }
        if attempt >= self.config.max_retries {
            error!("Camera feed not responding. Exiting...");
            return SessionState::Quit(QuitReason::CameraUnresponsive);
        }
        SessionState::AwaitingInput {
            slot,
            retries: attempt,
        }
    }

    /// Best-effort write of the raw frame; a failed write is logged and the slot still advances.
    fn persist(&mut self, label: &str, frame: &Frame) -> Result<()> {
        let path = capture_path(&self.config.output_dir, label, capture_time())?;
        match self.store.save_image(&path, frame) {
            Ok(()) => {
                info!("Image saved: {}", path.display());
                self.captured.push(CapturedImage {
                    label: label.to_string(),
                    path,
                });
            }
            Err(err) => warn!("could not save {label} capture: {err}"),
        }
        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.camera.release();
        self.display.close();
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_slots;
    use std::path::Path;
    use std::time::Duration;
    use vision_capture::{MemoryStore, MockCamera, MockDisplay, MockRead, PixelFormat};

    const GUIDE_PIXEL: [u8; 4] = [1, 2, 3, 255];

    fn test_config() -> SessionConfig {
        SessionConfig {
            overlay_size: (16, 16),
            retry_backoff: Duration::ZERO,
            ..SessionConfig::default()
        }
    }

    fn store_without(missing: &[&str]) -> MemoryStore {
        let mut store = MemoryStore::new();
        for slot in default_slots(Path::new("assets")) {
            if !missing.contains(&slot.label.as_str()) {
                store.insert(
                    slot.path,
                    Frame::filled(8, 8, PixelFormat::Bgra8, &GUIDE_PIXEL),
                );
            }
        }
        store
    }

    fn session(
        camera: MockCamera,
        keys: Vec<Option<Key>>,
        store: MemoryStore,
    ) -> CaptureSession<MockCamera, MockDisplay, MemoryStore> {
        CaptureSession::new(
            test_config(),
            default_slots(Path::new("assets")),
            camera,
            MockDisplay::new(keys),
            store,
        )
    }

    fn saved_labels(s: &CaptureSession<MockCamera, MockDisplay, MemoryStore>) -> Vec<String> {
        s.store()
            .saved()
            .iter()
            .map(|(p, _)| {
                let name = p.file_name().unwrap().to_string_lossy().into_owned();
                name.split('_').nth(1).unwrap().to_string()
            })
            .collect()
    }

    #[test]
    fn test_confirming_every_slot_finishes() {
        let mut s = session(
            MockCamera::with_size(64, 48),
            vec![Some(Key::Capture); 4],
            store_without(&[]),
        );
        let report = s.run().unwrap();
        assert_eq!(report.outcome, SessionState::Finished);
        assert!(report.is_success());
        assert_eq!(saved_labels(&s), ["left", "right", "front", "rear"]);
        let report_labels: Vec<_> = report.captured.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(report_labels, ["left", "right", "front", "rear"]);
        assert!(report.skipped.is_empty());
        for (path, _) in s.store().saved() {
            assert!(path.starts_with("captured_images"));
            assert_eq!(path.extension().unwrap(), "png");
        }
        assert!(s.camera().is_released());
        assert_eq!(s.display().close_count(), 1);
    }

    #[test]
    fn test_states_visit_each_slot_in_order() {
        let mut s = session(
            MockCamera::with_size(64, 48),
            vec![Some(Key::Capture); 4],
            store_without(&[]),
        );
        let mut trace = vec![s.state()];
        while !s.state().is_terminal() {
            trace.push(s.step().unwrap());
        }
        let mut expected = Vec::new();
        for slot in 0..4 {
            expected.push(SessionState::LoadingGuide { slot });
            expected.push(SessionState::AwaitingInput { slot, retries: 0 });
            expected.push(SessionState::Captured { slot });
        }
        expected.push(SessionState::LoadingGuide { slot: 4 });
        expected.push(SessionState::Finished);
        assert_eq!(trace, expected);

        // Terminal states absorb further steps without releasing twice.
        assert_eq!(s.step().unwrap(), SessionState::Finished);
        assert_eq!(s.display().close_count(), 1);
    }

    #[test]
    fn test_missing_guide_skips_slot() {
        let mut s = session(
            MockCamera::with_size(64, 48),
            vec![Some(Key::Capture); 3],
            store_without(&["front"]),
        );
        let report = s.run().unwrap();
        assert_eq!(report.outcome, SessionState::Finished);
        assert_eq!(saved_labels(&s), ["left", "right", "rear"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].label, "front");
        assert!(s
            .display()
            .captions()
            .iter()
            .all(|c| !c.contains("front")));
    }

    #[test]
    fn test_corrupt_guide_skips_slot() {
        let mut store = store_without(&["left"]);
        store.insert_corrupt(Path::new("assets").join("car_left.png"));
        let mut s = session(
            MockCamera::with_size(64, 48),
            vec![Some(Key::Capture); 3],
            store,
        );
        let report = s.run().unwrap();
        assert_eq!(saved_labels(&s), ["right", "front", "rear"]);
        assert_eq!(report.skipped[0].label, "left");
    }

    #[test]
    fn test_quit_during_front_keeps_earlier_captures() {
        let mut s = session(
            MockCamera::with_size(64, 48),
            vec![
                Some(Key::Capture),
                None,
                Some(Key::Other(b'x')),
                Some(Key::Capture),
                Some(Key::Quit),
            ],
            store_without(&[]),
        );
        let report = s.run().unwrap();
        assert_eq!(report.outcome, SessionState::Quit(QuitReason::Operator));
        assert!(report.is_success());
        assert_eq!(saved_labels(&s), ["left", "right"]);
        assert!(s.camera().is_released());
        assert_eq!(s.display().close_count(), 1);
    }

    #[test]
    fn test_retry_budget_exhaustion_aborts() {
        let camera = MockCamera::with_size(64, 48).script([MockRead::Fail; 5]);
        let mut s = session(camera, vec![Some(Key::Capture); 4], store_without(&[]));
        let report = s.run().unwrap();
        assert_eq!(
            report.outcome,
            SessionState::Quit(QuitReason::CameraUnresponsive)
        );
        assert!(!report.is_success());
        assert!(s.store().saved().is_empty());
        assert!(s.display().captions().is_empty());
        assert!(s.camera().is_released());
        assert_eq!(s.display().close_count(), 1);
    }

    #[test]
    fn test_one_short_of_budget_recovers_and_resets_per_slot() {
        let mut reads = vec![MockRead::Fail; 4];
        reads.push(MockRead::Frame);
        reads.extend([MockRead::Fail; 4]);
        let camera = MockCamera::with_size(64, 48).script(reads);
        let mut s = session(camera, vec![Some(Key::Capture); 4], store_without(&[]));

        let mut trace = vec![s.state()];
        while !s.state().is_terminal() {
            trace.push(s.step().unwrap());
        }
        assert_eq!(s.state(), SessionState::Finished);
        assert!(trace.contains(&SessionState::AwaitingInput { slot: 0, retries: 4 }));
        assert!(trace.contains(&SessionState::AwaitingInput { slot: 1, retries: 0 }));
        assert!(trace.contains(&SessionState::AwaitingInput { slot: 1, retries: 4 }));
        assert_eq!(saved_labels(&s), ["left", "right", "front", "rear"]);
    }

    #[test]
    fn test_idle_frames_do_not_refill_retry_budget() {
        let camera = MockCamera::with_size(64, 48).script([
            MockRead::Fail,
            MockRead::Fail,
            MockRead::Fail,
            MockRead::Frame,
            MockRead::Fail,
            MockRead::Fail,
        ]);
        let mut s = session(camera, vec![None; 4], store_without(&[]));
        let report = s.run().unwrap();
        assert_eq!(
            report.outcome,
            SessionState::Quit(QuitReason::CameraUnresponsive)
        );
        assert_eq!(s.display().captions().len(), 1);
    }

    #[test]
    fn test_saved_frame_has_no_overlay() {
        let mut s = session(
            MockCamera::with_size(64, 48),
            vec![Some(Key::Capture)],
            store_without(&[]),
        );
        s.run().unwrap();
        let shown = &s.display().shown()[0];
        let (_, saved) = &s.store().saved()[0];
        // 16x16 guide requested at (150, 100) lands at (48, 32) on a 64x48 frame.
        assert_eq!(shown.pixel(48, 32), Some(&GUIDE_PIXEL[..3]));
        assert_eq!(shown.pixel(63, 47), Some(&GUIDE_PIXEL[..3]));
        assert_ne!(saved.pixel(48, 32), Some(&GUIDE_PIXEL[..3]));
        assert_eq!(shown.pixel(0, 0), saved.pixel(0, 0));
        assert_eq!(saved.pixel_format, PixelFormat::Bgr8);
    }

    #[test]
    fn test_opaque_guide_without_alpha_is_promoted() {
        let mut store = MemoryStore::new();
        for slot in default_slots(Path::new("assets")) {
            store.insert(slot.path, Frame::filled(4, 4, PixelFormat::Bgr8, &[9, 8, 7]));
        }
        let mut s = session(MockCamera::with_size(64, 48), vec![Some(Key::Capture)], store);
        s.run().unwrap();
        assert_eq!(s.display().shown()[0].pixel(50, 40), Some(&[9u8, 8, 7][..]));
    }

    #[test]
    fn test_caption_names_the_side() {
        let mut s = session(
            MockCamera::with_size(64, 48),
            vec![None, Some(Key::Capture), Some(Key::Quit)],
            store_without(&[]),
        );
        s.run().unwrap();
        assert_eq!(
            s.display().captions(),
            [
                "Align the left side of the car with the frame",
                "Align the left side of the car with the frame",
                "Align the right side of the car with the frame",
            ]
        );
    }

    #[test]
    fn test_failed_write_still_advances() {
        let mut store = store_without(&[]);
        store.fail_writes(true);
        let mut s = session(MockCamera::with_size(64, 48), vec![Some(Key::Capture); 4], store);
        let report = s.run().unwrap();
        assert_eq!(report.outcome, SessionState::Finished);
        assert!(report.captured.is_empty());
    }

    #[test]
    fn test_report_serializes() {
        let mut s = session(
            MockCamera::with_size(64, 48),
            vec![Some(Key::Quit)],
            store_without(&[]),
        );
        let report = s.run().unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"]["Quit"], "Operator");
    }
}
