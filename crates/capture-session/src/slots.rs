use serde::Serialize;
use std::path::{Path, PathBuf};

/// One stage of the capture sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuideSlot {
    pub path: PathBuf,
    pub label: String,
    pub ordinal: usize,
}

const VEHICLE_SIDES: [(&str, &str); 4] = [
    ("car_left.png", "left"),
    ("car_right.png", "right"),
    ("car_front.png", "front"),
    ("car_rear.png", "rear"),
];

/// The fixed left, right, front, rear sequence with guides under `assets_dir`.
pub fn default_slots(assets_dir: &Path) -> Vec<GuideSlot> {
    VEHICLE_SIDES
        .iter()
        .enumerate()
        .map(|(ordinal, (file, label))| GuideSlot {
            path: assets_dir.join(file),
            label: (*label).to_string(),
            ordinal,
        })
        .collect()
}
