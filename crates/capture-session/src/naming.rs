use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::Result;

/// `captured_{label}_{YYYYMMDD-HHMMSS}.png` under `dir`.
pub fn capture_path(dir: &Path, label: &str, at: OffsetDateTime) -> Result<PathBuf> {
    let stamp = at.format(format_description!(
        "[year][month][day]-[hour][minute][second]"
    ))?;
    Ok(dir.join(format!("captured_{label}_{stamp}.png")))
}

/// Local wall-clock time, or UTC when the local offset cannot be determined.
pub fn capture_time() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_capture_path_pattern() {
        let at = datetime!(2024-03-07 09:05:02 UTC);
        let p = capture_path(Path::new("captured_images"), "front", at).unwrap();
        assert_eq!(
            p,
            Path::new("captured_images").join("captured_front_20240307-090502.png")
        );
    }
}
