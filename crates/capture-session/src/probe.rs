use tracing::{debug, info};
use vision_capture::CameraSource;

use crate::{Result, SessionError};

/// Open the first camera that responds among `indices`, in order.
pub fn probe_camera<C: CameraSource>(indices: &[i32]) -> Result<(i32, C)> {
    for &index in indices {
        match C::open(&index.to_string()) {
            Ok(cam) => {
                info!("Camera initialized on index {index}");
                return Ok((index, cam));
            }
            Err(err) => debug!("camera index {index} unavailable: {err}"),
        }
    }
    Err(SessionError::DeviceUnavailable {
        probed: indices.to_vec(),
    })
}
