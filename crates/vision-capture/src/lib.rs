//! vision-capture: frames, camera/display/storage abstractions and guide compositing

mod types;
pub use types::{Frame, Key, PixelFormat};

mod error;
pub use error::{Error, Result};

mod traits;
pub use traits::{CameraSource, DisplaySurface, ImageStore};

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "mock")]
pub use mock::{MemoryStore, MockCamera, MockDisplay, MockRead};

#[cfg(feature = "opencv")]
mod opencv_backend;
#[cfg(feature = "opencv")]
pub use opencv_backend::{HighGuiDisplay, OpenCvCamera};

/// PNG storage on the local filesystem
pub mod io;

pub mod compositor;

pub mod guide;
pub use guide::GuideImage;
