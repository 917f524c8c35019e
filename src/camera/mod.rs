mod builder;
#[cfg(all(target_os = "linux", feature = "camera"))]
mod gst;
mod interface;
mod mock;
mod types;

pub use builder::{default_transient_dir, CameraBuilder};
#[cfg(all(target_os = "linux", feature = "camera"))]
pub use gst::GstCamera;
pub use interface::Camera;
pub use mock::MockCamera;
pub use types::{
    AspectRatio, AutoFocus, CameraSettings, CapturedImage, Facing, FlashMode, PictureSize,
    Platform, WhiteBalance,
};
