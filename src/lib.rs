pub mod app;
pub mod camera;
pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod events;
pub mod keyboard_input;
pub mod permissions;
pub mod storage;

pub use app::{ComponentState, ShutdownReason, ToadscanOrchestrator};
pub use camera::{
    Camera, CameraBuilder, CameraSettings, CapturedImage, MockCamera, PictureSize, Platform,
};
pub use config::ToadscanConfig;
pub use controller::{
    CaptureController, ControllerCommand, ControllerHandle, SavedPhoto, Screen, ViewMode,
    ViewState,
};
pub use display::TerminalDisplay;
pub use error::{Result, ToadscanError};
pub use events::{EventBus, EventFilter, EventReceiver, ToadscanEvent};
pub use permissions::{PermissionProvider, PermissionStatus};
pub use storage::{PhotoStore, StoredPhoto};
