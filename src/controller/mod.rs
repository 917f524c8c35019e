//! Capture controller: view state, rendering decisions and the capture flow

mod capture;
mod driver;
mod render;
mod state;
#[cfg(test)]
mod tests;

pub use capture::{
    run_capture, select_default_picture_size, CaptureResult, SavedPhoto, PRESET_DEFAULT_LABEL,
};
pub use driver::{CaptureController, ControllerCommand, ControllerHandle};
pub use render::{render, CameraOverlay, Screen, NO_PERMISSIONS_MESSAGE};
pub use state::{CaptureOutcome, PermissionState, ToggleOutcome, ViewMode, ViewState};
