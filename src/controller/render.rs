use super::state::ViewState;
use crate::camera::{FlashMode, PictureSize};
use serde::{Deserialize, Serialize};

pub const NO_PERMISSIONS_MESSAGE: &str =
    "Camera permissions not granted - cannot open camera preview.";

/// Overlay controls drawn on top of the live camera view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraOverlay {
    pub taking_photo: bool,
    /// Notification dot on the gallery button
    pub new_photos: bool,
    pub switch_pending: bool,
    pub picture_size: Option<PictureSize>,
    pub flash_mode: FlashMode,
    pub zoom: f32,
}

/// Top-level screen derived from the view state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Screen {
    NoPermissions,
    Gallery,
    Camera(CameraOverlay),
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::NoPermissions => "no_permissions",
            Screen::Gallery => "gallery",
            Screen::Camera(_) => "camera",
        }
    }
}

/// Decide what to show for a view state
pub fn render(state: &ViewState) -> Screen {
    if !state.permissions_granted() {
        return Screen::NoPermissions;
    }

    if state.show_gallery() {
        return Screen::Gallery;
    }

    let settings = state.camera_settings();
    Screen::Camera(CameraOverlay {
        taking_photo: state.taking_photo(),
        new_photos: state.new_photos(),
        switch_pending: state.switch_pending(),
        picture_size: settings.picture_size.clone(),
        flash_mode: settings.flash_mode,
        zoom: settings.zoom,
    })
}
