use crate::camera::{CameraSettings, PictureSize};
use crate::error::CaptureError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which top-level view is shown and whether a capture is in flight
///
/// A capture can only be in flight while the camera view is shown, so the
/// gallery and an in-flight capture never coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    Preview,
    /// `switch_pending` records a gallery toggle requested mid-capture
    Capturing { switch_pending: bool },
    Gallery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionState {
    Pending,
    Granted,
    Denied,
}

/// Result of a view toggle request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The view switched immediately
    Switched { show_gallery: bool },
    /// A capture is in flight; the switch waits for it to complete
    Deferred { switch_pending: bool },
    /// Permission was not granted; only the placeholder can be shown
    Ignored,
}

/// What completing a capture did to the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub switched_to_gallery: bool,
}

/// View state owned by the capture controller
#[derive(Debug, Clone)]
pub struct ViewState {
    permission: PermissionState,
    camera: CameraSettings,
    picture_sizes: Vec<PictureSize>,
    picture_size_id: Option<usize>,
    new_photos: bool,
    mode: ViewMode,
}

impl ViewState {
    pub fn new(camera: CameraSettings) -> Self {
        Self {
            permission: PermissionState::Pending,
            camera,
            picture_sizes: Vec::new(),
            picture_size_id: None,
            new_photos: false,
            mode: ViewMode::Preview,
        }
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    pub fn permissions_granted(&self) -> bool {
        self.permission == PermissionState::Granted
    }

    pub fn camera_settings(&self) -> &CameraSettings {
        &self.camera
    }

    pub fn picture_size(&self) -> Option<&PictureSize> {
        self.camera.picture_size.as_ref()
    }

    pub fn picture_sizes(&self) -> &[PictureSize] {
        &self.picture_sizes
    }

    pub fn picture_size_id(&self) -> Option<usize> {
        self.picture_size_id
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn taking_photo(&self) -> bool {
        matches!(self.mode, ViewMode::Capturing { .. })
    }

    pub fn show_gallery(&self) -> bool {
        self.mode == ViewMode::Gallery
    }

    /// A gallery toggle was requested while the current capture is in flight
    pub fn switch_pending(&self) -> bool {
        matches!(
            self.mode,
            ViewMode::Capturing {
                switch_pending: true
            }
        )
    }

    pub fn new_photos(&self) -> bool {
        self.new_photos
    }

    /// Record the permission answer. Only the first answer is kept.
    pub fn resolve_permission(&mut self, granted: bool) -> bool {
        if self.permission != PermissionState::Pending {
            debug!("Ignoring repeated permission answer");
            return false;
        }

        self.permission = if granted {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        };
        true
    }

    /// Enter the capturing state
    pub fn begin_capture(&mut self) -> Result<(), CaptureError> {
        match self.mode {
            ViewMode::Capturing { .. } => Err(CaptureError::AlreadyInFlight),
            ViewMode::Gallery => Err(CaptureError::CameraUnavailable),
            ViewMode::Preview if !self.permissions_granted() => {
                Err(CaptureError::CameraUnavailable)
            }
            ViewMode::Preview => {
                self.mode = ViewMode::Capturing {
                    switch_pending: false,
                };
                Ok(())
            }
        }
    }

    /// Toggle between camera and gallery, deferring while a capture is in flight
    pub fn request_toggle(&mut self) -> ToggleOutcome {
        if !self.permissions_granted() {
            return ToggleOutcome::Ignored;
        }

        match self.mode {
            ViewMode::Capturing { switch_pending } => {
                self.mode = ViewMode::Capturing {
                    switch_pending: !switch_pending,
                };
                ToggleOutcome::Deferred {
                    switch_pending: !switch_pending,
                }
            }
            ViewMode::Preview => {
                self.switch_view(ViewMode::Gallery);
                ToggleOutcome::Switched { show_gallery: true }
            }
            ViewMode::Gallery => {
                self.switch_view(ViewMode::Preview);
                ToggleOutcome::Switched {
                    show_gallery: false,
                }
            }
        }
    }

    /// Leave the gallery. Returns false when the gallery is not shown.
    pub fn close_gallery(&mut self) -> bool {
        if self.mode != ViewMode::Gallery {
            return false;
        }

        self.switch_view(ViewMode::Preview);
        true
    }

    /// Leave the capturing state
    ///
    /// `saved` tells whether the photo reached permanent storage. A pending
    /// switch is honored either way.
    pub fn complete_capture(&mut self, saved: bool) -> CaptureOutcome {
        match self.mode {
            ViewMode::Capturing {
                switch_pending: true,
            } => {
                self.switch_view(ViewMode::Gallery);
                CaptureOutcome {
                    switched_to_gallery: true,
                }
            }
            ViewMode::Capturing {
                switch_pending: false,
            } => {
                self.mode = ViewMode::Preview;
                if saved {
                    self.new_photos = true;
                }
                CaptureOutcome {
                    switched_to_gallery: false,
                }
            }
            ViewMode::Preview | ViewMode::Gallery => {
                debug!("Capture completion with no capture in flight");
                CaptureOutcome {
                    switched_to_gallery: false,
                }
            }
        }
    }

    /// Store the sizes reported by a ready camera and the chosen default
    ///
    /// An already chosen size is kept when no new choice can be made.
    pub fn camera_ready(&mut self, sizes: Vec<PictureSize>, chosen: Option<usize>) {
        let picked = chosen.and_then(|id| sizes.get(id).cloned().map(|size| (id, size)));
        self.picture_sizes = sizes;

        if let Some((id, size)) = picked {
            self.picture_size_id = Some(id);
            self.camera.picture_size = Some(size);
        }
    }

    fn switch_view(&mut self, mode: ViewMode) {
        self.mode = mode;
        self.new_photos = false;
    }
}
