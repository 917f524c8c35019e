use crate::camera::{Camera, CameraSettings, PictureSize, Platform};
use crate::error::CaptureError;
use crate::storage::PhotoStore;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error};

/// Preset label the iOS camera subsystem uses for its default quality
pub const PRESET_DEFAULT_LABEL: &str = "High";

/// A photo that reached permanent storage
#[derive(Debug, Clone, PartialEq)]
pub struct SavedPhoto {
    pub path: PathBuf,
    pub saved_at: DateTime<Utc>,
    pub width: u32,
    pub height: u32,
}

pub type CaptureResult = Result<SavedPhoto, CaptureError>;

/// Capture one still and move it into the photo store
///
/// The transient file is removed when it cannot be stored.
pub async fn run_capture(
    camera: Arc<dyn Camera>,
    store: Arc<PhotoStore>,
    settings: CameraSettings,
) -> CaptureResult {
    let image = camera
        .capture_still(&settings)
        .await
        .map_err(CaptureError::Camera)?;

    debug!("Camera wrote transient image {}", image.path.display());

    if let Err(e) = store.ensure_directory().await {
        error!("Photo directory unavailable: {}", e);
        store.discard_transient(&image.path).await;
        return Err(CaptureError::Store(e));
    }

    let saved_at = Utc::now();
    match store.persist(&image.path, saved_at).await {
        Ok(path) => Ok(SavedPhoto {
            path,
            saved_at,
            width: image.width,
            height: image.height,
        }),
        Err(e) => {
            error!("Failed to store captured image: {}", e);
            store.discard_transient(&image.path).await;
            Err(CaptureError::Store(e))
        }
    }
}

/// Index of the default picture size for `platform`
///
/// iOS picks its "High" preset; every other platform reports sizes in
/// ascending order and gets the last, largest one. iOS falls back to the
/// largest size when no preset is reported.
pub fn select_default_picture_size(platform: Platform, sizes: &[PictureSize]) -> Option<usize> {
    if sizes.is_empty() {
        return None;
    }

    if platform.uses_preset_labels() {
        if let Some(id) = sizes
            .iter()
            .position(|size| size.label() == PRESET_DEFAULT_LABEL)
        {
            return Some(id);
        }
    }

    Some(sizes.len() - 1)
}
