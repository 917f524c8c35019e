use super::types::{AspectRatio, CameraSettings, CapturedImage, PictureSize};
use crate::error::CameraError;
use async_trait::async_trait;

/// Camera backend the capture controller drives
///
/// Implementations write each still image to a transient location and hand
/// back its path; moving it into permanent storage is the caller's job.
#[async_trait]
pub trait Camera: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &str;

    /// Attach to the device. Resolves once the camera is ready for capture.
    async fn open(&self) -> Result<(), CameraError>;

    /// Still-image sizes supported at `ratio`, in ascending order
    async fn supported_picture_sizes(
        &self,
        ratio: &AspectRatio,
    ) -> Result<Vec<PictureSize>, CameraError>;

    /// Expose and encode one still image
    async fn capture_still(&self, settings: &CameraSettings) -> Result<CapturedImage, CameraError>;

    /// Release the device
    async fn close(&self) -> Result<(), CameraError> {
        Ok(())
    }
}
