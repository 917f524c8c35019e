use super::interface::Camera;
use super::types::{AspectRatio, CameraSettings, CapturedImage, PictureSize};
use crate::error::CameraError;
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, trace};

/// Frame size used when the selected picture size is a preset label
const PRESET_FALLBACK_SIZE: (u32, u32) = (320, 180);

/// Mock camera for running without hardware
///
/// Each capture encodes a small gradient JPEG into the transient directory.
pub struct MockCamera {
    sizes: Vec<PictureSize>,
    transient_dir: PathBuf,
    capture_delay: Duration,
    capture_counter: AtomicU64,
    is_open: AtomicBool,
    fail_open: AtomicBool,
    fail_capture: AtomicBool,
}

impl MockCamera {
    pub fn new(transient_dir: impl Into<PathBuf>) -> Self {
        Self {
            sizes: vec![
                PictureSize::new("160x90"),
                PictureSize::new("320x180"),
                PictureSize::new("640x360"),
            ],
            transient_dir: transient_dir.into(),
            capture_delay: Duration::ZERO,
            capture_counter: AtomicU64::new(0),
            is_open: AtomicBool::new(false),
            fail_open: AtomicBool::new(false),
            fail_capture: AtomicBool::new(false),
        }
    }

    /// Replace the size list reported by `supported_picture_sizes`
    pub fn with_sizes<I, S>(mut self, sizes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PictureSize>,
    {
        self.sizes = sizes.into_iter().map(Into::into).collect();
        self
    }

    /// Hold every capture for `delay` before the image is written
    pub fn with_capture_delay(mut self, delay: Duration) -> Self {
        self.capture_delay = delay;
        self
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_capture(&self, fail: bool) {
        self.fail_capture.store(fail, Ordering::SeqCst);
    }

    pub fn capture_count(&self) -> u64 {
        self.capture_counter.load(Ordering::SeqCst)
    }

    pub fn transient_dir(&self) -> &PathBuf {
        &self.transient_dir
    }

    fn encode_frame(width: u32, height: u32, seed: u64) -> Result<Vec<u8>, CameraError> {
        let shift = (seed % 256) as u8;
        let frame = RgbImage::from_fn(width, height, |x, y| {
            let r = ((x * 255) / width.max(1)) as u8;
            let g = ((y * 255) / height.max(1)) as u8;
            Rgb([r, g, shift])
        });

        let mut data = Vec::new();
        JpegEncoder::new_with_quality(&mut data, 85)
            .encode_image(&frame)
            .map_err(|e| CameraError::StillCapture {
                details: format!("Failed to encode mock frame: {}", e),
            })?;

        Ok(data)
    }
}

#[async_trait]
impl Camera for MockCamera {
    fn name(&self) -> &str {
        "mock"
    }

    async fn open(&self) -> Result<(), CameraError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(CameraError::DeviceOpen {
                device: "mock".to_string(),
                details: "simulated mount failure".to_string(),
            });
        }

        self.is_open.store(true, Ordering::SeqCst);
        info!("Mock camera opened");
        Ok(())
    }

    async fn supported_picture_sizes(
        &self,
        ratio: &AspectRatio,
    ) -> Result<Vec<PictureSize>, CameraError> {
        if !self.is_open.load(Ordering::SeqCst) {
            return Err(CameraError::NotReady);
        }

        debug!(
            "Mock camera reporting {} picture sizes for {}",
            self.sizes.len(),
            ratio
        );
        Ok(self.sizes.clone())
    }

    async fn capture_still(&self, settings: &CameraSettings) -> Result<CapturedImage, CameraError> {
        if !self.is_open.load(Ordering::SeqCst) {
            return Err(CameraError::NotReady);
        }

        if !self.capture_delay.is_zero() {
            tokio::time::sleep(self.capture_delay).await;
        }

        if self.fail_capture.load(Ordering::SeqCst) {
            return Err(CameraError::StillCapture {
                details: "simulated capture failure".to_string(),
            });
        }

        let seed = self.capture_counter.fetch_add(1, Ordering::SeqCst);
        let (width, height) = settings
            .picture_size
            .as_ref()
            .and_then(PictureSize::dimensions)
            .unwrap_or(PRESET_FALLBACK_SIZE);

        let data = Self::encode_frame(width, height, seed)?;

        tokio::fs::create_dir_all(&self.transient_dir)
            .await
            .map_err(|e| CameraError::StillCapture {
                details: format!(
                    "Failed to create transient directory {}: {}",
                    self.transient_dir.display(),
                    e
                ),
            })?;

        let path = self
            .transient_dir
            .join(format!("capture-{}-{}.jpg", std::process::id(), seed));
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| CameraError::StillCapture {
                details: format!("Failed to write {}: {}", path.display(), e),
            })?;

        trace!(
            "Mock capture {} written to {} ({}x{}, {} bytes)",
            seed,
            path.display(),
            width,
            height,
            data.len()
        );

        Ok(CapturedImage {
            path,
            width,
            height,
        })
    }

    async fn close(&self) -> Result<(), CameraError> {
        self.is_open.store(false, Ordering::SeqCst);
        debug!("Mock camera closed");
        Ok(())
    }
}
