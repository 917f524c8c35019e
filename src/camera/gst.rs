use super::interface::Camera;
use super::types::{AspectRatio, CameraSettings, CapturedImage, PictureSize};
use crate::error::CameraError;
use async_trait::async_trait;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

/// Frame size requested when the selected picture size is a preset label
const DEFAULT_STILL_SIZE: (u32, u32) = (1280, 720);

/// GStreamer-backed camera taking one-shot stills from a v4l2 device
pub struct GstCamera {
    index: u32,
    transient_dir: PathBuf,
    capture_counter: AtomicU64,
    is_open: AtomicBool,
}

impl GstCamera {
    pub fn new(index: u32, transient_dir: impl Into<PathBuf>) -> Self {
        Self {
            index,
            transient_dir: transient_dir.into(),
            capture_counter: AtomicU64::new(0),
            is_open: AtomicBool::new(false),
        }
    }

    fn device_path(&self) -> String {
        format!("/dev/video{}", self.index)
    }

    /// Build the one-shot still pipeline for a capture
    fn build_still_pipeline(&self, width: u32, height: u32, location: &str) -> String {
        format!(
            "v4l2src device={} num-buffers=1 ! decodebin ! videoconvert ! videoscale ! \
             video/x-raw,width={},height={} ! jpegenc quality=90 ! filesink location={}",
            self.device_path(),
            width,
            height,
            location
        )
    }

    fn launch(desc: &str) -> Result<Pipeline, CameraError> {
        gstreamer::parse::launch(desc)
            .map_err(|e| CameraError::Configuration {
                details: format!("Failed to create pipeline: {}", e),
            })?
            .downcast::<Pipeline>()
            .map_err(|_| CameraError::Configuration {
                details: "Failed to downcast to Pipeline".to_string(),
            })
    }

    /// Run a pipeline until it reaches end of stream
    fn run_to_eos(pipeline: &Pipeline) -> Result<(), CameraError> {
        let bus = pipeline.bus().ok_or_else(|| CameraError::StillCapture {
            details: "Pipeline has no bus".to_string(),
        })?;

        pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| CameraError::StillCapture {
                details: format!("Failed to start pipeline: {}", e),
            })?;

        let outcome = match bus.timed_pop_filtered(
            gstreamer::ClockTime::NONE,
            &[gstreamer::MessageType::Eos, gstreamer::MessageType::Error],
        ) {
            Some(msg) => match msg.view() {
                gstreamer::MessageView::Eos(..) => Ok(()),
                gstreamer::MessageView::Error(err) => Err(CameraError::StillCapture {
                    details: format!("{} ({:?})", err.error(), err.debug()),
                }),
                _ => Ok(()),
            },
            None => Err(CameraError::StillCapture {
                details: "Pipeline bus closed before end of stream".to_string(),
            }),
        };

        if let Err(e) = pipeline.set_state(gstreamer::State::Null) {
            warn!("Failed to reset still pipeline: {}", e);
        }

        outcome
    }

    /// Collect fixed frame sizes advertised by the device matching `device_path`
    fn probe_sizes(device_path: &str) -> Result<Vec<(u32, u32)>, CameraError> {
        let monitor = gstreamer::DeviceMonitor::new();
        monitor.add_filter(Some("Video/Source"), None);
        monitor.start().map_err(|e| CameraError::PictureSizes {
            details: format!("Failed to start device monitor: {}", e),
        })?;

        let mut sizes = Vec::new();
        for device in monitor.devices() {
            let matches_path = device
                .properties()
                .map(|props| {
                    ["api.v4l2.path", "device.path"]
                        .iter()
                        .any(|key| props.get::<String>(*key).ok().as_deref() == Some(device_path))
                })
                .unwrap_or(false);

            if !matches_path {
                continue;
            }

            if let Some(caps) = device.caps() {
                for structure in caps.iter() {
                    if let (Ok(w), Ok(h)) =
                        (structure.get::<i32>("width"), structure.get::<i32>("height"))
                    {
                        if w > 0 && h > 0 {
                            sizes.push((w as u32, h as u32));
                        }
                    }
                }
            }
        }

        monitor.stop();
        Ok(sizes)
    }
}

#[async_trait]
impl Camera for GstCamera {
    fn name(&self) -> &str {
        "gstreamer"
    }

    async fn open(&self) -> Result<(), CameraError> {
        let device = self.device_path();
        info!("Opening GStreamer camera on {}", device);

        gstreamer::init().map_err(|e| CameraError::Configuration {
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;

        if !std::path::Path::new(&device).exists() {
            return Err(CameraError::DeviceOpen {
                device,
                details: "device node does not exist".to_string(),
            });
        }

        let pipeline = Self::launch(&format!("v4l2src device={} ! fakesink", device))?;
        pipeline
            .set_state(gstreamer::State::Ready)
            .map_err(|e| CameraError::DeviceOpen {
                device: device.clone(),
                details: e.to_string(),
            })?;
        pipeline
            .set_state(gstreamer::State::Null)
            .map_err(|e| CameraError::Configuration {
                details: format!("Failed to reset pipeline: {}", e),
            })?;

        self.is_open.store(true, Ordering::SeqCst);
        debug!("GStreamer camera {} ready", device);
        Ok(())
    }

    async fn supported_picture_sizes(
        &self,
        ratio: &AspectRatio,
    ) -> Result<Vec<PictureSize>, CameraError> {
        if !self.is_open.load(Ordering::SeqCst) {
            return Err(CameraError::NotReady);
        }

        let device = self.device_path();
        let mut sizes = tokio::task::spawn_blocking(move || Self::probe_sizes(&device))
            .await
            .map_err(|e| CameraError::PictureSizes {
                details: format!("Size probe task failed: {}", e),
            })??;

        sizes.retain(|(w, h)| ratio.matches(*w, *h));
        sizes.sort_by_key(|(w, h)| (*w as u64 * *h as u64, *w));
        sizes.dedup();

        debug!(
            "Device {} supports {} sizes at {}",
            self.device_path(),
            sizes.len(),
            ratio
        );

        Ok(sizes
            .into_iter()
            .map(|(w, h)| PictureSize::from_dimensions(w, h))
            .collect())
    }

    async fn capture_still(&self, settings: &CameraSettings) -> Result<CapturedImage, CameraError> {
        if !self.is_open.load(Ordering::SeqCst) {
            return Err(CameraError::NotReady);
        }

        tokio::fs::create_dir_all(&self.transient_dir)
            .await
            .map_err(|e| CameraError::StillCapture {
                details: format!(
                    "Failed to create transient directory {}: {}",
                    self.transient_dir.display(),
                    e
                ),
            })?;

        let (width, height) = settings
            .picture_size
            .as_ref()
            .and_then(PictureSize::dimensions)
            .unwrap_or(DEFAULT_STILL_SIZE);

        let seq = self.capture_counter.fetch_add(1, Ordering::SeqCst);
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let path = self
            .transient_dir
            .join(format!("still-{}-{}.jpg", stamp, seq));

        let pipeline = Self::launch(&self.build_still_pipeline(
            width,
            height,
            &path.to_string_lossy(),
        ))?;

        debug!(
            "Capturing {}x{} still from {} (flash {:?}, zoom {:.2})",
            width,
            height,
            self.device_path(),
            settings.flash_mode,
            settings.zoom
        );

        tokio::task::spawn_blocking(move || Self::run_to_eos(&pipeline))
            .await
            .map_err(|e| CameraError::StillCapture {
                details: format!("Capture task failed: {}", e),
            })?
            .map_err(|e| {
                error!("Still capture failed: {}", e);
                e
            })?;

        Ok(CapturedImage {
            path,
            width,
            height,
        })
    }

    async fn close(&self) -> Result<(), CameraError> {
        self.is_open.store(false, Ordering::SeqCst);
        info!("GStreamer camera {} closed", self.device_path());
        Ok(())
    }
}
