use super::interface::Camera;
use super::mock::MockCamera;
use crate::config::CameraConfig;
use crate::error::{Result, ToadscanError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Builder selecting the camera backend for a configuration
pub struct CameraBuilder {
    config: Option<CameraConfig>,
    transient_dir: Option<PathBuf>,
    force_mock: bool,
}

impl CameraBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            transient_dir: None,
            force_mock: false,
        }
    }

    pub fn config(mut self, config: CameraConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn transient_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.transient_dir = Some(dir.into());
        self
    }

    /// Use the mock backend even when hardware support is compiled in
    pub fn mock(mut self, force_mock: bool) -> Self {
        self.force_mock = force_mock;
        self
    }

    pub fn build(self) -> Result<Arc<dyn Camera>> {
        let config = self
            .config
            .ok_or_else(|| ToadscanError::system("Camera configuration must be specified"))?;
        let transient_dir = self
            .transient_dir
            .unwrap_or_else(default_transient_dir);

        if self.force_mock {
            info!("Using mock camera backend");
            return Ok(Arc::new(MockCamera::new(transient_dir)));
        }

        Ok(hardware_camera(&config, transient_dir))
    }
}

impl Default for CameraBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Directory the camera writes stills to before they are moved into storage
pub fn default_transient_dir() -> PathBuf {
    std::env::temp_dir().join("toadscan")
}

#[cfg(all(target_os = "linux", feature = "camera"))]
fn hardware_camera(config: &CameraConfig, transient_dir: PathBuf) -> Arc<dyn Camera> {
    info!("Using GStreamer camera backend on /dev/video{}", config.index);
    Arc::new(super::gst::GstCamera::new(config.index, transient_dir))
}

#[cfg(not(all(target_os = "linux", feature = "camera")))]
fn hardware_camera(config: &CameraConfig, transient_dir: PathBuf) -> Arc<dyn Camera> {
    tracing::warn!(
        "No hardware camera backend compiled in for device {}; using mock camera",
        config.index
    );
    Arc::new(MockCamera::new(transient_dir))
}
