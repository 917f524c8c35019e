use crate::config::{PermissionMode, ToadscanConfig};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Answer to a camera permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Source of the camera capability gate
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn request_camera(&self) -> PermissionStatus;
}

/// Provider with a fixed answer
pub struct StaticPermissions {
    status: PermissionStatus,
}

impl StaticPermissions {
    pub fn granted() -> Self {
        Self {
            status: PermissionStatus::Granted,
        }
    }

    pub fn denied() -> Self {
        Self {
            status: PermissionStatus::Denied,
        }
    }
}

#[async_trait]
impl PermissionProvider for StaticPermissions {
    async fn request_camera(&self) -> PermissionStatus {
        debug!("Static camera permission: {:?}", self.status);
        self.status
    }
}

/// Grants camera access when the device node is readable and writable by this process
pub struct DevicePermissions {
    device_path: String,
}

impl DevicePermissions {
    pub fn new(index: u32) -> Self {
        Self {
            device_path: format!("/dev/video{}", index),
        }
    }

    pub fn with_path<S: Into<String>>(device_path: S) -> Self {
        Self {
            device_path: device_path.into(),
        }
    }

    #[cfg(unix)]
    fn check_access(path: &str) -> bool {
        let c_path = match std::ffi::CString::new(path) {
            Ok(c_path) => c_path,
            Err(_) => return false,
        };

        // SAFETY: c_path is a valid NUL-terminated string for the duration of the call
        unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::W_OK) == 0 }
    }

    #[cfg(not(unix))]
    fn check_access(path: &str) -> bool {
        std::path::Path::new(path).exists()
    }
}

#[async_trait]
impl PermissionProvider for DevicePermissions {
    async fn request_camera(&self) -> PermissionStatus {
        let path = self.device_path.clone();
        let granted = tokio::task::spawn_blocking(move || Self::check_access(&path))
            .await
            .unwrap_or(false);

        if granted {
            info!("Camera access granted on {}", self.device_path);
            PermissionStatus::Granted
        } else {
            warn!("No read/write access to {}", self.device_path);
            PermissionStatus::Denied
        }
    }
}

/// Build the permission provider selected by the configuration
pub fn provider_for(config: &ToadscanConfig) -> Arc<dyn PermissionProvider> {
    match config.permissions.mode {
        PermissionMode::Device => Arc::new(DevicePermissions::new(config.camera.index)),
        PermissionMode::Granted => Arc::new(StaticPermissions::granted()),
        PermissionMode::Denied => Arc::new(StaticPermissions::denied()),
    }
}
