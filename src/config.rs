use crate::camera::{
    AspectRatio, AutoFocus, CameraSettings, Facing, FlashMode, Platform, WhiteBalance,
};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ToadscanConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub permissions: PermissionsConfig,
    #[serde(default)]
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Camera device index (e.g., 0 for /dev/video0)
    #[serde(default)]
    pub index: u32,

    #[serde(default)]
    pub flash_mode: FlashMode,

    /// Zoom level between 0.0 (none) and 1.0 (maximum)
    #[serde(default)]
    pub zoom: f32,

    #[serde(default)]
    pub auto_focus: AutoFocus,

    #[serde(default)]
    pub facing: Facing,

    #[serde(default)]
    pub white_balance: WhiteBalance,

    /// Aspect ratio stills are captured at, e.g. "16:9"
    #[serde(default)]
    pub aspect_ratio: AspectRatio,

    /// Override for the platform whose picture size rules apply
    pub platform: Option<Platform>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Application document root; photos live in a subdirectory of it
    #[serde(default = "default_document_root")]
    pub document_root: String,

    /// Name of the photo directory under the document root
    #[serde(default = "default_photos_dir")]
    pub photos_dir: String,

    /// File extension given to stored photos
    #[serde(default = "default_photo_extension")]
    pub extension: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PermissionMode {
    /// Check access to the camera device node
    #[default]
    Device,
    Granted,
    Denied,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PermissionsConfig {
    #[serde(default)]
    pub mode: PermissionMode,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,

    /// Capacity of the controller's command queue
    #[serde(default = "default_command_queue_capacity")]
    pub command_queue_capacity: usize,
}

impl ToadscanConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.index", 0_u32)?
            .set_default("camera.flash_mode", "off")?
            .set_default("camera.zoom", 0.0)?
            .set_default("camera.auto_focus", "on")?
            .set_default("camera.facing", "back")?
            .set_default("camera.white_balance", "auto")?
            .set_default("camera.aspect_ratio", AspectRatio::WIDE.to_string())?
            .set_default("storage.document_root", default_document_root())?
            .set_default("storage.photos_dir", default_photos_dir())?
            .set_default("storage.extension", default_photo_extension())?
            .set_default("permissions.mode", "device")?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .set_default(
                "system.command_queue_capacity",
                default_command_queue_capacity() as i64,
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with TOADSCAN_ prefix
            .add_source(
                Environment::with_prefix("TOADSCAN")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: ToadscanConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.camera.zoom) {
            return Err(ConfigError::Message(format!(
                "Camera zoom must be between 0.0 and 1.0, got {}",
                self.camera.zoom
            )));
        }

        if self.storage.photos_dir.trim().is_empty() {
            return Err(ConfigError::Message(
                "Storage photos_dir must not be empty".to_string(),
            ));
        }

        if self.storage.photos_dir.contains(['/', '\\']) {
            return Err(ConfigError::Message(
                "Storage photos_dir must be a single directory name".to_string(),
            ));
        }

        if self.storage.extension.trim().is_empty() || self.storage.extension.contains('.') {
            return Err(ConfigError::Message(
                "Storage extension must be non-empty and given without a dot".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        if self.system.command_queue_capacity == 0 {
            return Err(ConfigError::Message(
                "Command queue capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Serialize the configuration as TOML
    pub fn to_toml(&self) -> crate::error::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl CameraConfig {
    /// Platform whose picture size rules apply
    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::current)
    }

    /// Initial capture settings; the picture size stays unset until the camera is ready
    pub fn initial_settings(&self) -> CameraSettings {
        CameraSettings {
            flash_mode: self.flash_mode,
            zoom: self.zoom,
            auto_focus: self.auto_focus,
            facing: self.facing,
            white_balance: self.white_balance,
            aspect_ratio: self.aspect_ratio,
            picture_size: None,
        }
    }
}

impl StorageConfig {
    pub fn photos_path(&self) -> PathBuf {
        PathBuf::from(&self.document_root).join(&self.photos_dir)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            flash_mode: FlashMode::Off,
            zoom: 0.0,
            auto_focus: AutoFocus::On,
            facing: Facing::Back,
            white_balance: WhiteBalance::Auto,
            aspect_ratio: AspectRatio::WIDE,
            platform: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            document_root: default_document_root(),
            photos_dir: default_photos_dir(),
            extension: default_photo_extension(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            event_bus_capacity: default_event_bus_capacity(),
            command_queue_capacity: default_command_queue_capacity(),
        }
    }
}

// Default value functions
fn default_document_root() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("toadscan"))
        .unwrap_or_else(|| PathBuf::from("."))
        .to_string_lossy()
        .to_string()
}
fn default_photos_dir() -> String {
    "photos".to_string()
}
fn default_photo_extension() -> String {
    "jpg".to_string()
}

fn default_event_bus_capacity() -> usize {
    100
}
fn default_command_queue_capacity() -> usize {
    32
}
