use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToadscanError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

/// Errors raised by camera backends
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera device {device}: {details}")]
    DeviceOpen { device: String, details: String },

    #[error("Camera configuration error: {details}")]
    Configuration { details: String },

    #[error("Still capture failed: {details}")]
    StillCapture { details: String },

    #[error("Failed to query picture sizes: {details}")]
    PictureSizes { details: String },

    #[error("Camera is not ready")]
    NotReady,
}

/// Errors raised by the photo store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create photo directory {path}: {source}")]
    DirectoryCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read photo directory {path}: {source}")]
    Listing {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the capture workflow
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("A capture is already in flight")]
    AlreadyInFlight,

    #[error("No live camera is attached")]
    CameraUnavailable,

    #[error("Camera failed during capture: {0}")]
    Camera(#[source] CameraError),

    #[error("Captured image could not be stored: {0}")]
    Store(#[source] StorageError),

    #[error("Capture task ended unexpectedly: {details}")]
    TaskAborted { details: String },
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Event bus channel closed")]
    ChannelClosed,
}

impl ToadscanError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

impl CaptureError {
    /// Whether the request was refused before any work was started
    pub fn is_rejection(&self) -> bool {
        matches!(self, CaptureError::AlreadyInFlight | CaptureError::CameraUnavailable)
    }
}

pub type Result<T> = std::result::Result<T, ToadscanError>;
