use crate::camera::PictureSize;
use crate::controller::Screen;
use crate::error::EventBusError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Events that can occur in the camera application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ToadscanEvent {
    /// The camera permission request was answered
    PermissionResolved {
        granted: bool,
        timestamp: SystemTime,
    },
    /// The camera reported readiness and a default picture size was chosen
    CameraReady {
        picture_size: Option<PictureSize>,
        timestamp: SystemTime,
    },
    /// A still capture was requested
    CaptureStarted { timestamp: SystemTime },
    /// A captured photo was moved into permanent storage
    PhotoSaved {
        path: PathBuf,
        timestamp: SystemTime,
    },
    /// A capture ended without a stored photo
    CaptureFailed { reason: String, timestamp: SystemTime },
    /// The rendered screen changed
    ViewChanged { screen: Screen, timestamp: SystemTime },
    /// A system error occurred in a component
    SystemError { component: String, error: String },
    /// Application shutdown requested
    ShutdownRequested {
        timestamp: SystemTime,
        reason: String,
    },
}

impl ToadscanEvent {
    /// Get the timestamp of the event
    pub fn timestamp(&self) -> SystemTime {
        match self {
            ToadscanEvent::PermissionResolved { timestamp, .. } => *timestamp,
            ToadscanEvent::CameraReady { timestamp, .. } => *timestamp,
            ToadscanEvent::CaptureStarted { timestamp } => *timestamp,
            ToadscanEvent::PhotoSaved { timestamp, .. } => *timestamp,
            ToadscanEvent::CaptureFailed { timestamp, .. } => *timestamp,
            ToadscanEvent::ViewChanged { timestamp, .. } => *timestamp,
            ToadscanEvent::SystemError { .. } => SystemTime::now(),
            ToadscanEvent::ShutdownRequested { timestamp, .. } => *timestamp,
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            ToadscanEvent::PermissionResolved { granted, .. } => {
                format!(
                    "Camera permission {}",
                    if *granted { "granted" } else { "denied" }
                )
            }
            ToadscanEvent::CameraReady { picture_size, .. } => match picture_size {
                Some(size) => format!("Camera ready with picture size {}", size),
                None => "Camera ready without a picture size".to_string(),
            },
            ToadscanEvent::CaptureStarted { .. } => "Capture started".to_string(),
            ToadscanEvent::PhotoSaved { path, .. } => {
                format!("Photo saved: {}", path.display())
            }
            ToadscanEvent::CaptureFailed { reason, .. } => {
                format!("Capture failed: {}", reason)
            }
            ToadscanEvent::ViewChanged { screen, .. } => {
                format!("View changed to {}", screen.name())
            }
            ToadscanEvent::SystemError { component, error } => {
                format!("Error in {}: {}", component, error)
            }
            ToadscanEvent::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            ToadscanEvent::PermissionResolved { .. } => "permission_resolved",
            ToadscanEvent::CameraReady { .. } => "camera_ready",
            ToadscanEvent::CaptureStarted { .. } => "capture_started",
            ToadscanEvent::PhotoSaved { .. } => "photo_saved",
            ToadscanEvent::CaptureFailed { .. } => "capture_failed",
            ToadscanEvent::ViewChanged { .. } => "view_changed",
            ToadscanEvent::SystemError { .. } => "system_error",
            ToadscanEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Async event bus for component coordination using broadcast channels
pub struct EventBus {
    sender: broadcast::Sender<ToadscanEvent>,
    debug_logging: bool,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: false,
        }
    }

    /// Create a new event bus with debug logging enabled
    pub fn with_debug_logging(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: true,
        }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<ToadscanEvent> {
        self.sender.subscribe()
    }

    /// Subscribe with a filter
    pub fn subscribe_filtered(&self, filter: EventFilter, name: &str) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), filter, name.to_string())
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: ToadscanEvent) -> Result<usize, EventBusError> {
        if self.debug_logging {
            debug!("Publishing event: {}", event.description());
        }

        match &event {
            ToadscanEvent::PermissionResolved { granted, .. } => {
                if *granted {
                    info!("Camera permission granted");
                } else {
                    warn!("Camera permission denied");
                }
            }
            ToadscanEvent::PhotoSaved { path, .. } => {
                info!("Photo saved to {}", path.display());
            }
            ToadscanEvent::CaptureFailed { reason, .. } => {
                warn!("Capture failed: {}", reason);
            }
            ToadscanEvent::SystemError { component, error } => {
                error!("System error in {}: {}", component, error);
            }
            ToadscanEvent::ShutdownRequested { reason, .. } => {
                info!("Shutdown requested: {}", reason);
            }
            _ => {
                if self.debug_logging {
                    debug!("Event: {}", event.description());
                }
            }
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            debug_logging: self.debug_logging,
        }
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// Accept all events
    All,
    /// Accept only specific event types
    EventTypes(Vec<&'static str>),
    /// Custom filter function
    Custom(fn(&ToadscanEvent) -> bool),
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &ToadscanEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
            EventFilter::Custom(filter_fn) => filter_fn(event),
        }
    }
}

/// Event receiver with filtering
pub struct EventReceiver {
    receiver: broadcast::Receiver<ToadscanEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    pub fn new(
        receiver: broadcast::Receiver<ToadscanEvent>,
        filter: EventFilter,
        name: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next event passing the filter
    ///
    /// Lagging skips the missed events and keeps receiving.
    pub async fn recv(&mut self) -> Result<ToadscanEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<Option<ToadscanEvent>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}
