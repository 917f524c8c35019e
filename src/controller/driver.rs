use super::capture::{run_capture, select_default_picture_size, CaptureResult, SavedPhoto};
use super::render::{render, Screen};
use super::state::{ToggleOutcome, ViewState};
use crate::camera::{Camera, CameraSettings, PictureSize, Platform};
use crate::error::{CameraError, CaptureError, Result, ToadscanError};
use crate::events::{EventBus, ToadscanEvent};
use crate::permissions::PermissionProvider;
use crate::storage::PhotoStore;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Commands accepted by the controller loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerCommand {
    TakePhoto,
    ToggleView,
    CloseGallery,
    Shutdown,
}

/// Cloneable sender side of the controller loop
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    sender: mpsc::Sender<ControllerCommand>,
}

impl ControllerHandle {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ControllerCommand>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    pub async fn send(&self, command: ControllerCommand) -> Result<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| ToadscanError::component("controller", "command loop has stopped"))
    }

    /// Send without waiting, for callers outside the async runtime
    pub fn try_send(&self, command: ControllerCommand) -> Result<()> {
        self.sender
            .try_send(command)
            .map_err(|e| ToadscanError::component("controller".to_string(), e.to_string()))
    }

    pub async fn take_photo(&self) -> Result<()> {
        self.send(ControllerCommand::TakePhoto).await
    }

    pub async fn toggle_view(&self) -> Result<()> {
        self.send(ControllerCommand::ToggleView).await
    }

    pub async fn close_gallery(&self) -> Result<()> {
        self.send(ControllerCommand::CloseGallery).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(ControllerCommand::Shutdown).await
    }
}

/// Owns the view state and drives captures against the camera and store
///
/// All state changes happen on the task that owns the controller. Captures
/// run on their own task and report back through a completion channel.
pub struct CaptureController {
    state: ViewState,
    platform: Platform,
    camera: Arc<dyn Camera>,
    camera_mounted: bool,
    permissions: Arc<dyn PermissionProvider>,
    store: Arc<PhotoStore>,
    event_bus: Arc<EventBus>,
    completion_tx: mpsc::UnboundedSender<CaptureResult>,
    completion_rx: Option<mpsc::UnboundedReceiver<CaptureResult>>,
    directory_task: Option<JoinHandle<()>>,
    last_screen: Option<Screen>,
}

impl CaptureController {
    pub fn new(
        settings: CameraSettings,
        platform: Platform,
        camera: Arc<dyn Camera>,
        permissions: Arc<dyn PermissionProvider>,
        store: Arc<PhotoStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let state = ViewState::new(settings);

        Self {
            state,
            platform,
            camera,
            camera_mounted: false,
            permissions,
            store,
            event_bus,
            completion_tx,
            completion_rx: Some(completion_rx),
            directory_task: None,
            last_screen: None,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn render(&self) -> Screen {
        render(&self.state)
    }

    pub fn camera_mounted(&self) -> bool {
        self.camera_mounted
    }

    /// Ask for permission, start directory creation and open the camera
    pub async fn mount(&mut self) {
        let status = self.permissions.request_camera().await;
        if self.state.resolve_permission(status.is_granted()) {
            self.emit(ToadscanEvent::PermissionResolved {
                granted: status.is_granted(),
                timestamp: SystemTime::now(),
            });
        }

        self.spawn_directory_creation();

        if self.state.permissions_granted() {
            self.mount_camera().await;
        } else {
            warn!("Camera permission denied; preview disabled");
        }

        self.publish_view();
    }

    /// Wait for the directory creation started by `mount`
    pub async fn wait_for_storage(&mut self) {
        if let Some(task) = self.directory_task.take() {
            if let Err(e) = task.await {
                warn!("Photo directory task ended abnormally: {}", e);
            }
        }
    }

    /// Query supported sizes and pick the platform default
    pub async fn on_camera_ready(&mut self) -> std::result::Result<Option<PictureSize>, CameraError> {
        let ratio = self.state.camera_settings().aspect_ratio;
        let sizes = self.camera.supported_picture_sizes(&ratio).await?;
        let chosen = select_default_picture_size(self.platform, &sizes);

        debug!(
            "Camera reported {} picture sizes for {}, chose {:?}",
            sizes.len(),
            ratio,
            chosen
        );

        self.state.camera_ready(sizes, chosen);
        let picture_size = self.state.picture_size().cloned();

        self.emit(ToadscanEvent::CameraReady {
            picture_size: picture_size.clone(),
            timestamp: SystemTime::now(),
        });
        self.publish_view();

        Ok(picture_size)
    }

    /// Start a capture on its own task
    pub fn request_capture(&mut self) -> std::result::Result<(), CaptureError> {
        if self.state.taking_photo() {
            return Err(CaptureError::AlreadyInFlight);
        }
        if !self.camera_mounted {
            return Err(CaptureError::CameraUnavailable);
        }
        self.state.begin_capture()?;

        let camera = Arc::clone(&self.camera);
        let store = Arc::clone(&self.store);
        let settings = self.state.camera_settings().clone();
        let completion_tx = self.completion_tx.clone();

        tokio::spawn(async move {
            let result = match tokio::spawn(run_capture(camera, store, settings)).await {
                Ok(result) => result,
                Err(e) => Err(CaptureError::TaskAborted {
                    details: e.to_string(),
                }),
            };

            if completion_tx.send(result).is_err() {
                debug!("Controller dropped before capture completed");
            }
        });

        info!("Capture started");
        self.emit(ToadscanEvent::CaptureStarted {
            timestamp: SystemTime::now(),
        });
        self.publish_view();

        Ok(())
    }

    /// Wait for the in-flight capture to report back
    ///
    /// Returns `None` once the controller loop owns the completion channel.
    pub async fn next_completion(&mut self) -> Option<CaptureResult> {
        self.completion_rx.as_mut()?.recv().await
    }

    /// Apply a capture outcome to the view state
    pub fn finish_capture(&mut self, result: CaptureResult) -> CaptureResult {
        let outcome = self.state.complete_capture(result.is_ok());

        match &result {
            Ok(photo) => self.emit(ToadscanEvent::PhotoSaved {
                path: photo.path.clone(),
                timestamp: SystemTime::now(),
            }),
            Err(e) => {
                error!("Capture failed: {}", e);
                self.emit(ToadscanEvent::CaptureFailed {
                    reason: e.to_string(),
                    timestamp: SystemTime::now(),
                });
            }
        }

        if outcome.switched_to_gallery {
            info!("Switching to gallery after capture");
        }
        self.publish_view();

        result
    }

    /// Request and finish one capture
    pub async fn capture_and_wait(&mut self) -> std::result::Result<SavedPhoto, CaptureError> {
        self.request_capture()?;
        match self.next_completion().await {
            Some(result) => self.finish_capture(result),
            None => Err(CaptureError::TaskAborted {
                details: "completion channel unavailable".to_string(),
            }),
        }
    }

    pub fn request_view_toggle(&mut self) -> ToggleOutcome {
        let outcome = self.state.request_toggle();
        match outcome {
            ToggleOutcome::Deferred { switch_pending } => {
                debug!("View switch deferred until capture completes (pending: {})", switch_pending)
            }
            ToggleOutcome::Ignored => debug!("View toggle ignored without camera permission"),
            ToggleOutcome::Switched { .. } => {}
        }
        self.publish_view();
        outcome
    }

    /// Return from the gallery to the camera view
    pub fn close_gallery(&mut self) -> bool {
        let closed = self.state.close_gallery();
        if closed {
            self.publish_view();
        }
        closed
    }

    /// Process commands and capture completions until shutdown
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<ControllerCommand>,
        cancellation_token: CancellationToken,
    ) -> Result<()> {
        let mut completions = self
            .completion_rx
            .take()
            .ok_or_else(|| ToadscanError::system("Controller loop is already running"))?;

        info!("Capture controller loop started");

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    debug!("Controller loop cancelled");
                    break;
                }
                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command).await {
                            break;
                        }
                    }
                    None => {
                        debug!("All controller handles dropped");
                        break;
                    }
                },
                Some(result) = completions.recv() => {
                    // Failures are logged and published by finish_capture
                    let _ = self.finish_capture(result);
                }
            }
        }

        self.unmount().await;
        info!("Capture controller loop stopped");
        Ok(())
    }

    async fn handle_command(&mut self, command: ControllerCommand) -> bool {
        trace!("Controller command: {:?}", command);

        match command {
            ControllerCommand::TakePhoto => {
                match self.request_capture() {
                    Ok(()) => {}
                    Err(e) if e.is_rejection() => warn!("Capture request rejected: {}", e),
                    Err(e) => error!("Capture could not start: {}", e),
                }
            }
            ControllerCommand::ToggleView => {
                self.request_view_toggle();
            }
            ControllerCommand::CloseGallery => {
                if !self.close_gallery() {
                    debug!("Gallery is not shown");
                }
            }
            ControllerCommand::Shutdown => return false,
        }

        true
    }

    async fn mount_camera(&mut self) {
        match self.camera.open().await {
            Ok(()) => {
                self.camera_mounted = true;
                info!("Camera '{}' mounted", self.camera.name());

                if let Err(e) = self.on_camera_ready().await {
                    warn!("Failed to query picture sizes: {}", e);
                }
            }
            Err(e) => {
                error!("Failed to mount camera '{}': {}", self.camera.name(), e);
                self.emit(ToadscanEvent::SystemError {
                    component: "camera".to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    async fn unmount(&mut self) {
        if self.state.taking_photo() {
            warn!("Shutting down with a capture in flight");
        }

        if self.camera_mounted {
            if let Err(e) = self.camera.close().await {
                warn!("Failed to close camera: {}", e);
            }
            self.camera_mounted = false;
        }
    }

    fn spawn_directory_creation(&mut self) {
        let store = Arc::clone(&self.store);
        let event_bus = Arc::clone(&self.event_bus);

        self.directory_task = Some(tokio::spawn(async move {
            if let Err(e) = store.ensure_directory().await {
                error!("Failed to create photo directory: {}", e);
                let _ = event_bus.publish(ToadscanEvent::SystemError {
                    component: "storage".to_string(),
                    error: e.to_string(),
                });
            }
        }));
    }

    fn publish_view(&mut self) {
        let screen = render(&self.state);
        if self.last_screen.as_ref() == Some(&screen) {
            return;
        }

        self.last_screen = Some(screen.clone());
        self.emit(ToadscanEvent::ViewChanged {
            screen,
            timestamp: SystemTime::now(),
        });
    }

    fn emit(&self, event: ToadscanEvent) {
        if let Err(e) = self.event_bus.publish(event) {
            trace!("Controller event not delivered: {}", e);
        }
    }
}
