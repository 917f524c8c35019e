use super::types::{ComponentState, ShutdownReason};
use crate::camera::{Camera, CameraBuilder};
use crate::config::ToadscanConfig;
use crate::controller::{CaptureController, ControllerCommand, ControllerHandle};
use crate::display::TerminalDisplay;
use crate::error::Result;
use crate::events::EventBus;
use crate::keyboard_input::KeyboardInputHandler;
use crate::permissions::{provider_for, PermissionProvider};
use crate::storage::PhotoStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Main application coordinator that wires the controller to its inputs and outputs
pub struct ToadscanOrchestrator {
    pub(super) config: ToadscanConfig,
    pub(super) event_bus: Arc<EventBus>,
    pub(super) store: Arc<PhotoStore>,

    // Components
    pub(super) controller: Option<CaptureController>,
    pub(super) controller_handle: ControllerHandle,
    pub(super) controller_commands: Option<mpsc::Receiver<ControllerCommand>>,
    pub(super) controller_task: Option<JoinHandle<Result<()>>>,
    pub(super) display: Option<TerminalDisplay>,
    pub(super) keyboard_handler: Option<KeyboardInputHandler>,
    pub(super) interactive: bool,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) shutdown_sender: Option<oneshot::Sender<ShutdownReason>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
    pub(super) cancellation_token: CancellationToken,
}

impl ToadscanOrchestrator {
    /// Create an orchestrator with the camera and permission source the config names
    pub async fn new(config: ToadscanConfig, mock_camera: bool) -> Result<Self> {
        let camera = CameraBuilder::new()
            .config(config.camera.clone())
            .mock(mock_camera)
            .build()?;
        let permissions = provider_for(&config);

        Self::with_components(config, camera, permissions)
    }

    /// Create an orchestrator around an existing camera and permission source
    pub fn with_components(
        config: ToadscanConfig,
        camera: Arc<dyn Camera>,
        permissions: Arc<dyn PermissionProvider>,
    ) -> Result<Self> {
        let capacity = config.system.event_bus_capacity;
        let event_bus = Arc::new(if tracing::enabled!(tracing::Level::DEBUG) {
            EventBus::with_debug_logging(capacity)
        } else {
            EventBus::new(capacity)
        });
        let store = Arc::new(PhotoStore::new(&config.storage));
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();
        let (controller_handle, controller_commands) =
            ControllerHandle::channel(config.system.command_queue_capacity);

        info!(
            "Photos will be stored in {} using camera '{}'",
            store.photos_dir().display(),
            camera.name()
        );

        let controller = CaptureController::new(
            config.camera.initial_settings(),
            config.camera.platform(),
            camera,
            permissions,
            Arc::clone(&store),
            Arc::clone(&event_bus),
        );

        let display = TerminalDisplay::new(Arc::clone(&event_bus), Arc::clone(&store));
        let keyboard_handler =
            KeyboardInputHandler::new(controller_handle.clone(), Arc::clone(&event_bus));

        Ok(Self {
            config,
            event_bus,
            store,
            controller: Some(controller),
            controller_handle,
            controller_commands: Some(controller_commands),
            controller_task: None,
            display: Some(display),
            keyboard_handler: Some(keyboard_handler),
            interactive: true,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            shutdown_sender: Some(shutdown_sender),
            shutdown_receiver: Some(shutdown_receiver),
            cancellation_token: CancellationToken::new(),
        })
    }

    /// Enable or disable the terminal display and keyboard input
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn config(&self) -> &ToadscanConfig {
        &self.config
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn store(&self) -> Arc<PhotoStore> {
        Arc::clone(&self.store)
    }

    /// Handle for sending commands to the controller
    pub fn controller_handle(&self) -> ControllerHandle {
        self.controller_handle.clone()
    }
}
