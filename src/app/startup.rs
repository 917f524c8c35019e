use super::{ComponentState, ToadscanOrchestrator};
use crate::error::{Result, ToadscanError};
use tracing::{error, info, warn};

impl ToadscanOrchestrator {
    /// Register all system components
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing toadscan components");

        let mut states = self.component_states.lock().await;
        states.insert("controller".to_string(), ComponentState::Stopped);
        states.insert("camera".to_string(), ComponentState::Stopped);

        // Only register terminal components when running interactively
        if self.interactive {
            states.insert("display".to_string(), ComponentState::Stopped);
            states.insert("keyboard".to_string(), ComponentState::Stopped);
        }

        drop(states);

        info!("All components initialized successfully");
        Ok(())
    }

    /// Start all system components
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting toadscan");

        let mut controller = self
            .controller
            .take()
            .ok_or_else(|| ToadscanError::system("Controller already started"))?;
        let commands = self
            .controller_commands
            .take()
            .ok_or_else(|| ToadscanError::system("Controller command queue already taken"))?;

        // The display subscribes before mounting so it sees the first view change
        if self.interactive {
            if let Some(display) = &self.display {
                self.set_component_state("display", ComponentState::Starting)
                    .await;

                display.start(controller.render()).await.map_err(|e| {
                    error!("Failed to start terminal display: {}", e);
                    e
                })?;

                self.set_component_state("display", ComponentState::Running)
                    .await;
                info!("Terminal display started successfully");
            }
        }

        self.set_component_state("controller", ComponentState::Starting)
            .await;
        self.set_component_state("camera", ComponentState::Starting)
            .await;

        controller.mount().await;

        let camera_state = if controller.camera_mounted() {
            ComponentState::Running
        } else if controller.state().permissions_granted() {
            warn!("Camera failed to mount; captures are unavailable");
            ComponentState::Failed
        } else {
            ComponentState::Stopped
        };
        self.set_component_state("camera", camera_state).await;

        let cancellation_token = self.cancellation_token.child_token();
        self.controller_task = Some(tokio::spawn(controller.run(commands, cancellation_token)));

        self.set_component_state("controller", ComponentState::Running)
            .await;
        info!("Capture controller started successfully");

        if self.interactive {
            if let Some(keyboard_handler) = &self.keyboard_handler {
                self.set_component_state("keyboard", ComponentState::Starting)
                    .await;

                keyboard_handler.start().await.map_err(|e| {
                    error!("Failed to start keyboard handler: {}", e);
                    e
                })?;

                self.set_component_state("keyboard", ComponentState::Running)
                    .await;
            }
        }

        info!("toadscan started successfully");
        Ok(())
    }
}
