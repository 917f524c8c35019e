use super::{ComponentState, ToadscanOrchestrator};
use crate::error::{Result, ToadscanError};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

impl ToadscanOrchestrator {
    /// Perform graceful shutdown of all components
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        let mut exit_code = 0;

        // Input first so no command arrives after the controller stops
        if self.interactive {
            if let Err(e) = self.stop_keyboard().await {
                error!("Error stopping keyboard: {}", e);
                exit_code = 1;
            }
        }

        if let Err(e) = self.stop_controller().await {
            error!("Error stopping controller: {}", e);
            exit_code = 1;
        }

        if self.interactive {
            if let Err(e) = self.stop_display().await {
                error!("Error stopping display: {}", e);
                exit_code = 1;
            }
        }

        // Cancel all remaining background tasks
        self.cancellation_token.cancel();

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }

    async fn stop_keyboard(&self) -> Result<()> {
        match &self.keyboard_handler {
            Some(keyboard_handler) => {
                self.stop_component("keyboard", Duration::from_secs(2), keyboard_handler.stop())
                    .await
            }
            None => {
                self.set_component_state("keyboard", ComponentState::Stopped)
                    .await;
                Ok(())
            }
        }
    }

    async fn stop_display(&self) -> Result<()> {
        match &self.display {
            Some(display) => {
                self.stop_component("display", Duration::from_secs(5), display.stop())
                    .await
            }
            None => {
                self.set_component_state("display", ComponentState::Stopped)
                    .await;
                Ok(())
            }
        }
    }

    /// Ask the controller loop to finish, then wait for it
    async fn stop_controller(&mut self) -> Result<()> {
        let Some(task) = self.controller_task.take() else {
            self.set_component_state("controller", ComponentState::Stopped)
                .await;
            return Ok(());
        };

        let handle = self.controller_handle.clone();
        let cancellation_token = self.cancellation_token.clone();

        let result = self
            .stop_component("controller", Duration::from_secs(10), async move {
                if handle.shutdown().await.is_err() {
                    // Loop already gone; cancel in case it is still draining
                    cancellation_token.cancel();
                }

                task.await.map_err(|e| {
                    ToadscanError::component("controller".to_string(), e.to_string())
                })?
            })
            .await;

        self.set_component_state("camera", ComponentState::Stopped)
            .await;
        result
    }

    /// Run a component's stop future with a time limit and track its state
    async fn stop_component<F>(&self, component: &str, limit: Duration, stop: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        info!("Stopping {} component", component);
        self.set_component_state(component, ComponentState::Stopping)
            .await;

        match timeout(limit, stop).await {
            Ok(Ok(())) => {
                self.set_component_state(component, ComponentState::Stopped)
                    .await;
                info!("{} component stopped", component);
                Ok(())
            }
            Ok(Err(e)) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("Error stopping {} component: {}", component, e);
                Err(e)
            }
            Err(_) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("{} component stop timeout", component);
                Err(ToadscanError::system(format!(
                    "{} component stop timeout",
                    component
                )))
            }
        }
    }
}
