use super::{ShutdownReason, ToadscanOrchestrator};
use crate::error::{Result, ToadscanError};
use crate::events::{EventFilter, ToadscanEvent};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tracing::{info, warn};

type SharedShutdownSender = Arc<Mutex<Option<oneshot::Sender<ShutdownReason>>>>;

impl ToadscanOrchestrator {
    /// Run until a signal or a shutdown request, then shut down
    pub async fn run(&mut self) -> Result<i32> {
        info!("toadscan is running");

        let shutdown_sender = self
            .shutdown_sender
            .take()
            .ok_or_else(|| ToadscanError::system("Shutdown sender already taken"))?;

        let shutdown_receiver = self
            .shutdown_receiver
            .take()
            .ok_or_else(|| ToadscanError::system("Shutdown receiver already taken"))?;

        let shutdown_sender = Arc::new(Mutex::new(Some(shutdown_sender)));
        self.setup_signal_handlers(&shutdown_sender);
        self.watch_shutdown_requests(&shutdown_sender);

        let shutdown_reason = shutdown_receiver
            .await
            .map_err(|_| ToadscanError::system("Shutdown channel closed unexpectedly"))?;

        info!("Shutdown initiated: {:?}", shutdown_reason);

        let exit_code = self.shutdown().await?;

        info!("toadscan shutdown complete");
        Ok(exit_code)
    }

    /// Set up signal handlers for graceful shutdown
    fn setup_signal_handlers(&self, shutdown_sender: &SharedShutdownSender) {
        // Handle SIGTERM - Unix only
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let shutdown_sender_sigterm = Arc::clone(shutdown_sender);
            tokio::spawn(async move {
                let mut sigterm = match signal(SignalKind::terminate()) {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        warn!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };

                if sigterm.recv().await.is_some() {
                    info!("Received SIGTERM signal");
                    send_shutdown(
                        &shutdown_sender_sigterm,
                        ShutdownReason::Signal("SIGTERM".to_string()),
                    )
                    .await;
                }
            });
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        let shutdown_sender_sigint = Arc::clone(shutdown_sender);
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                send_shutdown(
                    &shutdown_sender_sigint,
                    ShutdownReason::Signal("SIGINT".to_string()),
                )
                .await;
            }
        });
    }

    /// Turn a `ShutdownRequested` event into a shutdown
    fn watch_shutdown_requests(&self, shutdown_sender: &SharedShutdownSender) {
        let mut receiver = self.event_bus.subscribe_filtered(
            EventFilter::EventTypes(vec!["shutdown_requested"]),
            "shutdown_watcher",
        );
        let shutdown_sender = Arc::clone(shutdown_sender);
        let cancellation_token = self.cancellation_token.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancellation_token.cancelled() => {}
                event = receiver.recv() => {
                    if let Ok(ToadscanEvent::ShutdownRequested { .. }) = event {
                        send_shutdown(&shutdown_sender, ShutdownReason::UserRequest).await;
                    }
                }
            }
        });
    }
}

async fn send_shutdown(shutdown_sender: &SharedShutdownSender, reason: ShutdownReason) {
    if let Some(sender) = shutdown_sender.lock().await.take() {
        let _ = sender.send(reason);
    }
}
