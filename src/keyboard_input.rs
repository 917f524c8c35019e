use crate::controller::{ControllerCommand, ControllerHandle};
use crate::error::Result;
use crate::events::{EventBus, ToadscanEvent};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Controller(ControllerCommand),
    Quit,
}

/// Map a key to its action
pub fn key_action(code: KeyCode) -> Option<KeyAction> {
    match code {
        KeyCode::Char(' ') | KeyCode::Enter => {
            Some(KeyAction::Controller(ControllerCommand::TakePhoto))
        }
        KeyCode::Char('g') => Some(KeyAction::Controller(ControllerCommand::ToggleView)),
        KeyCode::Char('b') | KeyCode::Backspace => {
            Some(KeyAction::Controller(ControllerCommand::CloseGallery))
        }
        KeyCode::Char('q') | KeyCode::Esc => Some(KeyAction::Quit),
        _ => None,
    }
}

/// Keyboard input handler driving the capture controller
pub struct KeyboardInputHandler {
    controller: ControllerHandle,
    event_bus: Arc<EventBus>,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    pub fn new(controller: ControllerHandle, event_bus: Arc<EventBus>) -> Self {
        Self {
            controller,
            event_bus,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub async fn start(&self) -> Result<()> {
        info!("Starting keyboard input handler - SPACE captures, G toggles the gallery, Q quits");

        let controller = self.controller.clone();
        let event_bus = Arc::clone(&self.event_bus);
        let cancellation_token = self.cancellation_token.clone();

        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            debug!("Raw mode enabled - keyboard handler active");

            loop {
                if cancellation_token.is_cancelled() {
                    debug!("Keyboard input handler stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let key_event = match event::read() {
                            Ok(Event::Key(key_event)) => key_event,
                            Ok(_) => continue,
                            Err(e) => {
                                warn!("Error reading keyboard event: {}", e);
                                continue;
                            }
                        };

                        // Only handle key press events (not release)
                        if key_event.kind != KeyEventKind::Press {
                            continue;
                        }

                        match key_action(key_event.code) {
                            Some(KeyAction::Controller(command)) => {
                                debug!("Key {:?} -> {:?}", key_event.code, command);
                                if let Err(e) = controller.try_send(command) {
                                    warn!("Dropped {:?}: {}", command, e);
                                }
                            }
                            Some(KeyAction::Quit) => {
                                info!("Quit key pressed - requesting shutdown");
                                let shutdown_event = ToadscanEvent::ShutdownRequested {
                                    timestamp: SystemTime::now(),
                                    reason: "User requested via keyboard".to_string(),
                                };
                                if let Err(e) = event_bus.publish(shutdown_event) {
                                    warn!("Failed to publish shutdown event: {}", e);
                                }
                                break;
                            }
                            None => debug!("Key pressed: {:?}", key_event.code),
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }

            debug!("Keyboard input handler task exited");
        });

        Ok(())
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Give the task a moment to clean up and disable raw mode
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Ensure raw mode is disabled even if the task didn't clean up properly
        let _ = disable_raw_mode();

        Ok(())
    }
}
