use super::*;
use crate::camera::MockCamera;
use crate::config::ToadscanConfig;
use crate::events::{EventFilter, ToadscanEvent};
use crate::permissions::StaticPermissions;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tokio::time::timeout;

fn create_test_config(temp_dir: &TempDir) -> ToadscanConfig {
    let mut config = ToadscanConfig::default();
    config.storage.document_root = temp_dir
        .path()
        .join("documents")
        .to_string_lossy()
        .into_owned();
    config
}

fn create_test_orchestrator(temp_dir: &TempDir, granted: bool) -> ToadscanOrchestrator {
    let camera = Arc::new(MockCamera::new(temp_dir.path().join("cache")));
    let permissions = if granted {
        StaticPermissions::granted()
    } else {
        StaticPermissions::denied()
    };

    let mut orchestrator = ToadscanOrchestrator::with_components(
        create_test_config(temp_dir),
        camera,
        Arc::new(permissions),
    )
    .unwrap();
    orchestrator.set_interactive(false);
    orchestrator
}

#[tokio::test]
async fn test_orchestrator_creation() {
    let temp_dir = TempDir::new().unwrap();
    let orchestrator = create_test_orchestrator(&temp_dir, true);

    // No components registered until initialize
    let states = orchestrator.get_all_component_states().await;
    assert!(states.is_empty());
    assert_eq!(
        orchestrator.store().photos_dir(),
        temp_dir.path().join("documents").join("photos").as_path()
    );
}

#[tokio::test]
async fn test_orchestrator_with_mock_camera_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let orchestrator = ToadscanOrchestrator::new(create_test_config(&temp_dir), true)
        .await
        .unwrap();
    assert!(orchestrator.interactive);
}

#[tokio::test]
async fn test_initialize_registers_components() {
    let temp_dir = TempDir::new().unwrap();
    let mut orchestrator = create_test_orchestrator(&temp_dir, true);
    orchestrator.initialize().await.unwrap();

    let states = orchestrator.get_all_component_states().await;
    assert_eq!(states.get("controller"), Some(&ComponentState::Stopped));
    assert_eq!(states.get("camera"), Some(&ComponentState::Stopped));
    assert!(!states.contains_key("keyboard"));
    assert!(!states.contains_key("display"));
}

#[tokio::test]
async fn test_start_capture_and_shutdown() {
    let temp_dir = TempDir::new().unwrap();
    let mut orchestrator = create_test_orchestrator(&temp_dir, true);
    let mut receiver = orchestrator
        .event_bus()
        .subscribe_filtered(EventFilter::EventTypes(vec!["photo_saved"]), "test");

    orchestrator.initialize().await.unwrap();
    orchestrator.start().await.unwrap();

    assert_eq!(
        orchestrator.get_component_state("camera").await,
        Some(ComponentState::Running)
    );
    assert_eq!(
        orchestrator.get_component_state("controller").await,
        Some(ComponentState::Running)
    );

    orchestrator.controller_handle().take_photo().await.unwrap();
    let event = timeout(Duration::from_secs(5), receiver.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        ToadscanEvent::PhotoSaved { path, .. } => {
            assert!(path.starts_with(orchestrator.store().photos_dir()))
        }
        other => panic!("Unexpected event: {:?}", other),
    }

    let exit_code = orchestrator.shutdown().await.unwrap();
    assert_eq!(exit_code, 0);
    assert_eq!(
        orchestrator.get_component_state("controller").await,
        Some(ComponentState::Stopped)
    );
}

#[tokio::test]
async fn test_denied_permission_leaves_camera_stopped() {
    let temp_dir = TempDir::new().unwrap();
    let mut orchestrator = create_test_orchestrator(&temp_dir, false);

    orchestrator.initialize().await.unwrap();
    orchestrator.start().await.unwrap();

    assert_eq!(
        orchestrator.get_component_state("camera").await,
        Some(ComponentState::Stopped)
    );
    assert_eq!(orchestrator.shutdown().await.unwrap(), 0);
}

#[tokio::test]
async fn test_start_twice_fails() {
    let temp_dir = TempDir::new().unwrap();
    let mut orchestrator = create_test_orchestrator(&temp_dir, true);

    orchestrator.start().await.unwrap();
    assert!(orchestrator.start().await.is_err());
    orchestrator.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_run_exits_on_shutdown_request() {
    let temp_dir = TempDir::new().unwrap();
    let mut orchestrator = create_test_orchestrator(&temp_dir, true);
    let event_bus = orchestrator.event_bus();

    orchestrator.initialize().await.unwrap();
    orchestrator.start().await.unwrap();

    let run = tokio::spawn(async move { orchestrator.run().await });

    // Keep publishing until the watcher has subscribed
    let exit_code = timeout(Duration::from_secs(5), async {
        loop {
            let _ = event_bus.publish(ToadscanEvent::ShutdownRequested {
                timestamp: SystemTime::now(),
                reason: "test".to_string(),
            });
            if run.is_finished() {
                return run.await.unwrap().unwrap();
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(exit_code, 0);
}
