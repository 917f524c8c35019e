use super::*;
use crate::camera::{Camera, CameraSettings, MockCamera, PictureSize, Platform};
use crate::error::{CaptureError, StorageError};
use crate::events::{EventBus, EventFilter, ToadscanEvent};
use crate::permissions::StaticPermissions;
use crate::storage::PhotoStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

struct Fixture {
    _temp_dir: TempDir,
    camera: Arc<MockCamera>,
    store: Arc<PhotoStore>,
    event_bus: Arc<EventBus>,
}

impl Fixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let camera = Arc::new(MockCamera::new(temp_dir.path().join("cache")));
        let store = Arc::new(PhotoStore::with_dir(
            temp_dir.path().join("docs").join("photos"),
            "jpg",
        ));
        Self::with_parts(temp_dir, camera, store)
    }

    fn with_parts(temp_dir: TempDir, camera: Arc<MockCamera>, store: Arc<PhotoStore>) -> Self {
        Self {
            _temp_dir: temp_dir,
            camera,
            store,
            event_bus: Arc::new(EventBus::new(64)),
        }
    }

    fn controller(&self, granted: bool) -> CaptureController {
        self.controller_on(Platform::Linux, granted)
    }

    fn controller_on(&self, platform: Platform, granted: bool) -> CaptureController {
        let permissions = if granted {
            StaticPermissions::granted()
        } else {
            StaticPermissions::denied()
        };

        CaptureController::new(
            CameraSettings::default(),
            platform,
            self.camera.clone(),
            Arc::new(permissions),
            self.store.clone(),
            self.event_bus.clone(),
        )
    }
}

fn sizes(labels: &[&str]) -> Vec<PictureSize> {
    labels.iter().map(|label| PictureSize::new(*label)).collect()
}

#[test]
fn test_toggles_without_capture_follow_parity() {
    let mut state = ViewState::new(CameraSettings::default());
    state.resolve_permission(true);

    for calls in 1..=6 {
        state.request_toggle();
        assert_eq!(state.show_gallery(), calls % 2 == 1);
        if state.show_gallery() {
            assert!(!state.new_photos());
        }
    }
}

#[test]
fn test_odd_toggles_during_capture_switch_to_gallery() {
    let mut state = ViewState::new(CameraSettings::default());
    state.resolve_permission(true);
    state.begin_capture().unwrap();

    for _ in 0..3 {
        assert!(matches!(
            state.request_toggle(),
            ToggleOutcome::Deferred { .. }
        ));
    }
    assert!(!state.show_gallery());
    assert!(state.switch_pending());

    let outcome = state.complete_capture(true);
    assert!(outcome.switched_to_gallery);
    assert!(state.show_gallery());
    assert!(!state.new_photos());
    assert!(!state.taking_photo());
}

#[test]
fn test_even_toggles_during_capture_stay_on_camera() {
    let mut state = ViewState::new(CameraSettings::default());
    state.resolve_permission(true);

    state.begin_capture().unwrap();
    state.request_toggle();
    state.request_toggle();
    state.complete_capture(true);
    assert_eq!(state.mode(), ViewMode::Preview);
    assert!(state.new_photos());

    state.begin_capture().unwrap();
    state.complete_capture(false);
    assert_eq!(state.mode(), ViewMode::Preview);
    // Unchanged by a capture that stored nothing
    assert!(state.new_photos());
}

#[test]
fn test_begin_capture_guards() {
    let mut state = ViewState::new(CameraSettings::default());
    assert!(matches!(
        state.begin_capture(),
        Err(CaptureError::CameraUnavailable)
    ));

    state.resolve_permission(true);
    state.begin_capture().unwrap();
    assert!(matches!(
        state.begin_capture(),
        Err(CaptureError::AlreadyInFlight)
    ));

    state.complete_capture(true);
    state.request_toggle();
    assert!(matches!(
        state.begin_capture(),
        Err(CaptureError::CameraUnavailable)
    ));
}

#[test]
fn test_close_gallery_only_from_gallery() {
    let mut state = ViewState::new(CameraSettings::default());
    state.resolve_permission(true);
    assert!(!state.close_gallery());

    state.request_toggle();
    assert!(state.close_gallery());
    assert_eq!(state.mode(), ViewMode::Preview);
    assert!(!state.new_photos());
}

#[test]
fn test_toggle_ignored_without_permission() {
    let mut state = ViewState::new(CameraSettings::default());
    assert_eq!(state.request_toggle(), ToggleOutcome::Ignored);

    state.resolve_permission(false);
    assert_eq!(state.request_toggle(), ToggleOutcome::Ignored);
    assert_eq!(state.mode(), ViewMode::Preview);
    assert!(!state.show_gallery());
    assert_eq!(render(&state), Screen::NoPermissions);
}

#[test]
fn test_permission_resolves_once() {
    let mut state = ViewState::new(CameraSettings::default());
    assert_eq!(state.permission(), PermissionState::Pending);
    assert!(state.resolve_permission(false));
    assert!(!state.resolve_permission(true));
    assert_eq!(state.permission(), PermissionState::Denied);
}

#[test]
fn test_render_screens() {
    let mut state = ViewState::new(CameraSettings::default());
    assert_eq!(render(&state), Screen::NoPermissions);
    assert_eq!(render(&state).name(), "no_permissions");

    state.resolve_permission(true);
    match render(&state) {
        Screen::Camera(overlay) => {
            assert!(!overlay.taking_photo);
            assert!(!overlay.new_photos);
            assert!(overlay.picture_size.is_none());
        }
        other => panic!("Unexpected screen: {:?}", other),
    }

    state.request_toggle();
    assert_eq!(render(&state), Screen::Gallery);
}

#[test]
fn test_default_picture_size_per_platform() {
    let preset_sizes = sizes(&["352x288", "High", "1920x1080"]);
    let ascending = sizes(&["A", "B", "C"]);

    assert_eq!(
        select_default_picture_size(Platform::Ios, &preset_sizes),
        Some(1)
    );
    assert_eq!(
        select_default_picture_size(Platform::Android, &ascending),
        Some(2)
    );
    assert_eq!(
        select_default_picture_size(Platform::Linux, &preset_sizes),
        Some(2)
    );
    assert_eq!(
        select_default_picture_size(Platform::Ios, &ascending),
        Some(2)
    );
    assert_eq!(select_default_picture_size(Platform::Ios, &[]), None);
}

#[test]
fn test_camera_ready_keeps_previous_choice_on_empty_list() {
    let mut state = ViewState::new(CameraSettings::default());
    state.camera_ready(sizes(&["A", "B"]), Some(1));
    assert_eq!(state.picture_size().map(|s| s.label()), Some("B"));

    state.camera_ready(Vec::new(), None);
    assert_eq!(state.picture_size().map(|s| s.label()), Some("B"));
    assert_eq!(state.picture_size_id(), Some(1));
}

#[tokio::test]
async fn test_mount_with_permission_picks_largest_size() {
    let fixture = Fixture::new();
    let mut controller = fixture.controller(true);

    controller.mount().await;
    controller.wait_for_storage().await;

    assert!(controller.state().permissions_granted());
    assert!(controller.camera_mounted());
    assert_eq!(
        controller.state().picture_size(),
        Some(&PictureSize::new("640x360"))
    );
    assert!(fixture.store.photos_dir().is_dir());
}

#[tokio::test]
async fn test_camera_ready_on_preset_platform_selects_high() {
    let temp_dir = TempDir::new().unwrap();
    let camera = Arc::new(
        MockCamera::new(temp_dir.path().join("cache")).with_sizes(["352x288", "High", "1920x1080"]),
    );
    let store = Arc::new(PhotoStore::with_dir(temp_dir.path().join("photos"), "jpg"));
    let fixture = Fixture::with_parts(temp_dir, camera, store);

    let mut controller = fixture.controller_on(Platform::Ios, true);
    controller.mount().await;

    assert_eq!(
        controller.state().picture_size(),
        Some(&PictureSize::new("High"))
    );
    assert_eq!(controller.state().picture_size_id(), Some(1));
}

#[tokio::test]
async fn test_camera_ready_independent_of_permission() {
    let fixture = Fixture::new();
    let mut controller = fixture.controller(false);
    fixture.camera.open().await.unwrap();

    let chosen = controller.on_camera_ready().await.unwrap();
    assert_eq!(chosen, Some(PictureSize::new("640x360")));
    assert!(!controller.state().permissions_granted());
    assert_eq!(controller.render(), Screen::NoPermissions);
}

#[tokio::test]
async fn test_denied_permission_renders_placeholder() {
    let fixture = Fixture::new();
    let mut controller = fixture.controller(false);

    controller.mount().await;

    assert_eq!(controller.render(), Screen::NoPermissions);
    assert!(!controller.camera_mounted());
    assert!(matches!(
        controller.request_capture(),
        Err(CaptureError::CameraUnavailable)
    ));
}

#[tokio::test]
async fn test_existing_directory_does_not_block_camera_view() {
    let fixture = Fixture::new();
    std::fs::create_dir_all(fixture.store.photos_dir()).unwrap();

    let mut controller = fixture.controller(true);
    controller.mount().await;
    controller.wait_for_storage().await;

    assert!(matches!(controller.render(), Screen::Camera(_)));
}

#[tokio::test]
async fn test_capture_stores_one_timestamped_photo() {
    let fixture = Fixture::new();
    let mut controller = fixture.controller(true);
    controller.mount().await;

    let before = Utc::now().timestamp_millis();
    let photo = controller.capture_and_wait().await.unwrap();
    let after = Utc::now().timestamp_millis();

    assert!(!controller.state().taking_photo());
    assert!(controller.state().new_photos());

    let entries: Vec<_> = std::fs::read_dir(fixture.store.photos_dir())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(entries, vec![photo.path.clone()]);

    let stem = photo.path.file_stem().unwrap().to_str().unwrap();
    let millis: i64 = stem.parse().unwrap();
    assert!(millis >= before && millis <= after);
    assert_eq!(photo.path.extension().unwrap(), "jpg");
    assert_eq!((photo.width, photo.height), (640, 360));
}

#[tokio::test]
async fn test_second_capture_rejected_while_in_flight() {
    let fixture = Fixture::new();
    let mut controller = fixture.controller(true);
    controller.mount().await;

    controller.request_capture().unwrap();
    assert!(matches!(
        controller.request_capture(),
        Err(CaptureError::AlreadyInFlight)
    ));

    let result = controller.next_completion().await.unwrap();
    controller.finish_capture(result).unwrap();
    assert_eq!(fixture.camera.capture_count(), 1);
}

#[tokio::test]
async fn test_deferred_switch_applies_after_capture() {
    let fixture = Fixture::new();
    let mut controller = fixture.controller(true);
    controller.mount().await;

    controller.request_capture().unwrap();
    assert_eq!(
        controller.request_view_toggle(),
        ToggleOutcome::Deferred {
            switch_pending: true
        }
    );
    assert!(!controller.state().show_gallery());

    let result = controller.next_completion().await.unwrap();
    controller.finish_capture(result).unwrap();

    assert_eq!(controller.render(), Screen::Gallery);
    assert!(!controller.state().new_photos());
    assert!(controller.close_gallery());
    assert!(matches!(controller.render(), Screen::Camera(_)));
}

#[tokio::test]
async fn test_camera_failure_clears_capture_state() {
    let fixture = Fixture::new();
    let mut receiver =
        fixture
            .event_bus
            .subscribe_filtered(EventFilter::EventTypes(vec!["capture_failed"]), "test");
    let mut controller = fixture.controller(true);
    controller.mount().await;

    fixture.camera.set_fail_capture(true);
    controller.request_capture().unwrap();
    controller.request_view_toggle();

    let result = controller.next_completion().await.unwrap();
    assert!(matches!(
        controller.finish_capture(result),
        Err(CaptureError::Camera(_))
    ));

    assert!(!controller.state().taking_photo());
    assert!(controller.state().show_gallery());
    assert!(matches!(
        receiver.recv().await.unwrap(),
        ToadscanEvent::CaptureFailed { .. }
    ));
}

#[tokio::test]
async fn test_unavailable_directory_discards_transient_file() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, b"file in the way").unwrap();

    let camera = Arc::new(MockCamera::new(temp_dir.path().join("cache")));
    let store = Arc::new(PhotoStore::with_dir(blocker.join("photos"), "jpg"));
    let fixture = Fixture::with_parts(temp_dir, camera, store);

    let mut controller = fixture.controller(true);
    controller.mount().await;
    controller.wait_for_storage().await;

    let result = controller.capture_and_wait().await;
    assert!(matches!(result, Err(CaptureError::Store(_))));
    assert!(!controller.state().taking_photo());
    assert!(!controller.state().new_photos());

    let leftovers = std::fs::read_dir(fixture.camera.transient_dir())
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_camera_mount_failure_is_reported() {
    let fixture = Fixture::new();
    let mut receiver =
        fixture
            .event_bus
            .subscribe_filtered(EventFilter::EventTypes(vec!["system_error"]), "test");
    fixture.camera.set_fail_open(true);

    let mut controller = fixture.controller(true);
    controller.mount().await;

    assert!(!controller.camera_mounted());
    assert!(matches!(controller.render(), Screen::Camera(_)));
    match receiver.recv().await.unwrap() {
        ToadscanEvent::SystemError { component, .. } => assert_eq!(component, "camera"),
        other => panic!("Unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_controller_loop_processes_commands() {
    let fixture = Fixture::new();
    let mut receiver = fixture.event_bus.subscribe_filtered(
        EventFilter::EventTypes(vec!["photo_saved", "view_changed"]),
        "test",
    );

    let mut controller = fixture.controller(true);
    controller.mount().await;

    let (handle, commands) = ControllerHandle::channel(8);
    let cancellation_token = CancellationToken::new();
    let task = tokio::spawn(controller.run(commands, cancellation_token.clone()));

    handle.take_photo().await.unwrap();

    let saved = timeout(Duration::from_secs(5), async {
        loop {
            if let ToadscanEvent::PhotoSaved { path, .. } = receiver.recv().await.unwrap() {
                return path;
            }
        }
    })
    .await
    .unwrap();
    assert!(saved.exists());

    handle.toggle_view().await.unwrap();
    let screen = timeout(Duration::from_secs(5), async {
        loop {
            if let ToadscanEvent::ViewChanged { screen, .. } = receiver.recv().await.unwrap() {
                if screen == Screen::Gallery {
                    return screen;
                }
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(screen.name(), "gallery");

    handle.shutdown().await.unwrap();
    timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_controller_loop_stops_on_cancel() {
    let fixture = Fixture::new();
    let controller = fixture.controller(true);

    let (_handle, commands) = ControllerHandle::channel(8);
    let cancellation_token = CancellationToken::new();
    let task = tokio::spawn(controller.run(commands, cancellation_token.clone()));

    cancellation_token.cancel();
    timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_controller_loop_defers_toggle_during_slow_capture() {
    let temp_dir = TempDir::new().unwrap();
    let camera = Arc::new(
        MockCamera::new(temp_dir.path().join("cache"))
            .with_capture_delay(Duration::from_millis(200)),
    );
    let store = Arc::new(PhotoStore::with_dir(temp_dir.path().join("photos"), "jpg"));
    let fixture = Fixture::with_parts(temp_dir, camera, store);
    let mut receiver = fixture.event_bus.subscribe_filtered(
        EventFilter::EventTypes(vec!["photo_saved", "view_changed"]),
        "test",
    );

    let mut controller = fixture.controller(true);
    controller.mount().await;

    let (handle, commands) = ControllerHandle::channel(8);
    let task = tokio::spawn(controller.run(commands, CancellationToken::new()));

    handle.take_photo().await.unwrap();
    handle.toggle_view().await.unwrap();

    // The gallery only opens after the photo is saved
    let order = timeout(Duration::from_secs(5), async {
        let mut order = Vec::new();
        loop {
            match receiver.recv().await.unwrap() {
                ToadscanEvent::PhotoSaved { .. } => order.push("saved"),
                ToadscanEvent::ViewChanged {
                    screen: Screen::Gallery,
                    ..
                } => {
                    order.push("gallery");
                    return order;
                }
                ToadscanEvent::ViewChanged {
                    screen: Screen::Camera(overlay),
                    ..
                } if overlay.switch_pending => order.push("pending"),
                _ => {}
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(order, vec!["pending", "saved", "gallery"]);

    handle.close_gallery().await.unwrap();
    timeout(Duration::from_secs(5), async {
        loop {
            if let ToadscanEvent::ViewChanged {
                screen: Screen::Camera(overlay),
                ..
            } = receiver.recv().await.unwrap()
            {
                assert!(!overlay.new_photos);
                return;
            }
        }
    })
    .await
    .unwrap();

    handle.shutdown().await.unwrap();
    timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_move_failure_discards_transient_file() {
    let fixture = Fixture::new();
    let mut controller = fixture.controller(true);
    controller.mount().await;
    controller.wait_for_storage().await;

    // The store remembers the directory as created, so the rename fails
    std::fs::remove_dir(fixture.store.photos_dir()).unwrap();

    let result = controller.capture_and_wait().await;
    assert!(matches!(
        result,
        Err(CaptureError::Store(StorageError::Move { .. }))
    ));
    assert!(!controller.state().taking_photo());
    assert!(!controller.state().new_photos());
    assert_eq!(fixture.camera.capture_count(), 1);

    let leftovers = std::fs::read_dir(fixture.camera.transient_dir())
        .unwrap()
        .count();
    assert_eq!(leftovers, 0);
}
