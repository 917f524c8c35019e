use super::*;
use crate::camera::{FlashMode, PictureSize};
use crate::controller::{CameraOverlay, Screen, NO_PERMISSIONS_MESSAGE};
use crate::events::{EventBus, ToadscanEvent};
use crate::storage::{PhotoStore, StoredPhoto};
use chrono::{TimeZone, Utc};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

async fn wait_for_text(buffer: &SharedBuffer, needle: &str) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !buffer.contents().contains(needle) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("'{}' never drawn", needle));
}

fn camera_overlay() -> CameraOverlay {
    CameraOverlay {
        taking_photo: false,
        new_photos: false,
        switch_pending: false,
        picture_size: Some(PictureSize::new("1920x1080")),
        flash_mode: FlashMode::Off,
        zoom: 0.0,
    }
}

#[test]
fn test_compose_no_permissions() {
    let lines = compose(&Screen::NoPermissions, &[], None);
    assert!(lines.iter().any(|line| line == NO_PERMISSIONS_MESSAGE));
}

#[test]
fn test_compose_camera_overlay() {
    let mut overlay = camera_overlay();
    let lines = compose(&Screen::Camera(overlay.clone()), &[], None);
    assert!(lines.contains(&"picture size: 1920x1080".to_string()));
    assert!(!lines.iter().any(|line| line.contains("(new)")));

    overlay.new_photos = true;
    overlay.taking_photo = true;
    overlay.switch_pending = true;
    let lines = compose(&Screen::Camera(overlay), &[], Some("saved /tmp/1.jpg"));
    assert!(lines.iter().any(|line| line.contains("(new)")));
    assert!(lines.contains(&"capturing...".to_string()));
    assert!(lines.contains(&"gallery opens when the capture finishes".to_string()));
    assert_eq!(lines.last().map(String::as_str), Some("saved /tmp/1.jpg"));
}

#[test]
fn test_compose_gallery_listing() {
    assert!(compose(&Screen::Gallery, &[], None).contains(&"no photos yet".to_string()));

    let photo = StoredPhoto {
        path: "/photos/1700000000123.jpg".into(),
        file_name: "1700000000123.jpg".to_string(),
        captured_at: Utc.timestamp_millis_opt(1_700_000_000_123).single(),
        size_bytes: 2048,
        dimensions: Some((640, 360)),
    };

    let lines = compose(&Screen::Gallery, &[photo], None);
    assert_eq!(lines[0], "toadscan - gallery (1 photos)");
    let entry = lines
        .iter()
        .find(|line| line.contains("1700000000123.jpg"))
        .unwrap();
    assert!(entry.contains("2023-11-14 22:13:20.123"));
    assert!(entry.contains("640x360"));
    assert!(entry.contains("2048 bytes"));
}

#[test]
fn test_display_stats() {
    let mut stats = DisplayStats::default();
    assert_eq!(stats.draw_success_rate(), 0.0);

    stats.record_draw();
    stats.record_draw();
    stats.record_draw();
    stats.record_draw_error();
    assert_eq!(stats.draw_success_rate(), 0.75);
    assert!(stats.last_draw_time.is_some());
}

#[tokio::test]
async fn test_terminal_display_redraws_on_view_change() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(PhotoStore::with_dir(temp_dir.path().join("photos"), "jpg"));
    store.ensure_directory().await.unwrap();
    std::fs::write(store.photos_dir().join("1700000000123.jpg"), b"jpeg").unwrap();

    let event_bus = Arc::new(EventBus::new(16));
    let buffer = SharedBuffer::default();
    let display = TerminalDisplay::with_writer(event_bus.clone(), store, buffer.clone());

    display.start(Screen::NoPermissions).await.unwrap();
    assert!(display.is_running());
    wait_for_text(&buffer, NO_PERMISSIONS_MESSAGE).await;

    event_bus
        .publish(ToadscanEvent::ViewChanged {
            screen: Screen::Gallery,
            timestamp: SystemTime::now(),
        })
        .unwrap();
    wait_for_text(&buffer, "1700000000123.jpg").await;

    event_bus
        .publish(ToadscanEvent::ViewChanged {
            screen: Screen::Camera(camera_overlay()),
            timestamp: SystemTime::now(),
        })
        .unwrap();
    wait_for_text(&buffer, "picture size: 1920x1080").await;

    display.stop().await.unwrap();
    assert!(!display.is_running());

    let stats = display.stats().await;
    assert!(stats.screens_drawn >= 2);
    assert_eq!(stats.gallery_refreshes, 1);
}
