use crate::controller::{CameraOverlay, Screen, NO_PERMISSIONS_MESSAGE};
use crate::storage::StoredPhoto;

const TITLE: &str = "toadscan";

/// Lines to draw for a screen
///
/// `photos` is only read for the gallery. `status` is the outcome of the
/// most recent capture, if any.
pub fn compose(screen: &Screen, photos: &[StoredPhoto], status: Option<&str>) -> Vec<String> {
    let mut lines = match screen {
        Screen::NoPermissions => vec![
            TITLE.to_string(),
            String::new(),
            NO_PERMISSIONS_MESSAGE.to_string(),
            String::new(),
            "[q] quit".to_string(),
        ],
        Screen::Camera(overlay) => camera_lines(overlay),
        Screen::Gallery => gallery_lines(photos),
    };

    if let Some(status) = status {
        lines.push(String::new());
        lines.push(status.to_string());
    }

    lines
}

fn camera_lines(overlay: &CameraOverlay) -> Vec<String> {
    let picture_size = overlay
        .picture_size
        .as_ref()
        .map(|size| size.to_string())
        .unwrap_or_else(|| "pending".to_string());

    let mut lines = vec![
        format!("{} - camera", TITLE),
        String::new(),
        format!("picture size: {}", picture_size),
        format!(
            "flash: {}  zoom: {:.2}",
            format!("{:?}", overlay.flash_mode).to_lowercase(),
            overlay.zoom
        ),
    ];

    if overlay.taking_photo {
        lines.push("capturing...".to_string());
    }
    if overlay.switch_pending {
        lines.push("gallery opens when the capture finishes".to_string());
    }

    let gallery_marker = if overlay.new_photos { " (new)" } else { "" };
    lines.push(String::new());
    lines.push(format!(
        "[space] capture  [g] gallery{}  [q] quit",
        gallery_marker
    ));
    lines
}

fn gallery_lines(photos: &[StoredPhoto]) -> Vec<String> {
    let mut lines = vec![
        format!("{} - gallery ({} photos)", TITLE, photos.len()),
        String::new(),
    ];

    if photos.is_empty() {
        lines.push("no photos yet".to_string());
    }

    for photo in photos {
        let captured = photo
            .captured_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            .unwrap_or_else(|| "-".to_string());
        let dimensions = photo
            .dimensions
            .map(|(w, h)| format!("{}x{}", w, h))
            .unwrap_or_else(|| "?".to_string());

        lines.push(format!(
            "  {}  {}  {}  {} bytes",
            photo.file_name, captured, dimensions, photo.size_bytes
        ));
    }

    lines.push(String::new());
    lines.push("[b] back  [g] camera  [q] quit".to_string());
    lines
}
