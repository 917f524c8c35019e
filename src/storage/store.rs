use crate::config::StorageConfig;
use crate::error::StorageError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Outcome of preparing the photo directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryStatus {
    Created,
    AlreadyExisted,
}

/// A photo found in the photo directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPhoto {
    pub path: PathBuf,
    pub file_name: String,
    /// Parsed from the millisecond timestamp in the file name
    pub captured_at: Option<DateTime<Utc>>,
    pub size_bytes: u64,
    pub dimensions: Option<(u32, u32)>,
}

/// Statistics about the photo directory
#[derive(Debug, Clone, Default)]
pub struct StorageStats {
    pub total_photos: usize,
    pub total_size_bytes: u64,
    pub oldest_photo: Option<DateTime<Utc>>,
    pub newest_photo: Option<DateTime<Utc>>,
}

/// Append-only photo directory under the application document root
///
/// Captured images are moved in and named `<unix_millis>.<extension>`.
/// Two photos saved within the same millisecond share a name; the later
/// one replaces the earlier.
pub struct PhotoStore {
    photos_dir: PathBuf,
    extension: String,
    directory: OnceCell<DirectoryStatus>,
}

impl PhotoStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self::with_dir(config.photos_path(), &config.extension)
    }

    pub fn with_dir(photos_dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            photos_dir: photos_dir.into(),
            extension: extension.to_string(),
            directory: OnceCell::new(),
        }
    }

    pub fn photos_dir(&self) -> &Path {
        &self.photos_dir
    }

    /// Create the photo directory unless an earlier call already did
    ///
    /// A directory that already exists on disk is not an error.
    pub async fn ensure_directory(&self) -> Result<DirectoryStatus, StorageError> {
        let status = self
            .directory
            .get_or_try_init(|| Self::create_directory(&self.photos_dir))
            .await?;
        Ok(*status)
    }

    async fn create_directory(dir: &Path) -> Result<DirectoryStatus, StorageError> {
        if let Some(parent) = dir.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StorageError::DirectoryCreation {
                        path: parent.display().to_string(),
                        source: e,
                    })?;
            }
        }

        match fs::create_dir(dir).await {
            Ok(()) => {
                info!("Created photo directory: {}", dir.display());
                Ok(DirectoryStatus::Created)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("Photo directory already exists: {}", dir.display());
                Ok(DirectoryStatus::AlreadyExisted)
            }
            Err(e) => Err(StorageError::DirectoryCreation {
                path: dir.display().to_string(),
                source: e,
            }),
        }
    }

    /// Permanent path for a photo saved at `saved_at`
    pub fn photo_path_for(&self, saved_at: DateTime<Utc>) -> PathBuf {
        self.photos_dir
            .join(format!("{}.{}", saved_at.timestamp_millis(), self.extension))
    }

    /// Move a transient capture into the photo directory
    pub async fn persist(
        &self,
        transient: &Path,
        saved_at: DateTime<Utc>,
    ) -> Result<PathBuf, StorageError> {
        let target = self.photo_path_for(saved_at);

        match fs::rename(transient, &target).await {
            Ok(()) => {}
            Err(e) if is_cross_device(&e) => {
                debug!(
                    "Transient file {} is on another filesystem; copying",
                    transient.display()
                );
                self.copy_then_remove(transient, &target).await?;
            }
            Err(e) => {
                return Err(StorageError::Move {
                    from: transient.to_path_buf(),
                    to: target,
                    source: e,
                })
            }
        }

        debug!("Moved {} to {}", transient.display(), target.display());
        Ok(target)
    }

    async fn copy_then_remove(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        let move_error = |source| StorageError::Move {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        };

        fs::copy(from, to).await.map_err(move_error)?;
        fs::remove_file(from).await.map_err(move_error)?;
        Ok(())
    }

    /// Best-effort removal of a transient capture that will not be stored
    pub async fn discard_transient(&self, transient: &Path) {
        match fs::remove_file(transient).await {
            Ok(()) => debug!("Discarded transient capture {}", transient.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to discard transient capture {}: {}",
                transient.display(),
                e
            ),
        }
    }

    /// Photos in the directory, newest first
    pub async fn list_photos(&self) -> Result<Vec<StoredPhoto>, StorageError> {
        let listing_error = |source| StorageError::Listing {
            path: self.photos_dir.display().to_string(),
            source,
        };

        let mut entries = match fs::read_dir(&self.photos_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(listing_error(e)),
        };

        let mut photos = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(listing_error)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Failed to read metadata for {}: {}", path.display(), e);
                    continue;
                }
            };

            let file_name = entry.file_name().to_string_lossy().to_string();
            let captured_at = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(parse_capture_time);

            let probe_path = path.clone();
            let dimensions =
                tokio::task::spawn_blocking(move || image::image_dimensions(&probe_path).ok())
                    .await
                    .ok()
                    .flatten();

            photos.push(StoredPhoto {
                path,
                file_name,
                captured_at,
                size_bytes: metadata.len(),
                dimensions,
            });
        }

        photos.sort_by(|a, b| {
            b.captured_at
                .cmp(&a.captured_at)
                .then_with(|| b.file_name.cmp(&a.file_name))
        });

        debug!(
            "Found {} photos in {}",
            photos.len(),
            self.photos_dir.display()
        );
        Ok(photos)
    }

    /// Summary statistics over the stored photos
    pub async fn stats(&self) -> Result<StorageStats, StorageError> {
        let photos = self.list_photos().await?;

        Ok(StorageStats {
            total_photos: photos.len(),
            total_size_bytes: photos.iter().map(|p| p.size_bytes).sum(),
            oldest_photo: photos.iter().filter_map(|p| p.captured_at).min(),
            newest_photo: photos.iter().filter_map(|p| p.captured_at).max(),
        })
    }
}

/// Parse the millisecond timestamp a photo file is named after
pub(crate) fn parse_capture_time(stem: &str) -> Option<DateTime<Utc>> {
    if stem.is_empty() || !stem.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let millis: i64 = stem.parse().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

#[cfg(unix)]
fn is_cross_device(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(libc::EXDEV)
}

#[cfg(not(unix))]
fn is_cross_device(_e: &std::io::Error) -> bool {
    false
}
