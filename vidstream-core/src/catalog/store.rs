//! In-memory video catalog

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::types::{NewVideo, VideoPatch, VideoRecord};
use super::{CatalogError, CatalogResult};
use crate::streaming::{VideoMetadataStore, VideoSource};

/// Registry of uploaded videos keyed by id.
///
/// Lock scopes never span an await point.
#[derive(Debug, Default)]
pub struct VideoCatalog {
    videos: RwLock<HashMap<Uuid, VideoRecord>>,
}

impl VideoCatalog {
    /// Create empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an uploaded file.
    ///
    /// # Errors
    /// - `CatalogError::Validation` - Title or description invalid
    pub fn create(&self, video: NewVideo) -> CatalogResult<VideoRecord> {
        video.validate()?;

        let record = VideoRecord {
            id: Uuid::new_v4(),
            user_id: video.user_id,
            title: video.title,
            description: Some(video.description),
            file_path: video.file_path,
            uploaded_at: Utc::now(),
        };

        self.videos.write().insert(record.id, record.clone());
        info!(
            "Registered video {} ({}) at {}",
            record.id,
            record.title,
            record.file_path.display()
        );
        Ok(record)
    }

    /// All records, oldest upload first.
    pub fn list(&self) -> Vec<VideoRecord> {
        let mut videos: Vec<VideoRecord> = self.videos.read().values().cloned().collect();
        videos.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at).then(a.id.cmp(&b.id)));
        videos
    }

    /// Find a record by its textual id.
    ///
    /// # Errors
    /// - `CatalogError::NotFound` - Unknown or malformed id
    pub fn get(&self, video_id: &str) -> CatalogResult<VideoRecord> {
        let id = parse_video_id(video_id)?;
        self.videos
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                video_id: video_id.to_string(),
            })
    }

    /// Update title and/or description.
    ///
    /// # Errors
    /// - `CatalogError::NotFound` - Unknown or malformed id
    /// - `CatalogError::Validation` - Patched field invalid
    pub fn patch(&self, video_id: &str, patch: VideoPatch) -> CatalogResult<VideoRecord> {
        let id = parse_video_id(video_id)?;
        patch.validate()?;

        let mut videos = self.videos.write();
        let record = videos.get_mut(&id).ok_or_else(|| CatalogError::NotFound {
            video_id: video_id.to_string(),
        })?;
        patch.apply(record);
        debug!("Patched video {}", id);
        Ok(record.clone())
    }

    /// Remove the record and its file.
    ///
    /// A file that is already gone does not fail the deletion.
    ///
    /// # Errors
    /// - `CatalogError::NotFound` - Unknown or malformed id
    /// - `CatalogError::Io` - File exists but could not be removed
    pub async fn delete(&self, video_id: &str) -> CatalogResult<VideoRecord> {
        let file_path = self.get(video_id)?.file_path;

        match tokio::fs::remove_file(&file_path).await {
            Ok(()) => debug!("Removed {}", file_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "File for video {} was already missing: {}",
                    video_id,
                    file_path.display()
                );
            }
            Err(source) => {
                return Err(CatalogError::Io {
                    path: file_path,
                    source,
                });
            }
        }

        let id = parse_video_id(video_id)?;
        let removed = self
            .videos
            .write()
            .remove(&id)
            .ok_or_else(|| CatalogError::NotFound {
                video_id: video_id.to_string(),
            })?;
        info!("Deleted video {} ({})", removed.id, removed.title);
        Ok(removed)
    }

    /// Number of registered videos
    pub fn len(&self) -> usize {
        self.videos.read().len()
    }

    /// Whether the catalog has no videos
    pub fn is_empty(&self) -> bool {
        self.videos.read().is_empty()
    }
}

#[async_trait]
impl VideoMetadataStore for VideoCatalog {
    async fn video_source(&self, video_id: &str) -> Option<VideoSource> {
        self.get(video_id).ok().map(|record| VideoSource {
            title: record.title,
            file_path: record.file_path,
        })
    }
}

fn parse_video_id(video_id: &str) -> CatalogResult<Uuid> {
    Uuid::from_str(video_id).map_err(|_| CatalogError::NotFound {
        video_id: video_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::test_fixtures::{DUMMY_VIDEO_CONTENT, write_video_file};

    fn new_video(path: PathBuf) -> NewVideo {
        NewVideo {
            user_id: "user-1".to_string(),
            title: "Dummy".to_string(),
            description: "A dummy video".to_string(),
            file_path: path,
        }
    }

    #[test]
    fn test_create_and_get() {
        let catalog = VideoCatalog::new();
        let record = catalog.create(new_video(PathBuf::from("a.mp4"))).unwrap();

        let fetched = catalog.get(&record.id.to_string()).unwrap();
        assert_eq!(fetched, record);
        assert_eq!(fetched.description.as_deref(), Some("A dummy video"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let catalog = VideoCatalog::new();
        let mut video = new_video(PathBuf::from("a.mp4"));
        video.title = String::new();

        assert!(matches!(
            catalog.create(video),
            Err(CatalogError::Validation { field: "title", .. })
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_get_unknown_or_malformed_id_is_not_found() {
        let catalog = VideoCatalog::new();
        assert!(matches!(
            catalog.get(&Uuid::new_v4().to_string()),
            Err(CatalogError::NotFound { .. })
        ));
        assert!(matches!(
            catalog.get("not-a-uuid"),
            Err(CatalogError::NotFound { .. })
        ));
    }

    #[test]
    fn test_list_is_ordered_by_upload_time() {
        let catalog = VideoCatalog::new();
        let first = catalog.create(new_video(PathBuf::from("1.mp4"))).unwrap();
        let second = catalog.create(new_video(PathBuf::from("2.mp4"))).unwrap();

        let ids: Vec<Uuid> = catalog.list().iter().map(|v| v.id).collect();
        assert_eq!(ids.len(), 2);
        if first.uploaded_at < second.uploaded_at {
            assert_eq!(ids, vec![first.id, second.id]);
        }
    }

    #[test]
    fn test_patch_updates_present_fields() {
        let catalog = VideoCatalog::new();
        let record = catalog.create(new_video(PathBuf::from("a.mp4"))).unwrap();

        let patched = catalog
            .patch(
                &record.id.to_string(),
                VideoPatch {
                    title: Some("Renamed".to_string()),
                    description: None,
                },
            )
            .unwrap();
        assert_eq!(patched.title, "Renamed");
        assert_eq!(patched.description, record.description);
    }

    #[test]
    fn test_patch_unknown_video() {
        let catalog = VideoCatalog::new();
        let result = catalog.patch(&Uuid::new_v4().to_string(), VideoPatch::default());
        assert!(matches!(result, Err(CatalogError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_removes_file_and_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_video_file(dir.path(), "a.mp4", DUMMY_VIDEO_CONTENT);
        let catalog = VideoCatalog::new();
        let record = catalog.create(new_video(path.clone())).unwrap();

        catalog.delete(&record.id.to_string()).await.unwrap();
        assert!(!path.exists());
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_delete_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = VideoCatalog::new();
        let record = catalog
            .create(new_video(dir.path().join("never-written.mp4")))
            .unwrap();

        let removed = catalog.delete(&record.id.to_string()).await.unwrap();
        assert_eq!(removed.id, record.id);
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_video_source_for_streaming() {
        let catalog = VideoCatalog::new();
        let record = catalog.create(new_video(PathBuf::from("a.mp4"))).unwrap();

        let source = catalog.video_source(&record.id.to_string()).await.unwrap();
        assert_eq!(source.title, "Dummy");
        assert_eq!(source.file_path, PathBuf::from("a.mp4"));
        assert!(catalog.video_source("missing").await.is_none());
    }
}
