//! Test fixtures for streaming and catalog testing.
//!
//! Provides standardized on-disk video files and pre-populated catalogs
//! for consistent testing across crates.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::{NewVideo, VideoCatalog, VideoRecord};
use crate::config::AuthConfig;

/// Thirty-one bytes of fake video content.
pub const DUMMY_VIDEO_CONTENT: &[u8] = b"dummy data for video streaming\n";

/// Writes `contents` to `dir/name`, replacing any existing file.
///
/// # Panics
///
/// Panics if the file cannot be written. This is acceptable in test fixtures
/// where failures indicate environment issues.
pub fn write_video_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Creates a catalog holding one video backed by `DUMMY_VIDEO_CONTENT`.
///
/// # Panics
///
/// Panics if the file cannot be written or the record is rejected.
pub fn catalog_with_dummy_video(dir: &Path) -> (Arc<VideoCatalog>, VideoRecord) {
    let path = write_video_file(dir, "dummy.mp4", DUMMY_VIDEO_CONTENT);
    let catalog = Arc::new(VideoCatalog::new());
    let record = catalog
        .create(NewVideo {
            user_id: "test-user".to_string(),
            title: "Dummy".to_string(),
            description: "Dummy video".to_string(),
            file_path: path,
        })
        .unwrap();
    (catalog, record)
}

/// Auth settings with a fixed secret and the cheapest argon2 costs, so tests
/// that register accounts stay fast.
pub fn fast_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Some("vidstream-test-secret-vidstream-test-secret".to_string()),
        hash_memory_kib: 8,
        hash_iterations: 1,
        ..AuthConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_video_content_is_31_bytes() {
        assert_eq!(DUMMY_VIDEO_CONTENT.len(), 31);
    }

    #[test]
    fn test_catalog_with_dummy_video() {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, record) = catalog_with_dummy_video(dir.path());

        assert!(record.file_path.exists());
        assert_eq!(catalog.len(), 1);
    }
}
