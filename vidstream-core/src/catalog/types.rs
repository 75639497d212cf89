//! Video records, their public representation and input validation

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CatalogError, CatalogResult};

/// Maximum title length in characters.
pub const TITLE_MAX_CHARS: usize = 60;
/// Maximum description length in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 160;

/// Stored video entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub id: Uuid,
    /// Uploader
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Location of the uploaded file, never exposed to clients
    pub file_path: PathBuf,
    pub uploaded_at: DateTime<Utc>,
}

/// Client-facing view of a video record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDto {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&VideoRecord> for VideoDto {
    fn from(record: &VideoRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            uploaded_at: record.uploaded_at,
        }
    }
}

/// Input for registering an uploaded file.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub file_path: PathBuf,
}

impl NewVideo {
    /// Check title and description before the record is created.
    ///
    /// # Errors
    /// - `CatalogError::Validation` - Field empty or too long
    pub fn validate(&self) -> CatalogResult<()> {
        require_non_empty("title", &self.title)?;
        require_max_chars("title", &self.title, TITLE_MAX_CHARS)?;
        require_non_empty("description", &self.description)?;
        require_max_chars("description", &self.description, DESCRIPTION_MAX_CHARS)
    }
}

/// Partial update of a record's metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl VideoPatch {
    /// Check the fields present in the patch.
    ///
    /// # Errors
    /// - `CatalogError::Validation` - A field is too long
    pub fn validate(&self) -> CatalogResult<()> {
        if let Some(title) = &self.title {
            require_max_chars("title", title, TITLE_MAX_CHARS)?;
        }
        if let Some(description) = &self.description {
            require_max_chars("description", description, DESCRIPTION_MAX_CHARS)?;
        }
        Ok(())
    }

    /// Apply the present fields to `record`.
    pub fn apply(self, record: &mut VideoRecord) {
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(description) = self.description {
            record.description = Some(description);
        }
    }
}

fn require_non_empty(field: &'static str, value: &str) -> CatalogResult<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::Validation {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

fn require_max_chars(field: &'static str, value: &str, max: usize) -> CatalogResult<()> {
    let chars = value.chars().count();
    if chars > max {
        return Err(CatalogError::Validation {
            field,
            reason: format!("must be at most {max} characters, got {chars}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_video(title: &str, description: &str) -> NewVideo {
        NewVideo {
            user_id: "user-1".to_string(),
            title: title.to_string(),
            description: description.to_string(),
            file_path: PathBuf::from("uploads/a.mp4"),
        }
    }

    #[test]
    fn test_new_video_validation() {
        assert!(new_video("Title", "Description").validate().is_ok());
        assert!(new_video("", "Description").validate().is_err());
        assert!(new_video("Title", "  ").validate().is_err());
        assert!(new_video(&"t".repeat(60), "d").validate().is_ok());
        assert!(new_video(&"t".repeat(61), "d").validate().is_err());
        assert!(new_video("t", &"d".repeat(161)).validate().is_err());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        assert!(new_video(&"é".repeat(60), "d").validate().is_ok());
    }

    #[test]
    fn test_patch_validation() {
        assert!(VideoPatch::default().validate().is_ok());

        // Only the maximum length applies on patch
        let empty_title = VideoPatch {
            title: Some(String::new()),
            description: Some(String::new()),
        };
        assert!(empty_title.validate().is_ok());

        let long_title = VideoPatch {
            title: Some("t".repeat(61)),
            description: None,
        };
        match long_title.validate() {
            Err(CatalogError::Validation { field, .. }) => assert_eq!(field, "title"),
            other => panic!("unexpected {other:?}"),
        }

        let long_description = VideoPatch {
            title: None,
            description: Some("d".repeat(161)),
        };
        assert!(long_description.validate().is_err());
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let result: Result<VideoPatch, _> =
            serde_json::from_str(r#"{"title": "New", "filePath": "/etc/passwd"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_dto_serializes_camel_case_without_path() {
        let record = VideoRecord {
            id: Uuid::nil(),
            user_id: "user-1".to_string(),
            title: "Title".to_string(),
            description: None,
            file_path: PathBuf::from("uploads/secret.mp4"),
            uploaded_at: DateTime::<Utc>::UNIX_EPOCH,
        };

        let json = serde_json::to_value(VideoDto::from(&record)).unwrap();
        assert_eq!(json["userId"], "user-1");
        assert!(json.get("uploadedAt").is_some());
        assert!(json.get("filePath").is_none());
        assert!(!json.to_string().contains("secret.mp4"));
    }
}
