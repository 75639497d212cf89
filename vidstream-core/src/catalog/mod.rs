//! Video metadata catalog.
//!
//! Holds the records behind `/videos` and serves as the metadata store the
//! streaming orchestrator resolves video ids against.

pub mod store;
pub mod types;

use std::path::PathBuf;

pub use store::VideoCatalog;
pub use types::{
    DESCRIPTION_MAX_CHARS, NewVideo, TITLE_MAX_CHARS, VideoDto, VideoPatch, VideoRecord,
};

/// Errors from catalog operations
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No record with this id
    #[error("Video not found: {video_id}")]
    NotFound {
        /// Identifier as supplied by the caller
        video_id: String,
    },

    /// Input field failed validation
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// Name of the offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Filesystem operation on the video file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
