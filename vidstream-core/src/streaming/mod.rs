//! HTTP byte-range streaming of uploaded video files.
//!
//! Parses `Range` headers, opens bounded file streams and assembles the
//! status/headers/body triple served by the web layer.

pub mod file_reader;
pub mod orchestrator;
pub mod range;
pub mod traits;

use std::path::{Path, PathBuf};

pub use file_reader::{ByteStream, DEFAULT_CHUNK_SIZE, PartialFileReader, ReadSpan};
pub use orchestrator::{StreamDescriptor, StreamingOrchestrator, VideoFileHandle};
pub use range::{
    ByteInterval, RangeError, RangeRejection, RangeRequest, format_content_range, parse_range,
};
pub use traits::{LocalFilesystem, MediaFilesystem, VideoMetadataStore, VideoSource};

/// Errors that terminate a stream request.
#[derive(Debug, thiserror::Error)]
pub enum StreamingError {
    /// No video record with this identifier
    #[error("Video not found: {video_id}")]
    VideoNotFound {
        /// Identifier that was looked up
        video_id: String,
    },

    /// The record exists but its file is missing
    #[error("Video file not found: {}", path.display())]
    FileNotFound {
        /// Path recorded for the video
        path: PathBuf,
    },

    /// Range header could not be honored
    #[error("Bad range request: {source}")]
    BadRange {
        /// The parser failure
        #[from]
        source: RangeError,
    },

    /// Filesystem failure other than a missing file
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },
}

impl StreamingError {
    /// Classify an I/O error for `path`, splitting out missing files.
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            StreamingError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            StreamingError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// True for both a missing record and a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StreamingError::VideoNotFound { .. } | StreamingError::FileNotFound { .. }
        )
    }
}

/// Result type for streaming operations
pub type StreamingResult<T> = Result<T, StreamingError>;
