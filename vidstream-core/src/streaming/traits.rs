//! Collaborator seams for the streaming orchestrator.
//!
//! The orchestrator only needs a read-only metadata lookup and a way to
//! measure and open files. Keeping both behind traits lets tests swap in
//! in-memory implementations without touching the streaming logic.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::file_reader::{ByteStream, PartialFileReader, ReadSpan};
use super::{StreamingError, StreamingResult};

/// Metadata needed to stream a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSource {
    /// Display title, used for the inline filename
    pub title: String,
    /// Location of the uploaded file
    pub file_path: PathBuf,
}

/// Read-only lookup of stream metadata by video identifier.
#[async_trait]
pub trait VideoMetadataStore: Send + Sync {
    /// Returns the title and file path for `video_id`, or `None` if unknown.
    async fn video_source(&self, video_id: &str) -> Option<VideoSource>;
}

/// Filesystem access used while streaming.
#[async_trait]
pub trait MediaFilesystem: Send + Sync {
    /// Current size of the file in bytes.
    ///
    /// # Errors
    /// - `StreamingError::FileNotFound` - File does not exist
    /// - `StreamingError::Io` - Metadata could not be read
    async fn file_size(&self, path: &Path) -> StreamingResult<u64>;

    /// Opens the file as a byte stream yielding exactly `span`.
    ///
    /// # Errors
    /// - `StreamingError::FileNotFound` - File does not exist
    /// - `StreamingError::Io` - File could not be opened or positioned
    async fn open_range(&self, path: &Path, span: ReadSpan) -> StreamingResult<ByteStream>;
}

/// [`MediaFilesystem`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem {
    reader: PartialFileReader,
}

impl LocalFilesystem {
    /// Creates a local filesystem reading chunks of `chunk_size` bytes.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            reader: PartialFileReader::new(chunk_size),
        }
    }
}

#[async_trait]
impl MediaFilesystem for LocalFilesystem {
    async fn file_size(&self, path: &Path) -> StreamingResult<u64> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| StreamingError::from_io(path, e))?;

        if !metadata.is_file() {
            return Err(StreamingError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        Ok(metadata.len())
    }

    async fn open_range(&self, path: &Path, span: ReadSpan) -> StreamingResult<ByteStream> {
        self.reader.open(path, span).await
    }
}
