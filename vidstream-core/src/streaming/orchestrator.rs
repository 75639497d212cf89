//! Per-request stream composition: resolve, measure, decide, open.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use tracing::{debug, info, warn};

use super::file_reader::{ByteStream, ReadSpan};
use super::range::{ByteInterval, RangeRequest, format_content_range, parse_range};
use super::traits::{MediaFilesystem, VideoMetadataStore};
use super::{StreamingError, StreamingResult};

/// File resolved for a single stream request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFileHandle {
    /// Display title of the video
    pub title: String,
    /// Location of the file on disk
    pub file_path: PathBuf,
    /// Size measured at request time
    pub file_size: u64,
}

/// Everything the HTTP layer needs to emit a stream response.
///
/// Consumed once; the body owns the open file.
pub struct StreamDescriptor {
    /// 200 for full content, 206 for a single range
    pub status: StatusCode,
    /// Accept-Ranges and Content-Length, plus Content-Range for partial content
    pub headers: HeaderMap,
    /// The file being streamed
    pub video: VideoFileHandle,
    /// Bytes served, in ascending file order
    pub body: ByteStream,
}

impl StreamDescriptor {
    /// Number of bytes the body will yield.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
    }

    /// Whether this descriptor carries a single byte range.
    pub fn is_partial(&self) -> bool {
        self.status == StatusCode::PARTIAL_CONTENT
    }
}

impl fmt::Debug for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamDescriptor")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("video", &self.video)
            .finish_non_exhaustive()
    }
}

/// Composes metadata lookup, range parsing and file reads into responses.
///
/// Holds no per-request state; one instance serves all concurrent requests.
#[derive(Clone)]
pub struct StreamingOrchestrator {
    metadata: Arc<dyn VideoMetadataStore>,
    filesystem: Arc<dyn MediaFilesystem>,
}

impl StreamingOrchestrator {
    /// Creates an orchestrator over the given collaborators.
    pub fn new(
        metadata: Arc<dyn VideoMetadataStore>,
        filesystem: Arc<dyn MediaFilesystem>,
    ) -> Self {
        Self {
            metadata,
            filesystem,
        }
    }

    /// Build the stream response for `video_id`.
    ///
    /// Without a Range header the whole file is served with status 200. A
    /// valid single range is served with 206 and a Content-Range header.
    ///
    /// # Errors
    /// - `StreamingError::VideoNotFound` - No record for `video_id`
    /// - `StreamingError::FileNotFound` - Record exists but the file is gone
    /// - `StreamingError::BadRange` - Range header unparsable, multi-range or out of bounds
    /// - `StreamingError::Io` - Stat or open failed
    pub async fn stream(
        &self,
        video_id: &str,
        range_header: Option<&str>,
    ) -> StreamingResult<StreamDescriptor> {
        let video = self.resolve(video_id).await?;

        let request = parse_range(video.file_size, range_header).inspect_err(|e| {
            warn!("Rejecting range for video {}: {}", video_id, e);
        })?;

        match request {
            RangeRequest::Full => {
                let span = ReadSpan::Whole {
                    file_size: video.file_size,
                };
                let body = self.filesystem.open_range(&video.file_path, span).await?;
                info!(
                    "Streaming video {} in full ({} bytes)",
                    video_id, video.file_size
                );
                Ok(StreamDescriptor {
                    status: StatusCode::OK,
                    headers: stream_headers(video.file_size, None),
                    video,
                    body,
                })
            }
            RangeRequest::Partial(interval) => {
                let body = self
                    .filesystem
                    .open_range(&video.file_path, ReadSpan::Interval(interval))
                    .await?;
                info!(
                    "Streaming video {} bytes {}-{} of {}",
                    video_id,
                    interval.start(),
                    interval.end(),
                    interval.file_size()
                );
                Ok(StreamDescriptor {
                    status: StatusCode::PARTIAL_CONTENT,
                    headers: stream_headers(interval.len(), Some(&interval)),
                    video,
                    body,
                })
            }
        }
    }

    /// Look up the record and measure its file as it is right now.
    async fn resolve(&self, video_id: &str) -> StreamingResult<VideoFileHandle> {
        let source = self.metadata.video_source(video_id).await.ok_or_else(|| {
            debug!("No metadata for video {}", video_id);
            StreamingError::VideoNotFound {
                video_id: video_id.to_string(),
            }
        })?;

        let file_size = self
            .filesystem
            .file_size(&source.file_path)
            .await
            .inspect_err(|e| warn!("Cannot stat file for video {}: {}", video_id, e))?;

        Ok(VideoFileHandle {
            title: source.title,
            file_path: source.file_path,
            file_size,
        })
    }
}

fn stream_headers(content_length: u64, interval: Option<&ByteInterval>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(content_length));
    if let Some(interval) = interval
        && let Ok(value) = HeaderValue::from_str(&format_content_range(interval))
    {
        headers.insert(header::CONTENT_RANGE, value);
    }
    headers
}
