//! Lazy, bounded file reads for streaming responses.
//!
//! The returned stream owns the file handle. Dropping the stream, whether
//! after the last chunk, after an error, or because the client went away,
//! closes the file.

use std::fmt;
use std::io::{self, SeekFrom};
use std::path::Path;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::range::ByteInterval;
use super::{StreamingError, StreamingResult};

/// Boxed byte stream handed to the HTTP layer.
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + 'static>>;

/// Default size of chunks read from disk.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024; // 64 KiB

/// Bytes a read should produce, fixed when the file was measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSpan {
    /// The whole file, as long as it was when measured
    Whole {
        /// Measured size in bytes
        file_size: u64,
    },
    /// A single validated interval
    Interval(ByteInterval),
}

impl ReadSpan {
    /// Offset of the first byte.
    pub fn start(&self) -> u64 {
        match self {
            ReadSpan::Whole { .. } => 0,
            ReadSpan::Interval(interval) => interval.start(),
        }
    }

    /// Number of bytes the stream yields.
    pub fn len(&self) -> u64 {
        match self {
            ReadSpan::Whole { file_size } => *file_size,
            ReadSpan::Interval(interval) => interval.len(),
        }
    }

    /// True for a whole read of an empty file.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for ReadSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadSpan::Whole { file_size } => write!(f, "full file ({file_size} bytes)"),
            ReadSpan::Interval(i) => write!(f, "bytes {}-{}", i.start(), i.end()),
        }
    }
}

/// Opens files and turns them into forward-only byte streams.
#[derive(Debug, Clone, Copy)]
pub struct PartialFileReader {
    chunk_size: usize,
}

impl Default for PartialFileReader {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl PartialFileReader {
    /// Creates a reader emitting chunks of at most `chunk_size` bytes.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Open `path` and stream exactly the bytes of `span`.
    ///
    /// Bytes appended after the file was measured are not served; a file
    /// that shrank ends the stream with `UnexpectedEof`.
    ///
    /// # Errors
    /// - `StreamingError::FileNotFound` - File does not exist at call time
    /// - `StreamingError::Io` - Open or seek failed for any other reason
    pub async fn open(&self, path: &Path, span: ReadSpan) -> StreamingResult<ByteStream> {
        let file = File::open(path)
            .await
            .map_err(|e| StreamingError::from_io(path, e))?;

        debug!("Opened {} for streaming ({})", path.display(), span);

        self.stream_reader(file, span)
            .await
            .map_err(|e| StreamingError::from_io(path, e))
    }

    /// Stream `span` from an already opened seekable reader.
    ///
    /// The reader is moved into the stream, or dropped here if seeking fails.
    ///
    /// # Errors
    /// - `std::io::Error` - Seeking to the span start failed
    pub async fn stream_reader<R>(&self, mut reader: R, span: ReadSpan) -> io::Result<ByteStream>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send + 'static,
    {
        if span.start() > 0 {
            reader.seek(SeekFrom::Start(span.start())).await?;
        }
        let bounded = ReaderStream::with_capacity(reader.take(span.len()), self.chunk_size);
        Ok(Box::pin(exact_length(bounded, span.len())))
    }
}

/// Fails the stream if the source ends before `expected` bytes were produced.
///
/// The inner stream is dropped as soon as it ends or errors.
fn exact_length<S>(inner: S, expected: u64) -> impl Stream<Item = io::Result<Bytes>> + Send
where
    S: Stream<Item = io::Result<Bytes>> + Unpin + Send,
{
    stream::unfold(Some((inner, expected)), |state| async move {
        let (mut inner, remaining) = state?;
        match inner.next().await {
            Some(Ok(chunk)) => {
                let remaining = remaining.saturating_sub(chunk.len() as u64);
                Some((Ok(chunk), Some((inner, remaining))))
            }
            Some(Err(e)) => Some((Err(e), None)),
            None if remaining > 0 => Some((
                Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("file ended {remaining} bytes short of the measured span"),
                )),
                None,
            )),
            None => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;
    use crate::test_fixtures::{DUMMY_VIDEO_CONTENT, write_video_file};

    async fn collect(mut stream: ByteStream) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }

    /// In-memory reader that tracks how many instances are alive.
    struct TrackedReader {
        inner: Cursor<Vec<u8>>,
        live: Arc<AtomicUsize>,
    }

    impl TrackedReader {
        fn new(data: Vec<u8>, live: Arc<AtomicUsize>) -> Self {
            live.fetch_add(1, Ordering::SeqCst);
            Self {
                inner: Cursor::new(data),
                live,
            }
        }
    }

    impl Drop for TrackedReader {
        fn drop(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl AsyncRead for TrackedReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Pin::new(&mut self.inner).poll_read(cx, buf)
        }
    }

    impl AsyncSeek for TrackedReader {
        fn start_seek(mut self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
            Pin::new(&mut self.inner).start_seek(position)
        }

        fn poll_complete(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
            Pin::new(&mut self.inner).poll_complete(cx)
        }
    }

    #[tokio::test]
    async fn test_open_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_video_file(dir.path(), "full.mp4", DUMMY_VIDEO_CONTENT);

        let span = ReadSpan::Whole {
            file_size: DUMMY_VIDEO_CONTENT.len() as u64,
        };

        let stream = PartialFileReader::default().open(&path, span).await.unwrap();
        assert_eq!(collect(stream).await.unwrap(), DUMMY_VIDEO_CONTENT);
    }

    #[tokio::test]
    async fn test_open_interval_yields_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_video_file(dir.path(), "partial.mp4", DUMMY_VIDEO_CONTENT);
        let interval = ByteInterval::new(0, 4, DUMMY_VIDEO_CONTENT.len() as u64).unwrap();

        let stream = PartialFileReader::default()
            .open(&path, ReadSpan::Interval(interval))
            .await
            .unwrap();
        assert_eq!(collect(stream).await.unwrap(), b"dummy");
    }

    #[tokio::test]
    async fn test_small_chunks_preserve_order() {
        let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let dir = tempfile::tempdir().unwrap();
        let path = write_video_file(dir.path(), "ordered.mp4", &data);
        let interval = ByteInterval::new(1234, 8765, data.len() as u64).unwrap();

        let stream = PartialFileReader::new(7)
            .open(&path, ReadSpan::Interval(interval))
            .await
            .unwrap();
        assert_eq!(collect(stream).await.unwrap(), &data[1234..=8765]);
    }

    #[tokio::test]
    async fn test_open_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = PartialFileReader::default()
            .open(&dir.path().join("missing.mp4"), ReadSpan::Whole { file_size: 0 })
            .await;
        assert!(matches!(result, Err(StreamingError::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn test_truncated_source_reports_unexpected_eof() {
        // Interval validated against a larger size than the reader holds.
        let interval = ByteInterval::new(0, 99, 100).unwrap();
        let stream = PartialFileReader::default()
            .stream_reader(Cursor::new(vec![1u8; 10]), ReadSpan::Interval(interval))
            .await
            .unwrap();

        let err = collect(stream).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_dropping_stream_early_releases_reader() {
        let live = Arc::new(AtomicUsize::new(0));
        let reader = TrackedReader::new(vec![7u8; 4096], live.clone());
        let interval = ByteInterval::new(10, 4000, 4096).unwrap();

        let mut stream = PartialFileReader::new(16)
            .stream_reader(reader, ReadSpan::Interval(interval))
            .await
            .unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert!(!first.is_empty());
        assert_eq!(live.load(Ordering::SeqCst), 1);

        drop(stream);
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhausted_stream_releases_reader() {
        let live = Arc::new(AtomicUsize::new(0));
        let reader = TrackedReader::new(vec![1u8; 64], live.clone());
        let interval = ByteInterval::new(0, 63, 64).unwrap();

        let mut stream = PartialFileReader::new(16)
            .stream_reader(reader, ReadSpan::Interval(interval))
            .await
            .unwrap();
        while stream.next().await.is_some() {}

        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_whole_read_ignores_bytes_appended_after_measuring() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_video_file(dir.path(), "growing.mp4", DUMMY_VIDEO_CONTENT);
        let span = ReadSpan::Whole {
            file_size: DUMMY_VIDEO_CONTENT.len() as u64,
        };

        let mut grown = DUMMY_VIDEO_CONTENT.to_vec();
        grown.extend_from_slice(b"extra");
        write_video_file(dir.path(), "growing.mp4", &grown);

        let stream = PartialFileReader::new(8).open(&path, span).await.unwrap();
        assert_eq!(collect(stream).await.unwrap(), DUMMY_VIDEO_CONTENT);
    }

    #[tokio::test]
    async fn test_whole_read_of_shrunk_source_reports_unexpected_eof() {
        let stream = PartialFileReader::default()
            .stream_reader(Cursor::new(vec![1u8; 10]), ReadSpan::Whole { file_size: 31 })
            .await
            .unwrap();

        let err = collect(stream).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_whole_read_of_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_video_file(dir.path(), "empty.mp4", b"");

        let stream = PartialFileReader::default()
            .open(&path, ReadSpan::Whole { file_size: 0 })
            .await
            .unwrap();
        assert!(collect(stream).await.unwrap().is_empty());
    }

    #[test]
    fn test_read_span_bounds() {
        let interval = ByteInterval::new(21, 30, 31).unwrap();
        assert_eq!(ReadSpan::Interval(interval).start(), 21);
        assert_eq!(ReadSpan::Interval(interval).len(), 10);
        assert_eq!(ReadSpan::Whole { file_size: 31 }.start(), 0);
        assert_eq!(ReadSpan::Whole { file_size: 31 }.len(), 31);
        assert_eq!(ReadSpan::Interval(interval).to_string(), "bytes 21-30");
    }
}
