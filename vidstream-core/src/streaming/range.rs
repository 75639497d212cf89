//! HTTP Range header parsing and Content-Range formatting
//!
//! Only single `bytes` ranges are served. Every header that cannot be turned
//! into exactly one in-bounds interval is rejected, including syntactically
//! valid multi-range requests.

use std::fmt;

/// Inclusive byte interval validated against a file size.
///
/// Always satisfies `start <= end < file_size`, so a constructed interval
/// names at least one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteInterval {
    start: u64,
    end: u64,
    file_size: u64,
}

impl ByteInterval {
    /// Creates an interval if `start <= end < file_size` holds.
    pub fn new(start: u64, end: u64, file_size: u64) -> Option<Self> {
        (start <= end && end < file_size).then_some(Self {
            start,
            end,
            file_size,
        })
    }

    /// First byte offset, inclusive.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Last byte offset, inclusive.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Total size of the file the interval was validated against.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Number of bytes covered by the interval.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Outcome of a successfully interpreted Range header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// No range was requested; the whole file is served.
    Full,
    /// A single satisfiable interval was requested.
    Partial(ByteInterval),
}

/// Why a Range header was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRejection {
    /// Unit other than `bytes`
    UnsupportedUnit,
    /// Not of the form `start-end`, `start-` or `-suffix`
    Malformed,
    /// More than one range in a single header
    MultipleRanges,
    /// Interval does not fit inside the file
    OutOfBounds,
}

impl fmt::Display for RangeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeRejection::UnsupportedUnit => write!(f, "unsupported range unit"),
            RangeRejection::Malformed => write!(f, "malformed range"),
            RangeRejection::MultipleRanges => write!(f, "multiple ranges are not supported"),
            RangeRejection::OutOfBounds => write!(f, "range outside of file bounds"),
        }
    }
}

/// Range header parse failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// Header cannot be satisfied as a single in-bounds byte range
    #[error("Unsatisfiable range {header:?} for {file_size} byte file: {reason}")]
    Unsatisfiable {
        /// Raw header value as received
        header: String,
        /// Size of the file the header was checked against
        file_size: u64,
        /// Specific rejection cause, kept for diagnostics
        reason: RangeRejection,
    },
}

impl RangeError {
    /// Returns the specific rejection cause.
    pub fn reason(&self) -> RangeRejection {
        match self {
            RangeError::Unsatisfiable { reason, .. } => *reason,
        }
    }
}

const BYTES_UNIT: &str = "bytes";

/// Parse an optional Range header against the current file size.
///
/// Absent or blank headers yield [`RangeRequest::Full`]. Accepted forms are
/// `bytes=start-end`, `bytes=start-` and `bytes=-suffix`.
///
/// # Examples
/// ```
/// use vidstream_core::streaming::{RangeRequest, parse_range};
///
/// let request = parse_range(1000, Some("bytes=100-199")).unwrap();
/// let RangeRequest::Partial(interval) = request else { panic!() };
/// assert_eq!((interval.start(), interval.end(), interval.len()), (100, 199, 100));
/// ```
///
/// # Errors
/// - `RangeError::Unsatisfiable` - Malformed, multi-range, non-`bytes` or out-of-bounds header
pub fn parse_range(file_size: u64, header: Option<&str>) -> Result<RangeRequest, RangeError> {
    let raw = match header {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(RangeRequest::Full),
    };

    let reject = |reason| RangeError::Unsatisfiable {
        header: raw.to_string(),
        file_size,
        reason,
    };

    let (unit, range_set) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| reject(RangeRejection::Malformed))?;
    if !unit.trim().eq_ignore_ascii_case(BYTES_UNIT) {
        return Err(reject(RangeRejection::UnsupportedUnit));
    }
    if range_set.contains(',') {
        return Err(reject(RangeRejection::MultipleRanges));
    }

    let (start_str, end_str) = range_set
        .trim()
        .split_once('-')
        .ok_or_else(|| reject(RangeRejection::Malformed))?;

    let (start, end) = match (start_str.is_empty(), end_str.is_empty()) {
        (true, true) => return Err(reject(RangeRejection::Malformed)),
        // Suffix form: last N bytes, clamped to the whole file.
        (true, false) => {
            let suffix = parse_offset(end_str).ok_or_else(|| reject(RangeRejection::Malformed))?;
            if suffix == 0 || file_size == 0 {
                return Err(reject(RangeRejection::OutOfBounds));
            }
            (file_size.saturating_sub(suffix), file_size - 1)
        }
        (false, true) => {
            let start =
                parse_offset(start_str).ok_or_else(|| reject(RangeRejection::Malformed))?;
            if file_size == 0 {
                return Err(reject(RangeRejection::OutOfBounds));
            }
            (start, file_size - 1)
        }
        (false, false) => {
            let start =
                parse_offset(start_str).ok_or_else(|| reject(RangeRejection::Malformed))?;
            let end = parse_offset(end_str).ok_or_else(|| reject(RangeRejection::Malformed))?;
            (start, end)
        }
    };

    ByteInterval::new(start, end, file_size)
        .map(RangeRequest::Partial)
        .ok_or_else(|| reject(RangeRejection::OutOfBounds))
}

/// Decimal byte offset, digits only. Signs and overflow are rejected.
fn parse_offset(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Render the `Content-Range` header value for a served interval.
///
/// # Examples
/// ```
/// use vidstream_core::streaming::{ByteInterval, format_content_range};
///
/// let interval = ByteInterval::new(0, 4, 31).unwrap();
/// assert_eq!(format_content_range(&interval), "bytes 0-4/31");
/// ```
pub fn format_content_range(interval: &ByteInterval) -> String {
    format!(
        "{BYTES_UNIT} {}-{}/{}",
        interval.start, interval.end, interval.file_size
    )
}
