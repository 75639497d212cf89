//! Range header extraction

use axum::http::{HeaderMap, header};

use crate::errors::ApiError;

/// Extract the raw Range header value.
///
/// Returns `None` if no range header is present. Parsing and validation
/// against the file size happen in the stream orchestrator.
///
/// # Errors
/// - `ApiError::BadRequest` - Header present but not valid visible ASCII
pub fn extract_range_header(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    headers
        .get(header::RANGE)
        .map(|range| {
            range
                .to_str()
                .map(str::to_string)
                .map_err(|_| ApiError::BadRequest("Range header is not valid ASCII".to_string()))
        })
        .transpose()
}
