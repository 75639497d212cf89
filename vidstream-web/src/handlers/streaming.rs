//! Video stream endpoint with HTTP Range support

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::Response;
use tracing::debug;
use vidstream_core::streaming::StreamDescriptor;

use super::range::extract_range_header;
use crate::errors::ApiError;
use crate::server::AppState;

/// `GET /videos/{video_id}/stream`
///
/// Serves the whole file with 200, or a single requested range with 206.
///
/// # Errors
/// - `ApiError::NotFound` - Unknown video or missing file
/// - `ApiError::BadRequest` - Range header unusable
/// - `ApiError::Internal` - File could not be read
pub async fn stream_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let range = extract_range_header(&headers)?;
    debug!("Stream request for {}: range={:?}", video_id, range);

    let descriptor = state.orchestrator.stream(&video_id, range.as_deref()).await?;
    Ok(stream_response(descriptor))
}

/// Turn a descriptor into a response, adding media type and disposition.
fn stream_response(descriptor: StreamDescriptor) -> Response {
    let content_type = mime_guess::from_path(&descriptor.video.file_path).first_or_octet_stream();
    let disposition = content_disposition(&descriptor.video.title);

    let mut response = Response::new(Body::from_stream(descriptor.body));
    *response.status_mut() = descriptor.status;

    let headers = response.headers_mut();
    headers.extend(descriptor.headers);
    if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    response
}

/// `inline; filename="<title>"` with quotes and control characters neutralized.
pub fn content_disposition(title: &str) -> String {
    let filename: String = title
        .chars()
        .filter(|c| !c.is_control())
        .flat_map(|c| match c {
            '"' | '\\' => vec!['\\', c],
            _ => vec![c],
        })
        .collect();
    format!("inline; filename=\"{filename}\"")
}
