//! Video upload and metadata endpoints

use std::path::{Path as FsPath, PathBuf};

use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;
use vidstream_core::catalog::{NewVideo, VideoDto, VideoPatch};

use crate::auth::AuthenticatedUser;
use crate::errors::ApiError;
use crate::server::AppState;

/// Multipart part carrying the file.
const VIDEO_FIELD: &str = "video";

/// `GET /videos`
pub async fn list_videos(State(state): State<AppState>) -> Json<Vec<VideoDto>> {
    Json(state.catalog.list().iter().map(VideoDto::from).collect())
}

/// `GET /videos/{video_id}`
///
/// # Errors
/// - `ApiError::NotFound` - Unknown video
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<VideoDto>, ApiError> {
    let record = state.catalog.get(&video_id)?;
    Ok(Json(VideoDto::from(&record)))
}

/// `PATCH /videos/{video_id}`
///
/// # Errors
/// - `ApiError::Unauthorized` - Missing, invalid or expired access token
/// - `ApiError::BadRequest` - Body not a valid patch
/// - `ApiError::NotFound` - Unknown video
pub async fn patch_video(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(video_id): Path<String>,
    payload: Result<Json<VideoPatch>, JsonRejection>,
) -> Result<Json<VideoDto>, ApiError> {
    let Json(patch) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let record = state.catalog.patch(&video_id, patch)?;
    info!("User {} patched video {}", user.user_id, record.id);
    Ok(Json(VideoDto::from(&record)))
}

/// `DELETE /videos/{video_id}`
///
/// # Errors
/// - `ApiError::Unauthorized` - Missing, invalid or expired access token
/// - `ApiError::NotFound` - Unknown video
/// - `ApiError::Internal` - File exists but could not be removed
pub async fn delete_video(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(video_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let record = state.catalog.delete(&video_id).await?;
    info!("User {} deleted video {}", user.user_id, record.id);
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /videos` with multipart fields `title`, `description` and `video`.
///
/// The file part is streamed straight to the uploads directory.
///
/// # Errors
/// - `ApiError::Unauthorized` - Missing, invalid or expired access token
/// - `ApiError::BadRequest` - Missing, empty or oversized file, invalid fields
/// - `ApiError::Internal` - File could not be written
pub async fn upload_video(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<VideoDto>), ApiError> {
    let mut title = None;
    let mut description = None;
    let mut upload: Option<PendingUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => title = Some(field.text().await.map_err(bad_multipart)?),
            Some("description") => description = Some(field.text().await.map_err(bad_multipart)?),
            Some(VIDEO_FIELD) if upload.is_none() => {
                upload = Some(store_upload(&state, field).await?);
            }
            Some(VIDEO_FIELD) => {
                return Err(ApiError::BadRequest(
                    "only one video file may be uploaded".to_string(),
                ));
            }
            other => {
                return Err(ApiError::BadRequest(format!(
                    "unexpected multipart field {:?}",
                    other.unwrap_or_default()
                )));
            }
        }
    }

    let upload =
        upload.ok_or_else(|| ApiError::BadRequest("video file is required".to_string()))?;

    let record = state.catalog.create(NewVideo {
        user_id: user.user_id,
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
        file_path: upload.path().to_path_buf(),
    })?;
    upload.commit();

    Ok((StatusCode::CREATED, Json(VideoDto::from(&record))))
}

/// Stream one multipart file field to a fresh file in the uploads directory.
async fn store_upload(state: &AppState, mut field: Field<'_>) -> Result<PendingUpload, ApiError> {
    let storage = &state.config.storage;
    let file_name = match upload_extension(field.file_name(), field.content_type()) {
        Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
        None => Uuid::new_v4().to_string(),
    };
    let upload = PendingUpload::new(storage.uploads_dir.join(file_name));

    let mut file = File::create(upload.path())
        .await
        .map_err(|e| write_failed(upload.path(), e))?;

    let mut written: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(bad_multipart)? {
        written += chunk.len() as u64;
        if written > storage.max_upload_bytes {
            return Err(ApiError::BadRequest(format!(
                "video file exceeds {} bytes",
                storage.max_upload_bytes
            )));
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| write_failed(upload.path(), e))?;
    }
    file.flush()
        .await
        .map_err(|e| write_failed(upload.path(), e))?;

    if written == 0 {
        return Err(ApiError::BadRequest("video file must not be empty".to_string()));
    }

    info!("Stored upload of {} bytes at {}", written, upload.path().display());
    Ok(upload)
}

/// Extension for a stored upload: from the client file name when it is
/// a plain alphanumeric suffix, otherwise from the declared media type.
fn upload_extension(file_name: Option<&str>, content_type: Option<&str>) -> Option<String> {
    let from_name = file_name
        .and_then(|name| FsPath::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);

    from_name.or_else(|| {
        content_type
            .and_then(mime_guess::get_mime_extensions_str)
            .and_then(|exts| exts.first())
            .map(|ext| ext.to_string())
    })
}

fn bad_multipart(error: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(error.body_text())
}

fn write_failed(path: &FsPath, error: std::io::Error) -> ApiError {
    ApiError::Internal(format!("writing {}: {error}", path.display()))
}

/// Uploaded file that is removed again unless committed to the catalog.
struct PendingUpload {
    path: PathBuf,
    committed: bool,
}

impl PendingUpload {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn path(&self) -> &FsPath {
        &self.path
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => warn!("Discarded incomplete upload {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to discard {}: {}", self.path.display(), e),
        }
    }
}
