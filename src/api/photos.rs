//! Photo gallery endpoints.

use axum::extract::{Multipart, Path, State};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{Photo, UploadReport};
use crate::uploads::{PendingUpload, UploadQueue};
use crate::AppState;

async fn ensure_spot_exists(state: &AppState, id: i64) -> Result<(), AppError> {
    match state.repo.get_spot(id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("Spot {} not found", id))),
    }
}

/// GET /api/spots/:id/photos - List a spot's photos, oldest first.
pub async fn list_photos(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Photo>> {
    ensure_spot_exists(&state, id).await?;
    let photos = state.repo.list_photos(id).await?;
    success(photos)
}

/// POST /api/spots/:id/photos - Upload one or more photos (multipart).
///
/// Every part carrying a file name is queued in submission order. Files that
/// fail are reported back and skipped; the gallery is refetched afterwards.
pub async fn upload_photos(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<UploadReport> {
    ensure_spot_exists(&state, id).await?;

    let mut queue = UploadQueue::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await?;
        queue.push(PendingUpload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    if queue.is_empty() {
        return Err(AppError::Validation("No files provided".to_string()));
    }

    tracing::info!(spot_id = id, files = queue.len(), "Uploading photos");
    let outcome = queue
        .process(id, &state.repo, &state.blobs, &state.config.photo_bucket)
        .await;

    let photos = state.repo.list_photos(id).await?;
    success(UploadReport {
        photos,
        uploaded: outcome.stored.len(),
        failed: outcome.failed,
    })
}
