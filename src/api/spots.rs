//! Spot API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateSpotRequest, Spot, SpotDetail, UpdateSpotRequest};
use crate::AppState;

/// GET /api/spots - List all spots.
pub async fn list_spots(State(state): State<AppState>) -> ApiResult<Vec<Spot>> {
    let spots = state.repo.list_spots().await?;
    success(spots)
}

/// GET /api/spots/:id - Get a single spot.
pub async fn get_spot(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Spot> {
    match state.repo.get_spot(id).await? {
        Some(spot) => success(spot),
        None => Err(AppError::NotFound(format!("Spot {} not found", id))),
    }
}

/// POST /api/spots - Submit the add-spot form.
///
/// The start point is reverse-geocoded before insertion; the stored row is
/// returned so the client can append it to its list.
pub async fn create_spot(
    State(state): State<AppState>,
    Json(request): Json<CreateSpotRequest>,
) -> ApiResult<Spot> {
    let mut new_spot = request.validate().map_err(AppError::Validation)?;

    let location = state
        .geocoder
        .reverse_geocode(new_spot.start.lat, new_spot.start.lng)
        .await;
    new_spot.location_data = Some(location);

    let spot = state.repo.insert_spot(&new_spot).await?;
    tracing::info!(spot_id = spot.id, "Created spot {}", spot.name);

    success(spot)
}

/// PUT /api/spots/:id - Update a spot.
pub async fn update_spot(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateSpotRequest>,
) -> ApiResult<Spot> {
    let existing = state
        .repo
        .get_spot(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Spot {} not found", id)))?;

    let mut spot = request.apply(&existing).map_err(AppError::Validation)?;

    // Location is computed once and only filled in again when absent
    if spot.location_data.is_none() {
        let location = state
            .geocoder
            .reverse_geocode(spot.start_lat, spot.start_lng)
            .await;
        spot.location_data = Some(location);
    }

    let spot = state.repo.update_spot(&spot).await?;
    tracing::info!(spot_id = spot.id, "Updated spot {}", spot.name);

    success(spot)
}

/// GET /api/spots/:id/detail - A spot with its gallery, fetched concurrently.
pub async fn get_spot_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<SpotDetail> {
    let (spot, photos) = tokio::join!(state.repo.get_spot(id), state.repo.list_photos(id));

    let spot = spot?.ok_or_else(|| AppError::NotFound(format!("Spot {} not found", id)))?;
    success(SpotDetail {
        spot,
        photos: photos?,
    })
}
