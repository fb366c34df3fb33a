//! Location tree endpoint.

use axum::extract::State;

use super::{success, ApiResult};
use crate::hierarchy::{build_hierarchy, LocationHierarchy};
use crate::models::Spot;
use crate::AppState;

/// GET /api/locations - Spots grouped by country, state and city.
///
/// Spots missing part of their location are geocoded and saved first, so every
/// spot lands under real (or placeholder) names.
pub async fn list_locations(State(state): State<AppState>) -> ApiResult<LocationHierarchy> {
    let spots = state.repo.list_spots().await?;
    let spots = normalize_locations(&state, spots).await;
    success(build_hierarchy(&spots))
}

async fn normalize_locations(state: &AppState, spots: Vec<Spot>) -> Vec<Spot> {
    let mut normalized = Vec::with_capacity(spots.len());

    for mut spot in spots {
        if spot.location_data.as_ref().is_some_and(|l| l.is_complete()) {
            normalized.push(spot);
            continue;
        }

        let resolved = state
            .geocoder
            .reverse_geocode(spot.start_lat, spot.start_lng)
            .await;
        spot.location_data
            .get_or_insert_with(Default::default)
            .fill_missing(resolved);

        match state.repo.update_spot(&spot).await {
            Ok(saved) => {
                tracing::info!(spot_id = saved.id, "Backfilled location data");
                normalized.push(saved);
            }
            Err(e) => {
                tracing::warn!(spot_id = spot.id, "Failed to save location data: {}", e);
                normalized.push(spot);
            }
        }
    }

    normalized
}
