//! Reverse geocoding endpoint.

use axum::extract::{Query, State};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::map::LatLng;
use crate::models::LocationData;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub lat: f64,
    #[serde(alias = "lon")]
    pub lng: f64,
}

/// GET /api/geocode - Resolve coordinates to country, state and city.
pub async fn reverse_geocode(
    State(state): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> ApiResult<LocationData> {
    if !LatLng::new(query.lat, query.lng).is_valid() {
        return Err(AppError::Validation(
            "Invalid coordinates: lat must be -90..90, lng must be -180..180".to_string(),
        ));
    }

    let location = state.geocoder.reverse_geocode(query.lat, query.lng).await;
    success(location)
}
