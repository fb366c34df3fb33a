//! Map view endpoint.

use axum::extract::{Query, State};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::map::{self, MapFilter, MapView, TileSource, DEFAULT_ZOOM};
use crate::models::LineType;
use crate::AppState;

/// Query parameters for GET /api/map.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapQuery {
    pub zoom: Option<u8>,
    pub highline: Option<bool>,
    pub waterline: Option<bool>,
    pub parkline: Option<bool>,
    pub min_length: Option<f64>,
    pub max_length: Option<f64>,
}

impl MapQuery {
    pub fn filter(&self) -> MapFilter {
        let mut filter = MapFilter::default();
        for (line_type, flag) in [
            (LineType::Highline, self.highline),
            (LineType::Waterline, self.waterline),
            (LineType::Parkline, self.parkline),
        ] {
            if let Some(visible) = flag {
                filter.set_visible(line_type, visible);
            }
        }
        // NaN or infinite bounds would hide every spot
        filter.min_length = self.min_length.filter(|v| v.is_finite());
        filter.max_length = self.max_length.filter(|v| v.is_finite());
        filter
    }
}

/// GET /api/map - Filtered, clustered markers for one map render.
pub async fn get_map(
    State(state): State<AppState>,
    Query(query): Query<MapQuery>,
) -> ApiResult<MapView> {
    let spots = state.repo.list_spots().await?;
    let tiles = TileSource {
        url: state.config.tiles.url.clone(),
        attribution: state.config.tiles.attribution.clone(),
    };

    let view = map::render(
        &spots,
        &query.filter(),
        query.zoom.unwrap_or(DEFAULT_ZOOM),
        tiles,
    );
    tracing::debug!(total = view.total, shown = view.shown, "Rendered map view");

    success(view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_bounds_are_ignored() {
        let query = MapQuery {
            min_length: Some(f64::NAN),
            max_length: Some(f64::INFINITY),
            waterline: Some(false),
            ..Default::default()
        };

        let filter = query.filter();
        assert_eq!(filter.min_length, None);
        assert_eq!(filter.max_length, None);
        assert!(!filter.is_visible(LineType::Waterline));
        assert!(filter.is_visible(LineType::Highline));
    }
}
