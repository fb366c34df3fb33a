//! Map view model: type/length filtering, marker styling and clustering.
//!
//! Clients only draw what this module decides: which spots are visible, how
//! nearby markers collapse into count badges, and which color each gets.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::models::{LineType, Spot};

/// Badge color for clusters mixing several line types.
pub const NEUTRAL_CLUSTER_COLOR: &str = "#47A979";

pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 39.5,
    lng: -98.35,
};
pub const DEFAULT_ZOOM: u8 = 4;
pub const MAX_ZOOM: u8 = 18;

const TILE_SIZE: f64 = 256.0;
/// Pixel radius within which markers are grouped.
const CLUSTER_RADIUS_PX: f64 = 80.0;

impl LineType {
    pub fn color(&self) -> &'static str {
        match self {
            LineType::Highline => "#704786",
            LineType::Waterline => "#18abc9",
            LineType::Parkline => "#bfa33f",
        }
    }
}

/// A geographic point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// Web-Mercator world pixel coordinates at `zoom`.
    fn to_pixel(self, zoom: u8) -> (f64, f64) {
        let scale = TILE_SIZE * 2f64.powi(zoom as i32);
        let lat = self.lat.clamp(-85.051_128_78, 85.051_128_78).to_radians();
        let x = (self.lng + 180.0) / 360.0 * scale;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * scale;
        (x, y)
    }

    /// Inverse of [`LatLng::to_pixel`]; `x` is wrapped onto the world width.
    fn from_pixel((x, y): (f64, f64), zoom: u8) -> Self {
        let scale = TILE_SIZE * 2f64.powi(zoom as i32);
        let x = x.rem_euclid(scale);
        let lng = x / scale * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y / scale)).sinh().atan().to_degrees();
        Self { lat, lng }
    }
}

/// Horizontal pixel offset from `anchor` to `x`, taking the shorter way around the world.
fn wrapped_dx(anchor: f64, x: f64, zoom: u8) -> f64 {
    let world = TILE_SIZE * 2f64.powi(zoom as i32);
    let dx = (x - anchor).rem_euclid(world);
    if dx > world / 2.0 {
        dx - world
    } else {
        dx
    }
}

/// Two-click point capture used to prefill a new spot's start and end.
///
/// Holds at most two points; a third click drops the pair and starts over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCapture {
    points: Vec<LatLng>,
}

impl PointCapture {
    pub fn record(&mut self, point: LatLng) {
        if self.points.len() >= 2 {
            self.points.clear();
        }
        self.points.push(point);
    }

    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    pub fn start(&self) -> Option<LatLng> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<LatLng> {
        self.points.get(1).copied()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// User-chosen visibility and length bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct MapFilter {
    visible: BTreeMap<LineType, bool>,
    pub min_length: Option<f64>,
    pub max_length: Option<f64>,
}

impl Default for MapFilter {
    fn default() -> Self {
        Self {
            visible: LineType::ALL.iter().map(|t| (*t, true)).collect(),
            min_length: None,
            max_length: None,
        }
    }
}

impl MapFilter {
    pub fn set_visible(&mut self, line_type: LineType, visible: bool) {
        self.visible.insert(line_type, visible);
    }

    pub fn is_visible(&self, line_type: LineType) -> bool {
        self.visible.get(&line_type).copied().unwrap_or(true)
    }

    /// Whether a spot survives the current filter.
    ///
    /// A spot without a length cannot satisfy a length bound, so it is hidden as
    /// soon as either bound is set.
    pub fn includes(&self, spot: &Spot) -> bool {
        if !self.is_visible(spot.line_type) {
            return false;
        }
        if let Some(min) = self.min_length {
            match spot.length {
                Some(length) if length >= min => {}
                _ => return false,
            }
        }
        if let Some(max) = self.max_length {
            match spot.length {
                Some(length) if length <= max => {}
                _ => return false,
            }
        }
        true
    }

    pub fn apply<'a>(&self, spots: &'a [Spot]) -> Vec<&'a Spot> {
        spots.iter().filter(|s| self.includes(s)).collect()
    }
}

/// A single spot drawn on the map.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub spot_id: i64,
    pub name: String,
    pub line_type: LineType,
    pub position: LatLng,
    pub color: &'static str,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Where selecting the marker navigates to.
    pub detail_path: String,
}

impl Marker {
    pub fn from_spot(spot: &Spot) -> Self {
        let label = match spot.length {
            Some(length) => format!("{}m", length),
            None => "?m".to_string(),
        };
        Self {
            spot_id: spot.id,
            name: spot.name.clone(),
            line_type: spot.line_type,
            position: spot.start(),
            color: spot.line_type.color(),
            label,
            length: spot.length,
            anchor_type: spot.anchor_type.clone(),
            description: spot.description.clone(),
            detail_path: format!("/lines/{}", spot.id),
        }
    }
}

/// A group of nearby markers shown as a count badge.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub position: LatLng,
    pub count: usize,
    pub color: &'static str,
    pub spot_ids: Vec<i64>,
}

/// Badge color: the shared type's color, or the neutral color for mixed groups.
pub fn cluster_color(types: impl IntoIterator<Item = LineType>) -> &'static str {
    let mut types = types.into_iter();
    let Some(first) = types.next() else {
        return NEUTRAL_CLUSTER_COLOR;
    };
    if types.all(|t| t == first) {
        first.color()
    } else {
        NEUTRAL_CLUSTER_COLOR
    }
}

struct Group {
    anchor: (f64, f64),
    /// Member pixels, x unwrapped next to the anchor.
    pixels: Vec<(f64, f64)>,
    members: Vec<Marker>,
}

/// Greedily group markers lying within the cluster radius of a group's first marker.
///
/// Groups of one stay plain markers.
pub fn cluster_markers(markers: Vec<Marker>, zoom: u8) -> (Vec<Marker>, Vec<Cluster>) {
    let zoom = zoom.min(MAX_ZOOM);
    let mut groups: Vec<Group> = Vec::new();

    for marker in markers {
        let pixel = marker.position.to_pixel(zoom);
        let nearby = groups.iter_mut().find_map(|g| {
            let dx = wrapped_dx(g.anchor.0, pixel.0, zoom);
            let dy = pixel.1 - g.anchor.1;
            ((dx * dx + dy * dy).sqrt() <= CLUSTER_RADIUS_PX).then_some((g, dx))
        });
        match nearby {
            Some((group, dx)) => {
                group.pixels.push((group.anchor.0 + dx, pixel.1));
                group.members.push(marker);
            }
            None => groups.push(Group {
                anchor: pixel,
                pixels: vec![pixel],
                members: vec![marker],
            }),
        }
    }

    let mut singles = Vec::new();
    let mut clusters = Vec::new();
    for mut group in groups {
        if group.members.len() == 1 {
            singles.append(&mut group.members);
            continue;
        }
        let count = group.members.len();
        let x = group.pixels.iter().map(|p| p.0).sum::<f64>() / count as f64;
        let y = group.pixels.iter().map(|p| p.1).sum::<f64>() / count as f64;
        clusters.push(Cluster {
            position: LatLng::from_pixel((x, y), zoom),
            count,
            color: cluster_color(group.members.iter().map(|m| m.line_type)),
            spot_ids: group.members.iter().map(|m| m.spot_id).collect(),
        });
    }

    (singles, clusters)
}

/// Base map imagery handed to the client.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TileSource {
    pub url: String,
    pub attribution: String,
}

/// Everything a client needs to draw the map.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
    pub tiles: TileSource,
    pub total: usize,
    pub shown: usize,
    pub markers: Vec<Marker>,
    pub clusters: Vec<Cluster>,
}

/// Filter, style and cluster the spots for one map render.
pub fn render(spots: &[Spot], filter: &MapFilter, zoom: u8, tiles: TileSource) -> MapView {
    let zoom = zoom.min(MAX_ZOOM);
    let visible: Vec<Marker> = filter
        .apply(spots)
        .into_iter()
        .map(Marker::from_spot)
        .collect();
    let shown = visible.len();
    let (markers, clusters) = cluster_markers(visible, zoom);

    MapView {
        center: DEFAULT_CENTER,
        zoom,
        tiles,
        total: spots.len(),
        shown,
        markers,
        clusters,
    }
}
