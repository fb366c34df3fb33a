//! Spot model and the add-spot form payload.

use serde::{Deserialize, Serialize};

use super::LocationData;
use crate::map::{LatLng, PointCapture};

/// Kind of line rigged at a spot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Highline,
    Waterline,
    #[serde(alias = "slackline")]
    Parkline,
}

impl LineType {
    pub const ALL: [LineType; 3] = [LineType::Highline, LineType::Waterline, LineType::Parkline];

    pub fn as_str(&self) -> &'static str {
        match self {
            LineType::Highline => "highline",
            LineType::Waterline => "waterline",
            LineType::Parkline => "parkline",
        }
    }

    /// Case-insensitive parse; `slackline` is the older name for `parkline`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "highline" => Some(LineType::Highline),
            "waterline" => Some(LineType::Waterline),
            "parkline" | "slackline" => Some(LineType::Parkline),
            _ => None,
        }
    }
}

/// A catalogued highline spot as stored in the `spots` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    pub id: i64,
    pub name: String,
    pub line_type: LineType,
    pub start_lat: f64,
    pub start_lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_lng: Option<f64>,
    /// Length in meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub established_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_ascent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approach: Option<String>,
    /// Computed once from the start point; only filled in again when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_data: Option<LocationData>,
    pub created_at: String,
}

impl Spot {
    pub fn start(&self) -> LatLng {
        LatLng::new(self.start_lat, self.start_lng)
    }
}

/// A numeric form field: either a JSON number or the raw text typed by the user.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    /// Parse the field, yielding `None` for blank or unparsable text.
    pub fn value(&self) -> Option<f64> {
        match self {
            NumericInput::Number(n) if n.is_finite() => Some(*n),
            NumericInput::Number(_) => None,
            NumericInput::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }
}

fn parse_numeric(input: &Option<NumericInput>) -> Option<f64> {
    input.as_ref().and_then(NumericInput::value)
}

fn non_empty(text: &Option<String>) -> Option<String> {
    text.as_ref()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Request body submitted by the add-spot form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpotRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub line_type: Option<String>,
    #[serde(default)]
    pub start_lat: Option<NumericInput>,
    #[serde(default)]
    pub start_lng: Option<NumericInput>,
    #[serde(default)]
    pub end_lat: Option<NumericInput>,
    #[serde(default)]
    pub end_lng: Option<NumericInput>,
    #[serde(default)]
    pub length: Option<NumericInput>,
    #[serde(default)]
    pub anchor_type: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub established_by: Option<String>,
    #[serde(default)]
    pub first_ascent: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub approach: Option<String>,
    /// Points clicked on the map while the form was open, oldest first.
    #[serde(default)]
    pub map_clicks: Vec<LatLng>,
}

/// A validated spot ready for insertion, still missing its location breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSpot {
    pub name: String,
    pub line_type: LineType,
    pub start: LatLng,
    pub end: Option<LatLng>,
    pub length: Option<f64>,
    pub anchor_type: Option<String>,
    pub tag: Option<String>,
    pub established_by: Option<String>,
    pub first_ascent: Option<String>,
    pub description: Option<String>,
    pub approach: Option<String>,
    pub location_data: Option<LocationData>,
}

impl CreateSpotRequest {
    /// Parse numeric fields, apply captured map clicks and validate required fields.
    pub fn validate(&self) -> Result<NewSpot, String> {
        let mut capture = PointCapture::default();
        for click in &self.map_clicks {
            capture.record(*click);
        }

        let explicit_start = match (parse_numeric(&self.start_lat), parse_numeric(&self.start_lng))
        {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
            _ => None,
        };
        let explicit_end = match (parse_numeric(&self.end_lat), parse_numeric(&self.end_lng)) {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
            _ => None,
        };

        let start = explicit_start
            .or_else(|| capture.start())
            .ok_or_else(|| "Start coordinates are required".to_string())?;
        if !start.is_valid() {
            return Err("Start coordinates are out of range".to_string());
        }
        let end = explicit_end.or_else(|| capture.end());
        if end.is_some_and(|p| !p.is_valid()) {
            return Err("End coordinates are out of range".to_string());
        }

        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required".to_string());
        }

        let line_type = self
            .line_type
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| "Line type is required".to_string())?;
        let line_type = LineType::from_str(line_type)
            .ok_or_else(|| format!("Unknown line type '{}'", line_type))?;

        let length = parse_numeric(&self.length);
        if length.is_some_and(|l| l < 0.0) {
            return Err("Length must not be negative".to_string());
        }

        Ok(NewSpot {
            name: name.to_string(),
            line_type,
            start,
            end,
            length,
            anchor_type: non_empty(&self.anchor_type),
            tag: non_empty(&self.tag),
            established_by: non_empty(&self.established_by),
            first_ascent: non_empty(&self.first_ascent),
            description: non_empty(&self.description),
            approach: non_empty(&self.approach),
            location_data: None,
        })
    }
}

/// Request body for updating an existing spot. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSpotRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub line_type: Option<String>,
    #[serde(default)]
    pub start_lat: Option<f64>,
    #[serde(default)]
    pub start_lng: Option<f64>,
    #[serde(default)]
    pub end_lat: Option<f64>,
    #[serde(default)]
    pub end_lng: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub anchor_type: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub established_by: Option<String>,
    #[serde(default)]
    pub first_ascent: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub approach: Option<String>,
    #[serde(default)]
    pub location_data: Option<LocationData>,
}

impl UpdateSpotRequest {
    /// Merge the requested changes over an existing spot.
    pub fn apply(&self, existing: &Spot) -> Result<Spot, String> {
        let name = match &self.name {
            Some(name) if name.trim().is_empty() => return Err("Name is required".to_string()),
            Some(name) => name.trim().to_string(),
            None => existing.name.clone(),
        };
        let start = LatLng::new(
            self.start_lat.unwrap_or(existing.start_lat),
            self.start_lng.unwrap_or(existing.start_lng),
        );
        if !start.is_valid() {
            return Err("Start coordinates are out of range".to_string());
        }
        let (end_lat, end_lng) = match (
            self.end_lat.or(existing.end_lat),
            self.end_lng.or(existing.end_lng),
        ) {
            (Some(lat), Some(lng)) => {
                if !LatLng::new(lat, lng).is_valid() {
                    return Err("End coordinates are out of range".to_string());
                }
                (Some(lat), Some(lng))
            }
            (None, None) => (None, None),
            _ => return Err("End coordinates need both latitude and longitude".to_string()),
        };
        let length = self.length.or(existing.length);
        if length.is_some_and(|l| l < 0.0) {
            return Err("Length must not be negative".to_string());
        }
        let line_type = match self.line_type.as_deref() {
            Some(raw) => LineType::from_str(raw)
                .ok_or_else(|| format!("Unknown line type '{}'", raw))?,
            None => existing.line_type,
        };

        Ok(Spot {
            id: existing.id,
            name,
            line_type,
            start_lat: start.lat,
            start_lng: start.lng,
            end_lat,
            end_lng,
            length,
            anchor_type: self.anchor_type.clone().or(existing.anchor_type.clone()),
            tag: self.tag.clone().or(existing.tag.clone()),
            established_by: self
                .established_by
                .clone()
                .or(existing.established_by.clone()),
            first_ascent: self.first_ascent.clone().or(existing.first_ascent.clone()),
            description: self.description.clone().or(existing.description.clone()),
            approach: self.approach.clone().or(existing.approach.clone()),
            location_data: self
                .location_data
                .clone()
                .or(existing.location_data.clone()),
            created_at: existing.created_at.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: serde_json::Value) -> CreateSpotRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_line_type_aliases() {
        assert_eq!(LineType::from_str("Highline"), Some(LineType::Highline));
        assert_eq!(LineType::from_str("slackline"), Some(LineType::Parkline));
        assert_eq!(LineType::from_str("rope"), None);

        let parsed: LineType = serde_json::from_value(json!("slackline")).unwrap();
        assert_eq!(parsed, LineType::Parkline);
        assert_eq!(serde_json::to_value(parsed).unwrap(), json!("parkline"));
    }

    #[test]
    fn test_numeric_fields_accept_text_and_numbers() {
        let request = form(json!({
            "name": "Lost Arrow",
            "lineType": "highline",
            "startLat": "37.74",
            "startLng": -119.59,
            "length": "not a number"
        }));

        let spot = request.validate().unwrap();
        assert_eq!(spot.start, LatLng::new(37.74, -119.59));
        assert_eq!(spot.length, None);
        assert_eq!(spot.end, None);
    }

    #[test]
    fn test_missing_start_is_rejected() {
        let request = form(json!({
            "name": "Nowhere",
            "lineType": "waterline",
            "startLat": "",
            "startLng": "12.5"
        }));

        assert_eq!(
            request.validate().unwrap_err(),
            "Start coordinates are required"
        );
    }

    #[test]
    fn test_map_clicks_prefill_coordinates() {
        let request = form(json!({
            "name": "Gorge",
            "lineType": "highline",
            "mapClicks": [
                {"lat": 1.0, "lng": 1.0},
                {"lat": 2.0, "lng": 2.0},
                {"lat": 46.1, "lng": 7.2}
            ]
        }));

        let spot = request.validate().unwrap();
        assert_eq!(spot.start, LatLng::new(46.1, 7.2));
        assert_eq!(spot.end, None);
    }

    #[test]
    fn test_explicit_coordinates_win_over_clicks() {
        let request = form(json!({
            "name": "Gorge",
            "lineType": "highline",
            "startLat": 10.0,
            "startLng": 20.0,
            "mapClicks": [{"lat": 1.0, "lng": 1.0}, {"lat": 2.0, "lng": 2.0}]
        }));

        let spot = request.validate().unwrap();
        assert_eq!(spot.start, LatLng::new(10.0, 20.0));
        assert_eq!(spot.end, Some(LatLng::new(2.0, 2.0)));
    }

    #[test]
    fn test_required_fields() {
        let no_name = form(json!({"lineType": "highline", "startLat": 1, "startLng": 1}));
        assert_eq!(no_name.validate().unwrap_err(), "Name is required");

        let no_type = form(json!({"name": "A", "startLat": 1, "startLng": 1}));
        assert_eq!(no_type.validate().unwrap_err(), "Line type is required");

        let negative = form(json!({
            "name": "A", "lineType": "parkline", "startLat": 1, "startLng": 1, "length": -3
        }));
        assert_eq!(negative.validate().unwrap_err(), "Length must not be negative");
    }

    #[test]
    fn test_update_keeps_untouched_fields() {
        let existing = Spot {
            id: 3,
            name: "Old".to_string(),
            line_type: LineType::Highline,
            start_lat: 1.0,
            start_lng: 2.0,
            end_lat: None,
            end_lng: None,
            length: Some(40.0),
            anchor_type: Some("bolts".to_string()),
            tag: None,
            established_by: None,
            first_ascent: None,
            description: None,
            approach: None,
            location_data: Some(LocationData::unknown()),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        };
        let update = UpdateSpotRequest {
            name: Some("New".to_string()),
            length: Some(55.0),
            ..Default::default()
        };

        let merged = update.apply(&existing).unwrap();
        assert_eq!(merged.name, "New");
        assert_eq!(merged.length, Some(55.0));
        assert_eq!(merged.anchor_type.as_deref(), Some("bolts"));
        assert_eq!(merged.location_data, existing.location_data);
    }

    fn existing_spot() -> Spot {
        Spot {
            id: 9,
            name: "Base".to_string(),
            line_type: LineType::Highline,
            start_lat: 10.0,
            start_lng: 20.0,
            end_lat: None,
            end_lng: None,
            length: None,
            anchor_type: None,
            tag: None,
            established_by: None,
            first_ascent: None,
            description: None,
            approach: None,
            location_data: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_update_line_type_is_case_insensitive() {
        let update: UpdateSpotRequest =
            serde_json::from_value(json!({"lineType": "Waterline"})).unwrap();
        let merged = update.apply(&existing_spot()).unwrap();
        assert_eq!(merged.line_type, LineType::Waterline);

        let update: UpdateSpotRequest =
            serde_json::from_value(json!({"lineType": "rope"})).unwrap();
        assert_eq!(
            update.apply(&existing_spot()).unwrap_err(),
            "Unknown line type 'rope'"
        );
    }

    #[test]
    fn test_update_end_point_checks() {
        let half = UpdateSpotRequest {
            end_lat: Some(10.1),
            ..Default::default()
        };
        assert_eq!(
            half.apply(&existing_spot()).unwrap_err(),
            "End coordinates need both latitude and longitude"
        );

        let out_of_range = UpdateSpotRequest {
            end_lat: Some(95.0),
            end_lng: Some(20.0),
            ..Default::default()
        };
        assert_eq!(
            out_of_range.apply(&existing_spot()).unwrap_err(),
            "End coordinates are out of range"
        );

        let both = UpdateSpotRequest {
            end_lat: Some(10.1),
            end_lng: Some(20.1),
            ..Default::default()
        };
        let merged = both.apply(&existing_spot()).unwrap();
        assert_eq!((merged.end_lat, merged.end_lng), (Some(10.1), Some(20.1)));
    }
}
