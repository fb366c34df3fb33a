//! Reverse geocoding adapter.
//!
//! Turns a latitude/longitude pair into a `{country, state, city}` breakdown using
//! either Nominatim or the Google Geocoding API. Provider responses are decoded into
//! a tagged union and normalized here, so nothing downstream sees provider shapes.
//! Lookups never fail from the caller's point of view: any error yields the
//! "Unknown ..." placeholder triple.

use serde::Deserialize;

use crate::config::GeocodingConfig;
use crate::errors::AppError;
use crate::models::{LocationData, UNKNOWN_CITY, UNKNOWN_COUNTRY, UNKNOWN_STATE};

/// Supported reverse geocoding backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocodeProvider {
    Nominatim,
    Google,
}

impl GeocodeProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeocodeProvider::Nominatim => "nominatim",
            GeocodeProvider::Google => "google",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nominatim" | "osm" => Some(GeocodeProvider::Nominatim),
            "google" => Some(GeocodeProvider::Google),
            _ => None,
        }
    }
}

/// Nominatim `/reverse?format=json&addressdetails=1` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NominatimResponse {
    #[serde(default)]
    pub address: Option<NominatimAddress>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NominatimAddress {
    pub country: Option<String>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub hamlet: Option<String>,
    pub suburb: Option<String>,
}

/// Google `/maps/api/geocode/json` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleGeocodeResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub results: Vec<GoogleResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleResult {
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// A decoded provider response.
#[derive(Debug, Clone)]
pub enum GeocodeResponse {
    Nominatim(NominatimResponse),
    Google(GoogleGeocodeResponse),
}

/// Provider-neutral view of the address fields the selection policy looks at.
#[derive(Debug, Default)]
struct AddressFields<'a> {
    country: Option<&'a str>,
    state: Option<&'a str>,
    region: Option<&'a str>,
    city: Option<&'a str>,
    town: Option<&'a str>,
    village: Option<&'a str>,
    hamlet: Option<&'a str>,
    sublocality: Option<&'a str>,
}

impl AddressFields<'_> {
    fn into_location(self) -> LocationData {
        LocationData::new(
            first_non_empty(&[self.country]).unwrap_or(UNKNOWN_COUNTRY),
            first_non_empty(&[self.state, self.region]).unwrap_or(UNKNOWN_STATE),
            first_non_empty(&[
                self.city,
                self.town,
                self.village,
                self.hamlet,
                self.sublocality,
            ])
            .unwrap_or(UNKNOWN_CITY),
        )
    }
}

fn first_non_empty<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
}

impl GoogleGeocodeResponse {
    /// Long name of the first component (across all results) carrying `kind`.
    fn component(&self, kind: &str) -> Option<&str> {
        self.results
            .iter()
            .flat_map(|r| r.address_components.iter())
            .find(|c| c.types.iter().any(|t| t == kind))
            .map(|c| c.long_name.as_str())
    }
}

impl GeocodeResponse {
    /// Map the provider payload onto a location, substituting placeholders per field.
    ///
    /// Errors only when the provider itself reports a failure; an empty address is
    /// not an error and normalizes to the full placeholder triple.
    pub fn normalize(&self) -> Result<LocationData, AppError> {
        match self {
            GeocodeResponse::Nominatim(resp) => {
                let fields = match &resp.address {
                    Some(addr) => AddressFields {
                        country: addr.country.as_deref(),
                        state: addr.state.as_deref(),
                        region: addr.region.as_deref(),
                        city: addr.city.as_deref(),
                        town: addr.town.as_deref(),
                        village: addr.village.as_deref(),
                        hamlet: addr.hamlet.as_deref(),
                        sublocality: addr.suburb.as_deref(),
                    },
                    None => {
                        if let Some(err) = &resp.error {
                            tracing::debug!("Nominatim returned no address: {}", err);
                        }
                        AddressFields::default()
                    }
                };
                Ok(fields.into_location())
            }
            GeocodeResponse::Google(resp) => match resp.status.as_str() {
                "OK" | "ZERO_RESULTS" => Ok(AddressFields {
                    country: resp.component("country"),
                    state: resp.component("administrative_area_level_1"),
                    region: resp.component("administrative_area_level_2"),
                    city: resp.component("locality"),
                    town: resp.component("postal_town"),
                    village: None,
                    hamlet: None,
                    sublocality: resp.component("sublocality"),
                }
                .into_location()),
                status => Err(AppError::Upstream(format!(
                    "Google geocoding status {}: {}",
                    status,
                    resp.error_message.as_deref().unwrap_or("no message")
                ))),
            },
        }
    }
}

/// HTTP client for the configured reverse geocoding provider.
pub struct Geocoder {
    client: reqwest::Client,
    config: GeocodingConfig,
}

impl Geocoder {
    pub fn new(config: GeocodingConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn provider(&self) -> GeocodeProvider {
        self.config.provider
    }

    /// Resolve coordinates to a location, falling back to placeholders on any failure.
    pub async fn reverse_geocode(&self, lat: f64, lng: f64) -> LocationData {
        match self.try_reverse_geocode(lat, lng).await {
            Ok(location) => location,
            Err(e) => {
                tracing::warn!(
                    provider = self.config.provider.as_str(),
                    "Reverse geocoding failed for ({}, {}): {}",
                    lat,
                    lng,
                    e
                );
                LocationData::unknown()
            }
        }
    }

    async fn try_reverse_geocode(&self, lat: f64, lng: f64) -> Result<LocationData, AppError> {
        let response = self.fetch(lat, lng).await?;
        response.normalize()
    }

    async fn fetch(&self, lat: f64, lng: f64) -> Result<GeocodeResponse, AppError> {
        match self.config.provider {
            GeocodeProvider::Nominatim => {
                let url = format!(
                    "{}/reverse",
                    self.config.nominatim_url.trim_end_matches('/')
                );
                let body = self
                    .client
                    .get(url)
                    .query(&[
                        ("format", "json".to_string()),
                        ("lat", lat.to_string()),
                        ("lon", lng.to_string()),
                        ("zoom", "10".to_string()),
                        ("addressdetails", "1".to_string()),
                    ])
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<NominatimResponse>()
                    .await?;
                Ok(GeocodeResponse::Nominatim(body))
            }
            GeocodeProvider::Google => {
                let key = self.config.google_api_key.as_deref().ok_or_else(|| {
                    AppError::Upstream("Google geocoding requires an API key".to_string())
                })?;
                let url = format!(
                    "{}/maps/api/geocode/json",
                    self.config.google_url.trim_end_matches('/')
                );
                let body = self
                    .client
                    .get(url)
                    .query(&[("latlng", format!("{},{}", lat, lng)), ("key", key.to_string())])
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<GoogleGeocodeResponse>()
                    .await?;
                Ok(GeocodeResponse::Google(body))
            }
        }
    }
}
