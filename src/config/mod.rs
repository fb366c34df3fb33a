//! Configuration module for the highline backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::geocode::GeocodeProvider;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key guarding write routes (open when unset)
    pub api_key: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Root directory holding one sub-directory per blob bucket
    pub storage_path: PathBuf,
    /// Bucket that receives spot photos
    pub photo_bucket: String,
    /// Externally reachable base URL, used to build public blob URLs
    pub public_url: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
    /// Upper bound on one photo upload request body
    pub max_upload_bytes: usize,
    pub geocoding: GeocodingConfig,
    pub tiles: TileConfig,
}

/// Reverse geocoding provider settings.
#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub provider: GeocodeProvider,
    pub nominatim_url: String,
    pub google_url: String,
    pub google_api_key: Option<String>,
    pub user_agent: String,
    pub timeout: Duration,
}

/// Base map tile source handed to clients.
#[derive(Debug, Clone)]
pub struct TileConfig {
    pub url: String,
    pub attribution: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            provider: GeocodeProvider::Nominatim,
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            google_url: "https://maps.googleapis.com".to_string(),
            google_api_key: None,
            user_agent: "HighlineMap/1.0".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution:
                "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a>"
                    .to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AddrParseError> {
        dotenvy::dotenv().ok();

        let api_key = env::var("HIGHLINE_API_KEY").ok().filter(|k| !k.is_empty());

        let db_path = env::var("HIGHLINE_DB_PATH")
            .unwrap_or_else(|_| "./data/highline.sqlite".to_string())
            .into();

        let storage_path = env::var("HIGHLINE_STORAGE_PATH")
            .unwrap_or_else(|_| "./data/storage".to_string())
            .into();

        let photo_bucket =
            env::var("HIGHLINE_PHOTO_BUCKET").unwrap_or_else(|_| "spot-photos".to_string());

        let bind_addr: SocketAddr = env::var("HIGHLINE_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()?;

        let public_url = env::var("HIGHLINE_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{}", bind_addr))
            .trim_end_matches('/')
            .to_string();

        let log_level = env::var("HIGHLINE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_json = env::var("HIGHLINE_LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let max_upload_bytes = env::var("HIGHLINE_MAX_UPLOAD_MB")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(25)
            * 1024
            * 1024;

        let defaults = GeocodingConfig::default();
        let geocoding = GeocodingConfig {
            provider: env::var("HIGHLINE_GEOCODER")
                .ok()
                .and_then(|p| GeocodeProvider::from_str(&p))
                .unwrap_or(defaults.provider),
            nominatim_url: env::var("HIGHLINE_NOMINATIM_URL").unwrap_or(defaults.nominatim_url),
            google_url: env::var("HIGHLINE_GOOGLE_GEOCODE_URL").unwrap_or(defaults.google_url),
            google_api_key: env::var("HIGHLINE_GOOGLE_API_KEY").ok(),
            user_agent: env::var("HIGHLINE_USER_AGENT").unwrap_or(defaults.user_agent),
            timeout: env::var("HIGHLINE_GEOCODE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        };

        let tile_defaults = TileConfig::default();
        let tiles = TileConfig {
            url: env::var("HIGHLINE_TILE_URL").unwrap_or(tile_defaults.url),
            attribution: env::var("HIGHLINE_TILE_ATTRIBUTION")
                .unwrap_or(tile_defaults.attribution),
        };

        Ok(Self {
            api_key,
            db_path,
            storage_path,
            photo_bucket,
            public_url,
            bind_addr,
            log_level,
            log_json,
            max_upload_bytes,
            geocoding,
            tiles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: &[&str] = &[
        "HIGHLINE_API_KEY",
        "HIGHLINE_DB_PATH",
        "HIGHLINE_STORAGE_PATH",
        "HIGHLINE_PHOTO_BUCKET",
        "HIGHLINE_PUBLIC_URL",
        "HIGHLINE_BIND_ADDR",
        "HIGHLINE_LOG_LEVEL",
        "HIGHLINE_LOG_FORMAT",
        "HIGHLINE_MAX_UPLOAD_MB",
        "HIGHLINE_GEOCODER",
        "HIGHLINE_NOMINATIM_URL",
        "HIGHLINE_GOOGLE_GEOCODE_URL",
        "HIGHLINE_GOOGLE_API_KEY",
        "HIGHLINE_GEOCODE_TIMEOUT_SECS",
        "HIGHLINE_USER_AGENT",
        "HIGHLINE_TILE_URL",
        "HIGHLINE_TILE_ATTRIBUTION",
    ];

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        for var in VARS {
            env::remove_var(var);
        }

        let config = Config::from_env().unwrap();

        assert!(config.api_key.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/highline.sqlite"));
        assert_eq!(config.storage_path, PathBuf::from("./data/storage"));
        assert_eq!(config.photo_bucket, "spot-photos");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.public_url, "http://127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert_eq!(config.max_upload_bytes, 25 * 1024 * 1024);
        assert_eq!(config.geocoding.provider, GeocodeProvider::Nominatim);
        assert_eq!(config.geocoding.timeout, Duration::from_secs(10));
        assert!(config.tiles.url.contains("tile.openstreetmap.org"));
    }
}
