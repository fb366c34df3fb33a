//! Highline spot map backend
//!
//! REST backend for cataloguing highline spots: SQLite persistence, a local photo
//! bucket, reverse geocoding, the location tree and the clustered map view.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod geocode;
mod hierarchy;
mod map;
mod models;
mod storage;
mod uploads;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use geocode::Geocoder;
use storage::BlobStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub blobs: Arc<BlobStore>,
    pub geocoder: Arc<Geocoder>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Highline backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Storage path: {:?}", config.storage_path);
    tracing::info!("Geocoder: {}", config.geocoding.provider.as_str());
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_key.is_none() {
        tracing::warn!("No API key configured (HIGHLINE_API_KEY). Write routes are open!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let blobs = Arc::new(BlobStore::open(&config.storage_path, &config.public_url).await?);
    let geocoder = Arc::new(Geocoder::new(config.geocoding.clone())?);

    let spot_count = repo.list_spots().await?.len();
    tracing::info!("Loaded database with {} spots", spot_count);

    let state = AppState {
        repo,
        blobs,
        geocoder,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Write routes require the API key when one is configured
    let guard = middleware::from_fn_with_state(state.clone(), auth::require_api_key);

    let api_routes = Router::new()
        // Spots
        .route(
            "/spots",
            get(api::list_spots).merge(post(api::create_spot).route_layer(guard.clone())),
        )
        .route(
            "/spots/{id}",
            get(api::get_spot).merge(put(api::update_spot).route_layer(guard.clone())),
        )
        .route("/spots/{id}/detail", get(api::get_spot_detail))
        // Photos
        .route(
            "/spots/{id}/photos",
            get(api::list_photos).merge(
                post(api::upload_photos)
                    .route_layer(guard)
                    .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
            ),
        )
        // Derived views
        .route("/locations", get(api::list_locations))
        .route("/map", get(api::get_map))
        .route("/geocode", get(api::reverse_geocode));

    // Public blob URLs
    let storage = ServeDir::new(state.blobs.root());

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .nest_service(storage::PUBLIC_PREFIX, storage)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
