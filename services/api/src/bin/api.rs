//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{FirestoreAdapter, TmdbCatalogAdapter},
    config::Config,
    error::ApiError,
    web::{self, onboarding::default_tour, state::AppState},
};
use axum::http::{header::ACCEPT, header::CONTENT_TYPE, HeaderName, HeaderValue, Method};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    let catalog = Arc::new(TmdbCatalogAdapter::new(
        http.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_image_base_url.clone(),
        config.tmdb_api_key.clone(),
        config.tmdb_language.clone(),
    ));
    let store = Arc::new(FirestoreAdapter::new(
        http,
        &config.firestore_base_url,
        &config.firestore_project_id,
        config.firestore_auth_token.clone(),
    ));
    info!(
        "Using catalog at {} and document store project {}.",
        config.tmdb_base_url, config.firestore_project_id
    );

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(config.clone(), store, catalog, default_tour()));

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(web::middleware::USER_ID_HEADER),
        ]);

    // --- 4. Create the Web Router ---
    let app = web::router(app_state).layer(cors);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
