//! API Routes
//!
//! Configures the Axum router with all gallery endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    album_images_handler, albums_handler, cache_stats_handler, clear_cache_handler,
    gallery_handler, health_handler, image_exif_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /gallery` - Album metadata, images not loaded
/// - `GET /albums` - Album list
/// - `GET /albums/:key/images` - Images of one album
/// - `GET /images/:key/exif` - EXIF of one image, `null` on failure
/// - `GET /cache/stats` - Cache statistics
/// - `DELETE /cache` - Drop every cached entry
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/gallery", get(gallery_handler))
        .route("/albums", get(albums_handler))
        .route("/albums/:key/images", get(album_images_handler))
        .route("/images/:key/exif", get(image_exif_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
