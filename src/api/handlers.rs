//! API Handlers
//!
//! HTTP request handlers for each gallery endpoint. Handlers only translate
//! between HTTP and the [`GalleryFacade`]; errors render through
//! `GalleryError`'s `IntoResponse`.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::CacheStats;
use crate::error::Result;
use crate::facade::GalleryFacade;
use crate::models::{
    Album, ClearCacheResponse, ExifResponse, GalleryData, HealthResponse, Image,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub gallery: GalleryFacade,
}

impl AppState {
    pub fn new(gallery: GalleryFacade) -> Self {
        Self { gallery }
    }
}

/// Handler for GET /gallery
///
/// Album metadata only; no album's images are fetched.
pub async fn gallery_handler(State(state): State<AppState>) -> Result<Json<GalleryData>> {
    Ok(Json(state.gallery.fetch_gallery_data().await?))
}

/// Handler for GET /albums
pub async fn albums_handler(State(state): State<AppState>) -> Result<Json<Vec<Album>>> {
    Ok(Json(state.gallery.fetch_albums().await?))
}

/// Handler for GET /albums/:key/images
pub async fn album_images_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Vec<Image>>> {
    Ok(Json(state.gallery.fetch_album_images(&key).await?))
}

/// Handler for GET /images/:key/exif
///
/// Always 200: a failed lookup yields `"exif": null`.
pub async fn image_exif_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<ExifResponse> {
    let exif = state.gallery.fetch_image_exif(&key).await;
    Json(ExifResponse::new(key, exif))
}

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.gallery.get_cache_stats())
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    Json(ClearCacheResponse::new(state.gallery.clear_cache()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
