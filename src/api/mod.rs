//! API Module
//!
//! HTTP handlers and routing for the gallery backend-for-frontend.
//!
//! # Endpoints
//! - `GET /gallery` - Album metadata (lazy, no images)
//! - `GET /albums` - Album list
//! - `GET /albums/:key/images` - Images of one album
//! - `GET /images/:key/exif` - EXIF of one image
//! - `GET /cache/stats` - Cache statistics
//! - `DELETE /cache` - Clear the cache
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
