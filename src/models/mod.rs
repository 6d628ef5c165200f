//! Domain records and response DTOs
//!
//! Albums, images and EXIF fields are rebuilt from upstream responses on
//! every cache miss; the response DTOs shape the HTTP surface.

pub mod album;
pub mod exif;
pub mod image;
pub mod responses;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use album::Album;
pub use exif::ExifFields;
pub use image::Image;
pub use responses::{ClearCacheResponse, ErrorResponse, ExifResponse, HealthResponse};

/// Top-level gallery load: album metadata only, images are never included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryData {
    pub albums: Vec<Album>,
    /// Sum of the albums' reported image counts
    pub total_image_count: u64,
    pub fetched_at: DateTime<Utc>,
}

impl GalleryData {
    pub fn new(albums: Vec<Album>) -> Self {
        let total_image_count = albums.iter().map(|a| a.total_image_count).sum();
        Self {
            albums,
            total_image_count,
            fetched_at: Utc::now(),
        }
    }
}
