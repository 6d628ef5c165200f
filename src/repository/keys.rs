//! Cache keys and upstream endpoints.
//!
//! Cache keys double as coalescing keys, so one logical resource maps to
//! exactly one key.

use crate::error::{GalleryError, Result};

pub const AUTH_USER_ENDPOINT: &str = "/api/v2!authuser";

/// Expansions requested with every album-image page.
pub const IMAGE_EXPANSIONS: &str = "LargestImage,ImageSizeDetails";

pub fn user(account: &str) -> String {
    format!("user:{account}")
}

pub fn albums(account: &str) -> String {
    format!("albums:{account}")
}

pub fn images(album_key: &str) -> String {
    format!("images:{album_key}")
}

pub fn exif(image_key: &str) -> String {
    format!("exif:{image_key}")
}

pub fn album_images_endpoint(album_key: &str) -> String {
    format!("/api/v2/album/{album_key}!images")
}

pub fn image_metadata_endpoint(image_key: &str) -> String {
    format!("/api/v2/image/{image_key}!metadata")
}

/// Album and image keys are short alphanumeric identifiers, optionally
/// with `-` or `_` (image keys carry a `-N` version suffix).
pub fn validate(key: &str) -> Result<&str> {
    let valid = !key.is_empty()
        && key.len() <= 64
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(key)
    } else {
        Err(GalleryError::InvalidKey(key.to_string()))
    }
}
