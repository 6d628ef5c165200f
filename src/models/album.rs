//! Album domain record.

use serde::{Deserialize, Serialize};

use crate::models::Image;

/// An album as listed from the upstream account.
///
/// The image list is loaded lazily: a freshly listed album has
/// `images == None`, and only opening the album populates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub key: String,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    /// Upstream endpoint listing this album's images
    pub images_endpoint: String,
    pub total_image_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Image>>,
}

impl Album {
    pub fn images_loaded(&self) -> bool {
        self.images.is_some()
    }
}
