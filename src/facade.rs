//! Gallery Facade
//!
//! The one seam presentation code depends on. Every operation delegates to
//! the [`AlbumRepository`]; the facade only wires the production stack
//! together from [`Config`].

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cache::{CacheStats, SharedCache};
use crate::config::Config;
use crate::error::Result;
use crate::models::{Album, ExifFields, GalleryData, Image};
use crate::repository::{AlbumRepository, RepositorySettings};
use crate::tasks::{spawn_sweep_task, SweepHandle};
use crate::transport::{SignedTransport, Transport};

#[derive(Debug, Clone)]
pub struct GalleryFacade {
    repository: AlbumRepository,
}

impl GalleryFacade {
    pub fn new(repository: AlbumRepository) -> Self {
        Self { repository }
    }

    /// Builds the signed transport, the cache and the repository from
    /// configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = SignedTransport::new(
            &config.api_base_url,
            config.credentials.clone(),
            config.retry.clone(),
        )?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Same as [`from_config`](Self::from_config) over an arbitrary transport.
    pub fn with_transport(transport: Arc<dyn Transport>, config: &Config) -> Self {
        let cache = SharedCache::new(config.cache.max_entries);
        let repository = AlbumRepository::new(transport, cache, RepositorySettings::from(config));
        info!(
            account = %config.account,
            max_entries = config.cache.max_entries,
            "Gallery access layer initialized"
        );
        Self::new(repository)
    }

    pub fn repository(&self) -> &AlbumRepository {
        &self.repository
    }

    /// Starts the background expiry sweep over this facade's cache.
    pub fn spawn_sweep(&self, interval: Duration) -> SweepHandle {
        spawn_sweep_task(self.repository.cache().clone(), interval)
    }

    // == Read Operations ==

    pub async fn fetch_albums(&self) -> Result<Vec<Album>> {
        self.repository.list_albums().await
    }

    pub async fn fetch_album_images(&self, album_key: &str) -> Result<Vec<Image>> {
        self.repository.list_album_images(album_key).await
    }

    /// `None` when the metadata could not be fetched.
    pub async fn fetch_image_exif(&self, image_key: &str) -> Option<ExifFields> {
        self.repository.get_image_exif(image_key).await
    }

    /// Albums only; images are loaded per album on demand.
    pub async fn fetch_gallery_data(&self) -> Result<GalleryData> {
        self.repository.load_gallery().await
    }

    // == Cache Introspection ==

    /// Drops every cached entry, returning how many were dropped.
    pub fn clear_cache(&self) -> usize {
        self.repository.clear_cache()
    }

    pub fn get_cache_stats(&self) -> CacheStats {
        self.repository.cache_stats()
    }

    pub fn shutdown(&self) {
        self.repository.shutdown();
    }
}
