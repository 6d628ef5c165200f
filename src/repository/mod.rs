//! Album Repository
//!
//! Drives transport, coalescer and cache together: every lookup consults
//! the cache first, and every miss goes through the coalescer keyed by the
//! cache key, so concurrent callers share one upstream fetch and one cache
//! write.

pub mod keys;
pub mod paginate;
pub mod parse;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, SharedCache};
use crate::coalescer::RequestCoalescer;
use crate::config::{CacheSettings, Config};
use crate::error::{GalleryError, Result};
use crate::models::{Album, ExifFields, GalleryData, Image};
use crate::transport::{fetch_as, FetchOptions, Transport};

pub use paginate::{paginate, PagedCollection, PAGE_SIZE};
pub use parse::DegradedDataWarning;

/// Values held by the repository's cache.
#[derive(Debug, Clone)]
pub enum CachedPayload {
    AlbumsEndpoint(Arc<str>),
    Albums(Arc<Vec<Album>>),
    Images(Arc<Vec<Image>>),
    Exif(Arc<ExifFields>),
}

impl CachedPayload {
    fn kind(&self) -> &'static str {
        match self {
            CachedPayload::AlbumsEndpoint(_) => "albums endpoint",
            CachedPayload::Albums(_) => "albums",
            CachedPayload::Images(_) => "images",
            CachedPayload::Exif(_) => "exif",
        }
    }
}

/// Account scoping and TTL classes for the repository.
#[derive(Debug, Clone)]
pub struct RepositorySettings {
    /// Account identity, scopes album cache keys
    pub account: String,
    pub albums_ttl: Duration,
    pub images_ttl: Duration,
    /// `None` = EXIF never expires
    pub exif_ttl: Option<Duration>,
    pub page_size: usize,
}

impl RepositorySettings {
    pub fn new(account: impl Into<String>, cache: &CacheSettings) -> Self {
        Self {
            account: account.into(),
            albums_ttl: cache.albums_ttl,
            images_ttl: cache.images_ttl,
            exif_ttl: cache.exif_ttl,
            page_size: PAGE_SIZE,
        }
    }
}

impl From<&Config> for RepositorySettings {
    fn from(config: &Config) -> Self {
        Self::new(config.account.clone(), &config.cache)
    }
}

struct Inner {
    transport: Arc<dyn Transport>,
    cache: SharedCache<CachedPayload>,
    coalescer: RequestCoalescer<CachedPayload>,
    settings: RepositorySettings,
    shutdown: CancellationToken,
}

/// Cached, coalesced access to albums, album images and EXIF data.
///
/// Cheap to clone; clones share the cache, the coalescer and the shutdown
/// token.
#[derive(Clone)]
pub struct AlbumRepository {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for AlbumRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlbumRepository")
            .field("settings", &self.inner.settings)
            .field("cached", &self.inner.cache.len())
            .field("in_flight", &self.inner.coalescer.in_flight())
            .finish()
    }
}

impl AlbumRepository {
    pub fn new(
        transport: Arc<dyn Transport>,
        cache: SharedCache<CachedPayload>,
        settings: RepositorySettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                cache,
                coalescer: RequestCoalescer::new(),
                settings,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn settings(&self) -> &RepositorySettings {
        &self.inner.settings
    }

    pub fn cache(&self) -> &SharedCache<CachedPayload> {
        &self.inner.cache
    }

    // == List Albums ==
    /// All albums of the account, walking every page of the collection.
    pub async fn list_albums(&self) -> Result<Vec<Album>> {
        let key = keys::albums(&self.inner.settings.account);
        let ttl = Some(self.inner.settings.albums_ttl);

        let payload = self
            .cached(key, ttl, move |repo| async move {
                let endpoint = repo.albums_endpoint().await?;
                let collection = paginate(
                    repo.inner.transport.as_ref(),
                    &endpoint,
                    "Album",
                    &repo.fetch_options(),
                    repo.inner.settings.page_size,
                )
                .await?;
                let albums = parse::parse_albums(collection.items)?;
                info!(
                    albums = albums.len(),
                    pages = collection.pages_fetched,
                    "Fetched album list"
                );
                Ok(CachedPayload::Albums(Arc::new(albums)))
            })
            .await?;

        match payload {
            CachedPayload::Albums(albums) => Ok(albums.as_ref().clone()),
            other => Err(unexpected(other)),
        }
    }

    // == List Album Images ==
    /// Images of one album, with expanded URL metadata.
    pub async fn list_album_images(&self, album_key: &str) -> Result<Vec<Image>> {
        let album_key = keys::validate(album_key)?.to_string();
        let key = keys::images(&album_key);
        let ttl = Some(self.inner.settings.images_ttl);

        let payload = self
            .cached(key, ttl, move |repo| async move {
                let endpoint = keys::album_images_endpoint(&album_key);
                let options = repo
                    .fetch_options()
                    .with_query("_expand", keys::IMAGE_EXPANSIONS);
                let collection = paginate(
                    repo.inner.transport.as_ref(),
                    &endpoint,
                    "AlbumImage",
                    &options,
                    repo.inner.settings.page_size,
                )
                .await?;

                let mut images = Vec::with_capacity(collection.items.len());
                let mut degraded = 0usize;
                for raw in collection.items {
                    let (image, warning) = parse::parse_image(raw, &collection.expansions)?;
                    if let Some(warning) = warning {
                        degraded += 1;
                        warn!(
                            album = %album_key,
                            image = %warning.image_key,
                            reason = warning.reason,
                            "Degraded image URLs"
                        );
                    }
                    images.push(image);
                }
                info!(album = %album_key, images = images.len(), degraded, "Fetched album images");
                Ok(CachedPayload::Images(Arc::new(images)))
            })
            .await?;

        match payload {
            CachedPayload::Images(images) => Ok(images.as_ref().clone()),
            other => Err(unexpected(other)),
        }
    }

    // == Image EXIF ==
    /// EXIF metadata of one image, or `None` if it could not be fetched.
    ///
    /// EXIF is enrichment: every failure is logged and swallowed.
    pub async fn get_image_exif(&self, image_key: &str) -> Option<ExifFields> {
        match self.try_get_image_exif(image_key).await {
            Ok(exif) => Some(exif),
            Err(err) if err.is_cancellation() => {
                debug!(image = image_key, "EXIF lookup cancelled");
                None
            }
            Err(err) => {
                warn!(image = image_key, error = %err, "EXIF lookup failed");
                None
            }
        }
    }

    async fn try_get_image_exif(&self, image_key: &str) -> Result<ExifFields> {
        let image_key = keys::validate(image_key)?.to_string();
        let key = keys::exif(&image_key);
        let ttl = self.inner.settings.exif_ttl;

        let payload = self
            .cached(key, ttl, move |repo| async move {
                let endpoint = keys::image_metadata_endpoint(&image_key);
                let mut payload = repo
                    .inner
                    .transport
                    .fetch(&endpoint, &repo.fetch_options())
                    .await?;
                let metadata = payload
                    .get_mut("ImageMetadata")
                    .map(serde_json::Value::take)
                    .ok_or_else(|| {
                        GalleryError::MalformedPayload(format!("{endpoint}: no ImageMetadata"))
                    })?;
                Ok(CachedPayload::Exif(Arc::new(parse::parse_exif(metadata)?)))
            })
            .await?;

        match payload {
            CachedPayload::Exif(exif) => Ok(exif.as_ref().clone()),
            other => Err(unexpected(other)),
        }
    }

    // == Load Gallery ==
    /// Album metadata only. No image list is fetched here; callers open
    /// albums individually through [`list_album_images`](Self::list_album_images).
    pub async fn load_gallery(&self) -> Result<GalleryData> {
        Ok(GalleryData::new(self.list_albums().await?))
    }

    /// Drops every cached entry and returns how many were dropped.
    ///
    /// Fetches already in flight are not cancelled and still store their
    /// result once they complete.
    pub fn clear_cache(&self) -> usize {
        let cleared = self.inner.cache.len();
        self.inner.cache.clear();
        info!(cleared, "Cache cleared");
        cleared
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    /// Cancels every in-flight and future upstream fetch of this repository.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    /// Resolves the album collection URI via the current-user endpoint.
    async fn albums_endpoint(&self) -> Result<String> {
        let key = keys::user(&self.inner.settings.account);
        let ttl = Some(self.inner.settings.albums_ttl);

        let payload = self
            .cached(key, ttl, move |repo| async move {
                let user: parse::AuthUser = fetch_as(
                    repo.inner.transport.as_ref(),
                    keys::AUTH_USER_ENDPOINT,
                    &repo.fetch_options(),
                )
                .await?;
                let uri = user.albums_uri()?;
                debug!(uri, "Resolved album collection endpoint");
                Ok(CachedPayload::AlbumsEndpoint(Arc::from(uri)))
            })
            .await?;

        match payload {
            CachedPayload::AlbumsEndpoint(uri) => Ok(uri.to_string()),
            other => Err(unexpected(other)),
        }
    }

    /// Cache lookup, falling back to one coalesced fetch that fills the cache.
    async fn cached<F, Fut>(
        &self,
        key: String,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<CachedPayload>
    where
        F: FnOnce(AlbumRepository) -> Fut + Send + 'static,
        Fut: Future<Output = Result<CachedPayload>> + Send + 'static,
    {
        if let Some(hit) = self.inner.cache.get(&key) {
            debug!(key = %key, "Cache hit");
            return Ok(hit);
        }

        let repo = self.clone();
        let cache = self.inner.cache.clone();
        let cache_key = key.clone();
        self.inner
            .coalescer
            .coalesce(&key, move || async move {
                let payload = fetch(repo).await?;
                cache.set(cache_key, payload.clone(), ttl);
                Ok(payload)
            })
            .await
    }

    fn fetch_options(&self) -> FetchOptions {
        FetchOptions::new().with_cancel(self.inner.shutdown.child_token())
    }
}

fn unexpected(payload: CachedPayload) -> GalleryError {
    GalleryError::Internal(format!("unexpected cached {} payload", payload.kind()))
}
