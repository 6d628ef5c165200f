//! Transport Module
//!
//! Authenticated access to the upstream REST API. The [`Transport`] trait is
//! the seam the repository depends on; [`SignedTransport`] is the production
//! implementation with OAuth 1.0a signing, bounded retries and timeouts.

mod client;
pub mod envelope;
pub mod oauth;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::{GalleryError, Result};

pub use client::{SignedTransport, RATE_LIMIT_LOW_WATER};

/// Per-call options for a fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Extra query parameters, appended to any already in the endpoint
    pub query: Vec<(String, String)>,
    /// Aborts the in-flight attempt and suppresses further retries
    pub cancel: Option<CancellationToken>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

/// A GET against the upstream API returning the unwrapped `Response` payload.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, endpoint: &str, options: &FetchOptions) -> Result<Value>;
}

/// Fetches and deserializes the payload into `T`.
pub async fn fetch_as<T: DeserializeOwned>(
    transport: &dyn Transport,
    endpoint: &str,
    options: &FetchOptions,
) -> Result<T> {
    let payload = transport.fetch(endpoint, options).await?;
    serde_json::from_value(payload)
        .map_err(|e| GalleryError::MalformedPayload(format!("{endpoint}: {e}")))
}
