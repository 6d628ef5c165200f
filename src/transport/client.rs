//! reqwest-backed signed transport with retry.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION};
use reqwest::{Client, ClientBuilder, StatusCode, Url};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::{Credentials, RetryPolicy};
use crate::error::{GalleryError, Result};
use crate::transport::envelope::{truncate_body, unwrap_body};
use crate::transport::oauth::{self, SignableRequest};
use crate::transport::{FetchOptions, Transport};

/// Remaining-quota value below which a warning is logged.
pub const RATE_LIMIT_LOW_WATER: u64 = 10;

const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
const ERROR_BODY_LIMIT: usize = 200;

/// Signs and sends GET requests to the upstream API.
///
/// Each attempt is signed independently with its own timestamp and nonce.
/// Rate limiting (429) and transport failures are retried with exponential
/// backoff; authentication failures, cancellations and other error
/// statuses are returned immediately.
#[derive(Debug, Clone)]
pub struct SignedTransport {
    client: Client,
    base_url: Url,
    credentials: Credentials,
    retry: RetryPolicy,
}

impl SignedTransport {
    pub fn new(base_url: &str, credentials: Credentials, retry: RetryPolicy) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GalleryError::Config(format!("invalid API base URL {base_url:?}: {e}")))?;

        let client = ClientBuilder::new()
            .timeout(retry.request_timeout)
            .connect_timeout(retry.request_timeout.min(std::time::Duration::from_secs(10)))
            .user_agent(concat!("gallery_mirror/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GalleryError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            credentials,
            retry,
        })
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Resolves an endpoint path against the base URL and appends `query`.
    ///
    /// Endpoints resolving to another origin are rejected so credentials are
    /// never signed for a host other than the configured one.
    pub fn build_url(&self, endpoint: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(endpoint)
            .map_err(|e| GalleryError::MalformedPayload(format!("invalid endpoint {endpoint:?}: {e}")))?;

        if url.origin() != self.base_url.origin() {
            return Err(GalleryError::MalformedPayload(format!(
                "endpoint {endpoint:?} leaves the configured origin"
            )));
        }

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// One signed attempt. `attempt` is 0-based.
    async fn attempt(&self, url: &Url, attempt: u32) -> Result<Value> {
        let timestamp = Utc::now().timestamp();
        let nonce = oauth::generate_nonce();
        let authorization = oauth::sign(SignableRequest::get(url), &self.credentials, timestamp, &nonce);

        debug!(url = %url, attempt = attempt + 1, "Upstream GET");
        let response = self
            .client
            .get(url.clone())
            .header(AUTHORIZATION, authorization)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        observe_rate_limit(response.headers());

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GalleryError::RateLimited {
                attempts: attempt + 1,
            });
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(GalleryError::Authentication {
                status: status.as_u16(),
                message: truncate_body(&body, ERROR_BODY_LIMIT),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GalleryError::Upstream {
                status: status.as_u16(),
                body: truncate_body(&body, ERROR_BODY_LIMIT),
            });
        }

        let body = response.bytes().await.map_err(transport_error)?;
        unwrap_body(&body)
    }
}

#[async_trait]
impl Transport for SignedTransport {
    async fn fetch(&self, endpoint: &str, options: &FetchOptions) -> Result<Value> {
        let url = self.build_url(endpoint, &options.query)?;
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let outcome = cancellable(options.cancel.as_ref(), self.attempt(&url, attempt)).await;

            match outcome {
                Ok(payload) => return Ok(payload),
                Err(err) if err.is_retryable() && attempt + 1 < max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        url = %url,
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying upstream request"
                    );
                    cancellable(options.cancel.as_ref(), async {
                        tokio::time::sleep(delay).await;
                        Ok(())
                    })
                    .await?;
                    attempt += 1;
                }
                Err(err) => {
                    match &err {
                        GalleryError::Authentication { status, .. } => {
                            error!(url = %url, status, "Upstream rejected request signature");
                        }
                        GalleryError::Cancelled => debug!(url = %url, "Upstream request cancelled"),
                        _ => warn!(url = %url, attempts = attempt + 1, error = %err, "Upstream request failed"),
                    }
                    return Err(err);
                }
            }
        }
    }
}

/// Races `work` against the cancellation token, if any.
async fn cancellable<T>(
    cancel: Option<&CancellationToken>,
    work: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(GalleryError::Cancelled),
                outcome = work => outcome,
            }
        }
        None => work.await,
    }
}

fn transport_error(err: reqwest::Error) -> GalleryError {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_body() || err.is_decode() {
        "response body unreadable"
    } else {
        "request failed"
    };
    GalleryError::Transport(format!("{kind}: {err}"))
}

fn observe_rate_limit(headers: &HeaderMap) {
    let remaining = headers
        .get(RATE_LIMIT_REMAINING_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    if let Some(remaining) = remaining {
        if remaining < RATE_LIMIT_LOW_WATER {
            warn!(remaining, "Upstream rate limit nearly exhausted");
        }
    }
}
