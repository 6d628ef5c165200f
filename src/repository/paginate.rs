//! Start/count pagination over upstream collection endpoints.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{GalleryError, Result};
use crate::transport::{FetchOptions, Transport};

/// Items requested per page.
pub const PAGE_SIZE: usize = 100;

/// Upper bound on pages walked for one collection.
pub const MAX_PAGES: usize = 10_000;

/// The `Pages` block attached to collection responses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Pages {
    pub total: Option<u64>,
    pub start: Option<u64>,
    pub count: Option<u64>,
    pub next_page: Option<String>,
}

/// Every item of a collection plus the expansions returned alongside it.
#[derive(Debug, Default)]
pub struct PagedCollection {
    pub items: Vec<Value>,
    /// Expanded sub-resources keyed by URI, merged across pages
    pub expansions: Map<String, Value>,
    pub pages_fetched: usize,
}

/// Walks `endpoint` page by page until it is exhausted.
///
/// `start` is 1-based and advances by `page_size`. A page ends the walk
/// when it is short (fewer than `page_size` items, including empty) or when
/// it carries a `Pages` block without a `NextPage`. A short page is final
/// even if it still advertises a next page. Responses without any `Pages`
/// block rely on the short-page signal alone.
pub async fn paginate(
    transport: &dyn Transport,
    endpoint: &str,
    collection: &str,
    base: &FetchOptions,
    page_size: usize,
) -> Result<PagedCollection> {
    let page_size = page_size.max(1);
    let mut result = PagedCollection::default();
    let mut start = 1usize;

    while result.pages_fetched < MAX_PAGES {
        let options = base
            .clone()
            .with_query("start", start)
            .with_query("count", page_size);
        let payload = transport.fetch(endpoint, &options).await?;
        result.pages_fetched += 1;

        let Value::Object(mut payload) = payload else {
            return Err(GalleryError::MalformedPayload(format!(
                "{endpoint}: page payload is not an object"
            )));
        };

        let items = match payload.remove(collection) {
            Some(Value::Array(items)) => items,
            None | Some(Value::Null) => Vec::new(),
            Some(_) => {
                return Err(GalleryError::MalformedPayload(format!(
                    "{endpoint}: {collection} is not an array"
                )))
            }
        };
        if let Some(Value::Object(expansions)) = payload.remove("Expansions") {
            result.expansions.extend(expansions);
        }
        let pages: Option<Pages> = payload
            .remove("Pages")
            .and_then(|p| serde_json::from_value(p).ok());

        let fetched = items.len();
        result.items.extend(items);
        debug!(
            endpoint,
            start,
            fetched,
            total = pages.as_ref().and_then(|p| p.total),
            "Fetched page"
        );

        let short_page = fetched < page_size;
        let no_next_page = pages.as_ref().is_some_and(|p| p.next_page.is_none());
        if short_page || no_next_page {
            return Ok(result);
        }
        start += page_size;
    }

    Err(GalleryError::MalformedPayload(format!(
        "{endpoint}: still paging after {MAX_PAGES} pages"
    )))
}
