//! The catalog trait and its Jikan implementation.
//!
//! This module defines the [`Catalog`] trait — the seam between the fetch
//! orchestrator and the remote anime catalog — and [`JikanCatalog`], the
//! implementation backed by the public Jikan REST API.
//!
//! # Examples
//!
//! ```rust,no_run
//! use hakken::catalog::{Catalog, JikanCatalog};
//!
//! # async fn example() -> hakken::Result<()> {
//! let catalog = JikanCatalog::new();
//!
//! let page = catalog.search("one piece", 1, 20).await?;
//! println!("{} of {} results", page.data.len(), page.pagination.items.total);
//!
//! let detail = catalog.detail("21").await?;
//! println!("{}", detail.title);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use derive_builder::Builder;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    error::Result,
    net::HttpClient,
    types::{AnimeDetail, ListPage},
};

/// The upstream ceiling on `limit` for list endpoints.
///
/// The client does not enforce or clamp this: values above the ceiling are
/// passed through and the upstream's behavior is authoritative. Page-size
/// controls use it as their upper bound.
pub const MAX_PAGE_SIZE: u32 = 25;

/// Default page size for list requests.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Jikan detail endpoint envelope
#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    data: AnimeDetail,
}

/// Interface to a remote anime catalog.
///
/// The trait covers the three request kinds the application issues: a
/// paginated search, a paginated top-rated listing, and a per-title detail
/// lookup. The fetch orchestrator talks to the catalog exclusively through
/// this trait, which is also the seam test doubles plug into.
///
/// # Implementation Guidelines
///
/// - Use [`net::HttpClient`](crate::net::HttpClient) for HTTP requests so
///   the rate-limit retry policy applies uniformly
/// - Pass `limit` through unvalidated; the upstream ceiling
///   ([`MAX_PAGE_SIZE`]) is the upstream's to enforce
/// - Return detailed errors using the [`Error`](crate::Error) types
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Returns the unique identifier for this catalog, e.g. `"jikan"`.
    fn id(&self) -> &'static str;

    /// Returns the human-readable name of this catalog.
    fn name(&self) -> &'static str;

    /// Returns the base URL of the catalog's API.
    fn base_url(&self) -> &str;

    /// Searches the catalog.
    ///
    /// # Parameters
    ///
    /// * `query` - Free-text search query
    /// * `page` - 1-based page number
    /// * `limit` - Entries per page, passed through unclamped
    ///
    /// # Errors
    ///
    /// * [`Error::Network`](crate::Error::Network) - transport failure
    /// * [`Error::RateLimit`](crate::Error::RateLimit) - 429 after the retry
    /// * [`Error::Validation`](crate::Error::Validation) - request rejected upstream
    async fn search(&self, query: &str, page: u32, limit: u32) -> Result<ListPage>;

    /// Fetches a page of the top-rated listing.
    ///
    /// Same failure modes as [`search`](Catalog::search).
    async fn top(&self, page: u32, limit: u32) -> Result<ListPage>;

    /// Fetches the full record for a single title.
    ///
    /// # Errors
    ///
    /// * [`Error::NotFound`](crate::Error::NotFound) - the id is unknown upstream
    /// * plus the failure modes of [`search`](Catalog::search)
    async fn detail(&self, id: &str) -> Result<AnimeDetail>;
}

/// Configuration for [`JikanCatalog`].
///
/// # Builder Usage
///
/// ```rust
/// use hakken::catalog::JikanConfigBuilder;
///
/// let config = JikanConfigBuilder::default()
///     .api_base("http://localhost:8080/v4")
///     .retry_delay_ms(50u64)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), default)]
pub struct JikanConfig {
    /// Base URL of the API, without a trailing slash
    pub api_base: String,

    /// Delay before the single 429 retry
    pub retry_delay_ms: u64,
}

impl Default for JikanConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.jikan.moe/v4".to_string(),
            retry_delay_ms: 1000,
        }
    }
}

/// Catalog implementation for the public Jikan REST API.
///
/// Jikan is an unofficial MyAnimeList API: free, keyless, and rate limited.
/// Any endpoint may answer HTTP 429; the shared [`HttpClient`] retries such
/// a response exactly once after a fixed delay and surfaces whatever the
/// retry produces.
///
/// # Examples
///
/// ```rust
/// use hakken::catalog::{Catalog, JikanCatalog};
///
/// let catalog = JikanCatalog::new();
/// assert_eq!(catalog.id(), "jikan");
/// ```
pub struct JikanCatalog {
    client: HttpClient,
    api_base: String,
}

impl JikanCatalog {
    /// Creates a catalog client against the public Jikan API.
    pub fn new() -> Self {
        Self::with_config(JikanConfig::default())
    }

    /// Creates a catalog client with explicit configuration.
    pub fn with_config(config: JikanConfig) -> Self {
        Self {
            client: HttpClient::new()
                .with_header("Accept", "application/json")
                .with_retry_delay(Duration::from_millis(config.retry_delay_ms)),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Formats the query string shared by the list endpoints.
    fn format_list_query(query: Option<&str>, page: u32, limit: u32) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(q) = query {
            parts.push(format!("q={}", urlencoding::encode(q)));
        }
        parts.push(format!("page={}", page));
        parts.push(format!("limit={}", limit));
        parts.join("&")
    }
}

impl Default for JikanCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Catalog for JikanCatalog {
    fn id(&self) -> &'static str {
        "jikan"
    }

    fn name(&self) -> &'static str {
        "Jikan"
    }

    fn base_url(&self) -> &str {
        &self.api_base
    }

    async fn search(&self, query: &str, page: u32, limit: u32) -> Result<ListPage> {
        let url = format!(
            "{}/anime?{}",
            self.api_base,
            Self::format_list_query(Some(query), page, limit)
        );
        self.client.get_json(&url).await
    }

    async fn top(&self, page: u32, limit: u32) -> Result<ListPage> {
        let url = format!(
            "{}/top/anime?{}",
            self.api_base,
            Self::format_list_query(None, page, limit)
        );
        self.client.get_json(&url).await
    }

    async fn detail(&self, id: &str) -> Result<AnimeDetail> {
        let url = format!("{}/anime/{}/full", self.api_base, urlencoding::encode(id));
        let envelope: DetailEnvelope = self.client.get_json(&url).await?;
        Ok(envelope.data)
    }
}
