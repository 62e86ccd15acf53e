//! Network utilities: the shared HTTP client and the rate-limit retry policy.
//!
//! This module provides the networking infrastructure for hakken:
//!
//! - **HTTP Client**: A global, configured HTTP client with connection pooling
//! - **Retry Policy**: A single automatic retry on HTTP 429, nothing else
//! - **Content Parsing**: JSON deserialization of response bodies
//!
//! # Examples
//!
//! ```rust,no_run
//! use hakken::net::HttpClient;
//!
//! # async fn example() -> hakken::Result<()> {
//! let client = HttpClient::new();
//! let json: serde_json::Value = client
//!     .get_json("https://api.jikan.moe/v4/anime?q=bleach")
//!     .await?;
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use once_cell::sync::Lazy;
use reqwest::{Client, Response, StatusCode, header::HeaderMap};
use std::time::Duration;

/// Delay before the single automatic retry of a rate-limited request.
pub const RATE_LIMIT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Global HTTP client instance with optimized configuration.
///
/// This client is configured with:
/// - 30-second timeout
/// - Connection pooling (10 idle connections per host)
/// - Compression support (gzip, brotli)
/// - Custom User-Agent header
///
/// The client is created lazily on first use and reused across all HTTP
/// operations.
static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("Hakken/0.1.0")
        .pool_max_idle_per_host(10)
        .gzip(true)
        .brotli(true)
        .build()
        .expect("Failed to build HTTP client")
});

/// HTTP client wrapper applying the catalog's rate-limit policy.
///
/// `HttpClient` provides a high-level interface for GET requests against the
/// remote catalog. Its one cross-cutting behavior: a response with HTTP
/// status 429 is retried exactly once, after a fixed delay, with the
/// original URL verbatim. Whatever the retry produces — success, a second
/// 429, a transport error — is surfaced to the caller unmodified. No other
/// status is ever retried and there is no backoff beyond the single extra
/// attempt.
///
/// # Examples
///
/// ```rust,no_run
/// use hakken::net::HttpClient;
/// use std::time::Duration;
///
/// # async fn example() -> hakken::Result<()> {
/// let client = HttpClient::new()
///     .with_header("Accept", "application/json")
///     .with_retry_delay(Duration::from_millis(1000));
///
/// let body = client.get("https://api.jikan.moe/v4/top/anime").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct HttpClient {
    headers: HeaderMap,
    retry_delay: Duration,
}

impl HttpClient {
    /// Creates a new HTTP client with the default 1000ms retry delay.
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
            retry_delay: RATE_LIMIT_RETRY_DELAY,
        }
    }

    /// Sets the delay before the single 429 retry.
    ///
    /// The upstream policy is a fixed 1000ms; tests shorten it.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Adds a custom header to all requests made by this client.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hakken::net::HttpClient;
    ///
    /// let client = HttpClient::new()
    ///     .with_header("Accept", "application/json");
    /// ```
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<reqwest::header::HeaderName>(),
            value.parse::<reqwest::header::HeaderValue>(),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Performs a GET request with the single-retry rate-limit policy.
    ///
    /// # Parameters
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body as `Bytes` on success.
    ///
    /// # Errors
    ///
    /// * [`Error::RateLimit`](crate::Error::RateLimit) - 429 on the retry too
    /// * [`Error::NotFound`](crate::Error::NotFound) - HTTP 404
    /// * [`Error::Validation`](crate::Error::Validation) - other non-2xx statuses
    /// * [`Error::Network`](crate::Error::Network) - transport failures
    pub async fn get(&self, url: &str) -> crate::Result<Bytes> {
        let response = CLIENT.get(url).headers(self.headers.clone()).send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            log::debug!(
                "rate limited on {}, retrying once in {}ms",
                url,
                self.retry_delay.as_millis()
            );
            tokio::time::sleep(self.retry_delay).await;
            let retried = CLIENT.get(url).headers(self.headers.clone()).send().await?;
            return Self::read_body(url, retried).await;
        }

        Self::read_body(url, response).await
    }

    /// Performs a GET request and deserializes the response as JSON.
    ///
    /// # Type Parameters
    ///
    /// * `T` - The type to deserialize the JSON into
    ///
    /// # Errors
    ///
    /// * All errors from [`get()`](HttpClient::get)
    /// * [`Error::Json`](crate::Error::Json) - If JSON parsing fails
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use hakken::net::HttpClient;
    /// use hakken::types::ListPage;
    ///
    /// # async fn example() -> hakken::Result<()> {
    /// let client = HttpClient::new();
    /// let page: ListPage = client
    ///     .get_json("https://api.jikan.moe/v4/top/anime?page=1&limit=20")
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_json<T>(&self, url: &str) -> crate::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let bytes = self.get(url).await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }

    /// Maps a final response into a body or a catalog error.
    ///
    /// A 429 reaching this point has already used up its retry and becomes
    /// [`Error::RateLimit`](crate::Error::RateLimit) with the `Retry-After`
    /// header value when present.
    async fn read_body(url: &str, response: Response) -> crate::Result<Bytes> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.bytes().await?);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(crate::Error::rate_limit(retry_after));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(crate::Error::not_found(url.to_string()));
        }

        Err(crate::Error::validation(format!("HTTP {}", status)))
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}
