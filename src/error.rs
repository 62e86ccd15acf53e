//! Error types and result handling for hakken operations.
//!
//! This module defines the error handling system used throughout hakken.
//! All operations return a [`Result<T>`] which is a type alias for
//! `std::result::Result<T, Error>`.
//!
//! # Error Categories
//!
//! - **Network Errors**: Connection issues, timeouts, HTTP transport errors
//! - **Rate Limiting**: HTTP 429 responses that persisted past the single retry
//! - **Not Found**: Unknown anime ids or missing endpoints
//! - **Validation**: Requests rejected by the upstream catalog
//! - **Parse Errors**: Malformed persisted state or response bodies
//! - **IO Errors**: File system operations of the state store
//! - **JSON Errors**: Serialization/deserialization failures
//!
//! # Examples
//!
//! ```rust,no_run
//! use hakken::catalog::{Catalog, JikanCatalog};
//! use hakken::error::{Result, Error};
//!
//! # async fn example() -> Result<()> {
//! let catalog = JikanCatalog::new();
//!
//! match catalog.detail("99999999").await {
//!     Ok(detail) => println!("Found {}", detail.title),
//!     Err(Error::NotFound(msg)) => println!("Unknown id: {}", msg),
//!     Err(Error::RateLimit { retry_after }) => {
//!         println!("Throttled, retry after {:?}s", retry_after)
//!     }
//!     Err(e) => println!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

/// Type alias for Results with hakken errors.
///
/// All public APIs in hakken return this Result type.
///
/// # Examples
///
/// ```rust
/// use hakken::{Result, Error};
///
/// fn example_operation() -> Result<String> {
///     Ok("Success".to_string())
/// }
///
/// fn example_with_error() -> Result<()> {
///     Err(Error::parse("Something went wrong"))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all hakken operations.
///
/// This enum covers all failure conditions that can occur while talking to
/// the remote catalog or restoring persisted session state. Each variant
/// provides specific context about what went wrong.
///
/// # Variants
///
/// * [`Network`](Error::Network) - HTTP client and connection errors
/// * [`RateLimit`](Error::RateLimit) - 429 responses that survived the retry
/// * [`NotFound`](Error::NotFound) - Missing resources
/// * [`Validation`](Error::Validation) - Requests rejected upstream
/// * [`Parse`](Error::Parse) - Data parsing and format errors
/// * [`Io`](Error::Io) - File system errors from the state store
/// * [`Json`](Error::Json) - JSON serialization errors
#[derive(Error, Debug)]
pub enum Error {
    /// Network-related errors from HTTP operations.
    ///
    /// Wraps errors from the underlying HTTP client (reqwest), including
    /// connection timeouts, DNS resolution failures, and HTTP transport
    /// errors.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The upstream catalog rate-limited the request and the single
    /// automatic retry was also rejected.
    ///
    /// The optional `retry_after` field carries the number of seconds the
    /// upstream asked us to wait, taken from the `Retry-After` header of the
    /// final 429 response when present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hakken::Error;
    ///
    /// let error = Error::rate_limit(Some(60));
    /// let error = Error::rate_limit(None);
    /// ```
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimit { retry_after: Option<u64> },

    /// Resource not found errors.
    ///
    /// Returned when the upstream reports an anime id or endpoint unknown
    /// (HTTP 404). The message describes what was not found.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hakken::Error;
    ///
    /// let error = Error::not_found("anime id '99999999'");
    /// ```
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request parameters rejected by the upstream catalog.
    ///
    /// Any non-2xx status other than 404 and 429 maps here; the message
    /// carries the HTTP status line for diagnosis.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hakken::Error;
    ///
    /// let error = Error::validation("HTTP 400 Bad Request");
    /// ```
    #[error("Validation error: {0}")]
    Validation(String),

    /// Data parsing and format errors.
    ///
    /// Used when received or persisted data cannot be parsed as expected,
    /// such as a non-UTF-8 response body or a corrupt state file. Parse
    /// failures of restored session state are never surfaced to callers;
    /// the stated default applies instead.
    #[error("Parse error: {0}")]
    Parse(String),

    /// File system and IO operation errors.
    ///
    /// Wraps standard IO errors that may occur while reading or writing the
    /// persisted session state file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization and deserialization errors.
    ///
    /// Wraps errors from serde_json when parsing catalog responses or the
    /// persisted state file.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates a parse error with the given message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hakken::Error;
    ///
    /// let error = Error::parse("Invalid page number");
    /// ```
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Creates a not found error with the given message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hakken::Error;
    ///
    /// let error = Error::not_found("anime id 'abc123'");
    /// ```
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Creates a validation error with the given message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hakken::Error;
    ///
    /// let error = Error::validation("HTTP 422 Unprocessable Entity");
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Creates a rate limit error with optional retry-after time.
    ///
    /// The retry-after parameter typically comes from the `Retry-After`
    /// HTTP header of the final 429 response.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hakken::Error;
    ///
    /// let error = Error::rate_limit(Some(60));
    /// ```
    pub fn rate_limit(retry_after: Option<u64>) -> Self {
        Error::RateLimit { retry_after }
    }

    /// Returns `true` for errors worth a user-visible retry affordance.
    ///
    /// Parse and IO errors come from local state and retrying the same
    /// fetch will not fix them.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::RateLimit { .. } | Error::Validation(_)
        )
    }
}
