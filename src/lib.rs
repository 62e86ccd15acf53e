//! # Hakken - Async anime discovery and search library
//!
//! Hakken is an async anime discovery library built around the [Jikan](https://jikan.moe)
//! API. It provides a typed catalog client with automatic rate-limit retry, a query
//! cache that deduplicates and prefetches requests, a debounce primitive for
//! keystroke-driven searching, and a persisted search session that survives
//! restarts through a shareable query string and a local state store.
//!
//! ## Features
//!
//! - **Typed Catalog Client**: Search, browse top-rated listings, and fetch full
//!   details with strongly typed responses
//! - **Rate-Limit Aware**: HTTP 429 responses are retried exactly once after a
//!   fixed delay, transparently
//! - **Query Cache**: Concurrent requests for the same key collapse into a single
//!   network call; results are cached with a staleness window
//! - **Prefetching & Placeholders**: Warm the cache for the next page and keep the
//!   previous page's data on screen while the next one loads
//! - **Debounced Search**: A pull-based debouncer settles the search term after a
//!   quiet period, so every keystroke does not become a request
//! - **Persisted Sessions**: Page and page size survive restarts; the session state
//!   round-trips through a `?q=...&page=N` query string
//!
//! ## Quick Start
//!
//! ### Searching the catalog
//!
//! ```rust,no_run
//! use hakken::prelude::*;
//! use hakken::error::Result;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let cache = QueryCache::new(Arc::new(JikanCatalog::new()));
//!
//!     let snapshot = cache.fetch(&QueryKey::search("one piece", 1, 20)).await;
//!     if let Some(QueryData::List(page)) = snapshot.data {
//!         println!("Found {} results", page.data.len());
//!     }
//!
//!     // Warm the cache for the next page turn
//!     cache.prefetch(&QueryKey::search("one piece", 2, 20));
//!     Ok(())
//! }
//! ```
//!
//! ### Driving a search session
//!
//! ```rust
//! use hakken::prelude::*;
//!
//! let mut session = SearchSession::mount(Some("?q=bleach&page=3"), MemoryStore::new());
//! assert_eq!(session.page(), 3);
//!
//! session.set_search_term("naruto");
//! // in the update loop:
//! if let Some(settle) = session.tick() {
//!     if settle.page_reset {
//!         // a genuinely new search landed back on page 1
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`catalog`]: The [`Catalog`](catalog::Catalog) trait and the Jikan implementation
//! - [`query`]: Query cache, single-flight deduplication, prefetch, placeholders
//! - [`session`]: Debounced, persisted search state with location mirroring
//! - [`debounce`]: The pull-based debounce primitive
//! - [`types`]: Data structures for anime listings, details, and pagination
//! - [`net`]: HTTP client with rate-limit retry
//! - [`error`]: Error handling

pub mod catalog;
pub mod debounce;
pub mod error;
pub mod net;
pub mod query;
pub mod session;
pub mod types;

#[cfg(feature = "tui")]
pub mod tui;

/// Prelude module for convenient imports.
///
/// Re-exports the most commonly used types so a single
/// `use hakken::prelude::*;` covers typical usage.
pub mod prelude {
    pub use crate::{
        catalog::{Catalog, JikanCatalog, JikanConfig},
        debounce::Debounced,
        query::{Operation, QueryCache, QueryData, QueryKey, QuerySnapshot, QueryStatus},
        session::{FileStore, MemoryStore, SearchSession, StateStore},
        types::{Anime, AnimeDetail, ListPage, Pagination},
    };
}

// Re-export main types at crate root for direct access
pub use catalog::{Catalog, JikanCatalog, JikanConfig};
pub use error::{Error, Result};
pub use query::{QueryCache, QueryKey, QuerySnapshot};
pub use session::{SearchSession, StateStore};
pub use types::{Anime, AnimeDetail, ListPage};
