//! Query cache and fetch orchestration.
//!
//! This module owns every network fetch the application performs. Fetches
//! are keyed by a structured [`QueryKey`]; per key the cache guarantees at
//! most one request in flight, retains the last successful payload across
//! refetches, and can serve the previous page's data as a placeholder while
//! a page turn is loading.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hakken::catalog::JikanCatalog;
//! use hakken::query::{QueryCache, QueryKey, QueryStatus};
//!
//! # async fn example() {
//! let cache = QueryCache::new(Arc::new(JikanCatalog::new()));
//!
//! let key = QueryKey::search("one piece", 1, 20);
//! let snapshot = cache.fetch(&key).await;
//! if snapshot.status == QueryStatus::Success {
//!     let page = snapshot.data.unwrap();
//!     println!("{} results", page.as_list().unwrap().data.len());
//! }
//!
//! // warm the cache before the user commits to navigation
//! cache.prefetch(&QueryKey::detail("21"));
//! # }
//! ```

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{
    catalog::Catalog,
    error::Error,
    types::{AnimeDetail, ListPage},
};

/// How long a successful entry counts as fresh by default.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(300);

/// The kind of catalog operation behind a query key.
///
/// Placeholder data is tracked per operation: while page 4 of a search is
/// loading, the last successful search page is what keeps the grid from
/// collapsing to an empty state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Search,
    Top,
    Detail,
}

/// Structured identifier for a fetchable resource.
///
/// Two keys are equal iff the operation and all parameter values are equal;
/// identity and construction order never matter. Keys index the cache, so
/// `fetch`/`prefetch` calls built from equal parameters share one cache
/// slot and one in-flight request.
///
/// # Examples
///
/// ```rust
/// use hakken::query::QueryKey;
///
/// let a = QueryKey::search("bleach", 2, 20);
/// let b = QueryKey::Search {
///     query: "bleach".to_string(),
///     page: 2,
///     limit: 20,
/// };
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Paginated free-text search
    Search { query: String, page: u32, limit: u32 },
    /// Paginated top-rated listing
    Top { page: u32, limit: u32 },
    /// Per-title detail lookup
    Detail { id: String },
}

impl QueryKey {
    /// Key for a search page.
    pub fn search(query: impl Into<String>, page: u32, limit: u32) -> Self {
        QueryKey::Search {
            query: query.into(),
            page,
            limit,
        }
    }

    /// Key for a page of the top-rated listing.
    pub fn top(page: u32, limit: u32) -> Self {
        QueryKey::Top { page, limit }
    }

    /// Key for a title's detail record.
    pub fn detail(id: impl Into<String>) -> Self {
        QueryKey::Detail { id: id.into() }
    }

    /// The operation kind this key belongs to.
    pub fn operation(&self) -> Operation {
        match self {
            QueryKey::Search { .. } => Operation::Search,
            QueryKey::Top { .. } => Operation::Top,
            QueryKey::Detail { .. } => Operation::Detail,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Search { query, page, limit } => {
                write!(f, "search {:?} page {} limit {}", query, page, limit)
            }
            QueryKey::Top { page, limit } => write!(f, "top page {} limit {}", page, limit),
            QueryKey::Detail { id } => write!(f, "detail {}", id),
        }
    }
}

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryStatus {
    /// No fetch has been issued for this key yet
    #[default]
    Idle,
    /// A request is in flight; prior `data` remains readable
    Fetching,
    /// The last fetch succeeded and `data` holds its payload
    Success,
    /// The last fetch failed and `error` holds the failure
    Error,
}

/// Payload of a resolved query.
#[derive(Debug, Clone)]
pub enum QueryData {
    /// A page of search or top-list results
    List(ListPage),
    /// A full detail record
    Detail(Box<AnimeDetail>),
}

impl QueryData {
    /// The list page, for search/top payloads.
    pub fn as_list(&self) -> Option<&ListPage> {
        match self {
            QueryData::List(page) => Some(page),
            QueryData::Detail(_) => None,
        }
    }

    /// The detail record, for detail payloads.
    pub fn as_detail(&self) -> Option<&AnimeDetail> {
        match self {
            QueryData::Detail(detail) => Some(detail),
            QueryData::List(_) => None,
        }
    }
}

/// Point-in-time view of a cache entry, cheap to clone and hand to the UI.
///
/// `data` is the entry's own last successful payload and survives
/// refetches of the same key. While `status` is [`QueryStatus::Fetching`]
/// the payload may be stale; the status stays accurate independent of any
/// placeholder the UI chooses to render.
#[derive(Debug, Clone, Default)]
pub struct QuerySnapshot {
    pub status: QueryStatus,
    pub data: Option<QueryData>,
    pub error: Option<Arc<Error>>,
    pub updated_at: Option<Instant>,
}

impl QuerySnapshot {
    /// `true` while a request for this key is outstanding.
    pub fn is_fetching(&self) -> bool {
        self.status == QueryStatus::Fetching
    }
}

#[derive(Default)]
struct CacheEntry {
    status: QueryStatus,
    data: Option<QueryData>,
    error: Option<Arc<Error>>,
    updated_at: Option<Instant>,
}

impl CacheEntry {
    fn snapshot(&self) -> QuerySnapshot {
        QuerySnapshot {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            updated_at: self.updated_at,
        }
    }
}

type FetchResult = std::result::Result<QueryData, Arc<Error>>;
type InFlight = Shared<BoxFuture<'static, FetchResult>>;

/// The query cache / fetch orchestrator.
///
/// One instance is created at the application's composition root and cloned
/// (cheaply, it is an `Arc` around shared state) into whatever consumes it;
/// nothing here is a hidden singleton. The cache maps are mutated
/// exclusively by the orchestrator in response to fetch lifecycle events —
/// presentation code only ever reads snapshots.
///
/// # Concurrency
///
/// For a given key at most one network request is in flight at any time;
/// concurrent [`fetch`](QueryCache::fetch) and
/// [`prefetch`](QueryCache::prefetch) calls join the shared in-flight
/// future instead of issuing duplicates. Responses for keys nobody watches
/// anymore still land in the cache without disturbing anything. Locks are
/// never held across await points.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use hakken::catalog::JikanCatalog;
/// use hakken::query::{QueryCache, QueryKey};
///
/// # async fn example() {
/// let cache = QueryCache::new(Arc::new(JikanCatalog::new()));
/// let key = QueryKey::top(1, 20);
///
/// // both calls resolve from the same single request
/// let (a, b) = tokio::join!(cache.fetch(&key), cache.fetch(&key));
/// # let _ = (a, b);
/// # }
/// ```
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

struct Inner {
    catalog: Arc<dyn Catalog>,
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    in_flight: Mutex<HashMap<QueryKey, InFlight>>,
    placeholders: Mutex<HashMap<Operation, QueryData>>,
    stale_after: Duration,
}

impl QueryCache {
    /// Creates a cache over the given catalog with the default staleness
    /// window of [`DEFAULT_STALE_AFTER`].
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self::with_stale_after(catalog, DEFAULT_STALE_AFTER)
    }

    /// Creates a cache with an explicit staleness window.
    ///
    /// Successful entries younger than `stale_after` are served without a
    /// network call; older ones are refetched on the next `fetch`.
    pub fn with_stale_after(catalog: Arc<dyn Catalog>, stale_after: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                catalog,
                entries: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                placeholders: Mutex::new(HashMap::new()),
                stale_after,
            }),
        }
    }

    /// Fetches the resource behind `key`, joining any in-flight request.
    ///
    /// A fresh successful entry resolves immediately without touching the
    /// network. Otherwise the entry transitions to
    /// [`QueryStatus::Fetching`] (its previous `data` stays readable),
    /// exactly one request is issued via the catalog, and the outcome is
    /// recorded as `Success` or `Error` before the final snapshot is
    /// returned.
    pub async fn fetch(&self, key: &QueryKey) -> QuerySnapshot {
        if let Some(snapshot) = self.fresh(key) {
            return snapshot;
        }
        let in_flight = self.join_or_start(key);
        let _ = in_flight.await;
        self.snapshot(key)
    }

    /// Fire-and-forget cache warming.
    ///
    /// Does nothing when a fresh successful entry already exists. Otherwise
    /// joins or starts the single in-flight request on a background task;
    /// errors are swallowed into the cache entry and logged at debug level,
    /// never surfaced to the caller.
    pub fn prefetch(&self, key: &QueryKey) {
        if self.fresh(key).is_some() {
            return;
        }
        let in_flight = self.join_or_start(key);
        let key = key.clone();
        tokio::spawn(async move {
            if let Err(err) = in_flight.await {
                log::debug!("prefetch {} failed: {}", key, err);
            }
        });
    }

    /// Reissues the fetch for `key` from scratch.
    ///
    /// This is the retry affordance: freshness is invalidated first, so a
    /// new request goes out even when a (failed or stale) entry exists.
    pub async fn refetch(&self, key: &QueryKey) -> QuerySnapshot {
        self.invalidate(key);
        self.fetch(key).await
    }

    /// Marks the entry for `key` stale; its data stays readable.
    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(entry) = self.inner.entries.lock().get_mut(key) {
            entry.updated_at = None;
        }
    }

    /// The current observable state for `key` without fetching.
    pub fn snapshot(&self, key: &QueryKey) -> QuerySnapshot {
        self.inner
            .entries
            .lock()
            .get(key)
            .map(CacheEntry::snapshot)
            .unwrap_or_default()
    }

    /// The entry's own data, or the last success of the same operation.
    ///
    /// This is what keeps the result grid populated during a page turn:
    /// while the entry for page N+1 is still fetching, page N's payload is
    /// returned as placeholder content. The snapshot's status is not
    /// affected.
    pub fn data_or_placeholder(&self, key: &QueryKey) -> Option<QueryData> {
        if let Some(entry) = self.inner.entries.lock().get(key) {
            if let Some(data) = &entry.data {
                return Some(data.clone());
            }
        }
        self.inner
            .placeholders
            .lock()
            .get(&key.operation())
            .cloned()
    }

    /// Drops entries whose last success is older than `age`.
    ///
    /// Entries with a request in flight survive. Purely a memory-hygiene
    /// operation; nothing depends on eviction for correctness.
    pub fn evict_older_than(&self, age: Duration) {
        self.inner.entries.lock().retain(|_, entry| {
            entry.status == QueryStatus::Fetching
                || entry
                    .updated_at
                    .map(|at| at.elapsed() < age)
                    .unwrap_or(false)
        });
    }

    /// Number of cached entries, mostly for diagnostics.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// `true` when nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }

    fn fresh(&self, key: &QueryKey) -> Option<QuerySnapshot> {
        let entries = self.inner.entries.lock();
        let entry = entries.get(key)?;
        let young = entry
            .updated_at
            .map(|at| at.elapsed() < self.inner.stale_after)
            .unwrap_or(false);
        (entry.status == QueryStatus::Success && young).then(|| entry.snapshot())
    }

    /// Joins the in-flight request for `key`, starting one if none exists.
    fn join_or_start(&self, key: &QueryKey) -> InFlight {
        if let Some(existing) = self.inner.in_flight.lock().get(key) {
            return existing.clone();
        }

        self.mark_fetching(key);

        let this = self.clone();
        let owned = key.clone();
        let fut: InFlight = async move {
            let result = this.request(&owned).await.map_err(Arc::new);
            this.record(&owned, &result);
            this.inner.in_flight.lock().remove(&owned);
            result
        }
        .boxed()
        .shared();

        let mut in_flight = self.inner.in_flight.lock();
        // a racing caller may have registered the same key in the meantime;
        // the future built above is lazy and dropping it unpolled is free
        if let Some(existing) = in_flight.get(key) {
            return existing.clone();
        }
        in_flight.insert(key.clone(), fut.clone());
        fut
    }

    fn mark_fetching(&self, key: &QueryKey) {
        let mut entries = self.inner.entries.lock();
        let entry = entries.entry(key.clone()).or_default();
        entry.status = QueryStatus::Fetching;
        entry.error = None;
        // data is retained so consumers can keep rendering it
    }

    fn record(&self, key: &QueryKey, result: &FetchResult) {
        {
            let mut entries = self.inner.entries.lock();
            let entry = entries.entry(key.clone()).or_default();
            match result {
                Ok(data) => {
                    entry.status = QueryStatus::Success;
                    entry.data = Some(data.clone());
                    entry.error = None;
                    entry.updated_at = Some(Instant::now());
                }
                Err(err) => {
                    entry.status = QueryStatus::Error;
                    entry.error = Some(err.clone());
                }
            }
        }
        if let Ok(data) = result {
            self.inner
                .placeholders
                .lock()
                .insert(key.operation(), data.clone());
        }
    }

    async fn request(&self, key: &QueryKey) -> crate::Result<QueryData> {
        log::debug!("fetching {}", key);
        match key {
            QueryKey::Search { query, page, limit } => self
                .inner
                .catalog
                .search(query, *page, *limit)
                .await
                .map(QueryData::List),
            QueryKey::Top { page, limit } => self
                .inner
                .catalog
                .top(*page, *limit)
                .await
                .map(QueryData::List),
            QueryKey::Detail { id } => self
                .inner
                .catalog
                .detail(id)
                .await
                .map(|detail| QueryData::Detail(Box::new(detail))),
        }
    }
}
