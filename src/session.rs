//! Persisted search session state.
//!
//! This module owns the search view's state machine: the search term (with
//! its debounced shadow), the current page, and the page size. Three
//! sources of truth exist for that state — the in-memory session, a
//! shareable location query string (`?q=...&page=N`), and a local
//! key-value store — and they are reconciled exactly once, at mount, by
//! [`resolve_initial_state`]. From then on the location and the store are
//! write-only mirrors of the session.
//!
//! The awkward part of the original behavior — "reset to page 1 when the
//! search term settles or the page size changes, but not on the settle
//! that happens right after mount" — is an explicit, testable transition
//! guard here rather than a side effect.
//!
//! # Examples
//!
//! ```rust
//! use hakken::session::{MemoryStore, SearchSession};
//!
//! let mut session = SearchSession::mount(Some("?q=bleach&page=3"), MemoryStore::new());
//! assert_eq!(session.search_term(), "bleach");
//! assert_eq!(session.page(), 3);
//!
//! session.set_search_term("naruto");
//! // in the update loop: session.tick() settles the term after 250ms
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use url::form_urlencoded;

use crate::catalog::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::debounce::Debounced;
use crate::query::QueryKey;

/// Store key for the last visited page number.
pub const LAST_PAGE_KEY: &str = "lastPage";

/// Store key for the last chosen page size.
pub const LAST_ITEMS_PER_PAGE_KEY: &str = "lastItemsPerPage";

/// Quiet period of the search term debouncer.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);

/// Best-effort local key-value persistence.
///
/// Values are plain strings (the two session keys hold string-encoded
/// integers). Reads happen once, at mount; writes happen on every change
/// and overwrite whatever was there.
pub trait StateStore {
    /// Reads a stored value.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes a value, best-effort. Failures are logged, never surfaced.
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store, used by tests and as a fallback when no config
/// directory exists.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// JSON-file-backed store under the platform config directory.
///
/// The whole map is rewritten on every `set`; a missing or corrupt file
/// degrades to an empty store instead of failing.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl FileStore {
    /// Opens the default store at `<config dir>/hakken/state.json`.
    pub fn open_default() -> crate::Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| {
                crate::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no platform config directory",
                ))
            })?
            .join("hakken");
        fs::create_dir_all(&dir)?;
        Ok(Self::open(dir.join("state.json")))
    }

    /// Opens a store at an explicit path, tolerating a missing or corrupt
    /// file.
    pub fn open(path: PathBuf) -> Self {
        let values = fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str::<HashMap<String, String>>(&text).ok())
            .unwrap_or_default();
        Self { path, values }
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        match serde_json::to_string_pretty(&self.values) {
            Ok(json) => {
                if let Err(err) = fs::write(&self.path, json) {
                    log::warn!("failed to persist state to {}: {}", self.path.display(), err);
                }
            }
            Err(err) => log::warn!("failed to encode state: {}", err),
        }
    }
}

/// Parses a location query string (`"?q=bleach&page=3"`) into pairs.
pub fn parse_query_string(location: &str) -> Vec<(String, String)> {
    let raw = location.trim_start_matches('?');
    form_urlencoded::parse(raw.as_bytes()).into_owned().collect()
}

/// Formats the session's shareable location query string.
///
/// `q` is omitted when the term is empty; `page` is always present.
///
/// # Examples
///
/// ```rust
/// use hakken::session::format_query_string;
///
/// assert_eq!(format_query_string("one piece", 2), "?q=one+piece&page=2");
/// assert_eq!(format_query_string("", 1), "?page=1");
/// ```
pub fn format_query_string(term: &str, page: u32) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if !term.is_empty() {
        serializer.append_pair("q", term);
    }
    serializer.append_pair("page", &page.to_string());
    format!("?{}", serializer.finish())
}

/// The session's location mirror with browser-history semantics.
///
/// The session only ever replaces the current entry, never pushes, so
/// rapid typing and page turns do not pile up history entries.
#[derive(Debug, Default, Clone)]
pub struct History {
    entries: Vec<String>,
}

impl History {
    /// Replaces the current entry (or creates the first one).
    pub fn replace(&mut self, location: String) {
        match self.entries.last_mut() {
            Some(last) => *last = location,
            None => self.entries.push(location),
        }
    }

    /// Pushes a new entry. The session itself never calls this.
    pub fn push(&mut self, location: String) {
        self.entries.push(location);
    }

    /// The current location, if any entry exists.
    pub fn current(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validated initial session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    pub search_term: String,
    pub page: u32,
    pub items_per_page: u32,
}

/// One-shot mount resolution of the three sources of truth.
///
/// Pure given its inputs; runs exactly once per session:
///
/// - `page`: the location value wins if it parses to an integer ≥ 1; else
///   the stored [`LAST_PAGE_KEY`] raised to ≥ 1 if it parses; else 1.
/// - `items_per_page`: the stored [`LAST_ITEMS_PER_PAGE_KEY`] if it parses
///   into `[1, 25]`; else 20.
/// - `search_term`: the location's `q` if present, else empty.
///
/// Unparsable or out-of-range values silently degrade to their defaults.
///
/// # Examples
///
/// ```rust
/// use hakken::session::{resolve_initial_state, MemoryStore};
///
/// let state = resolve_initial_state(Some("?q=bleach&page=3"), &MemoryStore::new());
/// assert_eq!(state.search_term, "bleach");
/// assert_eq!(state.page, 3);
/// assert_eq!(state.items_per_page, 20);
/// ```
pub fn resolve_initial_state(location: Option<&str>, store: &dyn StateStore) -> SearchState {
    let params = location.map(parse_query_string).unwrap_or_default();
    let lookup = |name: &str| {
        params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };

    let page = lookup("page")
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|page| *page >= 1)
        .or_else(|| {
            store
                .get(LAST_PAGE_KEY)
                .and_then(|value| value.parse::<u32>().ok())
                .map(|page| page.max(1))
        })
        .unwrap_or(1);

    let items_per_page = store
        .get(LAST_ITEMS_PER_PAGE_KEY)
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|items| (1..=MAX_PAGE_SIZE).contains(items))
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let search_term = lookup("q").unwrap_or("").to_string();

    SearchState {
        search_term,
        page,
        items_per_page,
    }
}

/// Outcome of a settle tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settle {
    /// The term that just settled
    pub term: String,
    /// Whether the reset-to-page-1 rule fired
    pub page_reset: bool,
    /// Whether this was the exempt settle right after mount
    pub first: bool,
}

/// The search view's state machine.
///
/// Owns `search_term` (immediate), its debounced shadow, `page`, and
/// `items_per_page`. Mount reads the location and the store once; every
/// later change flows one way, out to the mirrors:
///
/// - every page change is persisted to [`LAST_PAGE_KEY`];
/// - every page-size change is persisted to [`LAST_ITEMS_PER_PAGE_KEY`]
///   and forces the page back to 1 as an explicit transition;
/// - every settle or page change rewrites the location (replace, never
///   push).
///
/// The reset-to-page-1 rule fires on a settle only when the settled term
/// or the page size genuinely differs from its previous value, and never
/// on the first settle after mount — that one must not clobber a page
/// number restored from the location or the store.
pub struct SearchSession<S: StateStore> {
    term: Debounced<String>,
    page: u32,
    items_per_page: u32,
    prev_term: String,
    prev_items_per_page: u32,
    mount_settle_consumed: bool,
    store: S,
    history: History,
}

impl<S: StateStore> SearchSession<S> {
    /// Mounts a session, resolving initial state from the given location
    /// query string and the store. Runs the resolution exactly once.
    pub fn mount(location: Option<&str>, store: S) -> Self {
        let initial = resolve_initial_state(location, &store);
        let mut history = History::default();
        history.replace(format_query_string(&initial.search_term, initial.page));
        Self {
            term: Debounced::new(initial.search_term.clone(), SEARCH_DEBOUNCE),
            page: initial.page,
            items_per_page: initial.items_per_page,
            prev_term: initial.search_term,
            prev_items_per_page: initial.items_per_page,
            mount_settle_consumed: false,
            store,
            history,
        }
    }

    /// Overrides the debounce quiet period. Tests shorten it.
    ///
    /// A term change still waiting out the old quiet period is carried
    /// over; its timer restarts under the new delay.
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        let pending = self
            .term
            .is_pending()
            .then(|| self.term.latest().clone());
        self.term = Debounced::new(self.term.value().clone(), delay);
        if let Some(value) = pending {
            self.term.set(value);
        }
        self
    }

    /// Feeds a keystroke-level update of the search term.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.term.set(term.into());
    }

    /// The immediate search term, as typed.
    pub fn search_term(&self) -> &str {
        self.term.latest()
    }

    /// The settled search term that drives fetches.
    pub fn debounced_term(&self) -> &str {
        self.term.value()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn items_per_page(&self) -> u32 {
        self.items_per_page
    }

    /// The shareable location query string.
    pub fn location(&self) -> &str {
        self.history.current().unwrap_or("?page=1")
    }

    /// The location mirror, for inspecting its replace-only behavior.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Moves to a different page.
    ///
    /// Values below 1 are raised to 1. Persists the page and rewrites the
    /// location; a no-op when the page does not actually change.
    pub fn set_page(&mut self, page: u32) {
        let page = page.max(1);
        if page == self.page {
            return;
        }
        self.page = page;
        self.persist_page();
        self.rewrite_location();
    }

    /// Changes the page size.
    ///
    /// An explicit transition, independent of the settle rule: the new
    /// size is clamped into `[1, 25]`, persisted immediately, and the page
    /// is forced back to 1.
    pub fn set_items_per_page(&mut self, items: u32) {
        let items = items.clamp(1, MAX_PAGE_SIZE);
        if items == self.items_per_page {
            return;
        }
        self.items_per_page = items;
        self.store.set(LAST_ITEMS_PER_PAGE_KEY, &items.to_string());
        self.prev_items_per_page = items;
        if self.force_first_page() {
            self.rewrite_location();
        }
    }

    /// Advances the state machine; call from the owner's update loop.
    ///
    /// Returns `Some(Settle)` when the debounced term settles. The first
    /// tick after mount emits the exempt mount settle, which seeds the
    /// mirrors without ever resetting the page. Later settles apply the
    /// change-detection rule: if the settled term or the page size
    /// differs from its previous value, the page resets to 1.
    pub fn tick(&mut self) -> Option<Settle> {
        if !self.mount_settle_consumed {
            self.mount_settle_consumed = true;
            let term = self.term.value().clone();
            self.prev_term = term.clone();
            self.prev_items_per_page = self.items_per_page;
            self.rewrite_location();
            return Some(Settle {
                term,
                page_reset: false,
                first: true,
            });
        }

        let settled = self.term.poll()?.clone();
        let changed =
            settled != self.prev_term || self.items_per_page != self.prev_items_per_page;
        if changed {
            self.force_first_page();
        }
        self.prev_term = settled.clone();
        self.prev_items_per_page = self.items_per_page;
        self.rewrite_location();
        Some(Settle {
            term: settled,
            page_reset: changed,
            first: false,
        })
    }

    /// The query key for the current settled state: an empty term browses
    /// the top-rated listing, anything else searches.
    pub fn query_key(&self) -> QueryKey {
        let term = self.term.value();
        if term.is_empty() {
            QueryKey::top(self.page, self.items_per_page)
        } else {
            QueryKey::search(term.clone(), self.page, self.items_per_page)
        }
    }

    fn force_first_page(&mut self) -> bool {
        if self.page == 1 {
            return false;
        }
        self.page = 1;
        self.persist_page();
        true
    }

    fn persist_page(&mut self) {
        self.store.set(LAST_PAGE_KEY, &self.page.to_string());
    }

    fn rewrite_location(&mut self) {
        self.history
            .replace(format_query_string(self.term.value(), self.page));
    }
}
