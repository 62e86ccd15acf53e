//! Common test utilities and fixtures
//!
//! Shared functionality used across all test modules.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use hakken::catalog::Catalog;
use hakken::error::{Error, Result};
use hakken::types::{Anime, AnimeDetail, ListPage, PageItems, Pagination};

/// A scripted in-memory catalog counting every call it receives.
///
/// Used to verify deduplication, prefetching, and retry behavior without
/// touching the network. The first `fail_searches` list requests (search
/// and top combined) return an error; everything afterwards succeeds.
pub struct StubCatalog {
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    fail_searches: AtomicUsize,
    delay: Option<Duration>,
}

#[allow(dead_code)]
impl StubCatalog {
    pub fn new() -> Self {
        Self {
            list_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            fail_searches: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Every request waits this long before answering, so tests can observe
    /// in-flight state.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// The first `count` list requests fail with a validation error.
    pub fn failing_first(self, count: usize) -> Self {
        self.fail_searches.store(count, Ordering::SeqCst);
        self
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn detail_call_count(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    async fn maybe_delay(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn take_failure(&self) -> bool {
        self.fail_searches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }
}

#[async_trait]
impl Catalog for StubCatalog {
    fn id(&self) -> &'static str {
        "stub"
    }

    fn name(&self) -> &'static str {
        "Stub"
    }

    fn base_url(&self) -> &str {
        "http://stub.invalid"
    }

    async fn search(&self, query: &str, page: u32, limit: u32) -> Result<ListPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_delay().await;
        if self.take_failure() {
            return Err(Error::validation("HTTP 500 Internal Server Error"));
        }
        Ok(sample_page(&format!("{} result", query), page, limit))
    }

    async fn top(&self, page: u32, limit: u32) -> Result<ListPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_delay().await;
        if self.take_failure() {
            return Err(Error::validation("HTTP 500 Internal Server Error"));
        }
        Ok(sample_page("top result", page, limit))
    }

    async fn detail(&self, id: &str) -> Result<AnimeDetail> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_delay().await;
        let mal_id = id
            .parse::<u64>()
            .map_err(|_| Error::not_found(format!("anime id '{}'", id)))?;
        Ok(sample_detail(mal_id))
    }
}

/// Builds one anime entry with deterministic fields derived from the id.
#[allow(dead_code)]
pub fn sample_anime(mal_id: u64, title: &str) -> Anime {
    Anime {
        mal_id,
        title: title.to_string(),
        media_type: Some("TV".to_string()),
        episodes: Some(26),
        score: Some(8.0),
        ..Default::default()
    }
}

/// Builds a list page stamped with the requesting page number, so tests can
/// tell which page's data they are looking at.
#[allow(dead_code)]
pub fn sample_page(title_prefix: &str, page: u32, limit: u32) -> ListPage {
    let data: Vec<Anime> = (0..limit.min(3))
        .map(|i| sample_anime(u64::from(page) * 100 + u64::from(i), &format!("{} p{}", title_prefix, page)))
        .collect();
    ListPage {
        pagination: Pagination {
            last_visible_page: 10,
            has_next_page: page < 10,
            current_page: page,
            items: PageItems {
                count: data.len() as u32,
                total: 200,
                per_page: limit,
            },
        },
        data,
    }
}

#[allow(dead_code)]
pub fn sample_detail(mal_id: u64) -> AnimeDetail {
    AnimeDetail {
        anime: sample_anime(mal_id, &format!("title {}", mal_id)),
        source: Some("Manga".to_string()),
        duration: Some("24 min per ep".to_string()),
        ..Default::default()
    }
}

/// Jikan-shaped list response body for HTTP-level tests.
#[allow(dead_code)]
pub fn jikan_list_body() -> String {
    serde_json::json!({
        "pagination": {
            "last_visible_page": 112,
            "has_next_page": true,
            "current_page": 1,
            "items": { "count": 2, "total": 2231, "per_page": 20 }
        },
        "data": [
            {
                "mal_id": 21,
                "url": "https://myanimelist.net/anime/21/One_Piece",
                "images": { "jpg": { "image_url": "https://cdn.myanimelist.net/images/anime/1244/138851.jpg" } },
                "title": "One Piece",
                "title_english": "One Piece",
                "type": "TV",
                "episodes": null,
                "status": "Currently Airing",
                "score": 8.73,
                "genres": [ { "mal_id": 1, "name": "Action", "url": "https://myanimelist.net/anime/genre/1/Action" } ]
            },
            {
                "mal_id": 459,
                "title": "One Piece Movie 01",
                "type": "Movie",
                "episodes": 1,
                "score": 7.09
            }
        ]
    })
    .to_string()
}

/// Jikan-shaped detail response body for HTTP-level tests.
#[allow(dead_code)]
pub fn jikan_detail_body() -> String {
    serde_json::json!({
        "data": {
            "mal_id": 21,
            "title": "One Piece",
            "type": "TV",
            "source": "Manga",
            "episodes": null,
            "status": "Currently Airing",
            "duration": "24 min",
            "rating": "PG-13 - Teens 13 or older",
            "score": 8.73,
            "synopsis": "Gol D. Roger was known as the Pirate King...",
            "aired": { "from": "1999-10-20T00:00:00+00:00", "to": null, "string": "Oct 20, 1999 to ?" },
            "studios": [ { "mal_id": 18, "name": "Toei Animation" } ],
            "genres": [ { "mal_id": 1, "name": "Action" }, { "mal_id": 2, "name": "Adventure" } ]
        }
    })
    .to_string()
}
