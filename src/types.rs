//! Core data types for anime entries, details, and pagination.
//!
//! This module defines the payload structures returned by the remote
//! catalog:
//!
//! - [`Anime`] - A single catalog entry as it appears in list results
//! - [`AnimeDetail`] - The full per-title record from the detail endpoint
//! - [`ListPage`] - One page of list results together with its [`Pagination`]
//! - [`Pagination`] - The pagination descriptor driving page controls
//!
//! All types deserialize directly from the catalog's JSON; fields the UI
//! does not render are ignored. Everything is read-only from the consumer's
//! perspective.
//!
//! # Examples
//!
//! ```rust
//! use hakken::types::{Anime, Entity};
//!
//! let anime = Anime {
//!     mal_id: 21,
//!     url: Some("https://myanimelist.net/anime/21/One_Piece".to_string()),
//!     title: "One Piece".to_string(),
//!     score: Some(8.73),
//!     genres: vec![Entity { mal_id: 1, name: "Action".to_string(), url: None }],
//!     ..Default::default()
//! };
//! assert_eq!(anime.title, "One Piece");
//! ```

use serde::{Deserialize, Serialize};

/// A referenced catalog entity such as a genre, studio, or producer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entity {
    /// Catalog-wide identifier
    pub mal_id: u64,

    /// Display name
    pub name: String,

    /// Link into the upstream catalog
    #[serde(default)]
    pub url: Option<String>,
}

/// Image URLs for a single format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageSet {
    pub image_url: Option<String>,
    pub small_image_url: Option<String>,
    pub large_image_url: Option<String>,
}

/// Cover images grouped by encoding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub jpg: ImageSet,
    #[serde(default)]
    pub webp: ImageSet,
}

/// Airing date range of a title.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Aired {
    pub from: Option<String>,
    pub to: Option<String>,

    /// Human-readable range, e.g. `"Oct 20, 1999 to ?"`
    #[serde(rename = "string")]
    pub display: Option<String>,
}

/// A single anime entry as returned by the list endpoints.
///
/// This is the unit of the result grid: enough metadata to render a card
/// (title, image, score, type, episode count) without the heavyweight
/// fields of the detail record.
///
/// # Fields
///
/// * `mal_id` - Unique identifier within the catalog (used for detail fetches)
/// * `title` - The main romaji title; english/japanese variants are optional
/// * `media_type` - `"TV"`, `"Movie"`, `"OVA"`, ...
/// * `score` - Community score in `[1.0, 10.0]` when available
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Anime {
    /// Unique identifier within the catalog
    pub mal_id: u64,

    /// Link into the upstream catalog
    #[serde(default)]
    pub url: Option<String>,

    /// Cover images
    #[serde(default)]
    pub images: Images,

    /// Main title
    pub title: String,

    /// English title, when licensed
    #[serde(default)]
    pub title_english: Option<String>,

    /// Japanese title
    #[serde(default)]
    pub title_japanese: Option<String>,

    /// Media type: TV, Movie, OVA, Special, ...
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,

    /// Episode count, absent while airing
    #[serde(default)]
    pub episodes: Option<u32>,

    /// Airing status, e.g. "Finished Airing"
    #[serde(default)]
    pub status: Option<String>,

    /// Community score
    #[serde(default)]
    pub score: Option<f64>,

    /// Number of users behind the score
    #[serde(default)]
    pub scored_by: Option<u64>,

    /// Catalog rank by score
    #[serde(default)]
    pub rank: Option<u32>,

    /// Catalog rank by member count
    #[serde(default)]
    pub popularity: Option<u32>,

    /// Users with the title on a list
    #[serde(default)]
    pub members: Option<u64>,

    /// Plot summary
    #[serde(default)]
    pub synopsis: Option<String>,

    /// Premiere season, e.g. "fall"
    #[serde(default)]
    pub season: Option<String>,

    /// Premiere year
    #[serde(default)]
    pub year: Option<i32>,

    /// Genre tags
    #[serde(default)]
    pub genres: Vec<Entity>,
}

impl Anime {
    /// The preferred cover image URL, if any format is available.
    pub fn image_url(&self) -> Option<&str> {
        self.images
            .jpg
            .image_url
            .as_deref()
            .or(self.images.webp.image_url.as_deref())
    }

    /// The title preferred for display: english when present, romaji otherwise.
    pub fn display_title(&self) -> &str {
        self.title_english.as_deref().unwrap_or(&self.title)
    }
}

/// The full per-title record from the detail endpoint.
///
/// Extends [`Anime`] (available through `Deref`) with the fields only the
/// detail view renders: studios, producers, source material, duration,
/// rating, and the airing range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimeDetail {
    #[serde(flatten)]
    pub anime: Anime,

    /// Source material, e.g. "Manga"
    #[serde(default)]
    pub source: Option<String>,

    /// Per-episode duration, e.g. "24 min per ep"
    #[serde(default)]
    pub duration: Option<String>,

    /// Audience rating, e.g. "PG-13"
    #[serde(default)]
    pub rating: Option<String>,

    /// Airing date range
    #[serde(default)]
    pub aired: Option<Aired>,

    /// Production background notes
    #[serde(default)]
    pub background: Option<String>,

    /// Animation studios
    #[serde(default)]
    pub studios: Vec<Entity>,

    /// Producing companies
    #[serde(default)]
    pub producers: Vec<Entity>,

    /// Theme tags
    #[serde(default)]
    pub themes: Vec<Entity>,
}

impl std::ops::Deref for AnimeDetail {
    type Target = Anime;

    fn deref(&self) -> &Anime {
        &self.anime
    }
}

/// Pagination descriptor returned alongside every list page.
///
/// Read-only; drives the pagination control's bounds. A page number
/// restored from a shared link may exceed
/// [`last_visible_page`](Pagination::last_visible_page); the upstream's
/// answer for that page is authoritative and no client-side clamping is
/// applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub last_visible_page: u32,
    pub has_next_page: bool,
    pub current_page: u32,
    #[serde(default)]
    pub items: PageItems,
}

/// Item counts for the current page and the whole result set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageItems {
    pub count: u32,
    pub total: u64,
    pub per_page: u32,
}

/// One page of list results: the entries plus their pagination descriptor.
///
/// This is the wire shape of both the search and the top-list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPage {
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub data: Vec<Anime>,
}

impl ListPage {
    /// `true` when the page carries no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
