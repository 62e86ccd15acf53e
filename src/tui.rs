//! TUI utilities and shared formatting for the Hakken terminal user interface.
//!
//! This module provides the formatting helpers shared between the TUI binary
//! and any application that wants to build a terminal interface on top of
//! Hakken.
//!
//! # Features
//!
//! This module is only available when the `tui` feature is enabled.
//!
//! # Examples
//!
//! ```rust,no_run
//! use hakken::tui::format_anime_title;
//! use hakken::types::Anime;
//!
//! let anime = Anime {
//!     mal_id: 21,
//!     title: "One Piece".to_string(),
//!     media_type: Some("TV".to_string()),
//!     score: Some(8.73),
//!     ..Default::default()
//! };
//!
//! let line = format_anime_title(&anime);
//! ```

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::types::{Anime, Entity, Pagination};

/// Formats an anime entry as a styled result-list line.
///
/// Shows the display title with the media type and the community score,
/// when present.
pub fn format_anime_title(anime: &Anime) -> Line<'static> {
    let mut spans = vec![Span::styled(
        anime.display_title().to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];

    if let Some(ref media_type) = anime.media_type {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!("({})", media_type),
            Style::default().fg(Color::Green),
        ));
    }

    if let Some(score) = anime.score {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!("★ {:.2}", score),
            Style::default().fg(Color::Yellow),
        ));
    }

    Line::from(spans)
}

/// Formats genre or theme entities as bulleted lines.
pub fn format_genres(genres: &[Entity]) -> Vec<Line<'static>> {
    if genres.is_empty() {
        vec![Line::from(Span::styled(
            "None",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        genres
            .iter()
            .map(|genre| {
                Line::from(vec![
                    Span::raw("• "),
                    Span::styled(genre.name.clone(), Style::default().fg(Color::Magenta)),
                ])
            })
            .collect()
    }
}

/// Formats a synopsis with word wrapping for TUI display.
///
/// # Parameters
///
/// * `synopsis` - The synopsis to format
/// * `width` - Maximum width for text wrapping
pub fn format_synopsis(synopsis: &Option<String>, width: usize) -> Vec<Line<'static>> {
    match synopsis {
        Some(text) => {
            // Simple word wrapping
            let words: Vec<&str> = text.split_whitespace().collect();
            let mut lines = Vec::new();
            let mut current_line = String::new();

            for word in words {
                if current_line.len() + word.len() + 1 > width && !current_line.is_empty() {
                    lines.push(Line::from(current_line.clone()));
                    current_line.clear();
                }
                if !current_line.is_empty() {
                    current_line.push(' ');
                }
                current_line.push_str(word);
            }

            if !current_line.is_empty() {
                lines.push(Line::from(current_line));
            }

            lines
        }
        None => vec![Line::from(Span::styled(
            "No synopsis available",
            Style::default().fg(Color::DarkGray),
        ))],
    }
}

/// Formats the pagination footer, e.g. `"Page 3 of 112 (2231 titles)"`.
pub fn format_pagination(pagination: &Pagination) -> Line<'static> {
    Line::from(vec![
        Span::styled("Page ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            pagination.current_page.to_string(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" of {}", pagination.last_visible_page.max(1)),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!(" ({} titles)", pagination.items.total),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

/// Creates a styled status message for TUI display.
///
/// # Examples
///
/// ```rust,no_run
/// use hakken::tui::create_status_message;
/// use ratatui::style::Color;
///
/// let message = create_status_message("Info", "Fetching page 2...", Color::Blue);
/// ```
pub fn create_status_message(prefix: &str, message: &str, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{}:", prefix),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(message.to_string(), Style::default().fg(color)),
    ])
}

/// Creates a success message for TUI display.
pub fn success_message(message: &str) -> Line<'static> {
    create_status_message("Success", message, Color::Green)
}

/// Creates a warning message for TUI display.
pub fn warning_message(message: &str) -> Line<'static> {
    create_status_message("Warning", message, Color::Yellow)
}

/// Creates an error message for TUI display.
pub fn error_message(message: &str) -> Line<'static> {
    create_status_message("Error", message, Color::Red)
}

/// Creates an info message for TUI display.
pub fn info_message(message: &str) -> Line<'static> {
    create_status_message("Info", message, Color::Blue)
}

/// Truncates text to fit within a specified width.
///
/// # Examples
///
/// ```rust,no_run
/// use hakken::tui::truncate_text;
///
/// let truncated = truncate_text("This is a very long text", 10);
/// assert_eq!(truncated, "This is...");
/// ```
pub fn truncate_text(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else if width > 3 {
        let kept: String = text.chars().take(width - 3).collect();
        format!("{}...", kept)
    } else {
        text.chars().take(width).collect()
    }
}
