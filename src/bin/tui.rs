//! Hakken TUI - Terminal user interface for anime discovery
//!
//! A keyboard-driven anime browser: type to search, turn pages, open full
//! details. Search terms debounce before hitting the network, pages are
//! prefetched ahead of navigation, and the previous page stays on screen
//! while the next one loads.

use color_eyre::{eyre::Result, install};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::{env, io, sync::Arc, time::Duration};
use tokio::sync::mpsc;

use hakken::catalog::MAX_PAGE_SIZE;
use hakken::prelude::*;
use hakken::query::QueryStatus;
use hakken::session::FileStore;
use hakken::tui::{format_genres, format_pagination, format_synopsis, truncate_text};
use hakken::types::Pagination;

// Application events from background fetch tasks
#[derive(Debug)]
enum AppEvent {
    QueryDone(QueryKey),
}

#[derive(Debug, Clone, PartialEq)]
enum AppMode {
    Search,
    Detail,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
enum StatusType {
    Info,
    Success,
    Warning,
    Error,
}

impl StatusType {
    fn color(&self) -> ratatui::style::Color {
        match self {
            StatusType::Info => theme::INFO,
            StatusType::Success => theme::SUCCESS,
            StatusType::Warning => theme::WARNING,
            StatusType::Error => theme::ERROR,
        }
    }
}

mod theme {
    use ratatui::style::Color;

    pub const PRIMARY: Color = Color::Rgb(75, 85, 255); // Blue
    pub const ACCENT: Color = Color::Rgb(255, 152, 0); // Orange
    pub const SUCCESS: Color = Color::Rgb(76, 175, 80); // Green
    pub const WARNING: Color = Color::Rgb(255, 193, 7); // Yellow
    pub const ERROR: Color = Color::Rgb(244, 67, 54); // Red
    pub const INFO: Color = Color::Rgb(33, 150, 243); // Light Blue

    pub const TEXT_PRIMARY: Color = Color::Rgb(255, 255, 255);
    pub const TEXT_SECONDARY: Color = Color::Rgb(189, 189, 189);
    pub const TEXT_MUTED: Color = Color::Rgb(117, 117, 117);

    pub const BORDER: Color = Color::Rgb(66, 66, 66);
    pub const BORDER_FOCUS: Color = PRIMARY;
}

struct App {
    // Core state
    mode: AppMode,
    should_quit: bool,
    search_input_active: bool,

    // Data layer
    cache: QueryCache,
    session: SearchSession<FileStore>,

    // Results state
    list_state: ListState,
    pagination: Option<Pagination>,
    detail_id: Option<u64>,

    // UI state
    status_message: String,
    status_type: StatusType,

    // Communication
    event_sender: mpsc::UnboundedSender<AppEvent>,
    event_receiver: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    fn new(location: Option<&str>) -> Self {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();

        let store = match FileStore::open_default() {
            Ok(store) => store,
            Err(err) => {
                log::warn!("falling back to temporary state file: {}", err);
                FileStore::open(env::temp_dir().join("hakken-state.json"))
            }
        };

        let cache = QueryCache::new(Arc::new(JikanCatalog::new()));
        let session = SearchSession::mount(location, store);

        Self {
            mode: AppMode::Search,
            should_quit: false,
            search_input_active: false,
            cache,
            session,
            list_state: ListState::default(),
            pagination: None,
            detail_id: None,
            status_message: "Type / to search, Enter for details, ? for help".to_string(),
            status_type: StatusType::Info,
            event_sender,
            event_receiver,
        }
    }

    fn set_status(&mut self, message: String, status_type: StatusType) {
        self.status_message = message;
        self.status_type = status_type;
    }

    // Spawns a fetch for the key and pings the UI when it lands. Duplicate
    // spawns for the same key collapse into one request inside the cache.
    fn spawn_fetch(&self, key: QueryKey) {
        let cache = self.cache.clone();
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            cache.fetch(&key).await;
            let _ = sender.send(AppEvent::QueryDone(key));
        });
    }

    fn spawn_refetch(&self, key: QueryKey) {
        let cache = self.cache.clone();
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            cache.refetch(&key).await;
            let _ = sender.send(AppEvent::QueryDone(key));
        });
    }

    // Drives the session's debounce and keeps the cache warm.
    fn tick(&mut self) {
        if let Some(settle) = self.session.tick() {
            if settle.page_reset {
                self.list_state.select(None);
            }
            self.spawn_fetch(self.session.query_key());
        }
    }

    fn current_list(&self) -> Option<ListPage> {
        self.cache
            .data_or_placeholder(&self.session.query_key())
            .and_then(|data| data.as_list().cloned())
    }

    fn selected_anime(&self) -> Option<Anime> {
        let list = self.current_list()?;
        let index = self.list_state.selected()?;
        list.data.get(index).cloned()
    }

    fn move_selection(&mut self, delta: i64) {
        let Some(list) = self.current_list() else {
            return;
        };
        if list.data.is_empty() {
            self.list_state.select(None);
            return;
        }
        let last = list.data.len() as i64 - 1;
        let current = self.list_state.selected().map(|i| i as i64).unwrap_or(-1);
        let next = (current + delta).clamp(0, last) as usize;
        self.list_state.select(Some(next));

        // Warm the detail view for the highlighted entry
        if let Some(anime) = list.data.get(next) {
            self.cache
                .prefetch(&QueryKey::detail(anime.mal_id.to_string()));
        }
    }

    fn turn_page(&mut self, forward: bool) {
        let page = self.session.page();
        if forward {
            let has_next = self
                .pagination
                .as_ref()
                .map(|p| p.has_next_page)
                .unwrap_or(false);
            if !has_next {
                self.set_status("Already on the last page".to_string(), StatusType::Warning);
                return;
            }
            self.session.set_page(page + 1);
        } else {
            if page <= 1 {
                self.set_status("Already on the first page".to_string(), StatusType::Warning);
                return;
            }
            self.session.set_page(page - 1);
        }
        self.list_state.select(None);
        let key = self.session.query_key();
        self.spawn_fetch(key);

        // Keep one page ahead warm
        if let Some(next_key) = self.next_page_key() {
            self.cache.prefetch(&next_key);
        }
    }

    fn next_page_key(&self) -> Option<QueryKey> {
        let has_next = self.pagination.as_ref()?.has_next_page;
        if !has_next {
            return None;
        }
        let page = self.session.page() + 1;
        let limit = self.session.items_per_page();
        let term = self.session.debounced_term();
        Some(if term.is_empty() {
            QueryKey::top(page, limit)
        } else {
            QueryKey::search(term, page, limit)
        })
    }

    fn adjust_page_size(&mut self, delta: i64) {
        let current = self.session.items_per_page() as i64;
        let next = (current + delta).clamp(1, i64::from(MAX_PAGE_SIZE)) as u32;
        if next as i64 != current {
            self.session.set_items_per_page(next);
            self.list_state.select(None);
            self.spawn_fetch(self.session.query_key());
            self.set_status(format!("{} results per page", next), StatusType::Info);
        }
    }

    fn open_detail(&mut self) {
        if let Some(anime) = self.selected_anime() {
            self.detail_id = Some(anime.mal_id);
            self.mode = AppMode::Detail;
            self.spawn_fetch(QueryKey::detail(anime.mal_id.to_string()));
        }
    }

    fn retry_current(&mut self) {
        let key = match self.mode {
            AppMode::Detail => match self.detail_id {
                Some(id) => QueryKey::detail(id.to_string()),
                None => return,
            },
            _ => self.session.query_key(),
        };
        self.set_status(format!("Retrying {}", key), StatusType::Info);
        self.spawn_refetch(key);
    }

    fn handle_key_event(&mut self, key: KeyCode) {
        if self.search_input_active {
            self.handle_search_input(key);
            return;
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => match self.mode {
                AppMode::Search => self.should_quit = true,
                _ => self.mode = AppMode::Search,
            },
            KeyCode::Char('/') => {
                self.mode = AppMode::Search;
                self.search_input_active = true;
            }
            KeyCode::Char('?') => self.mode = AppMode::Help,
            KeyCode::Char('r') => self.retry_current(),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Left | KeyCode::Char('p') => self.turn_page(false),
            KeyCode::Right | KeyCode::Char('n') => self.turn_page(true),
            KeyCode::Char('+') => self.adjust_page_size(5),
            KeyCode::Char('-') => self.adjust_page_size(-5),
            KeyCode::Enter => {
                if self.mode == AppMode::Search {
                    self.open_detail();
                }
            }
            _ => {}
        }
    }

    fn handle_search_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Enter => self.search_input_active = false,
            KeyCode::Char(c) => {
                let mut term = self.session.search_term().to_string();
                term.push(c);
                self.session.set_search_term(term);
            }
            KeyCode::Backspace => {
                let mut term = self.session.search_term().to_string();
                term.pop();
                self.session.set_search_term(term);
            }
            _ => {}
        }
    }

    fn handle_app_event(&mut self, event: AppEvent) {
        let AppEvent::QueryDone(key) = event;
        let snapshot = self.cache.snapshot(&key);

        if key == self.session.query_key() {
            if let Some(list) = snapshot.data.as_ref().and_then(|data| data.as_list()) {
                self.pagination = Some(list.pagination.clone());
                if self.list_state.selected().is_none() && !list.data.is_empty() {
                    self.list_state.select(Some(0));
                }
            }
            match snapshot.status {
                QueryStatus::Success => {
                    let total = self
                        .pagination
                        .as_ref()
                        .map(|p| p.items.total)
                        .unwrap_or(0);
                    self.set_status(format!("{} titles found", total), StatusType::Success);
                }
                QueryStatus::Error => {
                    let message = snapshot
                        .error
                        .as_ref()
                        .map(|err| err.to_string())
                        .unwrap_or_else(|| "request failed".to_string());
                    self.set_status(message, StatusType::Error);
                }
                _ => {}
            }
        } else if snapshot.status == QueryStatus::Error {
            if let Some(err) = snapshot.error.as_ref() {
                log::debug!("background fetch for {} failed: {}", key, err);
            }
        }
    }
}

// Rendering implementation
impl App {
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search bar
                Constraint::Min(0),    // Body
                Constraint::Length(1), // Status line
                Constraint::Length(1), // Location footer
            ])
            .split(f.size());

        self.render_search_bar(f, chunks[0]);

        match self.mode {
            AppMode::Search => self.render_results(f, chunks[1]),
            AppMode::Detail => self.render_detail(f, chunks[1]),
            AppMode::Help => self.render_help(f, chunks[1]),
        }

        self.render_status(f, chunks[2]);
        self.render_footer(f, chunks[3]);
    }

    fn render_search_bar(&self, f: &mut Frame, area: ratatui::layout::Rect) {
        let border_color = if self.search_input_active {
            theme::BORDER_FOCUS
        } else {
            theme::BORDER
        };

        let term = self.session.search_term();
        let content = if term.is_empty() && !self.search_input_active {
            Line::from(Span::styled(
                "Top anime — press / to search",
                Style::default().fg(theme::TEXT_MUTED),
            ))
        } else {
            let cursor = if self.search_input_active { "█" } else { "" };
            Line::from(vec![
                Span::styled(term.to_string(), Style::default().fg(theme::TEXT_PRIMARY)),
                Span::styled(cursor, Style::default().fg(theme::ACCENT)),
            ])
        };

        let bar = Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(border_color))
                .title(" Search "),
        );
        f.render_widget(bar, area);
    }

    fn render_results(&mut self, f: &mut Frame, area: ratatui::layout::Rect) {
        let key = self.session.query_key();
        let snapshot = self.cache.snapshot(&key);
        let list = self.current_list();

        // Three mutually exclusive empty-area states: loading with nothing
        // to show, a fetch error, or a genuinely empty result set.
        let placeholder_text = match (&list, &snapshot.status) {
            (None, QueryStatus::Error) => {
                let mut text = format!(
                    "Could not load results: {}",
                    snapshot
                        .error
                        .as_ref()
                        .map(|err| err.to_string())
                        .unwrap_or_else(|| "unknown error".to_string())
                );
                if snapshot.error.as_ref().is_some_and(|err| err.is_retryable()) {
                    text.push_str("\nPress r to retry");
                }
                Some((text, theme::ERROR))
            }
            (None, _) => Some(("Loading...".to_string(), theme::TEXT_MUTED)),
            (Some(page), QueryStatus::Success) if page.is_empty() => {
                Some(("No results".to_string(), theme::TEXT_MUTED))
            }
            _ => None,
        };

        if let Some((text, color)) = placeholder_text {
            let paragraph = Paragraph::new(text)
                .style(Style::default().fg(color))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(theme::BORDER))
                        .title(" Results "),
                );
            f.render_widget(paragraph, area);
            return;
        }

        let Some(list) = list else { return };

        // Stale placeholder data renders dimmed while the next page loads
        let fetching = snapshot.is_fetching();
        let width = area.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = list
            .data
            .iter()
            .map(|anime| {
                let mut line = hakken::tui::format_anime_title(anime);
                if fetching {
                    line = line.patch_style(Style::default().add_modifier(Modifier::DIM));
                }
                ListItem::new(Line::from(
                    line.spans
                        .into_iter()
                        .map(|span| {
                            Span::styled(
                                truncate_text(&span.content, width),
                                span.style,
                            )
                        })
                        .collect::<Vec<_>>(),
                ))
            })
            .collect();

        let title = if fetching {
            " Results (loading next page...) "
        } else {
            " Results "
        };

        let widget = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(theme::BORDER))
                    .title(title),
            )
            .highlight_style(
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▸ ");

        f.render_stateful_widget(widget, area, &mut self.list_state);
    }

    fn render_detail(&self, f: &mut Frame, area: ratatui::layout::Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::BORDER))
            .title(" Details ");

        let Some(id) = self.detail_id else {
            f.render_widget(
                Paragraph::new("No title selected").block(block),
                area,
            );
            return;
        };

        let key = QueryKey::detail(id.to_string());
        let snapshot = self.cache.snapshot(&key);
        let detail = snapshot.data.as_ref().and_then(|data| data.as_detail());

        let Some(detail) = detail else {
            let (text, color) = if snapshot.status == QueryStatus::Error {
                if snapshot.error.as_ref().is_some_and(|err| err.is_retryable()) {
                    ("Could not load details. Press r to retry", theme::ERROR)
                } else {
                    ("Could not load details", theme::ERROR)
                }
            } else {
                ("Loading details...", theme::TEXT_MUTED)
            };
            f.render_widget(
                Paragraph::new(text)
                    .style(Style::default().fg(color))
                    .alignment(Alignment::Center)
                    .block(block),
                area,
            );
            return;
        };

        let width = area.width.saturating_sub(4) as usize;
        let mut lines: Vec<Line> = Vec::new();

        lines.push(Line::from(Span::styled(
            detail.display_title().to_string(),
            Style::default()
                .fg(theme::PRIMARY)
                .add_modifier(Modifier::BOLD),
        )));
        if let Some(ref japanese) = detail.title_japanese {
            lines.push(Line::from(Span::styled(
                japanese.clone(),
                Style::default().fg(theme::TEXT_MUTED),
            )));
        }
        lines.push(Line::default());

        let mut facts: Vec<String> = Vec::new();
        if let Some(ref media_type) = detail.media_type {
            facts.push(media_type.clone());
        }
        if let Some(episodes) = detail.episodes {
            facts.push(format!("{} eps", episodes));
        }
        if let Some(ref duration) = detail.duration {
            facts.push(duration.clone());
        }
        if let Some(ref rating) = detail.rating {
            facts.push(rating.clone());
        }
        if !facts.is_empty() {
            lines.push(Line::from(Span::styled(
                facts.join("  ·  "),
                Style::default().fg(theme::TEXT_SECONDARY),
            )));
        }
        if let Some(score) = detail.score {
            lines.push(Line::from(Span::styled(
                format!("★ {:.2}", score),
                Style::default().fg(theme::WARNING),
            )));
        }
        if let Some(aired) = detail.aired.as_ref().and_then(|a| a.display.clone()) {
            lines.push(Line::from(Span::styled(
                format!("Aired: {}", aired),
                Style::default().fg(theme::TEXT_SECONDARY),
            )));
        }
        if !detail.studios.is_empty() {
            let studios: Vec<&str> = detail
                .studios
                .iter()
                .map(|studio| studio.name.as_str())
                .collect();
            lines.push(Line::from(Span::styled(
                format!("Studio: {}", studios.join(", ")),
                Style::default().fg(theme::TEXT_SECONDARY),
            )));
        }

        lines.push(Line::default());
        lines.extend(format_genres(&detail.genres));
        lines.push(Line::default());
        lines.extend(format_synopsis(&detail.synopsis, width));

        f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
    }

    fn render_help(&self, f: &mut Frame, area: ratatui::layout::Rect) {
        let entries = [
            ("/", "Edit the search term"),
            ("↑/↓, j/k", "Move the selection"),
            ("←/→, p/n", "Previous / next page"),
            ("+/-", "More / fewer results per page"),
            ("Enter", "Open details for the selection"),
            ("r", "Retry the current request"),
            ("Esc", "Back (quit from the search view)"),
            ("q", "Quit"),
        ];

        let lines: Vec<Line> = entries
            .iter()
            .map(|(key, description)| {
                Line::from(vec![
                    Span::styled(
                        format!("{:>10}  ", key),
                        Style::default()
                            .fg(theme::ACCENT)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        description.to_string(),
                        Style::default().fg(theme::TEXT_PRIMARY),
                    ),
                ])
            })
            .collect();

        let widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(theme::BORDER))
                .title(" Help "),
        );
        f.render_widget(widget, area);
    }

    fn render_status(&self, f: &mut Frame, area: ratatui::layout::Rect) {
        let mut spans = vec![Span::styled(
            self.status_message.clone(),
            Style::default().fg(self.status_type.color()),
        )];

        if let Some(ref pagination) = self.pagination {
            let footer = format_pagination(pagination);
            spans.push(Span::styled(
                "  ·  ",
                Style::default().fg(theme::TEXT_MUTED),
            ));
            spans.extend(footer.spans);
        }

        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_footer(&self, f: &mut Frame, area: ratatui::layout::Rect) {
        // The shareable location: paste it back as an argument to restore
        // this exact view.
        let footer = Paragraph::new(Line::from(vec![
            Span::styled("hakken-tui ", Style::default().fg(theme::TEXT_MUTED)),
            Span::styled(
                self.session.location().to_string(),
                Style::default().fg(theme::TEXT_SECONDARY),
            ),
        ]))
        .alignment(Alignment::Right);
        f.render_widget(footer, area);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    install()?;
    env_logger::init();

    // An optional query string argument restores a shared view,
    // e.g. `hakken-tui "?q=bleach&page=3"`
    let location = env::args().nth(1);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(location.as_deref());

    // Main loop
    loop {
        app.tick();
        terminal.draw(|f| app.render(f))?;

        // Handle events
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key_event(key.code);
                }
            }
        }

        // Handle app events
        while let Ok(app_event) = app.event_receiver.try_recv() {
            app.handle_app_event(app_event);
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}
