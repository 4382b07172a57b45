use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::components::pull_refresh::{PullPhase, PullRefresh};
use crate::components::Component;
use crate::ids::IdentifierMapper;
use crate::visibility::{
    ElementBounds, ElementId, HeadlessViewport, ObservationPlatform, VisibilityThreshold,
    VisibilityTracker,
};

/// One terminal row is laid out as this many viewport pixels
pub const CELL_HEIGHT_PX: f64 = 16.0;
pub const CELL_WIDTH_PX: f64 = 8.0;

const STATUS_ROWS: u16 = 1;
const PLACEHOLDER_LISTINGS: usize = 8;
// No key-up events in a terminal: a pull ends once input stops for this long
const RELEASE_AFTER: Duration = Duration::from_millis(400);
const REFRESH_TICKS: u32 = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Card height in terminal rows, borders included
    pub card_height: u16,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { card_height: 5 }
    }
}

/// A restaurant entry with its ids already resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub name: String,
    pub canonical: String,
    pub legacy: Option<String>,
    pub rich_legacy_data: bool,
}

impl Listing {
    pub fn resolve(id: &str, mapper: &IdentifierMapper) -> Self {
        let canonical = mapper.resolve_canonical(id).to_string();
        let legacy = mapper.resolve_legacy(&canonical).map(str::to_string);
        let rich_legacy_data = mapper.has_rich_legacy_data(&canonical);
        let name = match &legacy {
            Some(slug) => display_name(slug),
            None => display_name(id),
        };
        Self {
            name,
            canonical,
            legacy,
            rich_legacy_data,
        }
    }
}

/// Every legacy listing from `mapper`, followed by placeholder listings that
/// only have canonical ids.
pub fn demo_listings(mapper: &IdentifierMapper) -> Vec<Listing> {
    let legacy_ids: Vec<String> = mapper.pairs().map(|(_, legacy)| legacy.to_string()).collect();
    let placeholders = (1..=PLACEHOLDER_LISTINGS).map(|n| format!("listing-{:02}", n));
    legacy_ids
        .into_iter()
        .chain(placeholders)
        .map(|id| Listing::resolve(&id, mapper))
        .collect()
}

fn display_name(slug: &str) -> String {
    slug.trim_end_matches("-demo")
        .split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

struct Card {
    element: ElementId,
    tracker: VisibilityTracker,
}

/// Scrollable listing feed; cards fade in once their tracker latches
pub struct Feed {
    viewport: Rc<HeadlessViewport>,
    listings: Vec<Listing>,
    cards: Vec<Card>,
    config: FeedConfig,
    threshold: VisibilityThreshold,
    pull: PullRefresh,
    last_pull: Option<Instant>,
    refresh_ticks: u32,
}

impl Feed {
    pub fn new(
        viewport: Rc<HeadlessViewport>,
        listings: Vec<Listing>,
        config: FeedConfig,
        threshold: VisibilityThreshold,
        pull: PullRefresh,
    ) -> Self {
        let mut feed = Self {
            viewport,
            listings,
            cards: Vec::new(),
            config,
            threshold,
            pull,
            last_pull: None,
            refresh_ticks: 0,
        };
        feed.build_cards();
        feed
    }

    fn card_px(&self) -> f64 {
        f64::from(self.config.card_height.max(1)) * CELL_HEIGHT_PX
    }

    fn build_cards(&mut self) {
        let card_px = self.card_px();
        let width = self.viewport.width();
        self.cards = (0..self.listings.len())
            .map(|i| {
                let bounds = ElementBounds::new(0.0, i as f64 * card_px, width, card_px);
                let element = self.viewport.place(bounds);
                let tracker =
                    VisibilityTracker::attach(self.viewport.clone(), element, self.threshold);
                Card { element, tracker }
            })
            .collect();
        tracing::debug!(
            "Feed laid out {} cards, {} visible at mount",
            self.cards.len(),
            self.visible_count()
        );
    }

    /// Drop every card (releasing its tracker) and lay the feed out again.
    fn reload(&mut self) {
        for card in std::mem::take(&mut self.cards) {
            let element = card.element;
            drop(card);
            self.viewport.remove(element);
        }
        self.viewport.scroll_to(0.0);
        self.build_cards();
    }

    fn max_scroll(&self) -> f64 {
        let content = self.listings.len() as f64 * self.card_px();
        (content - self.viewport.viewport_height()).max(0.0)
    }

    fn poll_cards(&mut self) {
        for card in &mut self.cards {
            card.tracker.poll();
        }
    }

    fn scroll_down(&mut self, rows: u16) {
        let delta = f64::from(rows) * CELL_HEIGHT_PX;
        if self.pull.phase() == PullPhase::Pulling || self.pull.phase() == PullPhase::Armed {
            self.pull.pull_by(-delta);
            self.last_pull = Some(Instant::now());
            return;
        }
        let target = (self.viewport.scroll_y() + delta).min(self.max_scroll());
        self.viewport.scroll_to(target);
    }

    fn scroll_up(&mut self, rows: u16) {
        let delta = f64::from(rows) * CELL_HEIGHT_PX;
        let current = self.viewport.scroll_y();
        if current > 0.0 {
            self.viewport.scroll_to((current - delta).max(0.0));
        } else if self.pull.phase() != PullPhase::Refreshing {
            self.pull.pull_by(delta);
            self.last_pull = Some(Instant::now());
        }
    }

    fn tick(&mut self) {
        self.poll_cards();

        if self
            .last_pull
            .is_some_and(|at| at.elapsed() >= RELEASE_AFTER)
        {
            self.last_pull = None;
            if self.pull.release() {
                self.refresh_ticks = 0;
            }
        }

        if self.pull.tick() {
            self.refresh_ticks += 1;
            if self.refresh_ticks >= REFRESH_TICKS {
                self.pull.finish();
                self.reload();
            }
        }
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        let width = f64::from(cols) * CELL_WIDTH_PX;
        let height = f64::from(rows.saturating_sub(STATUS_ROWS)) * CELL_HEIGHT_PX;
        self.viewport.resize(width, height);

        let card_px = self.card_px();
        for (i, card) in self.cards.iter().enumerate() {
            let bounds = ElementBounds::new(0.0, i as f64 * card_px, width, card_px);
            self.viewport.move_element(card.element, bounds);
        }
        let max = self.max_scroll();
        if self.viewport.scroll_y() > max {
            self.viewport.scroll_to(max);
        }
    }

    pub fn visible_count(&self) -> usize {
        self.cards.iter().filter(|c| c.tracker.is_visible()).count()
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn pull_phase(&self) -> PullPhase {
        self.pull.phase()
    }

    pub fn scroll_y(&self) -> f64 {
        self.viewport.scroll_y()
    }

    fn handle_key(&self, key: KeyEvent) -> Option<Action> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::ScrollDown(1)),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::ScrollUp(1)),
            KeyCode::PageDown => Some(Action::ScrollDown(self.config.card_height.saturating_mul(2))),
            KeyCode::PageUp => Some(Action::ScrollUp(self.config.card_height.saturating_mul(2))),
            _ => None,
        }
    }

    fn render_card(&self, frame: &mut Frame, area: Rect, listing: &Listing, visible: bool) {
        let (border, text) = if visible {
            (Style::default().fg(Color::Cyan), Style::default().fg(Color::White))
        } else {
            (Style::default().fg(Color::DarkGray), Style::default().fg(Color::DarkGray))
        };

        let block = Block::default()
            .title(format!(" {} ", listing.name))
            .title_style(border.add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(border);

        let legacy = match &listing.legacy {
            Some(slug) => Span::styled(format!("legacy: {}", slug), text),
            None => Span::styled(
                "legacy: none",
                text.add_modifier(Modifier::ITALIC),
            ),
        };
        let mut lines = vec![
            Line::from(Span::styled(format!("id: {}", listing.canonical), text)),
            Line::from(legacy),
        ];
        if listing.rich_legacy_data {
            lines.push(Line::from(Span::styled(
                "★ rich presentation data",
                text.fg(if visible { Color::Yellow } else { Color::DarkGray }),
            )));
        }

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

impl Component for Feed {
    fn handle_event(&mut self, event: &Event) -> Option<Action> {
        match event {
            Event::Key(key) => self.handle_key(*key),
            Event::Resize(cols, rows) => Some(Action::Resize {
                cols: *cols,
                rows: *rows,
            }),
            _ => None,
        }
    }

    fn update(&mut self, action: &Action) {
        match action {
            Action::ScrollDown(rows) => self.scroll_down(*rows),
            Action::ScrollUp(rows) => self.scroll_up(*rows),
            Action::Resize { cols, rows } => self.resize(*cols, *rows),
            Action::Tick => self.tick(),
            Action::Quit => {}
        }
        self.poll_cards();
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        if area.height <= STATUS_ROWS {
            return;
        }
        let body_height = area.height - STATUS_ROWS;

        let mut indicator_rows = (self.pull.transform().offset_y / CELL_HEIGHT_PX).round() as u16;
        if self.pull.phase() != PullPhase::Idle {
            indicator_rows = indicator_rows.max(1);
        }
        let indicator_rows = indicator_rows.min(body_height);
        self.pull
            .render(frame, Rect::new(area.x, area.y, area.width, indicator_rows));

        let feed_top = i32::from(indicator_rows);
        let feed_bottom = i32::from(body_height);
        for (card, listing) in self.cards.iter().zip(&self.listings) {
            let Some(bounds) = self.viewport.bounding_rect(card.element) else {
                continue;
            };
            let top = feed_top + (bounds.top / CELL_HEIGHT_PX).round() as i32;
            let bottom = feed_top + (bounds.bottom / CELL_HEIGHT_PX).round() as i32;
            let top = top.max(feed_top);
            let bottom = bottom.min(feed_bottom);
            if bottom <= top {
                continue;
            }
            let card_area = Rect::new(
                area.x,
                area.y + top as u16,
                area.width,
                (bottom - top) as u16,
            );
            self.render_card(frame, card_area, listing, card.tracker.is_visible());
        }

        let status = Line::from(vec![
            Span::styled(
                format!(" visible {}/{} ", self.visible_count(), self.card_count()),
                Style::default().fg(Color::Black).bg(Color::Cyan),
            ),
            Span::styled(
                "  j/k scroll · k at top to pull · q quit",
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(
            Paragraph::new(status),
            Rect::new(area.x, area.y + body_height, area.width, STATUS_ROWS),
        );
    }
}
