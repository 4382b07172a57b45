// Terminal host for the listing feed: crossterm input, ratatui drawing

use std::io::{self, Stdout};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::{
    event, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::action::Action;
use crate::components::feed::{demo_listings, CELL_HEIGHT_PX, CELL_WIDTH_PX};
use crate::components::{Component, Feed, PullRefresh};
use crate::config::AppConfig;
use crate::error::{ForkfulError, Result};
use crate::ids::IdentifierMapper;
use crate::visibility::{HeadlessViewport, VisibilityThreshold};

const TICK_INTERVAL_MS: u64 = 100;

pub struct App {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    feed: Feed,
    should_quit: bool,
    needs_redraw: bool,
    last_tick: Instant,
}

impl App {
    pub fn new(
        config: &AppConfig,
        mapper: &IdentifierMapper,
        threshold: VisibilityThreshold,
    ) -> Result<Self> {
        let pull = PullRefresh::new(config.refresh)?;

        enable_raw_mode().map_err(|e| ForkfulError::Terminal(e.to_string()))?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|e| ForkfulError::Terminal(e.to_string()))?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).map_err(|e| ForkfulError::Terminal(e.to_string()))?;
        let size = terminal.size().map_err(|e| ForkfulError::Terminal(e.to_string()))?;

        let viewport = Rc::new(HeadlessViewport::new(
            f64::from(size.width) * CELL_WIDTH_PX,
            f64::from(size.height.saturating_sub(1)) * CELL_HEIGHT_PX,
        ));
        let feed = Feed::new(
            viewport,
            demo_listings(mapper),
            config.feed.clone(),
            threshold,
            pull,
        );
        tracing::info!("Feed ready: {} listings, threshold {}", feed.card_count(), threshold.ratio());

        Ok(Self {
            terminal,
            feed,
            should_quit: false,
            needs_redraw: true,
            last_tick: Instant::now(),
        })
    }

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            other => self.feed.update(&other),
        }
        self.needs_redraw = true;
    }

    fn draw(&mut self) -> Result<()> {
        let feed = &self.feed;
        self.terminal
            .draw(|frame| {
                let area = frame.area();
                feed.render(frame, area);
            })
            .map_err(|e| ForkfulError::Terminal(e.to_string()))?;
        Ok(())
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            // Tick (drives pull release, refresh spin, visibility polling)
            if self.last_tick.elapsed() >= Duration::from_millis(TICK_INTERVAL_MS) {
                self.dispatch(Action::Tick);
                self.last_tick = Instant::now();
            }

            if event::poll(Duration::from_millis(16)).map_err(|e| ForkfulError::Terminal(e.to_string()))? {
                let event = event::read().map_err(|e| ForkfulError::Terminal(e.to_string()))?;
                if let Some(action) = self.feed.handle_event(&event) {
                    self.dispatch(action);
                }
            }

            if self.should_quit {
                break;
            }

            if self.needs_redraw {
                self.draw()?;
                self.needs_redraw = false;
            }
        }

        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}
