pub mod feed;
pub mod pull_refresh;

use crossterm::event::Event;
use ratatui::{layout::Rect, Frame};

use crate::action::Action;

pub use feed::{Feed, FeedConfig};
pub use pull_refresh::{IndicatorTransform, PullPhase, PullRefresh, PullRefreshConfig};

pub trait Component {
    fn handle_event(&mut self, event: &Event) -> Option<Action>;

    fn update(&mut self, action: &Action);

    fn render(&self, frame: &mut Frame, area: Rect);
}
