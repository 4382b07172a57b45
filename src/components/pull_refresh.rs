//! Pull-to-refresh indicator: maps pull distance to the indicator's transform

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use serde::{Deserialize, Serialize};

use crate::error::{ForkfulError, Result};

const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPIN_STEP_DEG: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRefreshConfig {
    /// Pull distance (px) at which releasing starts a refresh
    pub trigger_distance: f64,
    /// The indicator stops following the finger past this distance (px)
    pub max_distance: f64,
}

impl Default for PullRefreshConfig {
    fn default() -> Self {
        Self {
            trigger_distance: 80.0,
            max_distance: 120.0,
        }
    }
}

impl PullRefreshConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.trigger_distance.is_finite() && self.trigger_distance > 0.0) {
            return Err(ForkfulError::InvalidRefreshConfig(format!(
                "trigger_distance must be positive, got {}",
                self.trigger_distance
            )));
        }
        if !(self.max_distance.is_finite() && self.max_distance >= self.trigger_distance) {
            return Err(ForkfulError::InvalidRefreshConfig(format!(
                "max_distance ({}) must be at least trigger_distance ({})",
                self.max_distance, self.trigger_distance
            )));
        }
        Ok(())
    }

    /// Fraction of the trigger distance covered, in [0, 1].
    pub fn progress(&self, distance: f64) -> f64 {
        if distance.is_nan() || distance <= 0.0 {
            return 0.0;
        }
        (distance / self.trigger_distance).min(1.0)
    }

    pub fn transform(&self, distance: f64) -> IndicatorTransform {
        let progress = self.progress(distance);
        let distance = if distance.is_nan() { 0.0 } else { distance };
        IndicatorTransform {
            offset_y: distance.clamp(0.0, self.max_distance),
            rotation_deg: progress * 360.0,
            scale: 0.5 + 0.5 * progress,
            opacity: progress,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorTransform {
    pub offset_y: f64,
    pub rotation_deg: f64,
    pub scale: f64,
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullPhase {
    Idle,
    Pulling,
    /// Far enough that releasing starts a refresh
    Armed,
    Refreshing,
}

impl PullPhase {
    pub fn label(&self) -> &'static str {
        match self {
            PullPhase::Idle => "",
            PullPhase::Pulling => "Pull to refresh",
            PullPhase::Armed => "Release to refresh",
            PullPhase::Refreshing => "Refreshing…",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PullRefresh {
    config: PullRefreshConfig,
    distance: f64,
    refreshing: bool,
    spin_deg: f64,
}

impl PullRefresh {
    pub fn new(config: PullRefreshConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            distance: 0.0,
            refreshing: false,
            spin_deg: 0.0,
        })
    }

    pub fn config(&self) -> &PullRefreshConfig {
        &self.config
    }

    /// Set the current pull distance. Ignored while refreshing.
    pub fn pull_to(&mut self, distance: f64) {
        if self.refreshing {
            return;
        }
        self.distance = if distance.is_nan() { 0.0 } else { distance.max(0.0) };
    }

    pub fn pull_by(&mut self, delta: f64) {
        self.pull_to(self.distance + delta);
    }

    /// End the gesture. Returns true if a refresh started.
    pub fn release(&mut self) -> bool {
        if self.refreshing {
            return false;
        }
        let armed = self.phase() == PullPhase::Armed;
        self.distance = 0.0;
        if armed {
            self.refreshing = true;
            self.spin_deg = 0.0;
            tracing::debug!("Pull-to-refresh triggered");
        }
        armed
    }

    pub fn finish(&mut self) {
        if self.refreshing {
            tracing::debug!("Pull-to-refresh finished");
        }
        self.refreshing = false;
        self.distance = 0.0;
        self.spin_deg = 0.0;
    }

    /// Advance the spin while refreshing. Returns true if anything moved.
    pub fn tick(&mut self) -> bool {
        if !self.refreshing {
            return false;
        }
        self.spin_deg = (self.spin_deg + SPIN_STEP_DEG) % 360.0;
        true
    }

    pub fn phase(&self) -> PullPhase {
        if self.refreshing {
            PullPhase::Refreshing
        } else if self.distance <= 0.0 {
            PullPhase::Idle
        } else if self.config.progress(self.distance) >= 1.0 {
            PullPhase::Armed
        } else {
            PullPhase::Pulling
        }
    }

    pub fn progress(&self) -> f64 {
        if self.refreshing {
            1.0
        } else {
            self.config.progress(self.distance)
        }
    }

    pub fn transform(&self) -> IndicatorTransform {
        if self.refreshing {
            return IndicatorTransform {
                offset_y: self.config.trigger_distance,
                rotation_deg: self.spin_deg,
                scale: 1.0,
                opacity: 1.0,
            };
        }
        self.config.transform(self.distance)
    }

    pub fn current_frame(&self) -> &'static str {
        let rotation = self.transform().rotation_deg.rem_euclid(360.0);
        let index = (rotation / (360.0 / BRAILLE_FRAMES.len() as f64)) as usize;
        BRAILLE_FRAMES[index % BRAILLE_FRAMES.len()]
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if area.height == 0 || self.phase() == PullPhase::Idle {
            return;
        }
        let transform = self.transform();
        let level = (80.0 + 175.0 * transform.opacity).round().clamp(0.0, 255.0) as u8;
        let mut style = Style::default().fg(Color::Rgb(level, level, level));
        if transform.scale >= 1.0 {
            style = style.add_modifier(Modifier::BOLD);
        }

        let line = Line::from(vec![
            Span::styled(self.current_frame(), style),
            Span::raw(" "),
            Span::styled(self.phase().label(), style),
        ]);
        // Keep the indicator on the last row of the pulled-down strip
        let row = Rect::new(area.x, area.y + area.height - 1, area.width, 1);
        frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), row);
    }
}
