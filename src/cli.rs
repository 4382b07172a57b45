use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::ids::IdentifierMapper;
use crate::visibility::VisibilityThreshold;

/// Forkful: restaurant feed view-model tools (id mapping, visibility latches, pull-to-refresh)
#[derive(Parser, Debug, Clone)]
#[command(name = "forkful")]
#[command(version)]
#[command(about = "Restaurant feed view-model tools", long_about = None)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error). Overrides config; RUST_LOG overrides both.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Read config.toml and identifiers.toml from this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Resolve an id through the identifier table
    Resolve {
        id: String,
        /// Print the result as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List the installed identifier pairs
    Pairs,
    /// Browse the demo feed in the terminal (default)
    Browse {
        /// Visibility threshold in [0, 1]; overrides config
        #[arg(long, value_parser = parse_threshold)]
        threshold: Option<VisibilityThreshold>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Browse { threshold: None })
    }
}

fn parse_threshold(s: &str) -> std::result::Result<VisibilityThreshold, String> {
    let ratio: f64 = s.parse().map_err(|e| format!("not a number: {}", e))?;
    VisibilityThreshold::new(ratio).map_err(|e| e.to_string())
}

/// Output of `forkful resolve`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub input: String,
    pub canonical: String,
    pub legacy: Option<String>,
    pub rich_legacy_data: bool,
}

impl Resolution {
    pub fn lookup(mapper: &IdentifierMapper, id: &str) -> Self {
        let canonical = mapper.resolve_canonical(id).to_string();
        Self {
            input: id.to_string(),
            legacy: mapper.resolve_legacy(&canonical).map(str::to_string),
            rich_legacy_data: mapper.has_rich_legacy_data(id),
            canonical,
        }
    }

    pub fn to_text(&self) -> String {
        format!(
            "canonical: {}\nlegacy:    {}\nrich data: {}",
            self.canonical,
            self.legacy.as_deref().unwrap_or("(none)"),
            if self.rich_legacy_data { "yes" } else { "no" }
        )
    }
}
