use std::path::PathBuf;
use thiserror::Error;

/// Which side of an identifier pair a duplicate was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Canonical,
    Legacy,
}

impl std::fmt::Display for IdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdKind::Canonical => write!(f, "canonical"),
            IdKind::Legacy => write!(f, "legacy"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ForkfulError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("Duplicate {kind} id in identifier table: {id}")]
    DuplicateIdentifier { kind: IdKind, id: String },

    #[error("Identifier table contains an empty id")]
    EmptyIdentifier,

    #[error("Identifier table was already installed")]
    IdentifiersAlreadyInstalled,

    #[error("Visibility threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("Viewport observation unavailable: {0}")]
    ObserverUnavailable(String),

    #[error("Invalid pull-to-refresh config: {0}")]
    InvalidRefreshConfig(String),
}

pub type Result<T> = std::result::Result<T, ForkfulError>;
