//! View-model glue for a restaurant-discovery UI.
//!
//! - [`ids`]: static mapping between legacy demo ids and canonical storage ids
//! - [`visibility`]: one-shot viewport visibility latches
//! - [`components::pull_refresh`]: pull-to-refresh progress to indicator transform
//!
//! The remaining modules host these pieces in a small terminal feed.

pub mod action;
pub mod app;
pub mod cli;
pub mod components;
pub mod config;
pub mod error;
pub mod ids;
pub mod logging;
pub mod visibility;
