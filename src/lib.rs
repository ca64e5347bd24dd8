//! Recipe Explorer Library
//!
//! Exposes the cache, resilience helpers, API client and UI state so the
//! binary and the integration tests share one implementation.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod explorer;
pub mod logging;
pub mod resilience;
pub mod ui;
