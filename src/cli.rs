//! Command-line interface parsing for the recipe explorer
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a [`StartupConfig`] plus overrides applied on top of the default [`Config`].

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::{Config, ConfigError};

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// `--search` was given an empty term
    #[error("Invalid search term: the term must not be empty")]
    EmptySearchTerm,

    /// `--concurrency 0`
    #[error("Invalid concurrency: '{0}'. Use a value of at least 1")]
    InvalidConcurrency(usize),

    /// `--timeout-ms 0`
    #[error("Invalid timeout: '{0}'. Use a value of at least 1 millisecond")]
    InvalidTimeout(u64),

    /// `--api-url` is not an http(s) URL
    #[error("Invalid API URL: '{0}'. The URL must start with http:// or https://")]
    InvalidApiUrl(String),
}

/// Recipe Explorer - search TheMealDB from the terminal, with an offline cache
#[derive(Parser, Debug)]
#[command(name = "recipe-explorer")]
#[command(about = "Browse recipes from TheMealDB with an offline-tolerant cache and favorites")]
#[command(version)]
pub struct Cli {
    /// Open directly on the results of a recipe name search
    ///
    /// Example:
    ///   recipe-explorer --search arrabiata
    #[arg(long, value_name = "TERM")]
    pub search: Option<String>,

    /// Ignore fresh cache entries and always ask the API
    #[arg(long)]
    pub refresh: bool,

    /// Remove expired cache entries, print how many were removed, and exit
    #[arg(long)]
    pub evict_expired: bool,

    /// Directory holding the response cache
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Directory holding favorites and the log file
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Base URL of a TheMealDB-compatible API
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Deadline for each fetch in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum number of parallel requests when searching several letters
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
}

/// Validated startup settings derived from CLI arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartupConfig {
    /// Search to run before showing the menu
    pub initial_search: Option<String>,
    /// Bypass fresh cache entries
    pub force_refresh: bool,
    /// Only evict expired cache entries, no UI
    pub evict_only: bool,
    pub cache_dir: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub api_url: Option<String>,
    pub timeout: Option<Duration>,
    pub concurrency: Option<usize>,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if any value is out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let initial_search = match cli.search.as_deref().map(str::trim) {
            Some("") => return Err(CliError::EmptySearchTerm),
            Some(term) => Some(term.to_string()),
            None => None,
        };

        if let Some(concurrency) = cli.concurrency {
            if concurrency == 0 {
                return Err(CliError::InvalidConcurrency(concurrency));
            }
        }

        let timeout = match cli.timeout_ms {
            Some(0) => return Err(CliError::InvalidTimeout(0)),
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        };

        if let Some(url) = &cli.api_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(CliError::InvalidApiUrl(url.clone()));
            }
        }

        Ok(StartupConfig {
            initial_search,
            force_refresh: cli.refresh,
            evict_only: cli.evict_expired,
            cache_dir: cli.cache_dir.clone(),
            data_dir: cli.data_dir.clone(),
            api_url: cli.api_url.clone(),
            timeout,
            concurrency: cli.concurrency,
        })
    }

    /// Resolves the full configuration.
    ///
    /// Platform directories are only consulted when a directory flag is missing.
    pub fn build_config(&self) -> Result<Config, ConfigError> {
        let mut config = match (&self.cache_dir, &self.data_dir) {
            (Some(cache_dir), Some(data_dir)) => Config::from_dirs(cache_dir, data_dir),
            (cache_dir, data_dir) => {
                let mut config = Config::discover()?;
                if let Some(dir) = cache_dir {
                    config.cache_path = Config::from_dirs(dir, dir).cache_path;
                }
                if let Some(dir) = data_dir {
                    let rooted = Config::from_dirs(dir, dir);
                    config.favorites_path = rooted.favorites_path;
                    config.log_path = rooted.log_path;
                }
                config
            }
        };

        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout = timeout;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        config.force_refresh = self.force_refresh;

        Ok(config)
    }
}
