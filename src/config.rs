//! Runtime configuration
//!
//! Defaults come from the platform's XDG directories; command-line flags
//! override them (see [`crate::cli::StartupConfig::build_config`]).

use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::cache::DEFAULT_TTL_HOURS;
use crate::data::api::THEMEALDB_BASE_URL;
use crate::resilience::RetryPolicy;

/// File name of the cache document inside the cache directory
pub const CACHE_FILE: &str = "cache.json";

/// File name of the favorites document inside the data directory
pub const FAVORITES_FILE: &str = "favorites.json";

/// File name of the log inside the data directory
pub const LOG_FILE: &str = "recipe-explorer.log";

/// Errors resolving the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No home directory, so no default locations
    #[error("Cannot determine cache/data directories; pass --cache-dir and --data-dir")]
    NoProjectDirs,
}

/// Everything the explorer needs to run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub cache_path: PathBuf,
    pub favorites_path: PathBuf,
    pub log_path: PathBuf,
    pub api_base_url: String,
    /// Deadline for a single user-level fetch
    pub request_timeout: Duration,
    /// Maximum parallel requests in a fan-out
    pub concurrency: usize,
    /// Retry policy for lookups by id
    pub retry: RetryPolicy,
    pub cache_ttl: chrono::Duration,
    /// How many related recipes to show
    pub related_limit: usize,
    /// How many random requests to race
    pub random_race: usize,
    /// Ignore fresh cache entries for every fetch
    pub force_refresh: bool,
}

impl Config {
    /// Configuration rooted at explicit directories
    pub fn from_dirs(cache_dir: &Path, data_dir: &Path) -> Self {
        Self {
            cache_path: cache_dir.join(CACHE_FILE),
            favorites_path: data_dir.join(FAVORITES_FILE),
            log_path: data_dir.join(LOG_FILE),
            api_base_url: THEMEALDB_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(8),
            concurrency: 3,
            retry: RetryPolicy::default(),
            cache_ttl: chrono::Duration::hours(DEFAULT_TTL_HOURS),
            related_limit: 5,
            random_race: 3,
            force_refresh: false,
        }
    }

    /// Configuration using XDG-compliant directories
    ///
    /// Uses `~/.cache/recipe-explorer/` and `~/.local/share/recipe-explorer/` on Linux.
    pub fn discover() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("", "", "recipe-explorer").ok_or(ConfigError::NoProjectDirs)?;
        Ok(Self::from_dirs(dirs.cache_dir(), dirs.data_dir()))
    }
}
