//! Log file setup
//!
//! The terminal belongs to the UI, so log lines go to a file in the data
//! directory. Verbosity follows `RECIPE_EXPLORER_LOG` (an `EnvFilter`
//! directive such as `debug` or `recipe_explorer::cache=trace`), default `info`.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "RECIPE_EXPLORER_LOG";

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Cannot open log file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("A global logger is already installed")]
    AlreadyInstalled,
}

/// Filter from `RECIPE_EXPLORER_LOG`, falling back to `info`
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs a global subscriber appending to `log_path`
pub fn init(log_path: &Path) -> Result<(), LoggingError> {
    let io_error = |source| LoggingError::Io {
        path: log_path.display().to_string(),
        source,
    };

    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(io_error)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_env_filter_has_a_default() {
        let filter = env_filter();
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn test_init_creates_log_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("explorer.log");

        // Another test may already own the global subscriber
        let _ = init(&path);

        assert!(path.exists());
    }
}
