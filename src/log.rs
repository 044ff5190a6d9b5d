//! Logging setup with file output.
//!
//! Neovim owns stdout and stderr, so events only go to a file, and only when
//! one is configured.
//!
//! ## Filter priority
//!
//! 1. **`LINEDIFF_LOG`** (highest priority)
//! 2. **`RUST_LOG`**
//! 3. The `log_level` option (default `warn`)

use crate::error::{Error, Result};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber writing to `path`.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init(path: &Path, level: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .map_err(|e| Error::Logging(format!("{}: {e}", dir.display())))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::Logging(format!("{}: {e}", path.display())))?;

    let layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false);

    if tracing_subscriber::registry()
        .with(create_filter(level)?)
        .with(layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("logging already initialized");
    }
    Ok(())
}

fn create_filter(level: &str) -> Result<EnvFilter> {
    filter_from(
        env::var("LINEDIFF_LOG").ok(),
        env::var("RUST_LOG").ok(),
        level,
    )
}

/// Picks the first directive that is set, in priority order.
fn filter_from(
    linediff_log: Option<String>,
    rust_log: Option<String>,
    level: &str,
) -> Result<EnvFilter> {
    let directive = linediff_log
        .or(rust_log)
        .unwrap_or_else(|| level.to_string());
    EnvFilter::try_new(&directive).map_err(|e| Error::Logging(format!("{directive:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    fn logging_error(result: Result<EnvFilter>) -> String {
        match result {
            Err(Error::Logging(message)) => message,
            other => panic!("expected logging error, got {other:?}"),
        }
    }

    fn max_level(linediff_log: Option<&str>, rust_log: Option<&str>, level: &str) -> LevelFilter {
        filter_from(linediff_log.map(str::to_owned), rust_log.map(str::to_owned), level)
            .unwrap()
            .max_level_hint()
            .unwrap()
    }

    #[test]
    fn filter_priority() {
        assert_eq!(max_level(Some("trace"), Some("warn"), "info"), LevelFilter::TRACE);
        assert_eq!(max_level(None, Some("warn"), "info"), LevelFilter::WARN);
        assert_eq!(max_level(None, None, "debug"), LevelFilter::DEBUG);
    }

    #[test]
    fn invalid_linediff_log_is_reported() {
        let message = logging_error(filter_from(
            Some("linediff_nvim=loud".into()),
            Some("warn".into()),
            "info",
        ));
        assert!(message.contains("linediff_nvim=loud"));
    }

    #[test]
    fn invalid_level_is_ignored_when_env_is_set() {
        assert!(filter_from(None, Some("warn".into()), "linediff_nvim=loud").is_ok());
        let message = logging_error(filter_from(None, None, "linediff_nvim=loud"));
        assert!(message.contains("linediff_nvim=loud"));
    }

    #[test]
    fn missing_parent_directory_is_reported() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // The parent of the log path is a regular file.
        let path = file.path().join("linediff.log");
        let message = match init(&path, "warn") {
            Err(Error::Logging(message)) => message,
            other => panic!("expected logging error, got {other:?}"),
        };
        assert!(message.contains(&file.path().display().to_string()));
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let err = init(dir.path(), "warn").unwrap_err();
        assert!(matches!(err, Error::Logging(_)));
    }

    #[test]
    fn init_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("linediff.log");
        init(&path, "warn").unwrap();
        assert!(path.is_file());
        init(&path, "debug").unwrap();
    }
}
