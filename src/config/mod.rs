//! Configuration for Brief.
//!
//! ## config.kdl - User preferences
//!
//! Located at `~/.config/brief/config.kdl` (or `$BRIEF_CONFIG_DIR/config.kdl`).
//!
//! Contains:
//! - `backend-url` - Backend origin
//! - `settle-delay-ms` - Delay before a finished upload resets
//! - `request-timeout-secs` - HTTP request timeout
//! - `log-level` - tracing filter
//!
//! ## Precedence
//!
//! For the backend URL: CLI flag > `BRIEF_BACKEND_URL` > config.kdl > default.
//! For everything else: config.kdl > default.
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

use std::fs;
use std::path::PathBuf;

use kdl::KdlDocument;

use crate::{Error, Result};

pub use resolver::{
    BACKEND_URL_ENV, ConfigOverrides, Resolved, ResolvedConfig, ValueSource, resolve_config,
    resolve_with,
};
pub use schema::{
    BriefConfig, CONFIG_KEYS, DEFAULT_BACKEND_URL, DEFAULT_LOG_LEVEL,
    DEFAULT_REQUEST_TIMEOUT_SECS, normalize_backend_url,
};

/// Overrides the config directory (tests, sandboxes).
pub const CONFIG_DIR_ENV: &str = "BRIEF_CONFIG_DIR";

/// Overrides the data directory holding log files.
pub const DATA_DIR_ENV: &str = "BRIEF_DATA_DIR";

/// Directory holding config.kdl.
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|d| d.join("brief"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Full path of config.kdl.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.kdl"))
}

/// Directory for runtime files (TUI log files).
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|d| d.join("brief"))
        .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))
}

/// Read config.kdl. A missing file is an empty config.
pub fn read_config() -> Result<BriefConfig> {
    let path = config_path()?;
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BriefConfig::new()),
        Err(e) => return Err(e.into()),
    };
    let doc: KdlDocument = content
        .parse()
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
    Ok(BriefConfig::from_kdl(&doc))
}

/// Write config.kdl, creating the directory if needed. Returns the path.
pub fn write_config(config: &BriefConfig) -> Result<PathBuf> {
    config.validate()?;
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, config.to_kdl().to_string())?;
    tracing::debug!(path = %path.display(), "config written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_read_missing_config_is_empty() {
        let dir = TempDir::new().unwrap();
        // SAFETY: serialised with the other env-touching tests
        unsafe { std::env::set_var(CONFIG_DIR_ENV, dir.path()) };

        assert_eq!(read_config().unwrap(), BriefConfig::default());

        unsafe { std::env::remove_var(CONFIG_DIR_ENV) };
    }

    #[test]
    #[serial]
    fn test_write_then_read_config() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        unsafe { std::env::set_var(CONFIG_DIR_ENV, &nested) };

        let mut config = BriefConfig::new();
        config.set("backend-url", "http://example.test:8001").unwrap();
        config.set("settle-delay-ms", "10").unwrap();
        let path = write_config(&config).unwrap();

        assert_eq!(path, nested.join("config.kdl"));
        assert_eq!(read_config().unwrap(), config);

        unsafe { std::env::remove_var(CONFIG_DIR_ENV) };
    }

    #[test]
    #[serial]
    fn test_read_invalid_kdl_is_config_error() {
        let dir = TempDir::new().unwrap();
        unsafe { std::env::set_var(CONFIG_DIR_ENV, dir.path()) };
        fs::write(dir.path().join("config.kdl"), "backend-url \"unterminated").unwrap();

        assert!(matches!(read_config(), Err(Error::Config(_))));

        unsafe { std::env::remove_var(CONFIG_DIR_ENV) };
    }
}
