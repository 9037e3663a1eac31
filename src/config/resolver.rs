//! Precedence resolution for configuration.
//!
//! ## Backend URL precedence (highest to lowest)
//!
//! 1. `--backend-url` CLI flag
//! 2. `BRIEF_BACKEND_URL` environment variable
//! 3. config.kdl
//! 4. Built-in default (`http://localhost:8001`)
//!
//! The remaining settings come from config.kdl or fall back to defaults.

use std::time::Duration;

use serde::Serialize;

use crate::Result;
use crate::config::schema::{
    BriefConfig, DEFAULT_BACKEND_URL, DEFAULT_LOG_LEVEL, DEFAULT_REQUEST_TIMEOUT_SECS,
    normalize_backend_url,
};
use crate::upload::DEFAULT_SETTLE_DELAY;

/// Environment variable name for the backend URL override.
pub const BACKEND_URL_ENV: &str = "BRIEF_BACKEND_URL";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl
    File,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::File => write!(f, "file"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

impl Serialize for ValueSource {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, Serialize)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub backend_url: Resolved<String>,
    pub settle_delay_ms: Resolved<u64>,
    pub request_timeout_secs: Resolved<u64>,
    pub log_level: Resolved<String>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            backend_url: Resolved::new(DEFAULT_BACKEND_URL.to_string(), ValueSource::Default),
            settle_delay_ms: Resolved::new(
                DEFAULT_SETTLE_DELAY.as_millis() as u64,
                ValueSource::Default,
            ),
            request_timeout_secs: Resolved::new(
                DEFAULT_REQUEST_TIMEOUT_SECS,
                ValueSource::Default,
            ),
            log_level: Resolved::new(DEFAULT_LOG_LEVEL.to_string(), ValueSource::Default),
        }
    }
}

impl ResolvedConfig {
    pub fn backend_url(&self) -> &str {
        &self.backend_url.value
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms.value)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.value)
    }

    pub fn log_level(&self) -> &str {
        &self.log_level.value
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Backend URL from `--backend-url`
    pub backend_url: Option<String>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into());
        self
    }
}

/// Resolve configuration from config.kdl, the environment and `overrides`.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let file = super::read_config()?;
    let env_url = std::env::var(BACKEND_URL_ENV).ok();
    resolve_with(&file, env_url.as_deref(), overrides)
}

/// Resolve from explicit inputs. Empty environment values are ignored.
pub fn resolve_with(
    file: &BriefConfig,
    env_url: Option<&str>,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig> {
    let mut result = ResolvedConfig::default();

    // Resolve backend_url
    if let Some(ref url) = overrides.backend_url {
        result.backend_url = Resolved::new(normalize_backend_url(url)?, ValueSource::CliFlag);
    } else if let Some(url) = env_url.filter(|u| !u.trim().is_empty()) {
        result.backend_url = Resolved::new(
            normalize_backend_url(url)?,
            ValueSource::EnvVar(BACKEND_URL_ENV.to_string()),
        );
    } else if let Some(ref url) = file.backend_url {
        result.backend_url = Resolved::new(normalize_backend_url(url)?, ValueSource::File);
    }

    if let Some(delay) = file.settle_delay_ms {
        result.settle_delay_ms = Resolved::new(delay, ValueSource::File);
    }
    if let Some(timeout) = file.request_timeout_secs.filter(|t| *t > 0) {
        result.request_timeout_secs = Resolved::new(timeout, ValueSource::File);
    }
    if let Some(ref level) = file.log_level {
        result.log_level = Resolved::new(level.clone(), ValueSource::File);
    }

    Ok(result)
}
