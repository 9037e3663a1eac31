//! KDL schema for config.kdl.
//!
//! ```kdl
//! backend-url "http://localhost:8001"
//! settle-delay-ms 1000
//! request-timeout-secs 120
//! log-level "info"
//! ```
//!
//! Every key is optional; unset keys fall through to environment or
//! built-in defaults in the [`resolver`](super::resolver).

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Backend used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Keys accepted by `brief config set`.
pub const CONFIG_KEYS: [&str; 4] = [
    "backend-url",
    "settle-delay-ms",
    "request-timeout-secs",
    "log-level",
];

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a backend URL and strip any trailing slash.
pub fn normalize_backend_url(url: &str) -> Result<String> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::Config(format!(
            "backend-url must start with http:// or https://, got {url:?}"
        )));
    }
    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with("://") {
        return Err(Error::Config(format!("backend-url has no host: {url:?}")));
    }
    Ok(trimmed.to_string())
}

/// User preferences stored in config.kdl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BriefConfig {
    /// Backend origin, e.g. `http://localhost:8001`
    pub backend_url: Option<String>,

    /// Delay before a finished upload resets to idle
    pub settle_delay_ms: Option<u64>,

    /// HTTP request timeout
    pub request_timeout_secs: Option<u64>,

    /// tracing filter directive (`info`, `brief=debug`, ...)
    pub log_level: Option<String>,
}

impl BriefConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref url) = self.backend_url {
            normalize_backend_url(url)?;
        }
        if self.request_timeout_secs == Some(0) {
            return Err(Error::Config(
                "request-timeout-secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse config from a KDL document. Entries of the wrong type are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        config.backend_url = first_string(doc, "backend-url");
        config.log_level = first_string(doc, "log-level");
        config.settle_delay_ms = first_u64(doc, "settle-delay-ms");
        config.request_timeout_secs = first_u64(doc, "request-timeout-secs");

        config
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref url) = self.backend_url {
            push_node(&mut doc, "backend-url", KdlValue::String(url.clone()));
        }
        if let Some(delay) = self.settle_delay_ms {
            push_node(&mut doc, "settle-delay-ms", KdlValue::Integer(delay as i128));
        }
        if let Some(timeout) = self.request_timeout_secs {
            push_node(
                &mut doc,
                "request-timeout-secs",
                KdlValue::Integer(timeout as i128),
            );
        }
        if let Some(ref level) = self.log_level {
            push_node(&mut doc, "log-level", KdlValue::String(level.clone()));
        }

        doc
    }

    /// Set one key from its textual form (`brief config set`).
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "backend-url" => self.backend_url = Some(normalize_backend_url(value)?),
            "settle-delay-ms" => self.settle_delay_ms = Some(parse_u64(key, value)?),
            "request-timeout-secs" => {
                let secs = parse_u64(key, value)?;
                if secs == 0 {
                    return Err(Error::Config(format!("{key} must be greater than 0")));
                }
                self.request_timeout_secs = Some(secs);
            }
            "log-level" => {
                let level = value.trim().to_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(Error::Config(format!(
                        "log-level must be one of {}, got {value:?}",
                        LOG_LEVELS.join(", ")
                    )));
                }
                self.log_level = Some(level);
            }
            _ => {
                return Err(Error::Config(format!(
                    "unknown key {key:?} (expected one of {})",
                    CONFIG_KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

fn first_value<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a KdlValue> {
    doc.get(name)?.entries().first().map(|e| e.value())
}

fn first_string(doc: &KdlDocument, name: &str) -> Option<String> {
    first_value(doc, name)?.as_string().map(str::to_string)
}

fn first_u64(doc: &KdlDocument, name: &str) -> Option<u64> {
    let value = first_value(doc, name)?.as_integer()?;
    u64::try_from(value).ok()
}

fn push_node(doc: &mut KdlDocument, name: &str, value: KdlValue) {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(value));
    doc.nodes_mut().push(node);
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {value:?}")))
}
