//! View configuration.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration. The server address can additionally be overridden from the
//! `HOST` and `PORT` environment variables.

use crate::error::Result;
use crate::shading::ShadingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Debounce delays of the recompute scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Checkbox and numeric input changes
    pub toggle_ms: u64,
    /// Free-text search input
    pub search_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        DebounceConfig {
            toggle_ms: 200,
            search_ms: 300,
        }
    }
}

impl DebounceConfig {
    pub fn toggle(&self) -> Duration {
        Duration::from_millis(self.toggle_ms)
    }

    pub fn search(&self) -> Duration {
        Duration::from_millis(self.search_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub debounce: DebounceConfig,
    pub shading: ShadingConfig,
    /// Column sorted descending when a session starts
    pub initial_sort: Option<String>,
    pub server: ServerConfig,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            debounce: DebounceConfig::default(),
            shading: ShadingConfig::default(),
            initial_sort: Some("user_comment_state".to_string()),
            server: ServerConfig::default(),
        }
    }
}

impl ViewConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Override the server address from `HOST` / `PORT`
    pub fn apply_env(mut self) -> Self {
        self.apply_overrides(std::env::var("HOST").ok(), std::env::var("PORT").ok());
        self
    }

    fn apply_overrides(&mut self, host: Option<String>, port: Option<String>) {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => log::warn!("ignoring invalid PORT '{}'", port),
            }
        }
    }

    /// `host:port` of the server
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewConfig::default();
        assert_eq!(config.debounce.toggle(), Duration::from_millis(200));
        assert_eq!(config.debounce.search(), Duration::from_millis(300));
        assert_eq!(config.initial_sort.as_deref(), Some("user_comment_state"));
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.shading.journal_hue, 210.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ViewConfig::from_json_str(
            r#"{"debounce": {"search_ms": 500}, "initial_sort": null, "server": {"port": 9000}}"#,
        )
        .unwrap();
        assert_eq!(config.debounce.toggle_ms, 200);
        assert_eq!(config.debounce.search_ms, 500);
        assert_eq!(config.initial_sort, None);
        assert_eq!(config.bind_address(), "127.0.0.1:9000");

        assert_eq!(ViewConfig::from_json_str("{}").unwrap(), ViewConfig::default());
        assert!(ViewConfig::from_json_str("{\"server\": 3}").is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = ViewConfig::default();
        config.apply_overrides(Some("0.0.0.0".to_string()), Some("not-a-port".to_string()));
        assert_eq!(config.bind_address(), "0.0.0.0:8080");

        config.apply_overrides(None, Some("3000".to_string()));
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ViewConfig::from_file("/nonexistent/papertable.json"),
            Err(crate::error::Error::Io(_))
        ));
    }
}
