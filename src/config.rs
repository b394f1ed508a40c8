//! Configuration loader and validator for the approvals dashboard client.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides `backend.api_key`.
pub const API_KEY_ENV: &str = "BACKEND_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub backend: Backend,
}

/// Refresh policy for notification views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

/// Hosted backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Backend {
    pub endpoint: String,
    pub project_id: String,
    pub api_key: String,
    pub collections: Collections,
}

/// Collection names inside the backend's document store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Collections {
    pub notifications: String,
    pub orders: String,
    pub price_lists: String,
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_stale_after_secs() -> u64 {
    20
}

impl App {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

impl Backend {
    /// Parsed endpoint, always ending in `/` so relative joins keep any path prefix.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let mut raw = self.endpoint.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|_| ConfigError::Invalid("backend.endpoint must be a valid URL"))
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
/// - `BACKEND_API_KEY`, when set and non-empty, replaces `backend.api_key`.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let mut cfg: Config = serde_yaml::from_str(&content)?;
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.trim().is_empty() {
            cfg.backend.api_key = key;
        }
    }
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.poll_interval_secs == 0 {
        return Err(ConfigError::Invalid("app.poll_interval_secs must be > 0"));
    }
    if cfg.app.stale_after_secs > cfg.app.poll_interval_secs {
        return Err(ConfigError::Invalid(
            "app.stale_after_secs must not exceed app.poll_interval_secs",
        ));
    }

    if cfg.backend.endpoint.trim().is_empty() {
        return Err(ConfigError::Invalid("backend.endpoint must be non-empty"));
    }
    cfg.backend.endpoint_url()?;
    if cfg.backend.project_id.trim().is_empty() {
        return Err(ConfigError::Invalid("backend.project_id must be non-empty"));
    }
    if cfg.backend.api_key.trim().is_empty() {
        return Err(ConfigError::Invalid("backend.api_key must be non-empty"));
    }

    let c = &cfg.backend.collections;
    if c.notifications.trim().is_empty() {
        return Err(ConfigError::Invalid("backend.collections.notifications must be non-empty"));
    }
    if c.orders.trim().is_empty() {
        return Err(ConfigError::Invalid("backend.collections.orders must be non-empty"));
    }
    if c.price_lists.trim().is_empty() {
        return Err(ConfigError::Invalid("backend.collections.price_lists must be non-empty"));
    }

    Ok(())
}

/// Returns the example YAML content.
pub fn example() -> &'static str {
    r#"app:
  poll_interval_secs: 30
  stale_after_secs: 20

backend:
  endpoint: "https://backend.example.com/"
  project_id: "YOUR_PROJECT_ID"
  api_key: "YOUR_BACKEND_API_KEY"
  collections:
    notifications: "notifications"
    orders: "orders"
    price_lists: "price_lists"
"#
}
