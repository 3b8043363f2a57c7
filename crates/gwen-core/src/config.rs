//! Client configuration.
//!
//! Read from `~/.config/gwen/config.toml` when present. Every field has a
//! default, so a missing file or a partial file is fine. `GWEN_API_URL` and
//! `GWEN_MODEL` override the backend address and the preferred model.

use crate::error::{GwenError, Result};
use crate::event::NotificationSettings;
use crate::retry::RetryPlan;
use crate::session::PREFERRED_MODEL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 30;

pub const API_URL_ENV: &str = "GWEN_API_URL";
pub const MODEL_ENV: &str = "GWEN_MODEL";

/// Root configuration structure for config.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the workspace backend (without the `/api` suffix).
    pub api_base_url: String,
    /// Model pre-selected in the catalog and used as the fallback entry.
    pub preferred_model: String,
    pub health_retry: RetryPlan,
    pub model_retry: RetryPlan,
    /// Cadence of the background health heartbeat.
    pub heartbeat_interval_secs: u64,
    /// Per-request timeout for non-streaming calls. Unset means no timeout.
    pub request_timeout_secs: Option<u64>,
    /// Maximum silence between two chat chunks before the turn is abandoned.
    /// Unset means the client waits indefinitely.
    pub chat_stall_timeout_secs: Option<u64>,
    pub notifications: NotificationSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            preferred_model: PREFERRED_MODEL.to_string(),
            health_retry: RetryPlan::default(),
            model_retry: RetryPlan::default(),
            heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL_SECS,
            request_timeout_secs: None,
            chat_stall_timeout_secs: None,
            notifications: NotificationSettings::default(),
        }
    }
}

impl ClientConfig {
    /// Loads the configuration from the default location, then applies
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let config = match default_config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Loads the configuration from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(
                "[ClientConfig] No configuration file at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!("[ClientConfig] Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Applies `GWEN_API_URL` / `GWEN_MODEL` using the given lookup.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.preferred_model = model;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(GwenError::config("api_base_url must not be empty"));
        }
        if self.preferred_model.trim().is_empty() {
            return Err(GwenError::config("preferred_model must not be empty"));
        }
        if self.heartbeat_interval_secs == 0 {
            return Err(GwenError::config("heartbeat_interval_secs must be positive"));
        }
        for (name, plan) in [
            ("health_retry", &self.health_retry),
            ("model_retry", &self.model_retry),
        ] {
            if plan.delay_ms == 0 {
                return Err(GwenError::config(format!("{name}.delay_ms must be positive")));
            }
        }
        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn chat_stall_timeout(&self) -> Option<Duration> {
        self.chat_stall_timeout_secs.map(Duration::from_secs)
    }
}

/// Returns the path to the configuration file: ~/.config/gwen/config.toml
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gwen").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ClientConfig::load_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(30));
        assert!(config.chat_stall_timeout().is_none());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
api_base_url = "http://localhost:8080"
chat_stall_timeout_secs = 120

[model_retry]
attempts_remaining = 5
delay_ms = 500
"#,
        )
        .unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.model_retry, RetryPlan::new(5, 500));
        assert_eq!(config.health_retry, RetryPlan::default());
        assert_eq!(config.preferred_model, PREFERRED_MODEL);
        assert_eq!(config.chat_stall_timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "api_base_url = [").unwrap();

        let err = ClientConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, GwenError::Serialization { .. }));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "heartbeat_interval_secs = 0").unwrap();

        let err = ClientConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, GwenError::Config(_)));
    }

    #[test]
    fn test_zero_retry_delay_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[health_retry]
attempts_remaining = 3
delay_ms = 0
"#,
        )
        .unwrap();

        let err = ClientConfig::load_from(&path).unwrap_err();
        assert_eq!(
            err,
            GwenError::config("health_retry.delay_ms must be positive")
        );

        let mut config = ClientConfig::default();
        config.model_retry.delay_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::default().with_env_overrides(|key| match key {
            API_URL_ENV => Some("http://gwen.local".to_string()),
            MODEL_ENV => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "http://gwen.local");
        assert_eq!(config.preferred_model, PREFERRED_MODEL);
    }
}
