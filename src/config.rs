//! Configuration handling for the admin client

use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MESSAGE_DISMISS_MS: u64 = 3000;
const DEFAULT_STATUS_DISMISS_MS: u64 = 5000;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    /// Base URL of the LMS site, e.g. `https://lms.example.org`
    pub site_url: Option<String>,
    /// Session key sent with every ajax call
    pub sesskey: Option<String>,
    pub request_timeout_secs: Option<u64>,
    /// How long the message success panel stays before the dialog closes
    pub message_dismiss_ms: Option<u64>,
    /// How long the status card's saved indicator stays
    pub status_dismiss_ms: Option<u64>,
}

impl AdminConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "teamup", "teamup-admin")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if let Some(path) = path {
            if path.exists() {
                let content = fs::read_to_string(&path)?;
                let config: AdminConfig = serde_json::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    /// Apply `TEAMUP_SITE_URL` / `TEAMUP_SESSKEY` when set
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var("TEAMUP_SITE_URL").ok(),
            std::env::var("TEAMUP_SESSKEY").ok(),
        )
    }

    /// Replace site and session key with any values given
    pub fn with_overrides(mut self, site_url: Option<String>, sesskey: Option<String>) -> Self {
        if site_url.is_some() {
            self.site_url = site_url;
        }
        if sesskey.is_some() {
            self.sesskey = sesskey;
        }
        self
    }

    pub fn site_url(&self) -> Result<&str> {
        self.site_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow!("no site URL configured (set TEAMUP_SITE_URL or --site-url)"))
    }

    pub fn sesskey(&self) -> Result<&str> {
        self.sesskey
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow!("no session key configured (set TEAMUP_SESSKEY or --sesskey)"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn message_dismiss_delay(&self) -> Duration {
        Duration::from_millis(self.message_dismiss_ms.unwrap_or(DEFAULT_MESSAGE_DISMISS_MS))
    }

    pub fn status_dismiss_delay(&self) -> Duration {
        Duration::from_millis(self.status_dismiss_ms.unwrap_or(DEFAULT_STATUS_DISMISS_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AdminConfig::default();
        assert!(config.site_url.is_none());
        assert!(config.sesskey.is_none());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.message_dismiss_delay(), Duration::from_millis(3000));
        assert_eq!(config.status_dismiss_delay(), Duration::from_millis(5000));
    }

    #[test]
    fn test_serialization() {
        let config = AdminConfig {
            site_url: Some("https://lms.example.org".to_string()),
            sesskey: Some("abc123".to_string()),
            request_timeout_secs: Some(10),
            message_dismiss_ms: Some(1500),
            status_dismiss_ms: Some(2500),
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: AdminConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.site_url().unwrap(), "https://lms.example.org");
        assert_eq!(parsed.sesskey().unwrap(), "abc123");
        assert_eq!(parsed.request_timeout(), Duration::from_secs(10));
        assert_eq!(parsed.message_dismiss_delay(), Duration::from_millis(1500));
        assert_eq!(parsed.status_dismiss_delay(), Duration::from_millis(2500));
    }

    #[test]
    fn test_deserialize_from_empty_json() {
        let parsed: AdminConfig = serde_json::from_str("{}").unwrap();
        assert!(parsed.site_url.is_none());
        assert!(parsed.message_dismiss_ms.is_none());
    }

    #[test]
    fn test_deserialize_with_extra_fields() {
        // Should ignore unknown fields
        let json = r#"{"site_url": "https://lms.example.org", "theme": "dark"}"#;
        let parsed: AdminConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.site_url.as_deref(), Some("https://lms.example.org"));
    }

    #[test]
    fn test_missing_site_url_is_error() {
        let config = AdminConfig {
            site_url: Some(String::new()),
            ..Default::default()
        };
        assert!(config.site_url().is_err());
        assert!(config.sesskey().is_err());
    }

    #[test]
    fn test_overrides_replace_only_given_values() {
        let config = AdminConfig {
            site_url: Some("https://old.example.org".to_string()),
            sesskey: Some("old".to_string()),
            ..Default::default()
        }
        .with_overrides(Some("https://new.example.org".to_string()), None);

        assert_eq!(config.site_url().unwrap(), "https://new.example.org");
        assert_eq!(config.sesskey().unwrap(), "old");
    }

    #[test]
    fn test_load_returns_ok_when_no_file() {
        // Passes whether or not a config file exists on this machine
        let result = AdminConfig::load();
        assert!(result.is_ok());
    }
}
