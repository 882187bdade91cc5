//! Configuration management
//!
//! Settings live in `settings.json` in the app directory:
//! ```json
//! {
//!   "app": { "apiUrl": "http://localhost:5000", "requestTimeoutSecs": 30 },
//!   "auth": { "allowedEmailDomains": ["@esol.com"], "resetRedirectDelayMs": 1500 }
//! }
//! ```
//! Fields this crate does not manage are kept when saving.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::http_auth::{DEFAULT_API_URL, DEFAULT_TIMEOUT, SENTIVOX_API_URL_ENV};
use crate::domain::email::DEFAULT_ALLOWED_DOMAINS;
use crate::domain::EmailDomainPolicy;
use crate::services::recovery::DEFAULT_REDIRECT_DELAY;

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    auth: AuthSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_timeout_secs: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    allowed_email_domains: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reset_redirect_delay_ms: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Sentivox configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    /// API base URL from settings; see [`Config::api_url`] for the effective one
    pub api_base_url: String,
    pub allowed_email_domains: Vec<String>,
    pub request_timeout_secs: u64,
    pub reset_redirect_delay_ms: u64,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            allowed_email_domains: DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            reset_redirect_delay_ms: DEFAULT_REDIRECT_DELAY.as_millis() as u64,
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the app directory
    ///
    /// A missing or unparsable file yields defaults.
    pub fn load(app_dir: &Path) -> Result<Self> {
        let raw = read_settings(app_dir)?;
        let defaults = Self::default();

        let allowed_email_domains = raw
            .auth
            .allowed_email_domains
            .clone()
            .filter(|domains| domains.iter().any(|d| !d.trim().is_empty()))
            .unwrap_or(defaults.allowed_email_domains);

        Ok(Self {
            api_base_url: raw
                .app
                .api_url
                .clone()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.api_base_url),
            allowed_email_domains,
            request_timeout_secs: raw
                .app
                .request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.request_timeout_secs),
            reset_redirect_delay_ms: raw
                .auth
                .reset_redirect_delay_ms
                .unwrap_or(defaults.reset_redirect_delay_ms),
            _raw_settings: raw,
        })
    }

    /// Save config to the app directory
    /// Preserves other settings that Sentivox doesn't manage
    pub fn save(&self, app_dir: &Path) -> Result<()> {
        let mut settings = read_settings(app_dir)?;

        settings.app.api_url = Some(self.api_base_url.clone());
        settings.app.request_timeout_secs = Some(self.request_timeout_secs);
        settings.auth.allowed_email_domains = Some(self.allowed_email_domains.clone());
        settings.auth.reset_redirect_delay_ms = Some(self.reset_redirect_delay_ms);

        std::fs::create_dir_all(app_dir)
            .with_context(|| format!("Failed to create {}", app_dir.display()))?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(app_dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }

    /// Effective API base URL; `SENTIVOX_API_URL` wins over settings
    pub fn api_url(&self) -> String {
        resolve_api_url(std::env::var(SENTIVOX_API_URL_ENV).ok(), &self.api_base_url)
    }

    pub fn set_api_url(&mut self, url: impl Into<String>) {
        self.api_base_url = url.into();
    }

    pub fn email_policy(&self) -> EmailDomainPolicy {
        EmailDomainPolicy::new(&self.allowed_email_domains)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reset_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.reset_redirect_delay_ms)
    }
}

fn read_settings(app_dir: &Path) -> Result<SettingsFile> {
    let settings_path = app_dir.join(SETTINGS_FILE);
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)
        .with_context(|| format!("Failed to read {}", settings_path.display()))?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}

fn resolve_api_url(env: Option<String>, configured: &str) -> String {
    env.map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| configured.to_string())
}
