//! Configuration management for wikilisten.
//!
//! Configuration is stored in TOML format and supports environment variable
//! overrides.
//!
//! ## Configuration Hierarchy
//!
//! 1. **Built-in defaults**: English Wikipedia and `Template:Listen`
//! 2. **Config file**: platform config directory (see [`Config::config_path`])
//!    or an explicit path
//! 3. **Environment variables**: `WIKILISTEN_*` prefix
//!
//! ## Example Configuration File
//!
//! ```toml
//! [api]
//! url = "https://en.wikipedia.org/w/api.php"
//! timeout_secs = 30
//! max_retries = 3
//!
//! [assets]
//! base_url = "https://upload.wikimedia.org/wikipedia/commons"
//!
//! [discovery]
//! template = "Template:Listen"
//! template_match = "listen"
//! part_match = "filename"
//! limit = "max"
//! ```
//!
//! ```rust
//! use wikilisten_core::Config;
//!
//! let config = Config::default();
//! assert_eq!(config.discovery.template, "Template:Listen");
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`ApiConfig::url`].
pub const ENV_API_URL: &str = "WIKILISTEN_API_URL";
/// Environment variable overriding [`AssetsConfig::base_url`].
pub const ENV_ASSET_BASE_URL: &str = "WIKILISTEN_ASSET_BASE_URL";
/// Environment variable overriding [`DiscoveryConfig::template`].
pub const ENV_TEMPLATE: &str = "WIKILISTEN_TEMPLATE";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote API endpoint and transport behaviour
    pub api: ApiConfig,
    /// Media storage layout
    pub assets: AssetsConfig,
    /// Which template to discover and which parameters to extract
    pub discovery: DiscoveryConfig,
}

/// Remote API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base endpoint every query is sent to.
    pub url: String,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Retries for transient transport failures. API error envelopes are
    /// never retried.
    pub max_retries: usize,

    /// Initial backoff delay in milliseconds; doubles per attempt.
    pub retry_base_ms: u64,
}

/// Media storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Root of the hash-sharded upload directory.
    pub base_url: String,
}

/// Discovery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Full template title used for the `embeddedin` generator.
    pub template: String,

    /// Substring (ASCII case-insensitive) a template's title must contain.
    pub template_match: String,

    /// Substring (ASCII case-insensitive) a template part's name must contain.
    pub part_match: String,

    /// Page batch size requested per round; `max` lets the server decide.
    pub limit: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "https://en.wikipedia.org/w/api.php".to_string(),
            user_agent: concat!("wikilisten/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
            max_retries: 3,
            retry_base_ms: 100,
        }
    }
}

impl ApiConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            base_url: crate::assets::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            template: "Template:Listen".to_string(),
            template_match: "listen".to_string(),
            part_match: "filename".to_string(),
            limit: "max".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// defaults when no file exists. Environment overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined, or the
    /// file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from an explicit path, falling back to defaults
    /// when the file does not exist. Environment overrides are applied.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;
            toml::from_str(&content)?
        } else {
            tracing::debug!(path = %path.display(), "No config file; using defaults");
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `WIKILISTEN_*` overrides using the given lookup.
    ///
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_API_URL) {
            self.api.url = url;
        }
        if let Some(base) = lookup(ENV_ASSET_BASE_URL) {
            self.assets.base_url = base;
        }
        if let Some(template) = lookup(ENV_TEMPLATE) {
            self.discovery.template = template;
        }
    }

    /// Save the configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save the configuration as pretty TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::Config("Invalid config path".into()))?;

        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;

        let content = toml::to_string_pretty(self)?;

        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;

        Ok(())
    }

    /// Path of the global configuration file.
    ///
    /// - Linux: `~/.config/wikilisten/config.toml`
    /// - macOS: `~/Library/Application Support/org.wikilisten.wikilisten/config.toml`
    /// - Windows: `%APPDATA%\wikilisten\wikilisten\config\config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = directories::ProjectDirs::from("org", "wikilisten", "wikilisten")
            .ok_or_else(|| Error::Config("Failed to determine project directories".into()))?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }
}
