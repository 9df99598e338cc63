use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::api::{API_BASE, SEARCH_BASE};
use crate::feed::Pacing;

const APP_SENTINEL: &str = "5xx.engineer-hn-feed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "_app")]
    pub app: String,

    #[serde(default)]
    pub feed: FeedSettings,

    #[serde(default)]
    pub api: ApiSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Items revealed per "load more".
    pub increment: usize,
    /// Items requested per remote call.
    pub batch_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub search_url: String,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: APP_SENTINEL.to_string(),
            feed: FeedSettings::default(),
            api: ApiSettings::default(),
        }
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        let pacing = Pacing::default();
        Self {
            increment: pacing.increment,
            batch_size: pacing.batch_size,
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: API_BASE.to_string(),
            search_url: SEARCH_BASE.to_string(),
            timeout_secs: 10,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize settings")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        Ok(())
    }

    /// Writes default settings to `path`. An existing file is only replaced
    /// when `force` is set.
    pub fn init(path: &Path, force: bool) -> Result<Self> {
        if path.exists() && !force {
            bail!(
                "Settings file already exists at {} (use --force to overwrite)",
                path.display()
            );
        }
        let settings = Self::default();
        settings.save(path)?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.app != APP_SENTINEL {
            bail!(
                "Settings file appears to belong to another application (expected _app = '{}', found '{}')",
                APP_SENTINEL,
                self.app
            );
        }
        if self.feed.increment == 0 {
            bail!("feed.increment must be at least 1");
        }
        if self.feed.batch_size == 0 {
            bail!("feed.batch_size must be at least 1");
        }
        if self.api.timeout_secs == 0 {
            bail!("api.timeout_secs must be at least 1");
        }
        if self.api.base_url.trim().is_empty() || self.api.search_url.trim().is_empty() {
            bail!("api.base_url and api.search_url must not be empty");
        }
        Ok(())
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            increment: self.feed.increment,
            batch_size: self.feed.batch_size,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}

pub fn config_dir(custom: Option<&PathBuf>) -> Option<PathBuf> {
    custom
        .cloned()
        .or_else(|| dirs::home_dir().map(|p| p.join(".config").join("hn-feed")))
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join("settings.toml")
}

pub fn log_path(config_dir: &Path) -> PathBuf {
    config_dir.join("hn-feed.log")
}
