use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Value shipped in sample env files; treated as "no key".
const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

pub const DEFAULT_LOCATION: &str = "Bhubaneswar,IN";
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Longest accepted refresh interval: one day.
pub const MAX_REFRESH_MINUTES: u64 = 24 * 60;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// location = "Cuttack,IN"
/// refresh_minutes = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Provider credential. `OPENWEATHER_API_KEY` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider location query, e.g. "Bhubaneswar,IN".
    #[serde(default = "default_location")]
    pub location: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Minutes between scheduled refreshes.
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: u64,

    /// Upper bound on a single provider request.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_refresh_minutes() -> u64 {
    10
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            location: default_location(),
            base_url: default_base_url(),
            refresh_minutes: default_refresh_minutes(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "agri-dashboard", "forecast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.location.trim().is_empty() {
            bail!("location must not be empty");
        }
        if self.refresh_minutes == 0 {
            bail!("refresh_minutes must be at least 1");
        }
        if self.refresh_minutes > MAX_REFRESH_MINUTES {
            bail!(
                "refresh_minutes ({}) must not exceed {MAX_REFRESH_MINUTES} (one day)",
                self.refresh_minutes
            );
        }
        if self.fetch_timeout_secs == 0 {
            bail!("fetch_timeout_secs must be at least 1");
        }
        if self.fetch_timeout() > self.refresh_interval() {
            bail!(
                "fetch_timeout_secs ({}) must not exceed the refresh interval ({} minutes)",
                self.fetch_timeout_secs,
                self.refresh_minutes
            );
        }
        Ok(())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Credential to use: environment first, then the stored value.
    pub fn resolved_api_key(&self) -> Option<String> {
        let env = std::env::var(API_KEY_ENV).ok();
        pick_api_key(env.as_deref(), self.api_key.as_deref())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_minutes.saturating_mul(60))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn usable_key(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && value != API_KEY_PLACEHOLDER).then_some(value)
}

fn pick_api_key(env_value: Option<&str>, file_value: Option<&str>) -> Option<String> {
    env_value
        .and_then(usable_key)
        .or_else(|| file_value.and_then(usable_key))
        .map(str::to_owned)
}
