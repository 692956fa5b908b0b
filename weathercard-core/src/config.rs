use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    auth::SigningKey,
    provider::openweather::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT},
};

pub const ENV_API_KEY: &str = "WEATHER_API_KEY";
pub const ENV_SIGNING_SECRET: &str = "TEAMS_SECURITY_TOKEN";
pub const ENV_BASE_URL: &str = "OPENWEATHER_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "WEATHER_REQUEST_TIMEOUT_SECS";

/// Bot configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// weather_api_key = "..."
/// signing_secret = "<base64>"
/// request_timeout_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// OpenWeather API key.
    pub weather_api_key: Option<String>,

    /// Base64 shared secret the chat service signs requests with.
    pub signing_secret: Option<String>,

    /// Override for the OpenWeather endpoint, mostly for tests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
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
        let config: Self = toml::from_str(contents)?;
        if let Some(secs) = config.request_timeout_secs {
            check_timeout(secs).context("Invalid request_timeout_secs")?;
        }
        Ok(config)
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

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weathercard", "weathercard-bot")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup`; empty values are ignored.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = var(ENV_API_KEY) {
            self.weather_api_key = Some(key);
        }
        if let Some(secret) = var(ENV_SIGNING_SECRET) {
            self.signing_secret = Some(secret);
        }
        if let Some(url) = var(ENV_BASE_URL) {
            self.base_url = Some(url);
        }
        if let Some(secs) = var(ENV_TIMEOUT_SECS) {
            let secs = secs
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds"))?;
            check_timeout(secs).with_context(|| format!("Invalid {ENV_TIMEOUT_SECS}"))?;
            self.request_timeout_secs = Some(secs);
        }

        Ok(())
    }

    pub fn api_key(&self) -> Result<&str> {
        self.weather_api_key.as_deref().ok_or_else(|| {
            anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: run `weathercard-bot configure` or set {ENV_API_KEY}."
            )
        })
    }

    pub fn signing_key(&self) -> Result<SigningKey> {
        let secret = self.signing_secret.as_deref().ok_or_else(|| {
            anyhow!(
                "No signing secret configured.\n\
                 Hint: run `weathercard-bot configure` or set {ENV_SIGNING_SECRET}."
            )
        })?;

        SigningKey::from_base64(secret).context("Invalid signing secret")
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_secs
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs)
    }
}

/// A zero timeout would fail every lookup before it is sent.
fn check_timeout(secs: u64) -> Result<()> {
    if secs == 0 {
        return Err(anyhow!("request timeout must be at least 1 second"));
    }
    Ok(())
}
