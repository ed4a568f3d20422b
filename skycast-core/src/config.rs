use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::{model::Coordinate, units::UnitSystem};

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "SKYCAST_API_KEY";

pub const DEFAULT_PLACE: &str = "London";
pub const DEFAULT_GEO_BASE: &str = "https://api.openweathermap.org/geo/1.0";
pub const DEFAULT_WEATHER_BASE: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Base URLs of the geocoding and weather services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub geo_base: String,
    pub weather_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geo_base: DEFAULT_GEO_BASE.to_string(),
            weather_base: DEFAULT_WEATHER_BASE.to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// units = "imperial"
/// default_place = "Paris"
/// favorites = ["Oslo", "Lisbon"]
///
/// [home]
/// latitude = 51.5
/// longitude = -0.12
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,

    /// Unit system active at startup.
    pub units: UnitSystem,

    /// Place loaded when no device position is available.
    pub default_place: String,

    pub endpoints: Endpoints,

    pub request_timeout_secs: u64,

    /// Fixed device position, used as the geolocation source when set.
    pub home: Option<Coordinate>,

    /// Read once at startup and never written by the client.
    pub favorites: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            units: UnitSystem::default(),
            default_place: DEFAULT_PLACE.to_string(),
            endpoints: Endpoints::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            home: None,
            favorites: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skycast", "skycast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key to use, preferring a non-empty environment override.
    pub fn resolve_api_key(&self, env_override: Option<String>) -> Result<String> {
        env_override
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone().filter(|key| !key.trim().is_empty()))
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured.\n\
                     Hint: run `skycast configure` or set {API_KEY_ENV}."
                )
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
