use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::Coordinate;

/// A coordinate as stored on disk. Re-validated through
/// [`Coordinate::new`] when read back, so a hand-edited config cannot
/// smuggle an out-of-range point into a fetch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StoredCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// OpenWeather API key.
    pub api_key: Option<String>,

    /// Example TOML:
    /// [default_coordinate]
    /// latitude = 39.92077
    /// longitude = 32.85411
    pub default_coordinate: Option<StoredCoordinate>,
}

impl Config {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// The coordinate to fall back to when none is supplied, if one is
    /// configured and still valid.
    pub fn default_coordinate(&self) -> Option<Coordinate> {
        let stored = self.default_coordinate?;
        Coordinate::new(stored.latitude, stored.longitude)
    }

    pub fn set_default_coordinate(&mut self, coordinate: Coordinate) {
        self.default_coordinate = Some(StoredCoordinate {
            latitude: coordinate.latitude(),
            longitude: coordinate.longitude(),
        });
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

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

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skycast", "skycast-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
