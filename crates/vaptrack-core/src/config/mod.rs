//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Vaptrack configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Optional override for the database file path
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory holding catalog JSON files
    pub data_dir: Option<PathBuf>,
    /// Catalog file used when no file is named explicitly
    pub default_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Version string stamped on build records when none is given
    pub default_version: String,
    /// License tier applied to new domains when none is given
    pub default_license_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig { path: None },
            catalog: CatalogConfig {
                data_dir: None,
                default_file: "features.json".to_string(),
            },
            build: BuildConfig {
                default_version: "1.0.0".to_string(),
                default_license_type: "standard".to_string(),
            },
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("VAPTRACK_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("vaptrack")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            // Return default config without creating file
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Resolve the catalog data directory (config value or default)
    pub fn catalog_data_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.catalog.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::config_dir()?.join("catalogs")),
        }
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "database.path" => Ok(self
                .database
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(default)".to_string())),

            "catalog.data_dir" => Ok(self
                .catalog
                .data_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(default)".to_string())),
            "catalog.default_file" => Ok(self.catalog.default_file.clone()),

            "build.default_version" => Ok(self.build.default_version.clone()),
            "build.default_license_type" => Ok(self.build.default_license_type.clone()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `vaptrack config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "database.path" => {
                self.database.path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }

            "catalog.data_dir" => {
                self.catalog.data_dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "catalog.default_file" => {
                if value.is_empty() {
                    return Err(anyhow!("Default catalog file must not be empty"));
                }
                self.catalog.default_file = value.to_string();
            }

            "build.default_version" => {
                if value.is_empty() {
                    return Err(anyhow!("Default version must not be empty"));
                }
                self.build.default_version = value.to_string();
            }
            "build.default_license_type" => {
                let valid = ["standard", "premium", "enterprise"];
                if !valid.contains(&value) {
                    return Err(anyhow!(
                        "Invalid license type: {}. Valid options: {}",
                        value,
                        valid.join(", ")
                    ));
                }
                self.build.default_license_type = value.to_string();
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `vaptrack config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "database.path",
            "catalog.data_dir",
            "catalog.default_file",
            "build.default_version",
            "build.default_license_type",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
