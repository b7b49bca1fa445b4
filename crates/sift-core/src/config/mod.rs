//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::query::{MatchCase, QueryOptions, SearchDefaults};
use crate::storage::{DatabaseConfig, default_database_path};

/// Sift configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file; empty means the platform data directory
    pub path: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub default_sort: String,
    pub query_timeout_ms: u64,
    /// ASCII case-insensitive keyword containment
    pub case_insensitive: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: String::new(),
            max_connections: 5,
            acquire_timeout_ms: 5000,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_page_size: 5,
            max_page_size: 30,
            default_sort: "ID".to_string(),
            query_timeout_ms: 5000,
            case_insensitive: false,
        }
    }
}

const KEYS: &[&str] = &[
    "database.path",
    "database.max_connections",
    "database.acquire_timeout_ms",
    "search.default_page_size",
    "search.max_page_size",
    "search.default_sort",
    "search.query_timeout_ms",
    "search.case_insensitive",
];

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("SIFT_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("sift")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.max_connections == 0 {
            return Err(anyhow!("database.max_connections must be at least 1"));
        }
        if self.search.max_page_size == 0 {
            return Err(anyhow!("search.max_page_size must be at least 1"));
        }
        if !(1..=self.search.max_page_size).contains(&self.search.default_page_size) {
            return Err(anyhow!(
                "search.default_page_size must be between 1 and search.max_page_size ({})",
                self.search.max_page_size
            ));
        }
        if self.search.query_timeout_ms == 0 {
            return Err(anyhow!("search.query_timeout_ms must be greater than zero"));
        }
        if self.search.default_sort.trim().is_empty() {
            return Err(anyhow!("search.default_sort must not be empty"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            // Database settings
            "database.path" => Ok(self.database_path().display().to_string()),
            "database.max_connections" => Ok(self.database.max_connections.to_string()),
            "database.acquire_timeout_ms" => Ok(self.database.acquire_timeout_ms.to_string()),

            // Search settings
            "search.default_page_size" => Ok(self.search.default_page_size.to_string()),
            "search.max_page_size" => Ok(self.search.max_page_size.to_string()),
            "search.default_sort" => Ok(self.search.default_sort.clone()),
            "search.query_timeout_ms" => Ok(self.search.query_timeout_ms.to_string()),
            "search.case_insensitive" => Ok(self.search.case_insensitive.to_string()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `sift config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key; the result is validated as a whole
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut next = self.clone();

        match key {
            "database.path" => {
                next.database.path = value.trim().to_string();
            }
            "database.max_connections" => {
                next.database.max_connections = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
            }
            "database.acquire_timeout_ms" => {
                next.database.acquire_timeout_ms = value
                    .parse()
                    .with_context(|| format!("Invalid acquire_timeout_ms value: {}", value))?;
            }
            "search.default_page_size" => {
                next.search.default_page_size = value
                    .parse()
                    .with_context(|| format!("Invalid default_page_size value: {}", value))?;
            }
            "search.max_page_size" => {
                next.search.max_page_size = value
                    .parse()
                    .with_context(|| format!("Invalid max_page_size value: {}", value))?;
            }
            "search.default_sort" => {
                next.search.default_sort = value.trim().to_string();
            }
            "search.query_timeout_ms" => {
                next.search.query_timeout_ms = value
                    .parse()
                    .with_context(|| format!("Invalid query_timeout_ms value: {}", value))?;
            }
            "search.case_insensitive" => {
                next.search.case_insensitive = value
                    .parse()
                    .with_context(|| format!("Invalid case_insensitive value: {} (use true or false)", value))?;
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `sift config list` to see available keys.",
                    key
                ));
            }
        }

        next.validate()?;
        *self = next;
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.iter()
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

    /// Database file path, falling back to the platform data directory
    pub fn database_path(&self) -> PathBuf {
        if self.database.path.is_empty() {
            default_database_path()
        } else {
            PathBuf::from(&self.database.path)
        }
    }

    /// Storage settings for `Database::new`
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::with_path(self.database_path())
            .max_connections(self.database.max_connections)
            .acquire_timeout(Duration::from_millis(self.database.acquire_timeout_ms))
    }

    /// Execution options for every search
    pub fn query_options(&self) -> QueryOptions {
        let match_case = if self.search.case_insensitive {
            MatchCase::AsciiInsensitive
        } else {
            MatchCase::Sensitive
        };

        QueryOptions::default()
            .with_timeout(Duration::from_millis(self.search.query_timeout_ms))
            .with_match_case(match_case)
    }

    /// Request boundary defaults and caps
    pub fn search_limits(&self) -> SearchDefaults {
        SearchDefaults {
            default_page_size: self.search.default_page_size,
            max_page_size: self.search.max_page_size,
            default_sort: self.search.default_sort.clone(),
        }
    }
}
