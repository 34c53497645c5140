use crate::constants;
use crate::error::{ImporterError, Result};
use crate::types::YearRange;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_year_start")]
    pub year_start: i32,
    #[serde(default = "default_year_end")]
    pub year_end: i32,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = constants::CONFIG_PATH;
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ImporterError::Config(format!(
                "Failed to read config file '{config_path}': {e}"
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Load `config.toml` when present, fall back to defaults when absent.
    /// A present but unreadable or invalid file is still an error.
    pub fn load_or_default() -> Result<Self> {
        if Path::new(constants::CONFIG_PATH).exists() {
            Self::load()
        } else {
            Ok(Self::default())
        }
    }
}

impl ImportConfig {
    pub fn year_range(&self) -> Result<YearRange> {
        YearRange::new(self.year_start, self.year_end)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            import: ImportConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            year_start: default_year_start(),
            year_end: default_year_end(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    constants::DEFAULT_TIMEOUT_SECONDS
}

fn default_year_start() -> i32 {
    constants::DEFAULT_YEAR_START
}

fn default_year_end() -> i32 {
    constants::DEFAULT_YEAR_END
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [store]
            base_url = "http://localhost:4000"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.base_url, "http://localhost:4000");
        assert_eq!(config.store.timeout_seconds, 30);
        assert_eq!(config.import.year_start, 2019);
        assert_eq!(config.import.year_end, 2024);
    }

    #[test]
    fn year_range_comes_from_the_import_section() {
        let config: Config = toml::from_str(
            r#"
            [import]
            year_start = 2020
            year_end = 2022
            "#,
        )
        .unwrap();

        let years = config.import.year_range().unwrap();
        assert_eq!(years.years().collect::<Vec<_>>(), vec![2020, 2021, 2022]);
    }

    #[test]
    fn inverted_year_range_is_a_config_error() {
        let config: Config = toml::from_str(
            r#"
            [import]
            year_start = 2024
            year_end = 2019
            "#,
        )
        .unwrap();

        assert!(config.import.year_range().is_err());
    }
}
