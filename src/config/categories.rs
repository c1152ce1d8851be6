//! Category and schedule configuration loading from config.toml
//!
//! The category list drives the selection buttons and is the only set of values a
//! transaction's `category` may take. Category names travel inside button payloads
//! (`category_<name>_<id>`), so they may not contain the `_` delimiter.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Delimiter used inside button payloads
pub const PAYLOAD_DELIMITER: char = '_';

/// Discord allows five component rows; one is taken by the delete button and
/// categories are laid out two per row.
pub const MAX_CATEGORIES: usize = 8;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Selectable categories, in display order
    pub categories: Vec<String>,
    /// When the monthly close runs
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Monthly close schedule. The close always runs on the 1st of the month.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Local hour (0-23) at which the close runs
    #[serde(default = "default_close_hour")]
    pub close_hour: u32,
}

const fn default_close_hour() -> u32 {
    9
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            close_hour: default_close_hour(),
        }
    }
}

/// Validated, ordered set of category names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet(Vec<String>);

impl CategorySet {
    /// Builds a category set, rejecting names the payload encoding cannot carry.
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(config_error("at least one category is required"));
        }
        if names.len() > MAX_CATEGORIES {
            return Err(config_error(&format!(
                "at most {MAX_CATEGORIES} categories are supported, got {}",
                names.len()
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for name in &names {
            if name.trim().is_empty() {
                return Err(config_error("category names cannot be blank"));
            }
            if name.contains(PAYLOAD_DELIMITER) {
                return Err(config_error(&format!(
                    "category '{name}' contains the reserved '{PAYLOAD_DELIMITER}' character"
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(config_error(&format!("category '{name}' is listed twice")));
            }
        }

        Ok(Self(names))
    }

    /// Whether `name` is one of the configured categories
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|c| c == name)
    }

    /// Category names in display order
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

fn config_error(message: &str) -> Error {
    Error::Config {
        message: format!("Invalid categories: {message}"),
    }
}

/// Loads category configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses config.toml contents and validates the schedule.
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.schedule.close_hour > 23 {
        return Err(Error::Config {
            message: format!(
                "schedule.close_hour must be between 0 and 23, got {}",
                config.schedule.close_hour
            ),
        });
    }

    Ok(config)
}

/// Loads category configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}
