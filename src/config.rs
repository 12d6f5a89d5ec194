use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

static RE_LENGTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?(pt|mm|cm|in|em)$").unwrap());

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub markdown: MarkdownConfig,
    pub page: PageConfig,
    pub font: FontConfig,
}

/// Markdown extensions applied before the HTML is styled.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MarkdownConfig {
    pub tables: bool,
    pub attr_lists: bool,
    pub newline_to_break: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            tables: true,
            attr_lists: true,
            newline_to_break: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PageConfig {
    /// Paper name understood by the layout engine, e.g. `a4` or `us-letter`.
    pub paper: String,
    pub margin: String,
    pub numbers: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            paper: "a4".to_string(),
            margin: "2cm".to_string(),
            numbers: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FontConfig {
    pub system: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self { system: true }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// The settings shipped in `default_config.toml`.
    pub fn compiled_default() -> Self {
        // build.rs rejects malformed TOML; unit tests pin the result to Default
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !RE_LENGTH.is_match(self.page.margin.trim()) {
            return Err(ConfigError::Invalid {
                key: "page.margin",
                reason: format!(
                    "expected a length such as `2cm` or `72pt`, got `{}`",
                    self.page.margin
                ),
            });
        }
        if self.page.paper.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "page.paper",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
