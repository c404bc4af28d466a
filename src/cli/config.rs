//! TOML configuration file support.
//!
//! Settings that would otherwise be repeated on every invocation can live in
//! a config file:
//!
//! ```toml
//! # remind.toml
//! [output]
//! format = "json"
//! include_raw = false
//!
//! [lif]
//! image_index = 0
//! ```
//!
//! Command-line flags always win over config values.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use super::OutputFormat;

/// Root configuration structure for remind.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Output settings for the extract command.
    #[serde(default)]
    pub output: OutputConfig,

    /// Leica LIF settings.
    #[serde(default)]
    pub lif: LifConfig,
}

/// Configuration for extract output.
#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Output rendition (`text` or `json`).
    pub format: Option<OutputFormat>,

    /// Include the vendor-native tree in JSON output.
    pub include_raw: Option<bool>,
}

/// Configuration for LIF projects.
#[derive(Debug, Default, Deserialize)]
pub struct LifConfig {
    /// Which image of a multi-image project to extract.
    pub image_index: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [output]
            format = "json"
            include_raw = true

            [lif]
            image_index = 2
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert_eq!(config.output.include_raw, Some(true));
        assert_eq!(config.lif.image_index, Some(2));
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [output]
            format = "text"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.output.format, Some(OutputFormat::Text));
        assert_eq!(config.output.include_raw, None);
        assert_eq!(config.lif.image_index, None);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.output.format, None);
        assert_eq!(config.lif.image_index, None);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let toml = r#"
            [output]
            format = "xml"
        "#;
        assert!(Config::from_str(toml).is_err());
    }
}
