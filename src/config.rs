//! Configuration file support
//!
//! Settings are read from a TOML file and then overridden by any options
//! given explicitly on the command line.
//!
//! Default location: `<config dir>/border-crop/config.toml`
//!
//! ```toml
//! border_color = "auto"
//! tolerance = 10
//! ratio_policy = "prompt"
//! output_suffix = "_cropped"
//! overwrite = false
//! threads = 4
//! ```

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::crop::{BorderColor, DetectOptions, DEFAULT_TOLERANCE};

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "border-crop";

/// Config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default suffix appended to output file stems
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_cropped";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// What to do when a common aspect ratio is suggested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RatioPolicy {
    /// Ask interactively (falls back to reject when not possible)
    #[default]
    Prompt,
    /// Always crop strictly to the suggested ratio
    Accept,
    /// Always keep the detected content box
    Reject,
}

/// File-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub border_color: BorderColor,
    pub tolerance: u32,
    pub ratio_policy: RatioPolicy,
    pub output_suffix: String,
    pub overwrite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            border_color: BorderColor::Auto,
            tolerance: DEFAULT_TOLERANCE,
            ratio_policy: RatioPolicy::Prompt,
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            overwrite: false,
            threads: None,
        }
    }
}

impl Config {
    /// Default config file path, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location; a missing file yields defaults
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Render as TOML text
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply CLI overrides; CLI values take precedence
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> Config {
        Config {
            border_color: cli.border_color.unwrap_or(self.border_color),
            tolerance: cli.tolerance.unwrap_or(self.tolerance),
            ratio_policy: cli.ratio_policy.unwrap_or(self.ratio_policy),
            output_suffix: cli
                .output_suffix
                .clone()
                .unwrap_or_else(|| self.output_suffix.clone()),
            overwrite: cli.overwrite.unwrap_or(self.overwrite),
            threads: cli.threads.or(self.threads),
        }
    }

    /// Detection options derived from this config
    pub fn detect_options(&self) -> DetectOptions {
        DetectOptions::builder()
            .border_color(self.border_color)
            .tolerance(self.tolerance)
            .build()
    }
}

/// Values explicitly set on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub border_color: Option<BorderColor>,
    pub tolerance: Option<u32>,
    pub ratio_policy: Option<RatioPolicy>,
    pub output_suffix: Option<String>,
    pub overwrite: Option<bool>,
    pub threads: Option<usize>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}
