// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Application configuration.
//!
//! Settings are loaded from a YAML file. Every field has a default, so an
//! empty file (or no file) is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::exchange::ConflictChoice;
use crate::music::{chromatic_range, Pitch};

/// File looked for when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "songbook.yaml";

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Directory holding the file-backed catalogue store
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    /// Log filter level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub share_code: ShareCodeConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub instrument: InstrumentConfig,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("songbook-data")
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            log_level: default_log_level(),
            share_code: ShareCodeConfig::default(),
            import: ImportConfig::default(),
            instrument: InstrumentConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load a configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse a configuration from a YAML string. Blank input yields defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Check values serde cannot check
    pub fn validate(&self) -> Result<()> {
        if self.store_dir.as_os_str().is_empty() {
            bail!("store_dir must not be empty");
        }
        if !matches!(
            self.log_level.to_ascii_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            bail!("unknown log_level: {}", self.log_level);
        }
        self.instrument.range()?;
        Ok(())
    }
}

/// Share code output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShareCodeConfig {
    /// Emit gzip-compressed `OC6GZ:` codes
    #[serde(default = "default_compress")]
    pub compress: bool,
}

fn default_compress() -> bool {
    true
}

impl Default for ShareCodeConfig {
    fn default() -> Self {
        Self {
            compress: default_compress(),
        }
    }
}

/// What a non-interactive import does about conflicts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Prompt for each conflict
    #[default]
    Ask,
    Skip,
    Overwrite,
    SaveAs,
}

impl ConflictPolicy {
    /// The fixed answer for this policy; `None` when the user should be asked
    pub fn fixed_choice(self) -> Option<ConflictChoice> {
        match self {
            ConflictPolicy::Ask => None,
            ConflictPolicy::Skip => Some(ConflictChoice::Skip),
            ConflictPolicy::Overwrite => Some(ConflictChoice::Overwrite),
            ConflictPolicy::SaveAs => Some(ConflictChoice::SaveAs),
        }
    }
}

/// Import settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ImportConfig {
    #[serde(default)]
    pub on_conflict: ConflictPolicy,
}

/// Playable range of the instrument
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentConfig {
    #[serde(default = "default_lowest")]
    pub lowest: String,
    #[serde(default = "default_highest")]
    pub highest: String,
}

fn default_lowest() -> String {
    "C4".to_string()
}
fn default_highest() -> String {
    "C6".to_string()
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            lowest: default_lowest(),
            highest: default_highest(),
        }
    }
}

impl InstrumentConfig {
    /// Every playable pitch, lowest first
    pub fn range(&self) -> Result<Vec<String>> {
        let low = Pitch::parse(&self.lowest)
            .with_context(|| format!("invalid lowest pitch: {}", self.lowest))?;
        let high = Pitch::parse(&self.highest)
            .with_context(|| format!("invalid highest pitch: {}", self.highest))?;
        if low.index() > high.index() {
            bail!("lowest pitch {} is above highest {}", self.lowest, self.highest);
        }
        chromatic_range(&self.lowest, &self.highest).context("could not build instrument range")
    }
}

/// Load and validate a configuration file
pub fn validate_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let config = AppConfig::load(path)?;
    config.validate()?;
    Ok(config)
}
