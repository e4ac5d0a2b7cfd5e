// src/config.rs

//! # Application Config
//!
//! Presentation settings of an application (name, description, color mode and
//! build metadata) that can be declared in code or read from a TOML file:
//!
//! ```toml
//! name = "tool"
//! description = "Does things"
//! color = "never"
//!
//! [version]
//! version = "1.2.0"
//! commit_hash = "abc123"
//!
//! [show]
//! branch = false
//! ```
//!
//! Every key is optional.

use crate::constants::{DEFAULT_VERSION, NO_COLOR_ENV, UNKNOWN};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// When help and version output may use ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color only when writing to a terminal.
    #[default]
    Auto,
    #[serde(alias = "on")]
    Always,
    #[serde(alias = "off")]
    Never,
}

/// Build metadata reported by `--version` and root help.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct VersionInfo {
    pub version: String,
    pub build_date: String,
    pub commit_hash: String,
    pub branch: String,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            build_date: UNKNOWN.to_string(),
            commit_hash: UNKNOWN.to_string(),
            branch: UNKNOWN.to_string(),
        }
    }
}

/// Which [`VersionInfo`] fields appear in root help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppShow {
    pub version: bool,
    pub build_date: bool,
    pub commit_hash: bool,
    pub branch: bool,
}

impl Default for AppShow {
    fn default() -> Self {
        Self {
            version: true,
            build_date: true,
            commit_hash: true,
            branch: true,
        }
    }
}

impl AppShow {
    pub fn any(&self) -> bool {
        self.version || self.build_date || self.commit_hash || self.branch
    }
}

/// The deserialized form of an application config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: ColorMode,
    pub version: VersionInfo,
    pub show: AppShow,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse application config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        log::debug!("Loading application config from '{}'", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file '{}'", path.display()))
    }
}

/// Decides whether output is colored. `NO_COLOR` wins over every mode.
pub fn should_color(
    mode: ColorMode,
    is_terminal: bool,
    env: &dyn Fn(&str) -> Option<String>,
) -> bool {
    if env(NO_COLOR_ENV).is_some_and(|v| !v.is_empty()) {
        return false;
    }
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => is_terminal,
    }
}
