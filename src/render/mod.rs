// src/render/mod.rs

//! # Help and Version Presentation
//!
//! The pipeline never formats text itself. It assembles structured data
//! ([`AppInfo`], [`HelpData`]) and hands it to a [`Renderer`], together with
//! the color decision for the current invocation.
//!
//! - **`console`**: the default human-readable layout.
//! - **`json`**: the same data as pretty-printed JSON, for tooling.
//! - **`style`**: ANSI styling applied only when the invocation is colored.

use crate::{
    config::{AppShow, VersionInfo},
    core::{
        command::Command,
        flags::{FlagKind, FlagValue},
        resolver::flag_chain,
    },
};
use serde::Serialize;
use std::io::{self, Write};

pub mod console;
pub mod json;
pub mod style;

pub use console::ConsoleRenderer;
pub use json::JsonRenderer;

/// Application-level data shared by help and version output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    pub name: String,
    pub description: String,
    pub version: VersionInfo,
    pub show: AppShow,
    /// Whether this invocation's output may contain ANSI colors.
    pub colored: bool,
}

/// One row of the merged flag listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagRow {
    pub name: String,
    pub short: Option<char>,
    pub usage: String,
    pub kind: FlagKind,
    pub default: FlagValue,
    pub allowed: Vec<String>,
}

/// One row of the subcommand listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubcommandRow {
    pub name: String,
    pub summary: String,
    pub deprecated: bool,
}

/// Everything a renderer needs to print help for one command path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelpData {
    /// Command names from the root to the leaf.
    pub path: Vec<String>,
    pub summary: String,
    pub long: String,
    /// Root help also shows the version block and application description.
    pub is_root: bool,
    pub flags: Vec<FlagRow>,
    pub subcommands: Vec<SubcommandRow>,
    pub args: Vec<String>,
}

impl HelpData {
    /// Assembles help for the leaf of `path`.
    ///
    /// Flags are the persistent flags of every command on the path followed by
    /// the leaf's local flags, hidden ones left out. A name declared at two
    /// depths is listed twice. Subcommands are the leaf's visible children,
    /// sorted by name.
    pub fn for_path(path: &[&Command]) -> Self {
        let flags = flag_chain(path)
            .into_iter()
            .filter(|f| !f.is_hidden())
            .map(|f| FlagRow {
                name: f.name().to_string(),
                short: f.short_name(),
                usage: f.usage_text().to_string(),
                kind: f.kind(),
                default: f.default_value().clone(),
                allowed: f.allowed_values().to_vec(),
            })
            .collect();

        let leaf = path.last().copied();
        let mut subcommands: Vec<SubcommandRow> = leaf
            .map(Command::children)
            .unwrap_or_default()
            .iter()
            .filter(|c| !c.is_hidden())
            .map(|c| SubcommandRow {
                name: c.name().to_string(),
                summary: c.summary_text().to_string(),
                deprecated: c.deprecation().is_some(),
            })
            .collect();
        subcommands.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            path: path.iter().map(|c| c.name().to_string()).collect(),
            summary: leaf.map(Command::summary_text).unwrap_or_default().to_string(),
            long: leaf.map(Command::long_text).unwrap_or_default().to_string(),
            is_root: path.len() <= 1,
            flags,
            subcommands,
            args: leaf.map(|c| c.arg_spec().names.clone()).unwrap_or_default(),
        }
    }
}

/// Presentation of help and version data.
pub trait Renderer: Send + Sync {
    fn render_help(&self, out: &mut dyn Write, app: &AppInfo, help: &HelpData) -> io::Result<()>;

    fn render_version(&self, out: &mut dyn Write, app: &AppInfo) -> io::Result<()>;
}
