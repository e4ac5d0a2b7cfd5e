// src/render/json.rs

use super::{AppInfo, HelpData, Renderer};
use serde::Serialize;
use std::io::{self, Write};

/// Emits help and version data as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

#[derive(Serialize)]
struct HelpDocument<'a> {
    app: &'a AppInfo,
    help: &'a HelpData,
}

impl Renderer for JsonRenderer {
    fn render_help(&self, out: &mut dyn Write, app: &AppInfo, help: &HelpData) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, &HelpDocument { app, help })?;
        writeln!(out)
    }

    fn render_version(&self, out: &mut dyn Write, app: &AppInfo) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, app)?;
        writeln!(out)
    }
}
