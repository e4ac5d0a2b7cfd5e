// src/render/console.rs

use super::{
    AppInfo, FlagRow, HelpData, Renderer,
    style::{Style, paint},
};
use std::io::{self, Write};

/// Plain-text help and version layout, optionally colored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleRenderer;

impl ConsoleRenderer {
    fn write_version_block(out: &mut dyn Write, app: &AppInfo) -> io::Result<()> {
        if !app.show.any() {
            return Ok(());
        }
        writeln!(out, "{}", paint("Version:", Style::Header, app.colored))?;
        if app.show.version {
            writeln!(out, "  {}", app.version.version)?;
        }
        if app.show.build_date {
            writeln!(out, "  built {}", app.version.build_date)?;
        }
        if app.show.commit_hash {
            writeln!(out, "  commit {}", app.version.commit_hash)?;
        }
        if app.show.branch {
            writeln!(out, "  branch {}", app.version.branch)?;
        }
        writeln!(out)
    }

    fn flag_line(flag: &FlagRow) -> String {
        let short = flag
            .short
            .map(|c| format!("-{}, ", c))
            .unwrap_or_default();
        let default = if flag.allowed.is_empty() {
            format!(" (default: {})", flag.default)
        } else {
            format!(
                " (one of: {}; default: {})",
                flag.allowed.join(","),
                flag.default
            )
        };
        format!("  {}--{}\t{}{}", short, flag.name, flag.usage, default)
    }
}

impl Renderer for ConsoleRenderer {
    fn render_help(&self, out: &mut dyn Write, app: &AppInfo, help: &HelpData) -> io::Result<()> {
        let title = help.path.join(" ");
        writeln!(
            out,
            "{}: {}\n",
            paint(&title, Style::Title, app.colored),
            help.summary
        )?;
        if !help.long.is_empty() {
            writeln!(out, "{}\n", help.long)?;
        }

        if help.is_root {
            Self::write_version_block(out, app)?;
            if !app.description.is_empty() {
                writeln!(
                    out,
                    "{} {}\n",
                    paint("Description:", Style::Label, app.colored),
                    app.description
                )?;
            }
        }

        writeln!(out, "{}", paint("Usage:", Style::Header, app.colored))?;
        let command_slot = if help.subcommands.is_empty() {
            ""
        } else {
            " [COMMAND]"
        };
        writeln!(out, "  {} [FLAGS]{} [ARGS]\n", title, command_slot)?;

        if !help.flags.is_empty() {
            writeln!(out, "{}", paint("Flags:", Style::Header, app.colored))?;
            for flag in &help.flags {
                writeln!(out, "{}", Self::flag_line(flag))?;
            }
            writeln!(out)?;
        }

        if !help.subcommands.is_empty() {
            writeln!(out, "{}", paint("Commands:", Style::Header, app.colored))?;
            for sub in &help.subcommands {
                let name = if sub.deprecated {
                    format!(
                        "{} {}",
                        sub.name,
                        paint("(deprecated)", Style::Dim, app.colored)
                    )
                } else {
                    sub.name.clone()
                };
                writeln!(out, "  {:<16} {}", name, sub.summary)?;
            }
            writeln!(out)?;
        }

        if !help.args.is_empty() {
            writeln!(out, "{}", paint("Arguments:", Style::Header, app.colored))?;
            writeln!(out, "  {}\n", help.args.join(" "))?;
        }
        Ok(())
    }

    fn render_version(&self, out: &mut dyn Write, app: &AppInfo) -> io::Result<()> {
        let v = &app.version;
        writeln!(out, "{} {}", app.name, v.version)?;
        if !v.commit_hash.is_empty() || !v.build_date.is_empty() || !v.branch.is_empty() {
            writeln!(
                out,
                "commit: {}  built: {}  branch: {}",
                v.commit_hash, v.build_date, v.branch
            )?;
        }
        Ok(())
    }
}
