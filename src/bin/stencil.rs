// src/bin/stencil.rs

use anyhow::{Context as _, Result};
use colored::*;
use std::path::Path;
use std::time::Duration;
use stencil::{
    App, AppConfig, ArgSpec, Command, ExitStatus, Flag,
    constants::{EXIT_NO_CHANGE, EXIT_RUNTIME},
};

/// Names the file an application config is read from, if set.
const APP_CONFIG_ENV: &str = "STENCIL_APP_CONFIG";

const KNOWN_REMOTES: &[(&str, &str)] = &[
    ("origin", "https://example.com/stencil.git"),
    ("upstream", "https://example.com/upstream/stencil.git"),
];

fn remote_command() -> Result<Command> {
    let add = Command::new("add")
        .summary("Add a remote")
        .long("Registers a remote under <name>. The URL must include a scheme.")
        .flag(Flag::bool("fetch", false).short('f').usage("fetch the remote after adding it"))?
        .flag(
            Flag::string("tags", "auto")
                .usage("which tags to fetch")
                .allowed(&["auto", "all", "none"]),
        )?
        .args(
            ArgSpec::exact(2)
                .names(&["<name>", "<url>"])
                .validator(|args| match args.get(1) {
                    Some(url) if !url.contains("://") => {
                        Err(format!("'{}' is not a URL", url))
                    }
                    _ => Ok(()),
                }),
        )
        .run(|ctx| {
            writeln!(
                ctx.out,
                "Added remote {} (tags: {})",
                ctx.args.join(" "),
                ctx.flags.string("tags")
            )?;
            if ctx.flags.bool("fetch") {
                writeln!(ctx.out, "Fetching...")?;
            }
            Ok(())
        });

    let remove = Command::new("remove")
        .alias("rm")
        .summary("Remove a remote")
        .args(ArgSpec::exact(1).names(&["<name>"]))
        .run(|ctx| {
            let name = ctx.args.first().map(String::as_str).unwrap_or_default();
            if !KNOWN_REMOTES.iter().any(|(known, _)| *known == name) {
                anyhow::bail!("No such remote: '{}'", name);
            }
            writeln!(ctx.out, "Removed remote '{}'", name)?;
            Ok(())
        });

    let list = Command::new("list")
        .alias("ls")
        .summary("List remotes")
        .flag(
            Flag::string("format", "text")
                .short('o')
                .usage("output format")
                .allowed(&["text", "json"]),
        )?
        .flag(
            Flag::duration("timeout", Duration::from_secs(5))
                .usage("time allowed for remote lookups")
                .env("STENCIL_TIMEOUT"),
        )?
        .args(ArgSpec::exact(0))
        .run(|ctx| {
            log::debug!("Listing remotes with timeout {:?}", ctx.flags.duration("timeout"));
            if ctx.flags.string("format") == "json" {
                let remotes: Vec<_> = KNOWN_REMOTES
                    .iter()
                    .map(|(name, url)| serde_json::json!({ "name": name, "url": url }))
                    .collect();
                serde_json::to_writer_pretty(&mut *ctx.out, &remotes)?;
                writeln!(ctx.out)?;
            } else {
                for (name, url) in KNOWN_REMOTES {
                    writeln!(ctx.out, "{}\t{}", name, url)?;
                }
            }
            Ok(())
        });

    let prune = Command::new("prune")
        .summary("Drop stale remotes")
        .deprecated("use 'remote remove' instead")
        .run(|ctx| {
            writeln!(ctx.out, "Nothing to prune")?;
            Ok(())
        });

    Ok(Command::new("remote")
        .summary("Manage remotes")
        .subcommand(add)?
        .subcommand(remove)?
        .subcommand(list)?
        .subcommand(prune)?)
}

fn root_command() -> Result<Command> {
    let sync = Command::new("sync")
        .summary("Synchronize with every remote")
        .flag(Flag::int_list("only", &[]).usage("indices of the remotes to sync"))?
        .run(|ctx| {
            let only = ctx.flags.ints("only");
            if only.is_empty() {
                return Err(ExitStatus::new(EXIT_NO_CHANGE, "Already up to date").into());
            }
            for idx in only {
                let (name, _) = usize::try_from(*idx)
                    .ok()
                    .and_then(|i| KNOWN_REMOTES.get(i))
                    .with_context(|| format!("No remote at index {}", idx))?;
                writeln!(ctx.out, "Synced '{}'", name)?;
            }
            Ok(())
        });

    let debug = Command::new("debug")
        .hidden()
        .summary("Print the resolved invocation")
        .run(|ctx| {
            let path = ctx.command_path();
            writeln!(ctx.out, "path: {}\nargs: {:?}\nflags: {:#?}", path, ctx.args, ctx.flags)?;
            Ok(())
        });

    Ok(Command::new("stencil")
        .summary("A demo of the stencil command framework")
        .persistent_flag(
            Flag::bool("verbose", false)
                .short('v')
                .usage("print each command path before it runs"),
        )?
        .persistent_flag(
            Flag::string("config", "")
                .short('c')
                .usage("path to a config file")
                .env("STENCIL_CONFIG"),
        )?
        .persistent_pre_run(|ctx| {
            if ctx.flags.bool("verbose") {
                let path = ctx.command_path();
                writeln!(ctx.out, "[{}] config: {:?}", path, ctx.flags.string("config"))?;
            }
            Ok(())
        })
        .subcommand(remote_command()?)?
        .subcommand(sync)?
        .subcommand(debug)?)
}

fn build_app() -> Result<App> {
    let config = match std::env::var(APP_CONFIG_ENV) {
        Ok(path) if !path.is_empty() => AppConfig::load(Path::new(&path))?,
        _ => AppConfig::default(),
    };
    Ok(App::builder()
        .name("stencil")
        .description("Declarative command trees with layered flags")
        .config(config)
        .root(root_command()?)
        .build())
}

fn main() {
    env_logger::init();

    let code = match build_app() {
        Ok(app) => app.execute(std::env::args().skip(1)),
        Err(e) => {
            eprintln!("\n{}: {:#}", "Error".red().bold(), e);
            EXIT_RUNTIME
        }
    };
    std::process::exit(code);
}
