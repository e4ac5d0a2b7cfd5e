// src/core/pipeline.rs

//! The execution state machine behind [`App::execute_with`].
//!
//! Stages run in a fixed order and each one may end the invocation:
//!
//! 1. a version token anywhere prints version data (exit 0);
//! 2. a leading `help` prints help for the path that follows (exit 0);
//! 3. the command path is matched;
//! 4. a help token anywhere prints help for that path (exit 0);
//! 5. flags are resolved and 6. positionals are checked (usage errors, exit 2);
//! 7. a group node without a handler prints help (exit 2);
//! 8. the hooks run, and the first failure ends the chain (exit 1 or the
//!    code of an [`ExitStatus`]).
//!
//! A failing hook leaves every later hook unexecuted, persistent post-run
//! hooks included.

use crate::{
    app::App,
    constants::{EXIT_OK, EXIT_RUNTIME, EXIT_USAGE, HELP_COMMAND, HELP_FLAGS, VERSION_FLAGS},
    core::{
        command::{Command, Context, Hook},
        matcher::match_path,
        resolver::resolve,
    },
    errors::{ExitStatus, UsageError},
    render::{AppInfo, HelpData},
};
use std::fmt;
use std::io::Write;

/// Why the hook chain stopped early.
enum Interrupt {
    Failed(anyhow::Error),
    /// The leaf reached the handler stage without a handler.
    NotRunnable,
}

/// Runs one invocation and returns its exit status.
pub fn execute(
    app: &App,
    argv: &[String],
    out: &mut dyn Write,
    err: &mut dyn Write,
    colored: bool,
) -> i32 {
    let code = run_stages(app, argv, out, err, colored);
    log::debug!("Invocation finished with exit code {}", code);
    code
}

fn run_stages(
    app: &App,
    argv: &[String],
    out: &mut dyn Write,
    err: &mut dyn Write,
    colored: bool,
) -> i32 {
    let info = app.info(colored);

    if argv.iter().any(|t| VERSION_FLAGS.contains(&t.as_str())) {
        log::debug!("Version flag found, skipping command matching");
        if let Err(e) = app.renderer().render_version(out, &info) {
            log::error!("Failed to render version: {}", e);
        }
        return EXIT_OK;
    }

    if let Some((first, rest)) = argv.split_first()
        && first == HELP_COMMAND
    {
        let target = match_path(app.root(), rest);
        log::debug!("Help requested for '{}'", path_names(&target.path));
        show_help(app, &info, &target.path, out);
        return EXIT_OK;
    }

    let matched = match_path(app.root(), argv);
    log::debug!("Matched command path '{}'", path_names(&matched.path));

    if argv.iter().any(|t| HELP_FLAGS.contains(&t.as_str())) {
        show_help(app, &info, &matched.path, out);
        return EXIT_OK;
    }

    let env = app.env_lookup();
    let resolution = match resolve(&matched.path, matched.remainder, &**env) {
        Ok(resolution) => resolution,
        Err(e) => return usage_failure(app, &info, &matched.path, &e, out, err),
    };

    let leaf = matched.leaf;
    if let Err(e) = leaf.arg_spec().check(&resolution.positionals) {
        return usage_failure(app, &info, &matched.path, &e, out, err);
    }

    if leaf.is_group() {
        log::debug!("'{}' is a command group, showing help", leaf.name());
        show_help(app, &info, &matched.path, out);
        return EXIT_USAGE;
    }

    if let Some(note) = leaf.deprecation() {
        log::warn!("Command '{}' is deprecated: {}", leaf.name(), note);
    }

    let mut ctx = Context {
        app,
        path: matched.path,
        args: resolution.positionals,
        flags: resolution.flags,
        out,
    };
    match run_hooks(&mut ctx) {
        Ok(()) => EXIT_OK,
        Err(Interrupt::NotRunnable) => {
            show_help(app, &info, &ctx.path, &mut *ctx.out);
            EXIT_USAGE
        }
        Err(Interrupt::Failed(e)) => runtime_failure(&e, err),
    }
}

/// PersistentPreRun root→leaf, PreRun, Run, PostRun, PersistentPostRun leaf→root.
fn run_hooks(ctx: &mut Context<'_>) -> Result<(), Interrupt> {
    let path = ctx.path.clone();
    let Some(&leaf) = path.last() else {
        return Err(Interrupt::NotRunnable);
    };

    for &cmd in &path {
        invoke(cmd, cmd.persistent_pre_run_hook(), "PersistentPreRun", ctx)?;
    }
    invoke(leaf, leaf.pre_run_hook(), "PreRun", ctx)?;

    let run = leaf.run_hook().ok_or(Interrupt::NotRunnable)?;
    invoke(leaf, Some(run), "Run", ctx)?;

    invoke(leaf, leaf.post_run_hook(), "PostRun", ctx)?;
    for &cmd in path.iter().rev() {
        invoke(cmd, cmd.persistent_post_run_hook(), "PersistentPostRun", ctx)?;
    }
    Ok(())
}

fn invoke(
    cmd: &Command,
    hook: Option<&Hook>,
    stage: &str,
    ctx: &mut Context<'_>,
) -> Result<(), Interrupt> {
    let Some(hook) = hook else {
        return Ok(());
    };
    log::debug!("Running {} of '{}'", stage, cmd.name());
    hook(ctx).map_err(Interrupt::Failed)
}

fn usage_failure(
    app: &App,
    info: &AppInfo,
    path: &[&Command],
    error: &UsageError,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> i32 {
    log::debug!("Usage error: {}", error);
    report(err, error);
    show_help(app, info, path, out);
    EXIT_USAGE
}

fn runtime_failure(error: &anyhow::Error, err: &mut dyn Write) -> i32 {
    match error.downcast_ref::<ExitStatus>() {
        Some(status) => {
            if !status.message.is_empty() {
                report(err, &status.message);
            }
            status.code
        }
        None => {
            report(err, format_args!("{:#}", error));
            EXIT_RUNTIME
        }
    }
}

fn show_help(app: &App, info: &AppInfo, path: &[&Command], out: &mut dyn Write) {
    let help = HelpData::for_path(path);
    if let Err(e) = app.renderer().render_help(out, info, &help) {
        log::error!("Failed to render help: {}", e);
    }
}

fn report(err: &mut dyn Write, message: impl fmt::Display) {
    if let Err(e) = writeln!(err, "{}", message) {
        log::error!("Failed to write error output: {}", e);
    }
}

fn path_names(path: &[&Command]) -> String {
    path.iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use crate::{
        app::App,
        config::ColorMode,
        constants::EXIT_NETWORK_ERROR,
        core::{
            command::{ArgSpec, Command},
            flags::Flag,
        },
        errors::ExitStatus,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct Outcome {
        code: i32,
        out: String,
        err: String,
    }

    fn run(app: &App, argv: &[&str]) -> Outcome {
        let argv: Vec<String> = argv.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = app.execute_with(&argv, &mut out, &mut err);
        Outcome {
            code,
            out: String::from_utf8(out).unwrap(),
            err: String::from_utf8(err).unwrap(),
        }
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn app_with(root: Command, env: &[(&str, &str)]) -> App {
        App::builder()
            .name("tool")
            .color(ColorMode::Never)
            .env_lookup(env_of(env))
            .root(root)
            .build()
    }

    type Recorder = Arc<Mutex<Vec<String>>>;

    fn record(log: &Recorder, label: &str) {
        log.lock().unwrap().push(label.to_string());
    }

    /// root → mid → leaf with every hook recording its call.
    fn hooked_tree(log: &Recorder, fail_pre_run: bool) -> Command {
        let (l1, l2, l3, l4, l5) = (log.clone(), log.clone(), log.clone(), log.clone(), log.clone());
        let leaf = Command::new("leaf")
            .pre_run(move |_| {
                record(&l1, "leaf.PreRun");
                if fail_pre_run {
                    anyhow::bail!("pre-run refused");
                }
                Ok(())
            })
            .run(move |_| {
                record(&l2, "leaf.Run");
                Ok(())
            })
            .post_run(move |_| {
                record(&l3, "leaf.PostRun");
                Ok(())
            });
        let mid = Command::new("mid")
            .persistent_pre_run(move |_| {
                record(&l4, "mid.PersistentPreRun");
                Ok(())
            })
            .persistent_post_run(move |_| {
                record(&l5, "mid.PersistentPostRun");
                Ok(())
            })
            .subcommand(leaf)
            .unwrap();
        let (r1, r2) = (log.clone(), log.clone());
        Command::new("tool")
            .persistent_pre_run(move |_| {
                record(&r1, "root.PersistentPreRun");
                Ok(())
            })
            .persistent_post_run(move |_| {
                record(&r2, "root.PersistentPostRun");
                Ok(())
            })
            .subcommand(mid)
            .unwrap()
    }

    #[test]
    fn test_hook_order() {
        let log: Recorder = Arc::default();
        let app = app_with(hooked_tree(&log, false), &[]);

        let outcome = run(&app, &["mid", "leaf"]);
        assert_eq!(outcome.code, 0);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "root.PersistentPreRun",
                "mid.PersistentPreRun",
                "leaf.PreRun",
                "leaf.Run",
                "leaf.PostRun",
                "mid.PersistentPostRun",
                "root.PersistentPostRun",
            ]
        );
    }

    #[test]
    fn test_failing_pre_run_short_circuits() {
        let log: Recorder = Arc::default();
        let app = app_with(hooked_tree(&log, true), &[]);

        let outcome = run(&app, &["mid", "leaf"]);
        assert_eq!(outcome.code, 1);
        assert_eq!(outcome.err, "pre-run refused\n");
        assert!(outcome.out.is_empty(), "runtime errors do not print help");
        assert_eq!(
            *log.lock().unwrap(),
            vec!["root.PersistentPreRun", "mid.PersistentPreRun", "leaf.PreRun"]
        );
    }

    fn level_tree(seen: &Arc<Mutex<Vec<String>>>) -> Command {
        let seen = seen.clone();
        Command::new("tool")
            .persistent_flag(Flag::string("level", "info").env("TOOL_LEVEL"))
            .unwrap()
            .run(move |ctx| {
                seen.lock().unwrap().push(ctx.flags.string("level").to_string());
                Ok(())
            })
    }

    #[test]
    fn test_cli_beats_env_beats_default() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::default();

        assert_eq!(run(&app_with(level_tree(&seen), &[]), &[]).code, 0);
        let with_env = app_with(level_tree(&seen), &[("TOOL_LEVEL", "warn")]);
        assert_eq!(run(&with_env, &[]).code, 0);
        assert_eq!(run(&with_env, &["--level", "debug"]).code, 0);

        assert_eq!(*seen.lock().unwrap(), vec!["info", "warn", "debug"]);
    }

    #[test]
    fn test_missing_required_flag_never_reaches_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let root = Command::new("tool")
            .flag(Flag::string("target", "").required())
            .unwrap()
            .run(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        let app = app_with(root, &[]);

        let outcome = run(&app, &[]);
        assert_eq!(outcome.code, 2);
        assert_eq!(outcome.err, "missing required flag --target\n");
        assert!(outcome.out.contains("Usage:"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(run(&app, &["--target", "prod"]).code, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_flag_is_a_usage_error() {
        let app = app_with(Command::new("tool").run(|_| Ok(())), &[]);
        let outcome = run(&app, &["--bogus"]);
        assert_eq!(outcome.code, 2);
        assert!(outcome.err.contains("--bogus"));
        assert!(outcome.out.contains("tool [FLAGS] [ARGS]"));
    }

    #[test]
    fn test_repeated_invocations_are_identical() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::default();
        let app = app_with(level_tree(&seen), &[("TOOL_LEVEL", "warn")]);

        let first = run(&app, &["--level=error"]);
        let second = run(&app, &["--level=error"]);
        assert_eq!(first.code, second.code);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen.first(), seen.last());
    }

    fn remote_tree(calls: &Arc<AtomicUsize>) -> Command {
        let counter = calls.clone();
        let add = Command::new("add")
            .summary("Add a remote")
            .args(ArgSpec::exact(2).names(&["<name>", "<url>"]))
            .run(move |ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                writeln!(ctx.out, "added {}", ctx.args.join(" "))?;
                Ok(())
            });
        let remote = Command::new("remote")
            .summary("Manage remotes")
            .subcommand(add)
            .unwrap()
            .subcommand(Command::new("rm").deprecated("use remove").run(|_| Ok(())))
            .unwrap();
        Command::new("tool").subcommand(remote).unwrap()
    }

    #[test]
    fn test_version_shortcut_bypasses_matching() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = app_with(remote_tree(&calls), &[]);

        let outcome = run(&app, &["remote", "add", "--bogus", "-V"]);
        assert_eq!(outcome.code, 0);
        assert!(outcome.out.starts_with("tool dev\n"));
        assert!(outcome.err.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_help_keyword_and_help_flag() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = app_with(remote_tree(&calls), &[]);

        let outcome = run(&app, &["help", "remote"]);
        assert_eq!(outcome.code, 0);
        assert!(outcome.out.starts_with("tool remote: Manage remotes\n"));

        let outcome = run(&app, &["help"]);
        assert_eq!(outcome.code, 0);
        assert!(outcome.out.contains("Version:"));

        // The help flag wins even over flags that would fail resolution.
        let outcome = run(&app, &["remote", "add", "--bogus", "--help"]);
        assert_eq!(outcome.code, 0);
        assert!(outcome.out.starts_with("tool remote add: Add a remote\n"));
        assert!(outcome.out.contains("<name> <url>"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_group_node_without_handler_shows_help() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = app_with(remote_tree(&calls), &[]);

        let outcome = run(&app, &["remote"]);
        assert_eq!(outcome.code, 2);
        assert!(outcome.out.contains("Commands:"));
        assert!(outcome.err.is_empty());
    }

    #[test]
    fn test_positional_count_is_checked() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = app_with(remote_tree(&calls), &[]);

        let outcome = run(&app, &["remote", "add", "origin"]);
        assert_eq!(outcome.code, 2);
        assert_eq!(outcome.err, "requires at least 2 arg(s), got 1\n");
        assert!(outcome.out.starts_with("tool remote add: Add a remote\n"));
        assert!(outcome.out.contains("Usage:"));

        let outcome = run(&app, &["remote", "add", "origin", "https://x", "extra"]);
        assert_eq!(outcome.code, 2);
        assert_eq!(outcome.err, "accepts at most 2 arg(s), got 3\n");

        let outcome = run(&app, &["remote", "add", "origin", "https://x"]);
        assert_eq!(outcome.code, 0);
        assert_eq!(outcome.out, "added origin https://x\n");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_positional_validator_failure_is_a_usage_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let root = Command::new("tool")
            .args(ArgSpec::range(1, 0).validator(|args| {
                match args.iter().find(|a| !a.ends_with(".txt")) {
                    Some(bad) => Err(format!("not a text file: {}", bad)),
                    None => Ok(()),
                }
            }))
            .run(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        let app = app_with(root, &[]);

        let outcome = run(&app, &["a.txt", "b.png"]);
        assert_eq!(outcome.code, 2);
        assert_eq!(outcome.err, "not a text file: b.png\n");
        assert!(outcome.out.contains("Usage:"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(run(&app, &["a.txt", "b.txt"]).code, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    fn ids_tree() -> Command {
        Command::new("tool")
            .flag(Flag::int_list("ids", &[]).env("TOOL_IDS"))
            .unwrap()
            .run(|_| Ok(()))
    }

    #[test]
    fn test_bad_flag_value_is_a_usage_error() {
        let outcome = run(&app_with(ids_tree(), &[]), &["--ids", "1,x"]);
        assert_eq!(outcome.code, 2);
        assert_eq!(outcome.err, "invalid int in --ids: \"x\"\n");
        assert!(outcome.out.contains("Usage:"));
    }

    #[test]
    fn test_bad_env_value_is_a_usage_error_unless_overridden() {
        let app = app_with(ids_tree(), &[("TOOL_IDS", "1,two")]);

        let outcome = run(&app, &[]);
        assert_eq!(outcome.code, 2);
        assert_eq!(outcome.err, "invalid int in --ids: \"two\"\n");
        assert!(outcome.out.contains("Usage:"));

        let outcome = run(&app, &["--ids=3"]);
        assert_eq!(outcome.code, 0);
        assert!(outcome.err.is_empty());
    }

    #[test]
    fn test_deprecated_command_still_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = app_with(remote_tree(&calls), &[]);
        assert_eq!(run(&app, &["remote", "rm"]).code, 0);
    }

    #[test]
    fn test_exit_status_selects_code() {
        let root = Command::new("tool")
            .subcommand(
                Command::new("fetch")
                    .run(|_| Err(ExitStatus::new(EXIT_NETWORK_ERROR, "connection refused").into())),
            )
            .unwrap()
            .subcommand(Command::new("check").run(|_| Err(ExitStatus::silent(10).into())))
            .unwrap();
        let app = app_with(root, &[]);

        let outcome = run(&app, &["fetch"]);
        assert_eq!(outcome.code, 30);
        assert_eq!(outcome.err, "connection refused\n");

        let outcome = run(&app, &["check"]);
        assert_eq!(outcome.code, 10);
        assert!(outcome.err.is_empty());
    }

    #[test]
    fn test_leaf_without_handler_runs_pre_hooks_then_shows_help() {
        let log: Recorder = Arc::default();
        let l1 = log.clone();
        let root = Command::new("tool")
            .persistent_pre_run(move |_| {
                record(&l1, "root.PersistentPreRun");
                Ok(())
            })
            .subcommand(Command::new("empty").summary("Nothing here"))
            .unwrap();
        let app = app_with(root, &[]);

        let outcome = run(&app, &["empty"]);
        assert_eq!(outcome.code, 2);
        assert!(outcome.out.starts_with("tool empty: Nothing here\n"));
        assert_eq!(*log.lock().unwrap(), vec!["root.PersistentPreRun"]);
    }

    #[test]
    fn test_runtime_error_prints_context_chain() {
        let root = Command::new("tool").run(|_| {
            let inner = anyhow::anyhow!("disk full");
            Err(inner.context("Failed to write cache"))
        });
        let outcome = run(&app_with(root, &[]), &[]);
        assert_eq!(outcome.code, 1);
        assert_eq!(outcome.err, "Failed to write cache: disk full\n");
    }
}
