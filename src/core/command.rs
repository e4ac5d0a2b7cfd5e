// src/core/command.rs

use crate::{
    app::App,
    core::{
        flags::{Flag, FlagSet},
        resolver::ResolvedFlags,
    },
    errors::{SetupError, UsageError},
};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

/// A lifecycle callback. Any error it returns is a runtime failure of the invocation.
pub type Hook = Arc<dyn Fn(&mut Context<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Custom validation of the positional arguments, run after the count check.
pub type ArgsValidator = Arc<dyn Fn(&[String]) -> Result<(), String> + Send + Sync>;

/// Positional argument rules for a command.
#[derive(Clone, Default)]
pub struct ArgSpec {
    pub min: usize,
    /// Zero means unbounded.
    pub max: usize,
    /// Placeholder names shown in help.
    pub names: Vec<String>,
    pub validate: Option<ArgsValidator>,
}

impl ArgSpec {
    /// Any number of arguments.
    pub fn any() -> Self {
        Self::default()
    }

    /// Exactly `n` arguments.
    pub fn exact(n: usize) -> Self {
        Self::range(n, n)
    }

    pub fn range(min: usize, max: usize) -> Self {
        Self {
            min,
            max,
            ..Self::default()
        }
    }

    pub fn names(mut self, names: &[&str]) -> Self {
        self.names = names.iter().map(|s| (*s).to_string()).collect();
        self
    }

    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&[String]) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(f));
        self
    }

    /// Checks the argument count, then the custom validator.
    pub fn check(&self, args: &[String]) -> Result<(), UsageError> {
        let got = args.len();
        if got < self.min {
            return Err(UsageError::TooFewArgs { min: self.min, got });
        }
        if self.max > 0 && got > self.max {
            return Err(UsageError::TooManyArgs { max: self.max, got });
        }
        if let Some(validate) = &self.validate {
            validate(args).map_err(UsageError::InvalidArgs)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgSpec")
            .field("min", &self.min)
            .field("max", &self.max)
            .field("names", &self.names)
            .field("validate", &self.validate.is_some())
            .finish()
    }
}

/// A node of the static command tree.
///
/// Declared once at startup with the builder methods and never mutated while
/// executing. Builder methods that can violate a tree invariant return a
/// [`SetupError`], so a bad declaration aborts startup:
///
/// ```
/// use stencil::core::{command::Command, flags::Flag};
///
/// # fn main() -> Result<(), stencil::SetupError> {
/// let root = Command::new("tool")
///     .persistent_flag(Flag::bool("verbose", false).short('v'))?
///     .subcommand(
///         Command::new("build")
///             .alias("b")
///             .flag(Flag::string("target", "debug"))?
///             .run(|_ctx| Ok(())),
///     )?;
/// assert_eq!(root.children().len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct Command {
    name: String,
    summary: String,
    long: String,
    aliases: Vec<String>,
    hidden: bool,
    deprecated: Option<String>,

    run: Option<Hook>,
    pre_run: Option<Hook>,
    post_run: Option<Hook>,
    persistent_pre_run: Option<Hook>,
    persistent_post_run: Option<Hook>,

    persistent_flags: FlagSet,
    flags: FlagSet,

    args: ArgSpec,

    children: Vec<Command>,
    /// Child position by name and by alias.
    child_index: HashMap<String, usize>,
}

impl Command {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }

    pub fn long(mut self, long: &str) -> Self {
        self.long = long.to_string();
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Hides the command from the parent's subcommand listing. It still matches.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn deprecated(mut self, note: &str) -> Self {
        self.deprecated = Some(note.to_string());
        self
    }

    pub fn args(mut self, spec: ArgSpec) -> Self {
        self.args = spec;
        self
    }

    pub fn run<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.run = Some(Arc::new(f));
        self
    }

    pub fn pre_run<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.pre_run = Some(Arc::new(f));
        self
    }

    pub fn post_run<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.post_run = Some(Arc::new(f));
        self
    }

    /// Runs before `pre_run` for this command and every descendant it leads to.
    pub fn persistent_pre_run<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.persistent_pre_run = Some(Arc::new(f));
        self
    }

    /// Runs after `post_run`, unwinding from the leaf back to the root.
    pub fn persistent_post_run<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.persistent_post_run = Some(Arc::new(f));
        self
    }

    /// Declares a flag inherited by this command and all of its descendants.
    pub fn persistent_flag(mut self, flag: Flag) -> Result<Self, SetupError> {
        self.persistent_flags.add(flag)?;
        Ok(self)
    }

    /// Declares a flag visible only when this command is the matched leaf.
    pub fn flag(mut self, flag: Flag) -> Result<Self, SetupError> {
        self.flags.add(flag)?;
        Ok(self)
    }

    /// Appends a child command. Its name and aliases must not collide with a sibling's.
    pub fn subcommand(mut self, child: Self) -> Result<Self, SetupError> {
        if child.name.is_empty() {
            return Err(SetupError::EmptyCommandName);
        }

        let keys: Vec<&String> = std::iter::once(&child.name)
            .chain(child.aliases.iter())
            .collect();
        for (i, key) in keys.iter().enumerate() {
            let repeated = keys.iter().take(i).any(|earlier| earlier == key);
            if repeated || self.child_index.contains_key(key.as_str()) {
                return Err(SetupError::DuplicateCommand {
                    parent: self.name.clone(),
                    name: (*key).clone(),
                });
            }
        }

        let idx = self.children.len();
        for key in keys {
            self.child_index.insert(key.clone(), idx);
        }
        self.children.push(child);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn summary_text(&self) -> &str {
        &self.summary
    }

    pub fn long_text(&self) -> &str {
        &self.long
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn deprecation(&self) -> Option<&str> {
        self.deprecated.as_deref()
    }

    pub fn arg_spec(&self) -> &ArgSpec {
        &self.args
    }

    pub fn persistent_flags(&self) -> &FlagSet {
        &self.persistent_flags
    }

    pub fn local_flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Finds the direct child whose name or alias is exactly `token`.
    pub fn find_child(&self, token: &str) -> Option<&Self> {
        self.child_index
            .get(token)
            .and_then(|&idx| self.children.get(idx))
    }

    pub fn is_runnable(&self) -> bool {
        self.run.is_some()
    }

    /// A command with children and no handler can only print help.
    pub fn is_group(&self) -> bool {
        self.run.is_none() && !self.children.is_empty()
    }

    pub(crate) fn run_hook(&self) -> Option<&Hook> {
        self.run.as_ref()
    }

    pub(crate) fn pre_run_hook(&self) -> Option<&Hook> {
        self.pre_run.as_ref()
    }

    pub(crate) fn post_run_hook(&self) -> Option<&Hook> {
        self.post_run.as_ref()
    }

    pub(crate) fn persistent_pre_run_hook(&self) -> Option<&Hook> {
        self.persistent_pre_run.as_ref()
    }

    pub(crate) fn persistent_post_run_hook(&self) -> Option<&Hook> {
        self.persistent_post_run.as_ref()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("hidden", &self.hidden)
            .field("deprecated", &self.deprecated)
            .field("runnable", &self.run.is_some())
            .field("persistent_flags", &self.persistent_flags.len())
            .field("flags", &self.flags.len())
            .field("args", &self.args)
            .field("children", &self.children)
            .finish()
    }
}

/// Per-invocation state handed to every hook.
pub struct Context<'a> {
    pub app: &'a App,
    /// Matched commands, root first. Never empty.
    pub path: Vec<&'a Command>,
    /// Positional arguments left after flag parsing.
    pub args: Vec<String>,
    pub flags: ResolvedFlags,
    /// Standard output of the invocation.
    pub out: &'a mut dyn Write,
}

impl Context<'_> {
    /// The matched leaf command.
    pub fn command(&self) -> Option<&Command> {
        self.path.last().copied()
    }

    /// Space-separated command names from the root to the leaf.
    pub fn command_path(&self) -> String {
        self.path
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("path", &self.command_path())
            .field("args", &self.args)
            .field("flags", &self.flags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_are_found_by_name_and_alias() {
        let root = Command::new("git")
            .subcommand(Command::new("remote").alias("r"))
            .unwrap()
            .subcommand(Command::new("status").alias("st"))
            .unwrap();

        assert_eq!(root.find_child("remote").map(Command::name), Some("remote"));
        assert_eq!(root.find_child("st").map(Command::name), Some("status"));
        assert!(root.find_child("Remote").is_none());
        assert!(root.find_child("rem").is_none());
    }

    #[test]
    fn test_sibling_name_collisions_are_rejected() {
        let root = Command::new("git")
            .subcommand(Command::new("remote").alias("r"))
            .unwrap();

        let err = root
            .clone()
            .subcommand(Command::new("remote"))
            .unwrap_err();
        assert_eq!(
            err,
            SetupError::DuplicateCommand {
                parent: "git".to_string(),
                name: "remote".to_string()
            }
        );

        let err = root.clone().subcommand(Command::new("rebase").alias("r")).unwrap_err();
        assert!(matches!(err, SetupError::DuplicateCommand { name, .. } if name == "r"));

        let err = root.clone().subcommand(Command::new("reset").alias("reset")).unwrap_err();
        assert!(matches!(err, SetupError::DuplicateCommand { name, .. } if name == "reset"));

        assert_eq!(
            root.subcommand(Command::new("")).unwrap_err(),
            SetupError::EmptyCommandName
        );
    }

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_arg_spec_counts() {
        let spec = ArgSpec::range(1, 2);
        assert_eq!(
            spec.check(&[]),
            Err(UsageError::TooFewArgs { min: 1, got: 0 })
        );
        assert!(spec.check(&strings(&["a"])).is_ok());
        assert!(spec.check(&strings(&["a", "b"])).is_ok());
        let err = spec.check(&strings(&["a", "b", "c"])).unwrap_err();
        assert_eq!(err.to_string(), "accepts at most 2 arg(s), got 3");

        // A maximum of zero is unbounded.
        let many = strings(&["a"; 50]);
        assert!(ArgSpec::any().check(&many).is_ok());
    }

    #[test]
    fn test_arg_spec_validator_runs_after_count() {
        let spec = ArgSpec::exact(1).validator(|args| {
            if args.iter().all(|a| a.starts_with("http")) {
                Ok(())
            } else {
                Err("expected a URL".to_string())
            }
        });
        assert_eq!(
            spec.check(&[]),
            Err(UsageError::TooFewArgs { min: 1, got: 0 })
        );
        assert_eq!(
            spec.check(&strings(&["ftp"])),
            Err(UsageError::InvalidArgs("expected a URL".to_string()))
        );
        assert!(spec.check(&strings(&["https://example.com"])).is_ok());
    }

    #[test]
    fn test_group_and_runnable_classification() {
        let leaf = Command::new("list").run(|_| Ok(()));
        assert!(leaf.is_runnable());
        assert!(!leaf.is_group());

        let group = Command::new("remote").subcommand(leaf).unwrap();
        assert!(group.is_group());
        assert!(!group.is_runnable());

        assert!(!Command::new("bare").is_group());
    }

    #[test]
    fn test_flag_declarations_surface_setup_errors() {
        let err = Command::new("build")
            .flag(Flag::bool("release", false))
            .unwrap()
            .flag(Flag::bool("release", true))
            .unwrap_err();
        assert_eq!(err, SetupError::DuplicateFlag("release".to_string()));

        // Persistent and local sets are independent.
        let cmd = Command::new("build")
            .persistent_flag(Flag::bool("release", false))
            .unwrap()
            .flag(Flag::bool("release", true))
            .unwrap();
        assert_eq!(cmd.persistent_flags().len(), 1);
        assert_eq!(cmd.local_flags().len(), 1);
    }
}
