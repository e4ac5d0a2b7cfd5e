// src/core/resolver.rs

//! Flag resolution for a matched command path.
//!
//! Values are layered in a fixed order, each layer overwriting the previous:
//!
//! 1. **Defaults** of every flag in scope: persistent flags root→leaf, then the
//!    leaf's local flags. A later declaration of the same name replaces an
//!    earlier one.
//! 2. **Environment**: flags that declare a variable and are not hidden take
//!    its value when it is set and non-empty. Each name is considered once, by
//!    the first flag in scope that declares a variable for it. The text is
//!    kept raw until the command line has been scanned, and only cast (with
//!    the effective flag of that name) when no token set the flag.
//! 3. **Command line**: remaining tokens are scanned left to right. Repeated
//!    flags overwrite; nothing accumulates.
//!
//! Finally, required flags local to the leaf must hold a non-empty value.

use crate::{
    constants::{NEGATION_PREFIX, POSITIONAL_TERMINATOR},
    core::{
        cast::{RawValue, cast},
        command::Command,
        flags::{Flag, FlagKind, FlagValue},
    },
    errors::UsageError,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Looks up an environment variable by name.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// The process environment. Values that are not valid UTF-8 are converted lossily.
pub fn process_env() -> EnvLookup {
    Arc::new(|name| {
        std::env::var_os(name).map(|value| match value.into_string() {
            Ok(text) => text,
            Err(raw) => {
                log::trace!("${} is not valid UTF-8, converting lossily", name);
                raw.to_string_lossy().into_owned()
            }
        })
    })
}

/// Final flag values of one invocation, one per long name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFlags {
    values: HashMap<String, FlagValue>,
}

impl ResolvedFlags {
    pub fn get(&self, name: &str) -> Option<&FlagValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value of a boolean flag, `false` if absent or of another kind.
    pub fn bool(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(FlagValue::Bool(true)))
    }

    /// The value of a string flag, empty if absent or of another kind.
    pub fn string(&self, name: &str) -> &str {
        match self.values.get(name) {
            Some(FlagValue::String(s)) => s,
            _ => "",
        }
    }

    pub fn int(&self, name: &str) -> i64 {
        match self.values.get(name) {
            Some(FlagValue::Int(i)) => *i,
            _ => 0,
        }
    }

    pub fn duration(&self, name: &str) -> Duration {
        match self.values.get(name) {
            Some(FlagValue::Duration(d)) => *d,
            _ => Duration::ZERO,
        }
    }

    pub fn strings(&self, name: &str) -> &[String] {
        match self.values.get(name) {
            Some(FlagValue::StringList(v)) => v,
            _ => &[],
        }
    }

    pub fn ints(&self, name: &str) -> &[i64] {
        match self.values.get(name) {
            Some(FlagValue::IntList(v)) => v,
            _ => &[],
        }
    }

    fn set(&mut self, name: &str, value: FlagValue) {
        self.values.insert(name.to_string(), value);
    }
}

/// Flags and positional arguments resolved from one argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub flags: ResolvedFlags,
    pub positionals: Vec<String>,
}

/// Every flag in scope at the end of `path`: persistent flags root→leaf, then
/// the leaf's local flags, in declaration order. Same-named flags from
/// different depths all appear.
pub fn flag_chain<'t>(path: &[&'t Command]) -> Vec<&'t Flag> {
    let mut chain: Vec<&'t Flag> = path
        .iter()
        .flat_map(|&cmd| cmd.persistent_flags().list())
        .collect();
    if let Some(&leaf) = path.last() {
        chain.extend(leaf.local_flags().list());
    }
    chain
}

/// Resolves flag values for `path` from defaults, the environment and `remainder`.
pub fn resolve(
    path: &[&Command],
    remainder: &[String],
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<Resolution, UsageError> {
    let chain = flag_chain(path);

    let mut flags = ResolvedFlags::default();
    for flag in &chain {
        flags.set(flag.name(), flag.default_value().clone());
    }

    let lookup = FlagLookup::new(&chain);
    let pending = collect_env(&chain, &lookup, env);

    let mut from_cli = HashSet::new();
    let positionals = apply_tokens(&lookup, remainder, &mut flags, &mut from_cli)?;
    apply_env(pending, &from_cli, &mut flags)?;

    if let Some(leaf) = path.last() {
        check_required(leaf, &flags)?;
    }

    log::debug!(
        "Resolved {} flag(s) and {} positional(s)",
        flags.len(),
        positionals.len()
    );
    Ok(Resolution { flags, positionals })
}

/// An environment value waiting for the command line to be scanned.
struct EnvCandidate<'t> {
    flag: &'t Flag,
    var: &'t str,
    raw: String,
}

fn collect_env<'t>(
    chain: &[&'t Flag],
    lookup: &FlagLookup<'t>,
    env: &dyn Fn(&str) -> Option<String>,
) -> Vec<EnvCandidate<'t>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut pending = Vec::new();
    for &owner in chain {
        let Some(var) = owner.env_var() else { continue };
        if owner.is_hidden() || !seen.insert(owner.name()) {
            continue;
        }
        if let Some(raw) = env(var).filter(|v| !v.is_empty()) {
            let flag = lookup.long.get(owner.name()).copied().unwrap_or(owner);
            pending.push(EnvCandidate { flag, var, raw });
        }
    }
    pending
}

fn apply_env(
    pending: Vec<EnvCandidate<'_>>,
    from_cli: &HashSet<&str>,
    flags: &mut ResolvedFlags,
) -> Result<(), UsageError> {
    for candidate in pending {
        let name = candidate.flag.name();
        if from_cli.contains(name) {
            log::trace!("Flag --{} set on the command line, ignoring ${}", name, candidate.var);
            continue;
        }
        log::trace!("Flag --{} taken from ${}", name, candidate.var);
        let value = cast(candidate.flag, RawValue::Text(&candidate.raw))?;
        flags.set(name, value);
    }
    Ok(())
}

/// Long and short name indices over a flag chain; later flags shadow earlier ones.
struct FlagLookup<'t> {
    long: HashMap<&'t str, &'t Flag>,
    short: HashMap<char, &'t Flag>,
}

impl<'t> FlagLookup<'t> {
    fn new(chain: &[&'t Flag]) -> Self {
        let mut long = HashMap::new();
        let mut short = HashMap::new();
        for &flag in chain {
            long.insert(flag.name(), flag);
            if let Some(c) = flag.short_name() {
                short.insert(c, flag);
            }
        }
        Self { long, short }
    }
}

fn split_eq(body: &str) -> (&str, Option<&str>) {
    match body.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (body, None),
    }
}

/// Scans the command-line tokens, writing flag values into `flags` and
/// returning the positional arguments and recording every flag it set in
/// `from_cli`. Stops at the first error.
fn apply_tokens<'a, 't, I>(
    lookup: &FlagLookup<'t>,
    remainder: I,
    flags: &mut ResolvedFlags,
    from_cli: &mut HashSet<&'t str>,
) -> Result<Vec<String>, UsageError>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut positionals = Vec::new();
    let mut tokens = remainder.into_iter();
    let mut positional_only = false;

    while let Some(token) = tokens.next() {
        if positional_only {
            positionals.push(token.clone());
            continue;
        }
        if token == POSITIONAL_TERMINATOR {
            positional_only = true;
            continue;
        }

        if let Some(body) = token.strip_prefix("--") {
            let (name, inline) = split_eq(body);
            let (flag, negated) = match lookup.long.get(name) {
                Some(&flag) => (flag, false),
                None => match name
                    .strip_prefix(NEGATION_PREFIX)
                    .and_then(|base| lookup.long.get(base))
                {
                    Some(&flag) if flag.kind() == FlagKind::Bool => (flag, true),
                    _ => return Err(UsageError::UnknownFlag(format!("--{}", name))),
                },
            };
            log::trace!("Token '{}' sets --{}", token, flag.name());

            let raw = if negated {
                if inline.is_some() {
                    return Err(UsageError::UnexpectedValue(format!("--{}", name)));
                }
                RawValue::Native(FlagValue::Bool(false))
            } else if let Some(value) = inline {
                RawValue::Text(value)
            } else if flag.kind() == FlagKind::Bool {
                RawValue::Native(FlagValue::Bool(true))
            } else {
                let value = tokens
                    .next()
                    .ok_or_else(|| UsageError::MissingValue(format!("--{}", name)))?;
                RawValue::Text(value)
            };
            flags.set(flag.name(), cast(flag, raw)?);
            from_cli.insert(flag.name());
            continue;
        }

        if let Some(body) = token.strip_prefix('-')
            && !body.is_empty()
        {
            if !body.contains('=') && body.chars().count() > 1 {
                // Bundled boolean switches: every letter must be a boolean flag.
                for c in body.chars() {
                    let flag = lookup
                        .short
                        .get(&c)
                        .copied()
                        .ok_or_else(|| UsageError::UnknownFlag(format!("-{}", c)))?;
                    if flag.kind() != FlagKind::Bool {
                        return Err(UsageError::MissingValue(format!("-{}", c)));
                    }
                    flags.set(flag.name(), FlagValue::Bool(true));
                    from_cli.insert(flag.name());
                }
                continue;
            }

            let (name, inline) = split_eq(body);
            let mut letters = name.chars();
            let flag = match (letters.next(), letters.next()) {
                (Some(c), None) => lookup.short.get(&c).copied(),
                _ => None,
            }
            .ok_or_else(|| UsageError::UnknownFlag(format!("-{}", name)))?;
            log::trace!("Token '{}' sets --{}", token, flag.name());

            let raw = if let Some(value) = inline {
                RawValue::Text(value)
            } else if flag.kind() == FlagKind::Bool {
                RawValue::Native(FlagValue::Bool(true))
            } else {
                let value = tokens
                    .next()
                    .ok_or_else(|| UsageError::MissingValue(format!("-{}", name)))?;
                RawValue::Text(value)
            };
            flags.set(flag.name(), cast(flag, raw)?);
            from_cli.insert(flag.name());
            continue;
        }

        positionals.push(token.clone());
    }

    Ok(positionals)
}

fn check_required(leaf: &Command, flags: &ResolvedFlags) -> Result<(), UsageError> {
    for flag in leaf.local_flags().list() {
        if !flag.is_required() {
            continue;
        }
        if flags.get(flag.name()).is_none_or(FlagValue::is_empty) {
            return Err(UsageError::MissingRequired(flag.name().to_string()));
        }
    }
    Ok(())
}
