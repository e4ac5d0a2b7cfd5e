// src/core/flags.rs

//! Flag declarations, typed flag values and insertion-ordered flag sets.

use crate::errors::SetupError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Custom validation run on a cast value. Returns a human-readable reason on failure.
pub type Validator = Arc<dyn Fn(&FlagValue) -> Result<(), String> + Send + Sync>;

/// The semantic type of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    Bool,
    String,
    Int,
    Duration,
    StringList,
    IntList,
}

impl FlagKind {
    /// Short name used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::Int => "int",
            Self::Duration => "duration",
            Self::StringList => "string slice",
            Self::IntList => "int slice",
        }
    }
}

/// A natively typed flag value, one variant per [`FlagKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    String(String),
    Int(i64),
    Duration(#[serde(serialize_with = "serialize_duration")] Duration),
    StringList(Vec<String>),
    IntList(Vec<i64>),
}

impl FlagValue {
    /// The kind this value belongs to.
    pub fn kind(&self) -> FlagKind {
        match self {
            Self::Bool(_) => FlagKind::Bool,
            Self::String(_) => FlagKind::String,
            Self::Int(_) => FlagKind::Int,
            Self::Duration(_) => FlagKind::Duration,
            Self::StringList(_) => FlagKind::StringList,
            Self::IntList(_) => FlagKind::IntList,
        }
    }

    /// Whether the value counts as "not provided" for required-flag checks.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::String(s) => s.is_empty(),
            Self::StringList(v) => v.is_empty(),
            Self::IntList(v) => v.is_empty(),
            Self::Bool(_) | Self::Int(_) | Self::Duration(_) => false,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::String(s) => write!(f, "{}", s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Duration(d) => write!(f, "{:?}", d),
            Self::StringList(v) => write!(f, "[{}]", v.join(",")),
            Self::IntList(v) => {
                let parts: Vec<String> = v.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(","))
            }
        }
    }
}

fn serialize_duration<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{:?}", d))
}

/// A typed command-line parameter declaration.
///
/// Built with one of the typed constructors and refined with the chained
/// setters, then added to a [`FlagSet`]:
///
/// ```
/// use stencil::core::flags::Flag;
///
/// let flag = Flag::string("format", "text")
///     .short('f')
///     .usage("output format")
///     .env("APP_FORMAT")
///     .allowed(&["text", "json"]);
/// assert_eq!(flag.name(), "format");
/// ```
#[derive(Clone)]
pub struct Flag {
    kind: FlagKind,
    name: String,
    short: Option<char>,
    usage: String,
    default: FlagValue,
    env: Option<String>,
    required: bool,
    allowed: Vec<String>,
    validator: Option<Validator>,
    hidden: bool,
}

impl Flag {
    fn with_default(name: &str, default: FlagValue) -> Self {
        Self {
            kind: default.kind(),
            name: name.to_string(),
            short: None,
            usage: String::new(),
            default,
            env: None,
            required: false,
            allowed: Vec::new(),
            validator: None,
            hidden: false,
        }
    }

    /// A boolean flag. Supports `--name`, `--no-name` and short bundling.
    pub fn bool(name: &str, default: bool) -> Self {
        Self::with_default(name, FlagValue::Bool(default))
    }

    /// A string flag.
    pub fn string(name: &str, default: &str) -> Self {
        Self::with_default(name, FlagValue::String(default.to_string()))
    }

    /// A base-10 integer flag.
    pub fn int(name: &str, default: i64) -> Self {
        Self::with_default(name, FlagValue::Int(default))
    }

    /// A duration flag parsed from literals such as `1h30m` or `250ms`.
    pub fn duration(name: &str, default: Duration) -> Self {
        Self::with_default(name, FlagValue::Duration(default))
    }

    /// A comma-separated list of strings.
    pub fn string_list(name: &str, default: &[&str]) -> Self {
        let values = default.iter().map(|s| (*s).to_string()).collect();
        Self::with_default(name, FlagValue::StringList(values))
    }

    /// A comma-separated list of integers.
    pub fn int_list(name: &str, default: &[i64]) -> Self {
        Self::with_default(name, FlagValue::IntList(default.to_vec()))
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn usage(mut self, usage: &str) -> Self {
        self.usage = usage.to_string();
        self
    }

    /// Names an environment variable consulted between defaults and the command line.
    pub fn env(mut self, var: &str) -> Self {
        self.env = Some(var.to_string());
        self
    }

    /// Marks the flag as required. Only enforced for flags local to the matched leaf.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restricts a string flag to a fixed set of values.
    pub fn allowed(mut self, values: &[&str]) -> Self {
        self.allowed = values.iter().map(|s| (*s).to_string()).collect();
        self
    }

    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&FlagValue) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(f));
        self
    }

    /// Hides the flag from help and from the environment overlay.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn kind(&self) -> FlagKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_name(&self) -> Option<char> {
        self.short
    }

    pub fn usage_text(&self) -> &str {
        &self.usage
    }

    pub fn default_value(&self) -> &FlagValue {
        &self.default
    }

    pub fn env_var(&self) -> Option<&str> {
        self.env.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn allowed_values(&self) -> &[String] {
        &self.allowed
    }

    pub fn custom_validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("short", &self.short)
            .field("default", &self.default)
            .field("env", &self.env)
            .field("required", &self.required)
            .field("allowed", &self.allowed)
            .field("validator", &self.validator.is_some())
            .field("hidden", &self.hidden)
            .finish()
    }
}

/// An insertion-ordered collection of flags indexed by long and short name.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    order: Vec<Flag>,
    by_long: HashMap<String, usize>,
    by_short: HashMap<char, usize>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a flag, rejecting duplicate long or short names within this set.
    pub fn add(&mut self, flag: Flag) -> Result<(), SetupError> {
        if flag.name.is_empty() {
            return Err(SetupError::EmptyFlagName);
        }
        if self.by_long.contains_key(&flag.name) {
            return Err(SetupError::DuplicateFlag(flag.name));
        }
        if let Some(short) = flag.short
            && self.by_short.contains_key(&short)
        {
            return Err(SetupError::DuplicateShortFlag {
                short,
                name: flag.name,
            });
        }
        if !flag.allowed.is_empty() && flag.kind != FlagKind::String {
            return Err(SetupError::EnumOnNonString(flag.name));
        }

        let idx = self.order.len();
        self.by_long.insert(flag.name.clone(), idx);
        if let Some(short) = flag.short {
            self.by_short.insert(short, idx);
        }
        self.order.push(flag);
        Ok(())
    }

    /// Flags in declaration order.
    pub fn list(&self) -> &[Flag] {
        &self.order
    }

    pub fn get_long(&self, name: &str) -> Option<&Flag> {
        self.by_long.get(name).and_then(|&i| self.order.get(i))
    }

    pub fn get_short(&self, short: char) -> Option<&Flag> {
        self.by_short.get(&short).and_then(|&i| self.order.get(i))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
