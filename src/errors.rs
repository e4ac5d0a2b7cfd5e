// src/errors.rs

//! Error types for the three failure categories of the framework.
//!
//! - [`SetupError`]: the command tree or a flag set was declared incorrectly.
//!   Raised while building, never while executing.
//! - [`UsageError`]: the argument vector does not fit the tree. Always paired
//!   with a help render and exit status 2.
//! - Runtime errors are whatever a hook returns (`anyhow::Error`). An
//!   [`ExitStatus`] inside that error selects the exit code.

use thiserror::Error;

/// A declaration-time fault in the command tree or its flag sets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("flag must have a long name")]
    EmptyFlagName,
    #[error("duplicate flag: --{0}")]
    DuplicateFlag(String),
    #[error("duplicate short flag: -{short} (declared by --{name})")]
    DuplicateShortFlag { short: char, name: String },
    #[error("flag --{0} declares allowed values but is not a string flag")]
    EnumOnNonString(String),
    #[error("command must have a name")]
    EmptyCommandName,
    #[error("command '{parent}' already has a subcommand named or aliased '{name}'")]
    DuplicateCommand { parent: String, name: String },
}

/// A per-invocation input failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("unknown flag: {0}")]
    UnknownFlag(String),
    #[error("flag {0} requires a value")]
    MissingValue(String),
    #[error("flag {0} does not take a value")]
    UnexpectedValue(String),
    #[error("invalid {kind} for --{flag}: {value:?}")]
    InvalidValue {
        flag: String,
        kind: &'static str,
        value: String,
    },
    #[error("invalid {kind} for --{flag}")]
    WrongKind { flag: String, kind: &'static str },
    #[error("invalid int in --{flag}: {value:?}")]
    InvalidListElement { flag: String, value: String },
    #[error("--{flag} must be one of [{}]", allowed.join(" "))]
    NotAllowed { flag: String, allowed: Vec<String> },
    #[error("invalid value for --{flag}: {message}")]
    Rejected { flag: String, message: String },
    #[error("missing required flag --{0}")]
    MissingRequired(String),
    #[error("requires at least {min} arg(s), got {got}")]
    TooFewArgs { min: usize, got: usize },
    #[error("accepts at most {max} arg(s), got {got}")]
    TooManyArgs { max: usize, got: usize },
    #[error("{0}")]
    InvalidArgs(String),
}

/// A handler failure that ends the invocation with a specific exit code.
///
/// Return it from any hook through `anyhow` to use one of the
/// application-reserved codes instead of the generic runtime status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ExitStatus {
    pub code: i32,
    pub message: String,
}

impl ExitStatus {
    /// Creates an exit status with a message to print on stderr.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates an exit status that ends the invocation without printing anything.
    pub fn silent(code: i32) -> Self {
        Self::new(code, "")
    }
}
