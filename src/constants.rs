// src/constants.rs

/// Tokens that print version information, checked before any other parsing.
pub const VERSION_FLAGS: &[&str] = &["--version", "-V"];

/// Tokens that print help for the matched command path.
pub const HELP_FLAGS: &[&str] = &["--help", "-h"];

/// A literal first token that turns the rest of the line into a help lookup.
pub const HELP_COMMAND: &str = "help";

/// After this token every remaining argument is positional.
pub const POSITIONAL_TERMINATOR: &str = "--";

/// Prefix that negates a boolean long flag (`--no-verbose`).
pub const NEGATION_PREFIX: &str = "no-";

/// Separator for list-typed flag values.
pub const LIST_SEPARATOR: char = ',';

/// The invocation succeeded.
pub const EXIT_OK: i32 = 0;

/// A hook or handler failed.
pub const EXIT_RUNTIME: i32 = 1;

/// The command line was malformed or failed validation.
pub const EXIT_USAGE: i32 = 2;

/// Reserved for application logic: nothing needed to change.
pub const EXIT_NO_CHANGE: i32 = 10;

/// Reserved for application logic: a verification step failed.
pub const EXIT_VERIFY_FAILED: i32 = 20;

/// Reserved for application logic: a network operation failed.
pub const EXIT_NETWORK_ERROR: i32 = 30;

/// Version string used when the application does not declare one.
pub const DEFAULT_VERSION: &str = "dev";

/// Placeholder for unknown build metadata.
pub const UNKNOWN: &str = "unknown";

/// Environment variable that disables colored output when set and non-empty.
pub const NO_COLOR_ENV: &str = "NO_COLOR";
