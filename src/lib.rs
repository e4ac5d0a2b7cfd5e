//! A declarative command-tree framework for command-line applications.
//!
//! Declare a tree of [`Command`]s with typed [`Flag`]s, wrap it in an [`App`]
//! and hand it the argument vector:
//!
//! ```
//! use stencil::{App, Command, Flag};
//!
//! # fn main() -> Result<(), stencil::SetupError> {
//! let root = Command::new("greet")
//!     .flag(Flag::string("name", "world").short('n').env("GREET_NAME"))?
//!     .run(|ctx| {
//!         writeln!(ctx.out, "hello {}", ctx.flags.string("name"))?;
//!         Ok(())
//!     });
//! let app = App::builder().name("greet").root(root).env_lookup(|_| None).build();
//!
//! let mut out = Vec::new();
//! let argv = ["-n".to_string(), "rust".to_string()];
//! let code = app.execute_with(&argv, &mut out, &mut std::io::sink());
//! assert_eq!(code, 0);
//! assert_eq!(out, b"hello rust\n");
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod constants;
pub mod core;
pub mod errors;
pub mod render;

pub use app::{App, AppBuilder};
pub use config::{AppConfig, AppShow, ColorMode, VersionInfo};
pub use crate::core::{
    command::{ArgSpec, Command, Context},
    flags::{Flag, FlagKind, FlagSet, FlagValue},
    resolver::ResolvedFlags,
};
pub use errors::{ExitStatus, SetupError, UsageError};
pub use render::{ConsoleRenderer, JsonRenderer, Renderer};
