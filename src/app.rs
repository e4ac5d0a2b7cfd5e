// src/app.rs

//! # Application Entry Point
//!
//! An [`App`] bundles the command tree with everything the pipeline needs
//! around it: presentation settings, a [`Renderer`] and the environment
//! lookup used for flag overlays. It is immutable once built, so the same
//! `App` can execute any number of argument vectors.

use crate::{
    config::{AppConfig, AppShow, ColorMode, VersionInfo, should_color},
    core::{
        command::Command,
        pipeline,
        resolver::{EnvLookup, process_env},
    },
    render::{AppInfo, ConsoleRenderer, Renderer},
};
use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

const FALLBACK_NAME: &str = "app";

/// A command-line application ready to execute.
pub struct App {
    name: String,
    description: String,
    version: VersionInfo,
    show: AppShow,
    color: ColorMode,
    root: Command,
    renderer: Arc<dyn Renderer>,
    env: EnvLookup,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn version(&self) -> &VersionInfo {
        &self.version
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color
    }

    pub fn root(&self) -> &Command {
        &self.root
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn env_lookup(&self) -> &EnvLookup {
        &self.env
    }

    /// Application data for renderers, with the color decision of one invocation.
    pub fn info(&self, colored: bool) -> AppInfo {
        AppInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            version: self.version.clone(),
            show: self.show,
            colored,
        }
    }

    /// Executes `args` (without the program name) against the process stdout
    /// and stderr, returning the exit status.
    pub fn execute<I, S>(&self, args: I) -> i32
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = args.into_iter().map(Into::into).collect();
        let stdout = io::stdout();
        let colored = should_color(self.color, stdout.is_terminal(), &*self.env);
        let mut out = stdout.lock();
        let mut err = io::stderr().lock();
        pipeline::execute(self, &argv, &mut out, &mut err, colored)
    }

    /// Executes `argv` writing to the given streams, which are never treated
    /// as terminals.
    pub fn execute_with(&self, argv: &[String], out: &mut dyn Write, err: &mut dyn Write) -> i32 {
        let colored = should_color(self.color, false, &*self.env);
        pipeline::execute(self, argv, out, err, colored)
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name)
            .field("version", &self.version.version)
            .field("color", &self.color)
            .field("root", &self.root)
            .finish()
    }
}

/// Builder for [`App`].
#[derive(Default)]
pub struct AppBuilder {
    name: Option<String>,
    description: String,
    version: VersionInfo,
    show: AppShow,
    color: ColorMode,
    root: Option<Command>,
    renderer: Option<Arc<dyn Renderer>>,
    env: Option<EnvLookup>,
}

impl AppBuilder {
    /// Defaults to the file name of the running executable.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn version(mut self, version: VersionInfo) -> Self {
        self.version = version;
        self
    }

    pub fn show(mut self, show: AppShow) -> Self {
        self.show = show;
        self
    }

    pub fn color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }

    pub fn root(mut self, root: Command) -> Self {
        self.root = Some(root);
        self
    }

    pub fn renderer<R: Renderer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Replaces the process environment as the source of flag overlays.
    pub fn env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Some(Arc::new(lookup));
        self
    }

    /// Applies every setting of a loaded config file. Name and description
    /// are only replaced when the file declares them.
    pub fn config(mut self, config: AppConfig) -> Self {
        if let Some(name) = config.name {
            self.name = Some(name);
        }
        if let Some(description) = config.description {
            self.description = description;
        }
        self.color = config.color;
        self.version = config.version;
        self.show = config.show;
        self
    }

    pub fn build(self) -> App {
        let name = self.name.unwrap_or_else(program_name);
        let root = self
            .root
            .unwrap_or_else(|| Command::new(&name).summary(&self.description));
        log::debug!("Built application '{}' with root '{}'", name, root.name());
        App {
            name,
            description: self.description,
            version: self.version,
            show: self.show,
            color: self.color,
            root,
            renderer: self.renderer.unwrap_or_else(|| Arc::new(ConsoleRenderer)),
            env: self.env.unwrap_or_else(process_env),
        }
    }
}

impl fmt::Debug for AppBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppBuilder")
            .field("name", &self.name)
            .field("color", &self.color)
            .field("root", &self.root.as_ref().map(Command::name))
            .finish()
    }
}

fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|base| base.to_string_lossy().into_owned())
        .filter(|base| !base.is_empty())
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}
