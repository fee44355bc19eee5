//! Shared error handling and options for CLI commands.

use std::fmt;
use std::path::PathBuf;

use clap::Args;

use crate::compiler::Project;
use crate::config::BuildEnv;
use crate::models::{ConfigError, Environment, ProxyEngine};
use crate::template::TemplateError;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command completed
    Success = 0,
    /// Invalid command-line input
    ValidationError = 1,
    /// A file could not be read or written
    IoError = 2,
    /// The hub configuration is missing keys or has the wrong shape
    ConfigError = 3,
    /// A template could not be parsed or rendered
    TemplateError = 4,
}

impl ExitCode {
    /// Numeric code passed to `std::process::exit`.
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Failure category of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorKind {
    /// Invalid command-line input
    Validation,
    /// File system failure
    Io,
    /// Configuration error
    Config,
    /// Template error
    Template,
}

/// Error reported by a command, with its exit code category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    /// Category deciding the exit code
    pub kind: CliErrorKind,
    /// Message printed to stderr
    pub message: String,
}

impl CliError {
    /// Invalid input error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Validation,
            message: message.into(),
        }
    }

    /// File system error.
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Io,
            message: message.into(),
        }
    }

    /// Configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Config,
            message: message.into(),
        }
    }

    /// Template error.
    pub fn template(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Template,
            message: message.into(),
        }
    }

    /// Classifies a library error by the typed errors in its cause chain.
    ///
    /// Template errors are checked first; anything untyped counts as I/O.
    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        let message = format!("{error:#}");
        let chain = || error.chain();
        if chain().any(|cause| cause.downcast_ref::<TemplateError>().is_some()) {
            Self::template(message)
        } else if chain().any(|cause| cause.downcast_ref::<ConfigError>().is_some()) {
            Self::config(message)
        } else {
            Self::io(message)
        }
    }

    /// Exit code for this error.
    pub const fn exit_code(&self) -> ExitCode {
        match self.kind {
            CliErrorKind::Validation => ExitCode::ValidationError,
            CliErrorKind::Io => ExitCode::IoError,
            CliErrorKind::Config => ExitCode::ConfigError,
            CliErrorKind::Template => ExitCode::TemplateError,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(error: anyhow::Error) -> Self {
        Self::from_anyhow(&error)
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        Self::config(error.to_string())
    }
}

/// Result type of command handlers.
pub type CliResult<T> = Result<T, CliError>;

/// Project options shared by every command.
///
/// Flags take precedence over the matching environment variables.
#[derive(Debug, Clone, Args)]
pub struct ProjectArgs {
    /// Project root holding the configuration and templates
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Deploy environment
    #[arg(long = "env", value_name = "NAME", value_enum)]
    pub environment: Option<Environment>,

    /// Proxy engine
    #[arg(long, value_name = "ENGINE", value_enum, ignore_case = true)]
    pub proxy: Option<ProxyEngine>,

    /// Organization substituted into display URLs
    #[arg(long, value_name = "ID")]
    pub organization: Option<String>,

    /// Point display URLs at the combined organization
    #[arg(long)]
    pub combined: bool,

    /// Fail on template variables that do not resolve
    #[arg(long)]
    pub strict: bool,
}

impl ProjectArgs {
    /// Environment inputs with the flags applied on top.
    pub fn build_env(&self) -> CliResult<BuildEnv> {
        let mut env = BuildEnv::from_env()?;
        if self.environment.is_some() {
            env.environment = self.environment;
        }
        if self.proxy.is_some() {
            env.proxy = self.proxy;
        }
        if let Some(organization) = &self.organization {
            env.organization = Some(organization.clone());
        }
        if self.combined {
            env.combined = true;
        }
        Ok(env)
    }

    /// Opens the project with flags and environment applied.
    pub fn open(&self) -> CliResult<Project> {
        if !self.root.is_dir() {
            return Err(CliError::validation(format!(
                "Project root does not exist: {}",
                self.root.display()
            )));
        }
        let env = self.build_env()?;
        let mut project = Project::open(&self.root, env)?;
        if self.strict {
            project.settings.render.strict = true;
        }
        Ok(project)
    }
}
