//! CLI command handlers.
//!
//! Each command opens the project below `--root`, runs one stage (or the
//! whole pipeline) and reports failures through [`common::CliError`], whose
//! kind decides the process exit code.

pub mod build;
pub mod common;
pub mod config;
pub mod maps;
pub mod names;
pub mod render;

// Re-export types used by main.rs and tests
pub use build::BuildArgs;
pub use common::{CliError, CliErrorKind, CliResult, ExitCode, ProjectArgs};
pub use config::{ConfigArgs, ConfigMode};
pub use maps::MapsArgs;
pub use names::NamesArgs;
pub use render::RenderArgs;
