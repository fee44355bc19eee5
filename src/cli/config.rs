//! Config command: the resolved hub configuration as JSON.

use crate::cli::common::{CliError, CliResult, ProjectArgs};
use crate::services::api_context;
use clap::{Args, ValueEnum};
use serde_json::Value;

/// Placeholder mode of the printed configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigMode {
    /// URLs for the selected organization (or combined)
    Display,
    /// URLs with the organization removed, as the proxy rules see them
    Proxy,
    /// URLs with an `{organization}` parameter plus prediction paths
    Api,
}

/// Print the resolved configuration
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Which resolution to print
    #[arg(long, value_enum, default_value_t = ConfigMode::Display)]
    pub mode: ConfigMode,

    /// Project options
    #[command(flatten)]
    pub project: ProjectArgs,
}

impl ConfigArgs {
    /// Execute the config command
    pub fn execute(&self) -> CliResult<()> {
        let project = self.project.open()?;
        let resolved = project.resolve()?;

        let value = match self.mode {
            ConfigMode::Display => Value::Object(resolved.display.into_map()),
            ConfigMode::Proxy => Value::Object(resolved.proxy.into_map()),
            ConfigMode::Api => api_context(&resolved)?,
        };
        let json = serde_json::to_string_pretty(&value)
            .map_err(|e| CliError::io(format!("Failed to serialize configuration: {e}")))?;
        println!("{json}");
        Ok(())
    }
}
