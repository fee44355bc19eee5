//! Names command: visualization names eligible for the build.

use crate::cli::common::{CliResult, ProjectArgs};
use clap::Args;

/// Print the space-separated names of build-eligible visualizations
#[derive(Debug, Clone, Args)]
pub struct NamesArgs {
    /// Print the ids that receive proxy rules instead
    #[arg(long)]
    pub proxied: bool,

    /// Project options
    #[command(flatten)]
    pub project: ProjectArgs,
}

impl NamesArgs {
    /// Execute the names command
    pub fn execute(&self) -> CliResult<()> {
        let project = self.project.open()?;
        let resolved = project.resolve()?;
        let catalog = project.catalog(&resolved)?;

        let names = if self.proxied {
            catalog.proxied_names()
        } else {
            catalog.names()
        };
        println!("{}", names.join(" "));
        Ok(())
    }
}
