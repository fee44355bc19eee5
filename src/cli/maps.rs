//! Maps command: only the directive engine's lookup files.

use crate::cli::common::{CliResult, ProjectArgs};
use clap::Args;

/// Write the branch/host lookup maps
#[derive(Debug, Clone, Args)]
pub struct MapsArgs {
    /// Project options
    #[command(flatten)]
    pub project: ProjectArgs,
}

impl MapsArgs {
    /// Execute the maps command
    pub fn execute(&self) -> CliResult<()> {
        let project = self.project.open()?;
        let resolved = project.resolve()?;
        let written = project.write_maps(&resolved)?;

        if written.is_empty() {
            println!("No map files needed for {}", resolved.engine);
        }
        for path in &written {
            println!("✓ Wrote {}", path.display());
        }
        Ok(())
    }
}
