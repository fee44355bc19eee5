//! Build command: the full compile pipeline.

use crate::cli::common::{CliResult, ProjectArgs};
use clap::Args;

/// Compile proxy rules, maps, snapshot and OpenAPI document
#[derive(Debug, Clone, Args)]
pub struct BuildArgs {
    /// Project options
    #[command(flatten)]
    pub project: ProjectArgs,
}

impl BuildArgs {
    /// Execute the build command
    pub fn execute(&self) -> CliResult<()> {
        let project = self.project.open()?;
        let report = project.build()?;

        println!("✓ Wrote {}", report.names_file.display());
        for map in &report.maps {
            println!("✓ Wrote {}", map.display());
        }
        for artifact in &report.artifacts {
            println!("✓ Rendered {}", artifact.display());
        }
        println!("✓ Wrote {}", report.snapshot.display());
        if let Some(openapi) = &report.openapi {
            println!("✓ Rendered {}", openapi.display());
        }
        Ok(())
    }
}
