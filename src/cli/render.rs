//! Render command: one template to stdout.

use crate::cli::common::{CliError, CliResult, ProjectArgs};
use crate::compiler::{RenderContext, RuleCompiler};
use clap::Args;

/// Render a single template with the full context and print it
#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Artifact to render, e.g. `nginx.conf` (reads `nginx.conf.mustache`)
    #[arg(value_name = "TEMPLATE")]
    pub template: String,

    /// Project options
    #[command(flatten)]
    pub project: ProjectArgs,
}

impl RenderArgs {
    /// Execute the render command
    pub fn execute(&self) -> CliResult<()> {
        let artifact = self.template.trim_end_matches(".mustache");
        if artifact.is_empty() {
            return Err(CliError::validation("Template name must not be empty"));
        }

        let project = self.project.open()?;
        let resolved = project.resolve()?;
        let catalog = project.catalog(&resolved)?;
        let context = RenderContext::assemble(&resolved, &catalog, &project.env)?;
        let rendered = RuleCompiler::new(&project.root, &context, project.render_options())
            .render(artifact)?;

        print!("{rendered}");
        Ok(())
    }
}
