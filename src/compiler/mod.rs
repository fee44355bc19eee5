//! Rule compiler: renders every configured template with one shared context.
//!
//! Templates live next to their output as `<artifact>.mustache`. Rendering is
//! sequential and fail-fast: the first template that cannot be read or
//! rendered aborts the run with the template's name attached. Artifacts
//! written before the failure stay on disk.

mod context;
mod project;

pub use context::{error_log, rewrite_log, strip_named_groups, RenderContext, DEFAULT_REPO_ROOT};
pub use project::{BuildReport, Project};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::TEMPLATE_EXTENSION;
use crate::template::{RenderOptions, Template, TemplateError};

/// Source file of an artifact's template.
pub fn template_source(artifact: &str) -> String {
    format!("{artifact}.{TEMPLATE_EXTENSION}")
}

/// Renders templates below a project root.
pub struct RuleCompiler<'c, 'a> {
    root: &'c Path,
    context: &'c RenderContext<'a>,
    options: RenderOptions,
}

impl<'c, 'a> RuleCompiler<'c, 'a> {
    /// Creates a compiler for a project root and an assembled context.
    pub const fn new(root: &'c Path, context: &'c RenderContext<'a>, options: RenderOptions) -> Self {
        Self {
            root,
            context,
            options,
        }
    }

    /// Renders one artifact's template without writing it.
    pub fn render(&self, artifact: &str) -> Result<String> {
        let source_name = template_source(artifact);
        self.render_source(&self.root.join(&source_name))
            .with_context(|| format!("Could not render {source_name}"))
    }

    fn render_source(&self, path: &Path) -> Result<String> {
        let source = fs::read_to_string(path).map_err(|e| TemplateError::Unreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let template = Template::parse(&source)?;
        Ok(template.render(self.context.values(), self.context.helpers(), self.options)?)
    }

    /// Renders and writes one artifact.
    pub fn compile_one(&self, artifact: &str) -> Result<PathBuf> {
        let rendered = self.render(artifact)?;
        let path = self.root.join(artifact);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(&path, rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Renders and writes artifacts in order, stopping at the first failure.
    pub fn compile(&self, artifacts: &[String]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            written.push(self.compile_one(artifact)?);
        }
        info!(
            "Rendered {} templates for {}",
            written.len(),
            self.context.engine()
        );
        Ok(written)
    }
}
