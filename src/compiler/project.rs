//! A project tree and the full build pipeline over it.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{RenderContext, RuleCompiler};
use crate::config::{BuildEnv, Settings};
use crate::models::EnrichedCatalog;
use crate::services::{
    write_openapi, write_snapshot, CatalogBuilder, MapWriter, Messages, ResolvedConfig,
};
use crate::template::RenderOptions;

/// Files written by a full build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Build-eligible names file
    pub names_file: PathBuf,
    /// Lookup maps (directive engine only)
    pub maps: Vec<PathBuf>,
    /// Rendered templates in order
    pub artifacts: Vec<PathBuf>,
    /// Navigation snapshot
    pub snapshot: PathBuf,
    /// OpenAPI document, unless disabled
    pub openapi: Option<PathBuf>,
}

/// Project root with its build settings and environment inputs.
#[derive(Debug, Clone)]
pub struct Project {
    /// Project root; every relative path resolves against it
    pub root: PathBuf,
    /// Settings from `vizhub.toml`
    pub settings: Settings,
    /// Environment inputs
    pub env: BuildEnv,
}

impl Project {
    /// Opens a project root, reading its settings file if there is one.
    pub fn open(root: impl Into<PathBuf>, env: BuildEnv) -> Result<Self> {
        let root = root.into();
        let settings = Settings::load(&root)?;
        Ok(Self {
            root,
            settings,
            env,
        })
    }

    /// Path below the project root.
    pub fn path(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Render options from the settings.
    pub const fn render_options(&self) -> RenderOptions {
        RenderOptions {
            strict: self.settings.render.strict,
        }
    }

    /// Loads and resolves the hub configuration.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        ResolvedConfig::load(&self.root, &self.settings, &self.env)
    }

    /// Loads, filters and enriches the catalog.
    pub fn catalog(&self, resolved: &ResolvedConfig) -> Result<EnrichedCatalog> {
        let messages = Messages::load(&self.path(&self.settings.paths.locales))?;
        let catalog = CatalogBuilder::load(&self.path(&self.settings.paths.catalog))?;
        CatalogBuilder::new(&resolved.display, &messages)
            .with_allow_list(self.env.names.as_deref())
            .build(&catalog)
    }

    /// Artifacts rendered for the resolved engine.
    pub fn templates(&self, resolved: &ResolvedConfig) -> Vec<String> {
        self.settings.templates_for(resolved.engine)
    }

    /// Writes the space-separated names of build-eligible visualizations.
    pub fn write_names(&self, catalog: &EnrichedCatalog) -> Result<PathBuf> {
        let path = self.path(&self.settings.paths.names_file);
        fs::write(&path, catalog.names().join(" "))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
        Ok(path)
    }

    /// Writes the directive engine's lookup maps.
    pub fn write_maps(&self, resolved: &ResolvedConfig) -> Result<Vec<PathBuf>> {
        MapWriter::new(self.path(&self.settings.paths.maps_dir)).write(&resolved.base, resolved.engine)
    }

    /// Runs the whole pipeline: names, maps, templates, snapshot and OpenAPI.
    pub fn build(&self) -> Result<BuildReport> {
        let resolved = self.resolve()?;
        let catalog = self.catalog(&resolved)?;

        let names_file = self.write_names(&catalog)?;
        let maps = self.write_maps(&resolved)?;

        let context = RenderContext::assemble(&resolved, &catalog, &self.env)?;
        let compiler = RuleCompiler::new(&self.root, &context, self.render_options());
        let artifacts = compiler.compile(&self.templates(&resolved))?;

        let snapshot = self.path(&self.settings.paths.snapshot);
        write_snapshot(&snapshot, &resolved.base, &self.env)?;

        let openapi = if self.settings.render.openapi {
            write_openapi(
                &self.root,
                &self.settings.paths.openapi,
                &resolved,
                self.render_options(),
            )?;
            Some(self.path(&self.settings.paths.openapi))
        } else {
            None
        };

        Ok(BuildReport {
            names_file,
            maps,
            artifacts,
            snapshot,
            openapi,
        })
    }
}
