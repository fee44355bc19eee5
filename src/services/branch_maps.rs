//! Branch/host lookup maps for the directive engine.
//!
//! Every routing-group entry becomes one `{group}_{entry}.txt` file with a
//! `key value` line per output-table entry, in table order. Keys that are
//! absent from a table fall back to the entry's default when the proxy
//! looks them up, so missing keys are never a build error.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::{Configuration, Mapping, ProxyEngine, RoutingGroup};

/// A lookup map ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapFile {
    /// Map name, `{group}_{entry}`
    pub name: String,
    /// File content without trailing newline
    pub content: String,
}

impl MapFile {
    /// File name inside the map directory.
    pub fn file_name(&self) -> String {
        format!("{}.txt", self.name)
    }
}

/// Content of one map file.
pub fn map_content(mapping: &Mapping) -> String {
    mapping
        .output_entries()
        .map(|(key, value)| format!("{key} {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// All map files of a configuration, groups in routing order.
pub fn collect_maps(config: &Configuration) -> Result<Vec<MapFile>> {
    let mut maps = Vec::new();
    for group in RoutingGroup::ALL {
        let table = config.routing_table(group)?;
        for (entry, mapping) in &table.entries {
            maps.push(MapFile {
                name: table.map_name(entry),
                content: map_content(mapping),
            });
        }
    }
    Ok(maps)
}

/// Writes map files into a directory.
pub struct MapWriter {
    dir: PathBuf,
}

impl MapWriter {
    /// Creates a writer for a map directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Map directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the maps for an engine; the pattern engine needs none.
    ///
    /// Returns the written paths.
    pub fn write(&self, config: &Configuration, engine: ProxyEngine) -> Result<Vec<PathBuf>> {
        if !engine.uses_map_files() {
            debug!("{engine} reads routing tables from its configuration, no maps written");
            return Ok(Vec::new());
        }

        let maps = collect_maps(config)?;
        if !maps.is_empty() {
            fs::create_dir_all(&self.dir).with_context(|| {
                format!("Failed to create map directory: {}", self.dir.display())
            })?;
        }

        let mut written = Vec::with_capacity(maps.len());
        for map in maps {
            let path = self.dir.join(map.file_name());
            fs::write(&path, &map.content)
                .with_context(|| format!("Failed to write map {}", path.display()))?;
            debug!("Wrote map {}", path.display());
            written.push(path);
        }
        info!("Wrote {} map files to {}", written.len(), self.dir.display());
        Ok(written)
    }
}
