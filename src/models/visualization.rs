//! Visualization catalog: deployable units grouped for display.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_true() -> bool {
    true
}

/// Catalog as read from `visualizations.json`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Display groups in order
    #[serde(default)]
    pub groups: Vec<VisualizationGroup>,
    /// Other top-level fields, passed through to templates
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A display group of visualization units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationGroup {
    /// Group id, also the prefix of its localized title key
    pub id: String,
    /// Units in display order
    #[serde(default)]
    pub items: Vec<VisualizationUnit>,
    /// Other group fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One deployable visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationUnit {
    /// Identifier, also the default repository and proxy path name
    pub id: String,
    /// Display URL template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Download URL template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<String>,
    /// Icon class fragments; the first is used bare
    #[serde(default)]
    pub icon: Vec<String>,
    /// Listed on the hub index and built
    #[serde(default = "default_true")]
    pub index: bool,
    /// Receives proxy rules
    #[serde(default = "default_true", alias = "proxied")]
    pub nginx: bool,
    /// Repository name when it differs from the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Excluded from the test suite
    #[serde(default)]
    pub skip_test: bool,
    /// Other unit fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VisualizationUnit {
    /// Repository name of the unit.
    pub fn repo_name(&self) -> &str {
        self.repo.as_deref().unwrap_or(&self.id)
    }
}

/// Catalog after filtering and enrichment.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EnrichedCatalog {
    /// Enriched groups in order
    pub groups: Vec<EnrichedGroup>,
    /// Other top-level catalog fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EnrichedCatalog {
    /// Repository names of units listed on the index.
    pub fn names(&self) -> Vec<String> {
        self.units()
            .filter(|unit| unit.index)
            .map(|unit| unit.repo.clone())
            .collect()
    }

    /// Ids of units that receive proxy rules.
    pub fn proxied_names(&self) -> Vec<String> {
        self.units()
            .filter(|unit| unit.nginx)
            .map(|unit| unit.id.clone())
            .collect()
    }

    /// All retained units across groups.
    pub fn units(&self) -> impl Iterator<Item = &EnrichedUnit> {
        self.groups.iter().flat_map(|group| group.items.iter())
    }
}

/// Group with localized title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedGroup {
    /// Group id
    pub id: String,
    /// Localized title markup
    pub title: String,
    /// Retained, enriched units
    pub items: Vec<EnrichedUnit>,
    /// Other group fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Unit with display, download and icon fields computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedUnit {
    /// Identifier
    pub id: String,
    /// Repository name
    pub repo: String,
    /// Listed on the index
    pub index: bool,
    /// Receives proxy rules
    pub nginx: bool,
    /// Excluded from the test suite
    pub skip_test: bool,
    /// Raw display URL template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Rendered display URL, or the id
    pub show: String,
    /// Rendered download URL
    pub download: String,
    /// Icon class fragments as configured
    pub icon_parts: Vec<String>,
    /// Icon markup
    pub icon: String,
    /// Localized title markup
    pub title: String,
    /// Localized description markup
    pub content: String,
    /// Other unit fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
