//! Visualization catalog builder.
//!
//! Filters the catalog by the allow-list and computes the display fields of
//! every retained unit. URL templates of units are rendered against the
//! display configuration without helpers.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::messages::Messages;
use crate::models::{
    Catalog, Configuration, EnrichedCatalog, EnrichedGroup, EnrichedUnit, VisualizationUnit,
};
use crate::template::{render_str, Helpers, RenderOptions};

/// Builds the enriched catalog.
pub struct CatalogBuilder<'a> {
    display: &'a Configuration,
    messages: &'a Messages,
    allow: Option<&'a [String]>,
}

impl<'a> CatalogBuilder<'a> {
    /// Creates a builder rendering URLs with the display configuration.
    pub const fn new(display: &'a Configuration, messages: &'a Messages) -> Self {
        Self {
            display,
            messages,
            allow: None,
        }
    }

    /// Keeps only units whose id is in the allow-list.
    #[must_use]
    pub const fn with_allow_list(mut self, allow: Option<&'a [String]>) -> Self {
        self.allow = allow;
        self
    }

    /// Reads a catalog file.
    pub fn load(path: &Path) -> Result<Catalog> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid catalog: {}", path.display()))
    }

    /// Filters and enriches a catalog; group order and unit order are kept.
    pub fn build(&self, catalog: &Catalog) -> Result<EnrichedCatalog> {
        let mut groups = Vec::with_capacity(catalog.groups.len());
        let mut total = 0;
        for group in &catalog.groups {
            total += group.items.len();
            let items = group
                .items
                .iter()
                .filter(|unit| self.allows(&unit.id))
                .map(|unit| {
                    self.enrich(unit)
                        .with_context(|| format!("Could not enrich visualization '{}'", unit.id))
                })
                .collect::<Result<Vec<_>>>()?;
            groups.push(EnrichedGroup {
                id: group.id.clone(),
                title: self.messages.markup(&format!("{}-title", group.id)),
                items,
                extra: group.extra.clone(),
            });
        }

        let enriched = EnrichedCatalog {
            groups,
            extra: catalog.extra.clone(),
        };
        info!(
            "Catalog: {} of {} visualizations retained",
            enriched.units().count(),
            total
        );
        Ok(enriched)
    }

    fn allows(&self, id: &str) -> bool {
        self.allow
            .map_or(true, |names| names.iter().any(|name| name == id))
    }

    fn enrich(&self, unit: &VisualizationUnit) -> Result<EnrichedUnit> {
        let show = match &unit.url {
            Some(url) => self.render(url)?,
            None => unit.id.clone(),
        };
        let download = match &unit.download {
            Some(download) => self.render(download)?,
            None => format!("{}{}.zip", self.display.str("download_url")?, unit.id),
        };
        debug!("Visualization {} shows {}", unit.id, show);

        Ok(EnrichedUnit {
            id: unit.id.clone(),
            repo: unit.repo_name().to_string(),
            index: unit.index,
            nginx: unit.nginx,
            skip_test: unit.skip_test,
            url: unit.url.clone(),
            show,
            download,
            icon_parts: unit.icon.clone(),
            icon: icon_markup(&unit.icon),
            title: self.messages.markup(&format!("{}-title", unit.id)),
            content: self.messages.markup(&format!("{}-content", unit.id)),
            extra: unit.extra.clone(),
        })
    }

    fn render(&self, source: &str) -> Result<String> {
        let root = serde_json::Value::Object(self.display.as_map().clone());
        Ok(render_str(source, &root, &Helpers::new(), RenderOptions::default())?)
    }
}

/// Icon markup: the first fragment is a style class, the rest are `fa-` names.
pub fn icon_markup(parts: &[String]) -> String {
    let classes = parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            if i == 0 {
                part.clone()
            } else {
                format!("fa-{part}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("<span class=\"icon\"><i class=\"{classes}\" aria-hidden=\"true\"></i></span>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn display() -> Configuration {
        match json!({
            "visualization_url": "/hub/ictu/",
            "download_url": "https://gros.test/downloads/"
        }) {
            Value::Object(map) => Configuration::from_map(map),
            _ => unreachable!(),
        }
    }

    fn catalog() -> Catalog {
        serde_json::from_value(json!({
            "groups": [
                {
                    "id": "status",
                    "items": [
                        {"id": "alpha", "icon": ["fas", "chart-line"], "url": "{{{visualization_url}}}alpha/"},
                        {"id": "beta", "icon": ["far", "clock"], "repo": "beta-repo", "index": false},
                        {"id": "gamma", "icon": [], "nginx": false, "download": "{{{download_url}}}g.tar"}
                    ]
                },
                {"id": "empty", "items": []}
            ],
            "footer": "kept"
        }))
        .unwrap()
    }

    #[test]
    fn test_enriches_every_unit() {
        let config = display();
        let messages = Messages::from_entries([("alpha-title", "Alpha"), ("status-title", "Status")]);
        let enriched = CatalogBuilder::new(&config, &messages)
            .build(&catalog())
            .unwrap();

        let group = &enriched.groups[0];
        assert_eq!(group.title, "<span data-message=\"status-title\">Status</span>");
        let alpha = &group.items[0];
        assert_eq!(alpha.show, "/hub/ictu/alpha/");
        assert_eq!(alpha.download, "https://gros.test/downloads/alpha.zip");
        assert_eq!(
            alpha.icon,
            "<span class=\"icon\"><i class=\"fas fa-chart-line\" aria-hidden=\"true\"></i></span>"
        );
        assert_eq!(alpha.title, "<span data-message=\"alpha-title\">Alpha</span>");
        assert_eq!(alpha.content, "<span data-message=\"alpha-content\"></span>");
        assert_eq!(alpha.repo, "alpha");

        let beta = &group.items[1];
        assert_eq!(beta.show, "beta");
        assert_eq!(beta.repo, "beta-repo");

        let gamma = &group.items[2];
        assert_eq!(gamma.download, "https://gros.test/downloads/g.tar");
        assert_eq!(enriched.extra.get("footer"), Some(&json!("kept")));
    }

    #[test]
    fn test_names_and_proxied_names() {
        let config = display();
        let messages = Messages::default();
        let enriched = CatalogBuilder::new(&config, &messages)
            .build(&catalog())
            .unwrap();
        assert_eq!(enriched.names(), ["alpha", "gamma"]);
        assert_eq!(enriched.proxied_names(), ["alpha", "beta"]);
    }

    #[test]
    fn test_allow_list_keeps_group_membership() {
        let config = display();
        let messages = Messages::default();
        let allow = vec!["alpha".to_string()];
        let enriched = CatalogBuilder::new(&config, &messages)
            .with_allow_list(Some(allow.as_slice()))
            .build(&catalog())
            .unwrap();
        assert_eq!(enriched.groups.len(), 2);
        assert_eq!(enriched.groups[0].id, "status");
        let ids: Vec<_> = enriched.units().map(|unit| unit.id.as_str()).collect();
        assert_eq!(ids, ["alpha"]);
        assert_eq!(enriched.groups[0].items[0].show, "/hub/ictu/alpha/");
    }

    #[test]
    fn test_missing_download_url_is_a_configuration_error() {
        let config = Configuration::default();
        let messages = Messages::default();
        let err = CatalogBuilder::new(&config, &messages)
            .build(&catalog())
            .unwrap_err();
        assert!(err
            .chain()
            .any(|cause| cause.downcast_ref::<crate::models::ConfigError>().is_some()));
        assert!(format!("{err:#}").contains("alpha"));
    }

    #[test]
    fn test_icon_markup_without_parts() {
        assert_eq!(
            icon_markup(&[]),
            "<span class=\"icon\"><i class=\"\" aria-hidden=\"true\"></i></span>"
        );
    }
}
