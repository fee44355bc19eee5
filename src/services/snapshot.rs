//! Configuration snapshot for the navigation bar.
//!
//! The navigation bar binds organizations late, so URLs keep their
//! `$organization` placeholder here.

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::BuildEnv;
use crate::constants::{COMBINED_ORGANIZATION, URL_KEY_SUFFIX};
use crate::models::Configuration;

/// Keys with this prefix stay out of the snapshot.
const PRIVATE_PREFIX: &str = "jenkins_direct";

/// Builds the snapshot from the overridden configuration.
pub fn snapshot(base: &Configuration, env: &BuildEnv) -> Result<Value> {
    let mut values: Map<String, Value> = base
        .as_map()
        .iter()
        .filter(|(key, _)| key.ends_with(URL_KEY_SUFFIX) && !key.starts_with(PRIVATE_PREFIX))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let mut visualizations = Map::new();
    for organization in base.hub_organizations()? {
        visualizations.insert(organization.organization, json!(organization.visualizations));
    }
    visualizations.insert(COMBINED_ORGANIZATION.to_string(), json!(["prediction"]));

    values.insert(
        "organization".to_string(),
        json!(env.organization.as_deref().unwrap_or("")),
    );
    values.insert("visualizations".to_string(), Value::Object(visualizations));
    Ok(Value::Object(values))
}

/// Writes the snapshot as compact JSON.
pub fn write_snapshot(path: &Path, base: &Configuration, env: &BuildEnv) -> Result<()> {
    let snapshot = snapshot(base, env)?;
    let content = serde_json::to_string(&snapshot).context("Failed to serialize snapshot")?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}
