//! OpenAPI document of the prediction API.
//!
//! Rendered with the API placeholder mode, where URLs carry a literal
//! `{organization}` path parameter, plus the list of prediction paths and an
//! `example_file` helper that inlines example payloads.

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::info;

use super::resolver::{PlaceholderMode, ResolvedConfig};
use crate::constants::TEMPLATE_EXTENSION;
use crate::models::{Configuration, RoutingGroup};
use crate::template::{Helpers, RenderOptions, Template, TemplateError};

/// Literal the placeholder becomes in API URLs.
pub const API_ORGANIZATION: &str = "{organization}";

/// Quoted `hub + organization` path prefixes served by the prediction API.
pub fn prediction_paths(base: &Configuration) -> Result<Vec<String>> {
    let table = base.routing_table(RoutingGroup::Prediction)?;
    let keys = |entry: &str| -> Vec<String> {
        table
            .get(entry)
            .map(|mapping| mapping.output.keys().cloned().collect())
            .unwrap_or_default()
    };
    let mut hubs = keys("hub");
    hubs.push(String::new());
    let organizations = keys("branch_organization");

    Ok(hubs
        .iter()
        .flat_map(|hub| {
            organizations
                .iter()
                .map(move |organization| format!("\"{hub}{organization}\""))
        })
        .collect())
}

/// Values the OpenAPI template renders with.
pub fn api_context(resolved: &ResolvedConfig) -> Result<Value> {
    let mut values = resolved
        .with_mode(&PlaceholderMode::Literal(API_ORGANIZATION.to_string()))
        .into_map();
    let paths = prediction_paths(&resolved.base)?;
    let (joined, first) = if paths.is_empty() {
        ("\"\"".to_string(), "\"\"".to_string())
    } else {
        (paths.join(", "), paths[0].clone())
    };
    values.insert("prediction_paths".to_string(), Value::String(joined));
    values.insert("prediction_path".to_string(), Value::String(first));
    Ok(Value::Object(values))
}

/// Inlines an example file: `name:{"externalValue": "path", ...}`.
///
/// JSON files are embedded as values, anything else as a string. The
/// remaining example fields keep their order.
pub fn example_file(root: &Path, text: &str) -> Result<String> {
    let (name, example) = text
        .split_once(':')
        .ok_or_else(|| anyhow!("expected 'name:{{example}}', got '{text}'"))?;
    let example: Map<String, Value> =
        serde_json::from_str(example).with_context(|| format!("Invalid example for {name}"))?;
    let Some(Value::String(external)) = example.get("externalValue") else {
        bail!("Example {name} has no externalValue");
    };

    let path = root.join(external);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read example {}", path.display()))?;
    let value = if external.ends_with("json") {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON example {}", path.display()))?
    } else {
        Value::String(content)
    };

    let mut inlined: Map<String, Value> = example
        .iter()
        .filter(|(key, _)| key.as_str() != "externalValue")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    inlined.insert("value".to_string(), value);
    Ok(format!("{name}: {}", serde_json::to_string(&inlined)?))
}

/// Renders the OpenAPI template into its output file.
pub fn write_openapi(
    root: &Path,
    output: &Path,
    resolved: &ResolvedConfig,
    options: RenderOptions,
) -> Result<()> {
    let name = format!("{}.{TEMPLATE_EXTENSION}", output.display());
    let template_path = root.join(&name);
    let render = || -> Result<String> {
        let source = fs::read_to_string(&template_path).map_err(|e| TemplateError::Unreadable {
            path: template_path.display().to_string(),
            message: e.to_string(),
        })?;
        let mut helpers = Helpers::new();
        helpers.register("example_file", |text: &str| example_file(root, text));
        let context = api_context(resolved)?;
        Ok(Template::parse(&source)?.render(&context, &helpers, options)?)
    };
    let rendered = render().with_context(|| format!("Could not render {name}"))?;

    let path = root.join(output);
    fs::write(&path, rendered)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildEnv;
    use serde_json::json;
    use tempfile::TempDir;

    fn resolved() -> ResolvedConfig {
        let config = Configuration::from_json_str(
            r#"{
                "prediction_url": "https://gros.test/prediction/$organization/",
                "hub_mapping": {
                    "prediction": {
                        "hub": {"input": "$hub", "output": {"ictu-": "ictu"}},
                        "branch_organization": {"input": "$organization", "output": {"a": "master", "b": "b"}}
                    }
                }
            }"#,
        )
        .unwrap();
        ResolvedConfig::resolve(&config, "config.json", &BuildEnv::default()).unwrap()
    }

    #[test]
    fn test_prediction_paths() {
        let resolved = resolved();
        assert_eq!(
            prediction_paths(&resolved.base).unwrap(),
            ["\"ictu-a\"", "\"ictu-b\"", "\"a\"", "\"b\""]
        );
        assert!(prediction_paths(&Configuration::default()).unwrap().is_empty());
    }

    #[test]
    fn test_api_context() {
        let context = api_context(&resolved()).unwrap();
        assert_eq!(
            context["prediction_url"],
            json!("https://gros.test/prediction{organization}/")
        );
        assert_eq!(
            context["prediction_paths"],
            json!("\"ictu-a\", \"ictu-b\", \"a\", \"b\"")
        );
        assert_eq!(context["prediction_path"], json!("\"ictu-a\""));
    }

    #[test]
    fn test_example_file_inlines_json() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("example.json"), r#"{"score": 1}"#).unwrap();
        let out = example_file(
            dir.path(),
            r#"sprint:{"summary": "Sprint", "externalValue": "example.json", "x": 1}"#,
        )
        .unwrap();
        assert_eq!(
            out,
            r#"sprint: {"summary":"Sprint","x":1,"value":{"score":1}}"#
        );
    }

    #[test]
    fn test_example_file_inlines_text() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("example.csv"), "a,b\n").unwrap();
        let out = example_file(dir.path(), r#"csv:{"externalValue": "example.csv"}"#).unwrap();
        assert_eq!(out, r#"csv: {"value":"a,b\n"}"#);
    }

    #[test]
    fn test_example_file_errors() {
        let dir = TempDir::new().unwrap();
        assert!(example_file(dir.path(), "no-colon").is_err());
        assert!(example_file(dir.path(), r#"x:{"summary": "no file"}"#).is_err());
        assert!(example_file(dir.path(), r#"x:{"externalValue": "missing.json"}"#).is_err());
    }

    #[test]
    fn test_write_openapi() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ex.json"), "[1]").unwrap();
        fs::write(
            dir.path().join("openapi.json.mustache"),
            "{\"paths\": [{{{prediction_paths}}}], \"server\": \"{{{prediction_url}}}\",\n{{#example_file}}ex:{\"externalValue\": \"ex.json\"}{{/example_file}}}\n",
        )
        .unwrap();
        write_openapi(
            dir.path(),
            Path::new("openapi.json"),
            &resolved(),
            RenderOptions::default(),
        )
        .unwrap();
        let out = fs::read_to_string(dir.path().join("openapi.json")).unwrap();
        assert_eq!(
            out,
            "{\"paths\": [\"ictu-a\", \"ictu-b\", \"a\", \"b\"], \"server\": \"https://gros.test/prediction{organization}/\",\nex: {\"value\":[1]}}\n"
        );
    }

    #[test]
    fn test_write_openapi_missing_template() {
        let dir = TempDir::new().unwrap();
        let err = write_openapi(
            dir.path(),
            Path::new("openapi.json"),
            &resolved(),
            RenderOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Could not render openapi.json.mustache");
        assert!(err
            .chain()
            .any(|cause| cause.downcast_ref::<TemplateError>().is_some()));
    }
}
