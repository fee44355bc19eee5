//! Build settings and environment inputs.
//!
//! Two layers feed a build besides the hub configuration document:
//!
//! - `vizhub.toml` in the project root (optional) names the files the build
//!   reads and writes and the templates it renders;
//! - environment variables select the deploy environment, organization,
//!   proxy engine and a few path overrides.
//!
//! Both are captured once at start-up. Nothing downstream reads the process
//! environment again.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{env, SETTINGS_FILE};
use crate::models::{ConfigError, Environment, ProxyEngine};

/// Locations of inputs and outputs, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Hub configuration document
    pub configuration: PathBuf,
    /// Configuration used when `configuration` does not exist
    pub fallback_configuration: PathBuf,
    /// Visualization catalog
    pub catalog: PathBuf,
    /// Locale messages used for catalog titles
    pub locales: PathBuf,
    /// Directory of the directive engine's lookup maps
    pub maps_dir: PathBuf,
    /// Space-separated list of build-eligible visualizations
    pub names_file: PathBuf,
    /// Configuration snapshot for the navigation bar
    pub snapshot: PathBuf,
    /// Rendered OpenAPI document (template is this path plus `.mustache`)
    pub openapi: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            configuration: PathBuf::from("config.json"),
            fallback_configuration: PathBuf::from("lib/config.json"),
            catalog: PathBuf::from("visualizations.json"),
            locales: PathBuf::from("lib/locales.json"),
            maps_dir: PathBuf::from("httpd/maps"),
            names_file: PathBuf::from("visualization_names.txt"),
            snapshot: PathBuf::from("config-alias.json"),
            openapi: PathBuf::from("openapi.json"),
        }
    }
}

/// Template rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Artifacts to render, in order; `{proxy}` expands to the engine name
    pub templates: Vec<String>,
    /// Fail on unresolved variables
    pub strict: bool,
    /// Render the OpenAPI document
    pub openapi: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            templates: [
                "{proxy}.conf",
                "{proxy}/blog.conf",
                "{proxy}/discussion.conf",
                "{proxy}/prediction.conf",
                "{proxy}/visualization.conf",
                "{proxy}/websocket.conf",
                "caddy/docker-compose.yml",
                "caddy/ws",
                "caddy/www",
                "test/docker-compose.yml",
                "swagger/docker-compose.yml",
            ]
            .iter()
            .map(|t| (*t).to_string())
            .collect(),
            strict: false,
            openapi: true,
        }
    }
}

/// Contents of `vizhub.toml`.
///
/// # Example
///
/// ```toml
/// [paths]
/// configuration = "deploy/config.json"
/// maps_dir = "httpd/maps"
///
/// [render]
/// templates = ["{proxy}.conf", "caddy/www"]
/// strict = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// File locations
    pub paths: PathSettings,
    /// Rendering options
    pub render: RenderSettings,
}

impl Settings {
    /// Path of the settings file inside a project root.
    pub fn file_path(root: &Path) -> PathBuf {
        root.join(SETTINGS_FILE)
    }

    /// Loads settings from the project root, or defaults when there is no file.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::file_path(root);
        if !path.exists() {
            debug!("No {} in {}, using defaults", SETTINGS_FILE, root.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Template list for an engine with `{proxy}` expanded.
    pub fn templates_for(&self, engine: ProxyEngine) -> Vec<String> {
        self.render
            .templates
            .iter()
            .map(|template| template.replace("{proxy}", engine.as_str()))
            .collect()
    }
}

/// Inputs taken from the process environment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildEnv {
    /// Deploy environment; `None` applies no overrides
    pub environment: Option<Environment>,
    /// Organization substituted into display URLs
    pub organization: Option<String>,
    /// Combined mode: URLs point at the shared `combined` target
    pub combined: bool,
    /// Allow-list of visualization ids
    pub names: Option<Vec<String>>,
    /// Alternative configuration file
    pub configuration_file: Option<PathBuf>,
    /// Proxy engine overriding the `proxy_nginx` flag
    pub proxy: Option<ProxyEngine>,
    /// Direct artifact server overriding `jenkins_direct`
    pub jenkins_direct: Option<String>,
    /// Repository root for compose definitions
    pub repo_root: Option<String>,
    /// Certificate overriding `auth_cert`
    pub server_certificate: Option<String>,
    /// Branch being built
    pub branch_name: Option<String>,
    /// User id for compose definitions
    pub user_id: Option<u32>,
    /// Group id for compose definitions
    pub group_id: Option<u32>,
}

impl BuildEnv {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the inputs from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment: Option<Environment> = lookup(env::ENVIRONMENT)
            .filter(|value| !value.is_empty())
            .map(|value| value.parse())
            .transpose()?;
        let proxy: Option<ProxyEngine> = lookup(env::PROXY)
            .filter(|value| !value.is_empty())
            .map(|value| value.parse())
            .transpose()?;
        let id = |name: &str| -> Result<Option<u32>, ConfigError> {
            lookup(name)
                .map(|value| {
                    value.trim().parse().map_err(|_| ConfigError::WrongType {
                        key: name.to_string(),
                        expected: "a numeric id",
                    })
                })
                .transpose()
        };

        Ok(Self {
            environment,
            organization: lookup(env::ORGANIZATION),
            combined: lookup(env::COMBINED).is_some_and(|value| value == "true"),
            names: lookup(env::NAMES)
                .map(|value| value.split_whitespace().map(str::to_string).collect()),
            configuration_file: lookup(env::CONFIGURATION).map(PathBuf::from),
            proxy,
            jenkins_direct: lookup(env::JENKINS_DIRECT),
            repo_root: lookup(env::REPO_ROOT),
            server_certificate: lookup(env::SERVER_CERTIFICATE),
            branch_name: lookup(env::BRANCH_NAME),
            user_id: id(env::USER_ID)?,
            group_id: id(env::GROUP_ID)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_settings_default_when_missing() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.render.templates.len(), 11);
    }

    #[test]
    fn test_settings_partial_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "[paths]\nmaps_dir = \"maps\"\n\n[render]\ntemplates = [\"{proxy}.conf\"]\nstrict = true\n",
        )
        .unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.paths.maps_dir, PathBuf::from("maps"));
        assert_eq!(settings.paths.catalog, PathBuf::from("visualizations.json"));
        assert!(settings.render.strict);
        assert!(settings.render.openapi);
        assert_eq!(settings.templates_for(ProxyEngine::Httpd), ["httpd.conf"]);
    }

    #[test]
    fn test_settings_invalid_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "[render\n").unwrap();
        assert!(Settings::load(dir.path()).is_err());
    }

    #[test]
    fn test_build_env_from_lookup() {
        let env = BuildEnv::from_lookup(lookup(&[
            ("NODE_ENV", "production"),
            ("VISUALIZATION_ORGANIZATION", "ictu"),
            ("VISUALIZATION_COMBINED", "false"),
            ("VISUALIZATION_NAMES", "timeline  leaderboard"),
            ("VISUALIZATION_PROXY", "httpd"),
            ("USER_ID", "1000"),
        ]))
        .unwrap();
        assert_eq!(env.environment, Some(Environment::Production));
        assert_eq!(env.organization.as_deref(), Some("ictu"));
        assert!(!env.combined);
        assert_eq!(env.proxy, Some(ProxyEngine::Httpd));
        assert_eq!(env.user_id, Some(1000));
        assert_eq!(
            env.names,
            Some(vec!["timeline".to_string(), "leaderboard".to_string()])
        );
    }

    #[test]
    fn test_build_env_without_allow_list_allows_everything() {
        let env = BuildEnv::from_lookup(lookup(&[])).unwrap();
        assert_eq!(env.environment, None);
        assert_eq!(env.names, None);
    }

    #[test]
    fn test_build_env_rejects_bad_values() {
        assert!(BuildEnv::from_lookup(lookup(&[("NODE_ENV", "staging")])).is_err());
        assert!(BuildEnv::from_lookup(lookup(&[("VISUALIZATION_PROXY", "caddy")])).is_err());
        assert!(BuildEnv::from_lookup(lookup(&[("GROUP_ID", "staff")])).is_err());
    }
}
