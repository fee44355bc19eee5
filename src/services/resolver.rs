//! Configuration resolver.
//!
//! Loads the hub configuration, applies the deploy environment's overrides
//! and resolves the `$organization` placeholder of every `_url` value. The
//! result is immutable: each placeholder mode yields a separate copy and
//! the loaded document is never modified in place.

use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};
use url::Url;

use crate::config::{BuildEnv, Settings};
use crate::constants::{COMBINED_ORGANIZATION, TEST_CONTROL_HOST, URL_KEY_SUFFIX};
use crate::models::{ConfigError, Configuration, Environment, ProxyEngine};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(/)?\$organization").expect("placeholder pattern is valid"));

/// How the `$organization` placeholder of `_url` values is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderMode {
    /// Replace with an organization id, keeping a leading slash.
    Organization(String),
    /// Replace with the shared `combined` target, keeping a leading slash.
    Combined,
    /// Remove the placeholder together with a leading slash.
    Remove,
    /// Replace the placeholder and a leading slash with a literal.
    Literal(String),
}

impl PlaceholderMode {
    /// Display mode selected by the environment inputs.
    pub fn for_display(env: &BuildEnv) -> Self {
        if env.combined {
            Self::Combined
        } else if let Some(organization) = &env.organization {
            Self::Organization(organization.clone())
        } else {
            Self::Remove
        }
    }

    /// Replaces every placeholder occurrence in a value.
    pub fn apply(&self, value: &str) -> String {
        PLACEHOLDER
            .replace_all(value, |caps: &regex::Captures<'_>| {
                let slash = caps.get(1).map_or("", |m| m.as_str());
                match self {
                    Self::Organization(organization) => format!("{slash}{organization}"),
                    Self::Combined => format!("{slash}{COMBINED_ORGANIZATION}"),
                    Self::Remove => String::new(),
                    Self::Literal(literal) => literal.clone(),
                }
            })
            .into_owned()
    }
}

/// Resolves the placeholder in every `_url` value of a configuration.
pub fn resolve_urls(config: &Configuration, mode: &PlaceholderMode) -> Configuration {
    let mut values = config.as_map().clone();
    for (key, value) in &mut values {
        if !key.ends_with(URL_KEY_SUFFIX) {
            continue;
        }
        if let Some(text) = value.as_str() {
            *value = mode.apply(text).into();
        }
    }
    Configuration::from_map(values)
}

/// Applies deploy-environment overrides to a freshly loaded configuration.
pub fn apply_environment(
    config: &Configuration,
    env: &BuildEnv,
) -> Result<Configuration, ConfigError> {
    let mut config = match &env.jenkins_direct {
        Some(direct) => config.with("jenkins_direct", direct.as_str()),
        None => config.clone(),
    };

    match env.environment {
        Some(Environment::Test) => {
            // Absolute URLs against the upstream proxy, CI always proxied,
            // port hidden in redirects and a control host for access endpoints
            let server = config.str("visualization_server")?;
            let base_url = format!("http://{server}");
            let base = Url::parse(&base_url).map_err(|e| ConfigError::InvalidUrl {
                key: "visualization_server".to_string(),
                message: e.to_string(),
            })?;
            let visualization_url = base
                .join(config.str("visualization_url")?)
                .map_err(|e| ConfigError::InvalidUrl {
                    key: "visualization_url".to_string(),
                    message: e.to_string(),
                })?;

            config = config
                .with("base_url", base_url)
                .with("visualization_url", visualization_url.as_str())
                .with("jenkins_direct", "")
                .with("files_share_id", "test")
                .with("proxy_port_in_redirect", false);
            if config.str_or_empty("control_host").is_empty() {
                config = config.with("control_host", TEST_CONTROL_HOST);
            }
            debug!("Applied test environment overrides");
        }
        Some(Environment::Production) if config.is_set("jenkins_direct") => {
            config = config
                .with("swagger_openapi_url", "/")
                .with("swagger_validator_url", "");
            debug!("Applied production direct-access overrides");
        }
        _ => {}
    }
    Ok(config)
}

/// Configuration after environment overrides, in every placeholder mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// File the configuration was read from, relative to the project root
    pub source: PathBuf,
    /// Overridden configuration with placeholders intact
    pub base: Configuration,
    /// Placeholders resolved for display (organization, combined or removed)
    pub display: Configuration,
    /// Placeholders removed; branch routing picks the organization
    pub proxy: Configuration,
    /// Proxy engine the rules are compiled for
    pub engine: ProxyEngine,
    /// Deploy environment
    pub environment: Option<Environment>,
}

impl ResolvedConfig {
    /// Resolves a loaded configuration against the environment inputs.
    pub fn resolve(
        config: &Configuration,
        source: impl Into<PathBuf>,
        env: &BuildEnv,
    ) -> Result<Self, ConfigError> {
        let engine = env
            .proxy
            .unwrap_or_else(|| ProxyEngine::from_flag(config.is_set("proxy_nginx")));
        let base = apply_environment(config, env)?.with("proxy_nginx", engine == ProxyEngine::Nginx);
        let display = resolve_urls(&base, &PlaceholderMode::for_display(env));
        let proxy = resolve_urls(&base, &PlaceholderMode::Remove);

        Ok(Self {
            source: source.into(),
            base,
            display,
            proxy,
            engine,
            environment: env.environment,
        })
    }

    /// Loads the configuration file selected by the settings and environment.
    pub fn load(root: &Path, settings: &Settings, env: &BuildEnv) -> Result<Self> {
        let source = locate_configuration(root, settings, env);
        let path = root.join(&source);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration: {}", path.display()))?;
        let config = Configuration::from_json_str(&content)
            .with_context(|| format!("Invalid configuration: {}", path.display()))?;
        info!(
            "Configuration {} for {} ({})",
            source.display(),
            env.environment.map_or("default environment", Environment::as_str),
            env.proxy
                .unwrap_or_else(|| ProxyEngine::from_flag(config.is_set("proxy_nginx")))
        );
        Self::resolve(&config, source, env)
            .with_context(|| format!("Could not resolve configuration {}", path.display()))
    }

    /// Configuration with a custom placeholder mode, e.g. for API documents.
    pub fn with_mode(&self, mode: &PlaceholderMode) -> Configuration {
        resolve_urls(&self.base, mode)
    }
}

/// Picks the configuration file: environment override, then settings, then fallback.
fn locate_configuration(root: &Path, settings: &Settings, env: &BuildEnv) -> PathBuf {
    let primary = env
        .configuration_file
        .clone()
        .unwrap_or_else(|| settings.paths.configuration.clone());
    if root.join(&primary).exists() {
        primary
    } else {
        debug!(
            "{} not found, using {}",
            primary.display(),
            settings.paths.fallback_configuration.display()
        );
        settings.paths.fallback_configuration.clone()
    }
}
