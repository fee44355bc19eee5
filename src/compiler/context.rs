//! Render context shared by every template of one build.
//!
//! The context is assembled once, before the first template renders: the
//! enriched catalog, the proxy-mode configuration, values derived from both
//! and the helper registry. Templates only read from it.

use anyhow::Result;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;
use tracing::debug;

use crate::config::BuildEnv;
use crate::helpers::{httpd_matches, HelperContext};
use crate::models::{Configuration, EnrichedCatalog, Environment, ProxyEngine};
use crate::services::ResolvedConfig;
use crate::template::Helpers;

/// Repository root used by compose definitions when `REPO_ROOT` is unset.
pub const DEFAULT_REPO_ROOT: &str = "repos";

/// Visualization whose presence enables the prediction organizations.
const PREDICTION_SITE: &str = "prediction-site";

static NAMED_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\?<[A-Za-z0-9_]+>").expect("group pattern is valid"));

/// Error log level of an engine in a deploy environment.
pub const fn error_log(engine: ProxyEngine, environment: Option<Environment>) -> &'static str {
    match (engine, environment) {
        (ProxyEngine::Nginx, Some(Environment::Test)) => "notice",
        (ProxyEngine::Nginx, Some(Environment::Development)) => "warn",
        (ProxyEngine::Httpd, Some(Environment::Test)) => "trace4",
        (ProxyEngine::Httpd, Some(Environment::Development)) => "debug",
        (_, Some(Environment::Production) | None) => "error",
    }
}

/// Rewrite log setting of an engine in a deploy environment.
pub const fn rewrite_log(engine: ProxyEngine, environment: Option<Environment>) -> &'static str {
    match (engine, environment) {
        (ProxyEngine::Nginx, Some(Environment::Test)) => "on",
        (ProxyEngine::Nginx, Some(_)) => "off",
        (ProxyEngine::Httpd, Some(Environment::Test)) => "trace6",
        (ProxyEngine::Httpd, Some(Environment::Development)) => "trace3",
        (ProxyEngine::Httpd, Some(Environment::Production)) => "warn",
        (_, None) => "off",
    }
}

/// Turns named groups into non-capturing groups, except after an escaped `]`.
pub fn strip_named_groups(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut last = 0;
    for group in NAMED_GROUP.find_iter(pattern) {
        if pattern[..group.start()].ends_with("\\]") {
            continue;
        }
        out.push_str(&pattern[last..group.start()]);
        out.push_str("(?:");
        last = group.end();
    }
    out.push_str(&pattern[last..]);
    out
}

/// Ids of the running build, used when `USER_ID`/`GROUP_ID` are unset.
#[cfg(unix)]
fn process_ids() -> (u32, u32) {
    use rustix::process::{getgid, getuid};
    (getuid().as_raw(), getgid().as_raw())
}

#[cfg(not(unix))]
fn process_ids() -> (u32, u32) {
    (0, 0)
}

/// Values and helpers passed to every template render.
pub struct RenderContext<'a> {
    values: Value,
    helpers: Helpers<'a>,
    engine: ProxyEngine,
}

impl<'a> RenderContext<'a> {
    /// Assembles the context from the build's resolved inputs.
    pub fn assemble(
        resolved: &'a ResolvedConfig,
        catalog: &EnrichedCatalog,
        env: &BuildEnv,
    ) -> Result<Self> {
        let engine = resolved.engine;
        let base = &resolved.base;
        let mut values = match serde_json::to_value(catalog)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        values.extend(resolved.proxy.as_map().clone());

        let (control_hostname, control_domain) = base.host_parts("control_host")?;
        let (_, domain) = base.host_parts("visualization_server")?;
        let (_, internal_domain) = base.host_parts("jenkins_host")?;
        let (user_id, group_id) = match (env.user_id, env.group_id) {
            (Some(user), Some(group)) => (user, group),
            (user, group) => {
                let (process_user, process_group) = process_ids();
                (user.unwrap_or(process_user), group.unwrap_or(process_group))
            }
        };

        let organizations = base.hub_organizations()?;
        let names = catalog.names();
        let prediction_organizations = if names.iter().any(|name| name == PREDICTION_SITE) {
            serde_json::to_value(&organizations)?
        } else {
            json!([])
        };
        let visualization_organizations: Vec<Value> = organizations
            .iter()
            .map(|org| org.visualization_site.clone().unwrap_or(Value::Null))
            .collect();

        let derived = [
            ("config_file", json!(resolved.source.display().to_string())),
            ("control_hostname", json!(control_hostname)),
            ("control_domain", json!(control_domain)),
            ("domain", json!(domain)),
            ("internal_domain", json!(internal_domain)),
            (
                "repo_root",
                json!(env.repo_root.as_deref().unwrap_or(DEFAULT_REPO_ROOT)),
            ),
            ("server_certificate", server_certificate(base, env)),
            ("branch_name", json!(env.branch_name.as_deref().unwrap_or(""))),
            ("user_id", json!(user_id)),
            ("group_id", json!(group_id)),
            ("visualization_names", json!(catalog.proxied_names())),
            ("prediction_organizations", prediction_organizations),
            ("visualization_organizations", json!(visualization_organizations)),
            ("hub_rewrite", json!(strip_named_groups(base.str("hub_regex")?))),
            ("hub_redirect", json!(hub_redirect(base, engine)?)),
            ("jenkins_branches", json!(jenkins_branches(base))),
            ("error_log", json!(error_log(engine, resolved.environment))),
            ("rewrite_log", json!(rewrite_log(engine, resolved.environment))),
        ];
        for (key, value) in derived {
            values.insert(key.to_string(), value);
        }
        for key in ["hub_branch", "visualization_branch", "prediction_branch"] {
            let value = match engine {
                ProxyEngine::Nginx => base.get(key).cloned().unwrap_or(Value::Null),
                ProxyEngine::Httpd => json!("RewriteBase /"),
            };
            values.insert(key.to_string(), value);
        }
        debug!("Render context has {} values", values.len());

        Ok(Self {
            values: Value::Object(values),
            helpers: HelperContext::new(base, engine).registry(),
            engine,
        })
    }

    /// Context values.
    pub const fn values(&self) -> &Value {
        &self.values
    }

    /// Helper registry bound to the build's configuration.
    pub const fn helpers(&self) -> &Helpers<'a> {
        &self.helpers
    }

    /// Engine the context renders for.
    pub const fn engine(&self) -> ProxyEngine {
        self.engine
    }

    /// A single context value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

fn hub_redirect(base: &Configuration, engine: ProxyEngine) -> Result<String> {
    let redirect = base.str("hub_redirect")?;
    Ok(match engine {
        ProxyEngine::Nginx => redirect.to_string(),
        ProxyEngine::Httpd => httpd_matches(redirect),
    })
}

fn server_certificate(base: &Configuration, env: &BuildEnv) -> Value {
    match &env.server_certificate {
        Some(certificate) => json!(certificate),
        None => base.get("auth_cert").cloned().unwrap_or(Value::Null),
    }
}

fn jenkins_branches(base: &Configuration) -> String {
    if base.is_set("jenkins_direct") {
        "/branches.json".to_string()
    } else {
        format!(
            "{}/job/create-prediction/api/json?tree=jobs[name,lastStableBuild[description,duration,timestamp]]",
            base.str_or_empty("jenkins_path")
        )
    }
}
