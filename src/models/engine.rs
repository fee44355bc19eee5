//! Closed sets the compiler branches on: proxy engine, deploy environment
//! and routing group.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::configuration::ConfigError;

/// Proxy engine the rules are compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProxyEngine {
    /// nginx: ordered `rewrite` rules with trailing flags and native maps.
    Nginx,
    /// Apache httpd: `RewriteCond`/`RewriteRule` pairs with `RewriteMap` lookup files.
    #[value(alias = "apache")]
    Httpd,
}

impl ProxyEngine {
    /// Both engines, pattern engine first.
    pub const ALL: [Self; 2] = [Self::Nginx, Self::Httpd];

    /// Selects the engine from the `proxy_nginx` configuration flag.
    pub const fn from_flag(proxy_nginx: bool) -> Self {
        if proxy_nginx {
            Self::Nginx
        } else {
            Self::Httpd
        }
    }

    /// Name used for template paths (`nginx.conf`, `httpd/blog.conf`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nginx => "nginx",
            Self::Httpd => "httpd",
        }
    }

    /// Returns true for the directive engine, which needs side-loaded map files.
    pub const fn uses_map_files(self) -> bool {
        matches!(self, Self::Httpd)
    }
}

impl fmt::Display for ProxyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProxyEngine {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nginx" => Ok(Self::Nginx),
            "httpd" | "apache" => Ok(Self::Httpd),
            other => Err(ConfigError::UnknownEngine(other.to_string())),
        }
    }
}

/// Deploy environment of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Test setup behind an upstream caddy proxy.
    Test,
    /// Local development.
    Development,
    /// Production deployment.
    Production,
}

impl Environment {
    /// Lowercase name as used by `NODE_ENV`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "test" => Ok(Self::Test),
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

/// Logical traffic class with its own branch/host mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingGroup {
    /// The hub itself (`visualization-site`).
    Hub,
    /// Individual visualizations.
    Visualization,
    /// Prediction site and prediction files.
    Prediction,
}

impl RoutingGroup {
    /// All groups in the order their map files are written.
    pub const ALL: [Self; 3] = [Self::Hub, Self::Visualization, Self::Prediction];

    /// Key of the group inside `hub_mapping`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hub => "hub",
            Self::Visualization => "visualization",
            Self::Prediction => "prediction",
        }
    }

    /// Routing group responsible for artifacts of a CI job.
    pub fn for_job(job: &str) -> Self {
        if job == "visualization-site" {
            Self::Hub
        } else if job.starts_with("prediction") {
            Self::Prediction
        } else {
            Self::Visualization
        }
    }
}

impl fmt::Display for RoutingGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutingGroup {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "hub" => Ok(Self::Hub),
            "visualization" => Ok(Self::Visualization),
            "prediction" => Ok(Self::Prediction),
            other => Err(ConfigError::UnknownRoutingGroup(other.to_string())),
        }
    }
}
