//! Hub configuration document and its typed views.
//!
//! The configuration is a flat JSON object. Most keys are plain strings that
//! templates interpolate directly; a few nested tables (`hub_mapping`,
//! `hub_organizations`) get typed accessors here. Insertion order is kept so
//! that derived artifacts follow the order of the source document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::engine::RoutingGroup;
use crate::constants::URL_KEY_SUFFIX;

/// Configuration errors: missing or malformed keys and unparsable values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is absent.
    MissingKey(String),
    /// A key holds a value of the wrong JSON type.
    WrongType {
        /// Offending key
        key: String,
        /// Expected JSON type
        expected: &'static str,
    },
    /// A host key is empty where its domain suffix is needed.
    EmptyHost(String),
    /// A URL value could not be parsed.
    InvalidUrl {
        /// Offending key
        key: String,
        /// Parser message
        message: String,
    },
    /// A `hub_mapping` entry does not have the expected shape.
    InvalidMapping {
        /// Routing group of the entry
        group: String,
        /// Entry name (environment variable)
        entry: String,
        /// Parser message
        message: String,
    },
    /// Unknown proxy engine name.
    UnknownEngine(String),
    /// Unknown deploy environment name.
    UnknownEnvironment(String),
    /// Unknown routing group name.
    UnknownRoutingGroup(String),
    /// The document is not valid JSON.
    Malformed(String),
    /// The document is valid JSON but not an object.
    NotAnObject,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey(key) => write!(f, "Missing configuration key '{key}'"),
            Self::WrongType { key, expected } => {
                write!(f, "Configuration key '{key}' must be {expected}")
            }
            Self::EmptyHost(key) => write!(f, "Host key '{key}' is empty"),
            Self::InvalidUrl { key, message } => {
                write!(f, "Configuration key '{key}' is not a valid URL: {message}")
            }
            Self::InvalidMapping {
                group,
                entry,
                message,
            } => write!(f, "Invalid hub_mapping entry {group}.{entry}: {message}"),
            Self::UnknownEngine(name) => {
                write!(f, "Unknown proxy engine '{name}' (expected nginx or httpd)")
            }
            Self::UnknownEnvironment(name) => write!(
                f,
                "Unknown environment '{name}' (expected test, development or production)"
            ),
            Self::UnknownRoutingGroup(name) => write!(
                f,
                "Unknown routing group '{name}' (expected hub, visualization or prediction)"
            ),
            Self::Malformed(message) => write!(f, "Configuration is not valid JSON: {message}"),
            Self::NotAnObject => f.write_str("Configuration must be a JSON object"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// JavaScript-like truthiness used for configuration flags.
///
/// `null`, `false`, `0` and `""` are false; everything else, including empty
/// arrays and objects, is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Renders a scalar value as plain text (strings unquoted).
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The hub configuration document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    values: Map<String, Value>,
}

impl Configuration {
    /// Wraps an existing JSON object.
    pub const fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Parses a configuration document; the top level must be an object.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| ConfigError::Malformed(e.to_string()))?;
        match value {
            Value::Object(values) => Ok(Self { values }),
            _ => Err(ConfigError::NotAnObject),
        }
    }

    /// Underlying ordered map.
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Consumes the configuration into its ordered map.
    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }

    /// Raw value of a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns a copy with `key` set to `value`.
    #[must_use]
    pub fn with(&self, key: &str, value: impl Into<Value>) -> Self {
        let mut values = self.values.clone();
        values.insert(key.to_string(), value.into());
        Self { values }
    }

    /// Required string value.
    pub fn str(&self, key: &str) -> Result<&str, ConfigError> {
        match self.values.get(key) {
            Some(Value::String(s)) => Ok(s),
            Some(Value::Null) | None => Err(ConfigError::MissingKey(key.to_string())),
            Some(_) => Err(ConfigError::WrongType {
                key: key.to_string(),
                expected: "a string",
            }),
        }
    }

    /// String value, or an empty string when absent or not a string.
    pub fn str_or_empty(&self, key: &str) -> &str {
        self.values.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Truthiness of a flag key; absent keys are false.
    pub fn is_set(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(is_truthy)
    }

    /// Keys holding URL templates, in document order.
    pub fn url_keys(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .filter(|(key, value)| key.ends_with(URL_KEY_SUFFIX) && value.is_string())
            .map(|(key, _)| key.as_str())
    }

    /// Splits a host key at its first `.` into hostname and domain.
    ///
    /// A host without a dot has an empty domain.
    pub fn host_parts(&self, key: &str) -> Result<(String, String), ConfigError> {
        let host = self.str(key)?;
        if host.is_empty() {
            return Err(ConfigError::EmptyHost(key.to_string()));
        }
        Ok(match host.split_once('.') {
            Some((name, domain)) => (name.to_string(), domain.to_string()),
            None => (host.to_string(), String::new()),
        })
    }

    /// Mapping table of a routing group; absent tables are empty.
    pub fn routing_table(&self, group: RoutingGroup) -> Result<RoutingTable, ConfigError> {
        let entries = match self.values.get("hub_mapping") {
            None | Some(Value::Null) => None,
            Some(Value::Object(groups)) => groups.get(group.as_str()),
            Some(_) => {
                return Err(ConfigError::WrongType {
                    key: "hub_mapping".to_string(),
                    expected: "an object",
                })
            }
        };
        let Some(entries) = entries else {
            return Ok(RoutingTable::empty(group));
        };
        let Value::Object(entries) = entries else {
            return Err(ConfigError::WrongType {
                key: format!("hub_mapping.{group}"),
                expected: "an object",
            });
        };

        let mut table = RoutingTable::empty(group);
        for (entry, value) in entries {
            let mapping: Mapping = serde_json::from_value(value.clone()).map_err(|e| {
                ConfigError::InvalidMapping {
                    group: group.to_string(),
                    entry: entry.clone(),
                    message: e.to_string(),
                }
            })?;
            table.entries.push((entry.clone(), mapping));
        }
        Ok(table)
    }

    /// Organizations served by the hub, in document order.
    pub fn hub_organizations(&self) -> Result<Vec<HubOrganization>, ConfigError> {
        match self.values.get("hub_organizations") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|_| {
                ConfigError::WrongType {
                    key: "hub_organizations".to_string(),
                    expected: "a list of organization objects",
                }
            }),
        }
    }
}

/// One entry of a routing group's mapping table.
///
/// `input` is what the proxy matches (with `$name` references to captured
/// request parts), `default` is used when the lookup misses and `output` is
/// the lookup table written to the engine's map file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    /// Match input with `$name` references
    pub input: String,
    /// Fallback when the lookup key is absent
    #[serde(default)]
    pub default: Option<String>,
    /// Lookup table content
    #[serde(default)]
    pub output: Map<String, Value>,
}

impl Mapping {
    /// Output table entries as text, in table order.
    pub fn output_entries(&self) -> impl Iterator<Item = (&str, String)> {
        self.output
            .iter()
            .map(|(key, value)| (key.as_str(), value_text(value)))
    }
}

/// Mapping table of one routing group.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingTable {
    /// Group the table belongs to
    pub group: RoutingGroup,
    /// Entries keyed by environment variable name, in document order
    pub entries: Vec<(String, Mapping)>,
}

impl RoutingTable {
    /// Table without entries.
    pub const fn empty(group: RoutingGroup) -> Self {
        Self {
            group,
            entries: Vec::new(),
        }
    }

    /// Entry for a variable name.
    pub fn get(&self, name: &str) -> Option<&Mapping> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, mapping)| mapping)
    }

    /// Returns true when the group has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map name of an entry (`hub_branch`, `prediction_organization`, ...).
    pub fn map_name(&self, entry: &str) -> String {
        format!("{}_{}", self.group, entry)
    }
}

/// An organization served by the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubOrganization {
    /// Organization id
    pub organization: String,
    /// Visualizations available for the organization
    #[serde(default)]
    pub visualizations: Vec<String>,
    /// Branch or host of the organization's hub
    #[serde(
        rename = "visualization-site",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub visualization_site: Option<Value>,
    /// Remaining fields (locale, title, ...) passed through to templates
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
