//! Locale messages used for localized catalog markup.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::template::escape_html;

/// Locale used for the initial text of localized markup.
pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Deserialize)]
struct Locale {
    #[serde(default)]
    messages: BTreeMap<String, String>,
}

/// Messages of the default locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Messages {
    entries: BTreeMap<String, String>,
}

impl Messages {
    /// Loads the default locale from a locales file.
    ///
    /// A missing file yields no messages; markup is then emitted with empty text.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No locales at {}", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read locales: {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Invalid locales: {}", path.display()))
    }

    /// Parses a locales document (`{"en": {"messages": {...}}, ...}`).
    pub fn from_json_str(content: &str) -> Result<Self> {
        let mut locales: BTreeMap<String, Locale> =
            serde_json::from_str(content).context("Failed to parse locales JSON")?;
        let entries = locales
            .remove(DEFAULT_LOCALE)
            .map(|locale| locale.messages)
            .unwrap_or_default();
        Ok(Self { entries })
    }

    /// Creates messages from key/text pairs.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Text of a message key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Markup the navigation bar's locale switcher rewrites in place.
    pub fn markup(&self, key: &str) -> String {
        format!(
            "<span data-message=\"{}\">{}</span>",
            escape_html(key),
            self.get(key).unwrap_or("")
        )
    }
}
