//! Path helpers: `path`, `url` and `join`.

use anyhow::{Context, Result};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static ENCODED_MATCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^/)?%%7B(ENV:MATCH_[_a-zA-Z]+)%7D").expect("match pattern is valid")
});

/// Path component of a URL; absolute paths pass through unchanged.
///
/// Anything that is neither an absolute path nor a parsable URL yields `/`.
pub fn path(text: &str) -> String {
    if text.starts_with('/') && !text.starts_with("//") {
        return text.to_string();
    }
    Url::parse(text).map_or_else(|_| "/".to_string(), |url| url.path().to_string())
}

/// Normalized absolute path of `host/rest/of/path`.
///
/// The first segment is taken as the host and the remainder is resolved
/// against it. A doubled slash is collapsed once, a leading `/$` reference
/// loses its slash and percent-encoded directive-engine match references are
/// restored.
pub fn url(text: &str) -> Result<String> {
    let (host, rest) = text.split_once('/').unwrap_or((text, ""));
    let server = format!("http://{host}");
    let base = Url::parse(&server).with_context(|| format!("Invalid server '{host}'"))?;
    let rest = rest.replacen(&server, "", 1);
    let resolved = base
        .join(&rest)
        .with_context(|| format!("Cannot resolve '{rest}' against {server}"))?;

    let mut path = resolved.path().replacen("//", "/", 1);
    if path.starts_with("/$") {
        path.remove(0);
    }
    Ok(ENCODED_MATCH.replace_all(&path, "%{$1}").into_owned())
}

/// Drops the last character of the rendered text.
pub fn join(text: &str) -> String {
    let mut chars = text.chars();
    chars.next_back();
    chars.as_str().to_string()
}
