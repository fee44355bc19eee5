//! Rewrite rule grammar of both engines and the helpers built on it.
//!
//! nginx rules are `rewrite` directives with a trailing flag, optionally
//! followed by a `proxy_pass` to the target origin. httpd rules are a
//! `RewriteCond` on the request URI with a `RewriteRule` carrying bracketed
//! flags; captures of the condition are referenced as `%N` instead of `$N`.

use anyhow::{bail, Context, Result};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use url::Url;

use super::HelperContext;
use crate::models::{ProxyEngine, RoutingGroup};

static NAMED_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([_a-zA-Z]+)").expect("reference pattern is valid"));

static NUMBERED_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("reference pattern is valid"));

/// Target of a rewrite rule.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// Internal rewrite to a path
    Path(&'a str),
    /// Rewrite to the URL's path and proxy to its origin
    Proxy(&'a Url),
    /// Permanent redirect
    Redirect(&'a str),
}

/// nginx rewrite rule, indented for use inside a `location` block.
pub fn nginx_rewrite(pattern: &str, target: Target<'_>) -> String {
    match target {
        Target::Path(path) => format!("rewrite {pattern} {path} break;"),
        Target::Proxy(url) => format!(
            "rewrite {pattern} {} break;\n    proxy_pass {};",
            url.path(),
            url.origin().ascii_serialization()
        ),
        Target::Redirect(path) => format!("rewrite {pattern} {path} permanent;"),
    }
}

/// httpd condition and rule pair.
pub fn httpd_rewrite(pattern: &str, path: &str, flags: &[String]) -> String {
    let path = NUMBERED_REFERENCE.replace_all(path, "%$1");
    format!(
        "RewriteCond %{{REQUEST_URI}} {pattern}\n    RewriteRule ^ {path} [{}]",
        flags.join(",")
    )
}

/// httpd environment reference set by the hub's branch matcher.
pub fn httpd_match(name: &str) -> String {
    format!("%{{ENV:MATCH_{}}}", name.to_uppercase())
}

/// Replaces every `$name` reference with an httpd environment reference.
pub fn httpd_matches(text: &str) -> String {
    NAMED_REFERENCE
        .replace_all(text, |caps: &Captures<'_>| httpd_match(&caps[1]))
        .into_owned()
}

/// Flags from a `[A,B]` tag, without the brackets; no tag means no flags.
pub fn parse_flags(tags: Option<&str>) -> Vec<String> {
    let Some(tags) = tags.filter(|tags| !tags.is_empty()) else {
        return Vec::new();
    };
    let mut chars = tags.chars();
    chars.next();
    chars.next_back();
    chars.as_str().split(',').map(str::to_string).collect()
}

/// Splits helper arguments at spaces, keeping at most `limit` parts.
pub(super) fn arguments(text: &str, limit: usize) -> Vec<&str> {
    text.split(' ').take(limit).collect()
}

impl HelperContext<'_> {
    /// Rewrites `$name` references of a routing group for the active engine.
    ///
    /// nginx resolves references natively. For httpd, a reference with a
    /// mapping entry becomes a lookup in the entry's map with its input and
    /// default; other references read the matcher's environment.
    pub fn replace_matches(&self, group: RoutingGroup, text: &str) -> Result<String> {
        if self.engine == ProxyEngine::Nginx {
            return Ok(text.to_string());
        }
        let table = self.config.routing_table(group)?;
        Ok(NAMED_REFERENCE
            .replace_all(text, |caps: &Captures<'_>| {
                let name = &caps[1];
                match table.get(name) {
                    Some(mapping) => format!(
                        "${{{}:{}|{}}}",
                        table.map_name(name),
                        httpd_matches(&mapping.input),
                        mapping.default.as_deref().map(httpd_matches).unwrap_or_default()
                    ),
                    None => httpd_match(name),
                }
            })
            .into_owned())
    }

    /// `upstream`: nginx variable, or httpd `host[:port]` via `{server}_host`.
    pub fn upstream(&self, text: &str) -> Result<String> {
        match self.engine {
            ProxyEngine::Nginx => Ok(format!("${text}")),
            ProxyEngine::Httpd => {
                let (server, port) = text.split_once(':').unwrap_or((text, ""));
                let host = self.config.str(&format!("{server}_host"))?;
                if port.is_empty() {
                    Ok(host.to_string())
                } else {
                    Ok(format!("{host}:{port}"))
                }
            }
        }
    }

    /// `port`: redirect port visibility toggle, or a port suffix when visible.
    pub fn port(&self, text: &str) -> String {
        let visible = self.config.is_set("proxy_port_in_redirect");
        match (text.is_empty(), self.engine, visible) {
            (true, ProxyEngine::Nginx, true) => "on".to_string(),
            (true, ProxyEngine::Nginx, false) => "off".to_string(),
            (true, ProxyEngine::Httpd, true) => "On".to_string(),
            (true, ProxyEngine::Httpd, false) => "Off".to_string(),
            (false, _, true) => format!(":{text}"),
            (false, _, false) => String::new(),
        }
    }

    /// `proxy_rewrite`: `pattern url [flags]` as a proxied rewrite.
    pub fn proxy_rewrite(&self, text: &str) -> Result<String> {
        let args = arguments(text, 3);
        let [pattern, target, rest @ ..] = args.as_slice() else {
            bail!("expected 'pattern url [flags]', got '{text}'");
        };
        match self.engine {
            ProxyEngine::Nginx => {
                let url = Url::parse(target)
                    .with_context(|| format!("Invalid proxy target '{target}'"))?;
                Ok(nginx_rewrite(pattern, Target::Proxy(&url)))
            }
            ProxyEngine::Httpd => {
                let mut flags = parse_flags(rest.first().copied());
                flags.push("P".to_string());
                Ok(httpd_rewrite(pattern, target, &flags))
            }
        }
    }

    /// `jenkins_redirect`: `pattern path` as a permanent redirect.
    pub fn jenkins_redirect(&self, text: &str) -> Result<String> {
        let args = arguments(text, 2);
        let [pattern, path] = args.as_slice() else {
            bail!("expected 'pattern path', got '{text}'");
        };
        Ok(match self.engine {
            ProxyEngine::Nginx => nginx_rewrite(pattern, Target::Redirect(*path)),
            ProxyEngine::Httpd => {
                httpd_rewrite(pattern, path, &["L".to_string(), "R=301".to_string()])
            }
        })
    }

    /// `branch_maps`: branch routing of a group.
    ///
    /// nginx takes the `{group}_branch` directive from the configuration;
    /// httpd declares one `RewriteMap` per mapping entry.
    pub fn branch_maps(&self, text: &str) -> Result<String> {
        let group: RoutingGroup = text.trim().parse()?;
        match self.engine {
            ProxyEngine::Nginx => Ok(self
                .config
                .str_or_empty(&format!("{group}_branch"))
                .to_string()),
            ProxyEngine::Httpd => {
                let table = self.config.routing_table(group)?;
                if table.is_empty() {
                    return Ok(String::new());
                }
                let maps_path = self.config.str("branch_maps_path")?;
                Ok(table
                    .entries
                    .iter()
                    .map(|(entry, _)| {
                        let map = table.map_name(entry);
                        format!("RewriteMap {map} txt:{maps_path}/{map}.txt")
                    })
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Configuration;
    use serde_json::{json, Value};

    fn config(value: Value) -> Configuration {
        match value {
            Value::Object(map) => Configuration::from_map(map),
            _ => unreachable!(),
        }
    }

    fn mapped() -> Configuration {
        config(json!({
            "jenkins_host": "jenkins.gros.test",
            "www_host": "www.gros.test",
            "branch_maps_path": "/etc/httpd/maps",
            "hub_branch": "set $branch master;",
            "proxy_port_in_redirect": true,
            "hub_mapping": {
                "hub": {
                    "branch": {"input": "$organization", "default": "$organization-master", "output": {"ictu": "master"}},
                    "hub": {"input": "$organization", "output": {}}
                }
            }
        }))
    }

    #[test]
    fn test_parse_flags() {
        assert_eq!(parse_flags(Some("[L,QSA]")), ["L", "QSA"]);
        assert!(parse_flags(None).is_empty());
        assert!(parse_flags(Some("")).is_empty());
    }

    #[test]
    fn test_httpd_rewrite_renumbers_captures() {
        assert_eq!(
            httpd_rewrite("^/a/(.*)$", "/b/$1", &["P".to_string()]),
            "RewriteCond %{REQUEST_URI} ^/a/(.*)$\n    RewriteRule ^ /b/%1 [P]"
        );
    }

    #[test]
    fn test_replace_matches() {
        let cfg = mapped();
        let httpd = HelperContext::new(&cfg, ProxyEngine::Httpd);
        assert_eq!(
            httpd.replace_matches(RoutingGroup::Hub, "$branch/$other").unwrap(),
            "${hub_branch:%{ENV:MATCH_ORGANIZATION}|%{ENV:MATCH_ORGANIZATION}-master}/%{ENV:MATCH_OTHER}"
        );
        assert_eq!(
            httpd.replace_matches(RoutingGroup::Hub, "$hub").unwrap(),
            "${hub_hub:%{ENV:MATCH_ORGANIZATION}|}"
        );
        let nginx = HelperContext::new(&cfg, ProxyEngine::Nginx);
        assert_eq!(
            nginx.replace_matches(RoutingGroup::Hub, "$branch/$other").unwrap(),
            "$branch/$other"
        );
    }

    #[test]
    fn test_upstream() {
        let cfg = mapped();
        let nginx = HelperContext::new(&cfg, ProxyEngine::Nginx);
        assert_eq!(nginx.upstream("www").unwrap(), "$www");
        let httpd = HelperContext::new(&cfg, ProxyEngine::Httpd);
        assert_eq!(httpd.upstream("www").unwrap(), "www.gros.test");
        assert_eq!(httpd.upstream("jenkins:8080").unwrap(), "jenkins.gros.test:8080");
        assert!(httpd.upstream("missing:80").is_err());
    }

    #[test]
    fn test_port() {
        let visible = mapped();
        let hidden = visible.with("proxy_port_in_redirect", false);
        let cases = [
            (&visible, ProxyEngine::Nginx, "", "on"),
            (&hidden, ProxyEngine::Nginx, "", "off"),
            (&visible, ProxyEngine::Httpd, "", "On"),
            (&hidden, ProxyEngine::Httpd, "", "Off"),
            (&visible, ProxyEngine::Nginx, "8080", ":8080"),
            (&hidden, ProxyEngine::Httpd, "8080", ""),
        ];
        for (cfg, engine, input, expected) in cases {
            assert_eq!(HelperContext::new(cfg, engine).port(input), expected);
        }
    }

    #[test]
    fn test_proxy_rewrite() {
        let cfg = mapped();
        let nginx = HelperContext::new(&cfg, ProxyEngine::Nginx);
        assert_eq!(
            nginx
                .proxy_rewrite("^/blog/(.*)$ http://blog.gros.test:2368/ghost/$1")
                .unwrap(),
            "rewrite ^/blog/(.*)$ /ghost/$1 break;\n    proxy_pass http://blog.gros.test:2368;"
        );
        let httpd = HelperContext::new(&cfg, ProxyEngine::Httpd);
        assert_eq!(
            httpd
                .proxy_rewrite("^/blog/(.*)$ http://blog.gros.test:2368/ghost/$1 [NE]")
                .unwrap(),
            "RewriteCond %{REQUEST_URI} ^/blog/(.*)$\n    RewriteRule ^ http://blog.gros.test:2368/ghost/%1 [NE,P]"
        );
        assert!(nginx.proxy_rewrite("^/only-pattern").is_err());
        assert!(nginx.proxy_rewrite("^/x not-a-url").is_err());
    }

    #[test]
    fn test_jenkins_redirect() {
        let cfg = mapped();
        assert_eq!(
            HelperContext::new(&cfg, ProxyEngine::Nginx)
                .jenkins_redirect("^/old$ /new/")
                .unwrap(),
            "rewrite ^/old$ /new/ permanent;"
        );
        assert_eq!(
            HelperContext::new(&cfg, ProxyEngine::Httpd)
                .jenkins_redirect("^/old$ /new/")
                .unwrap(),
            "RewriteCond %{REQUEST_URI} ^/old$\n    RewriteRule ^ /new/ [L,R=301]"
        );
    }

    #[test]
    fn test_branch_maps() {
        let cfg = mapped();
        assert_eq!(
            HelperContext::new(&cfg, ProxyEngine::Nginx)
                .branch_maps("hub")
                .unwrap(),
            "set $branch master;"
        );
        assert_eq!(
            HelperContext::new(&cfg, ProxyEngine::Httpd)
                .branch_maps("hub")
                .unwrap(),
            "RewriteMap hub_branch txt:/etc/httpd/maps/hub_branch.txt\nRewriteMap hub_hub txt:/etc/httpd/maps/hub_hub.txt"
        );
        assert_eq!(
            HelperContext::new(&cfg, ProxyEngine::Httpd)
                .branch_maps("prediction")
                .unwrap(),
            ""
        );
        assert!(HelperContext::new(&cfg, ProxyEngine::Httpd)
            .branch_maps("unknown")
            .is_err());
    }
}
