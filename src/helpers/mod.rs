//! Template helper library.
//!
//! Every helper takes the rendered body of its section and returns the text
//! that replaces it. Helpers that depend on the proxy engine take it from a
//! [`HelperContext`], which also carries the resolved configuration every
//! helper of one build shares.
//!
//! | Helper | Output |
//! |---|---|
//! | `path` | path component of a URL |
//! | `url` | normalized path of `host/rest` |
//! | `upstream` | upstream reference |
//! | `port` | redirect port toggle or suffix |
//! | `proxy_rewrite` | proxied rewrite rule |
//! | `jenkins_rewrite` | rewrite to the CI artifact source |
//! | `jenkins_redirect` | permanent redirect rule |
//! | `jenkins_report`, `jenkins_artifact` | CI artifact path |
//! | `branch_maps` | branch routing of a routing group |
//! | `join` | body without its last character |

mod jenkins;
mod paths;
mod rewrite;

pub use jenkins::{ArtifactKind, JobPath};
pub use paths::{join, path, url};
pub use rewrite::{httpd_match, httpd_matches, httpd_rewrite, nginx_rewrite, parse_flags, Target};

use crate::models::{Configuration, ProxyEngine};
use crate::template::Helpers;

/// Names of the helpers registered by [`HelperContext::registry`].
pub const HELPER_NAMES: [&str; 11] = [
    "branch_maps",
    "jenkins_artifact",
    "jenkins_redirect",
    "jenkins_report",
    "jenkins_rewrite",
    "join",
    "path",
    "port",
    "proxy_rewrite",
    "upstream",
    "url",
];

/// Engine and configuration the helpers of one build answer from.
#[derive(Debug, Clone, Copy)]
pub struct HelperContext<'a> {
    /// Resolved configuration with placeholders intact
    pub config: &'a Configuration,
    /// Active proxy engine
    pub engine: ProxyEngine,
}

impl<'a> HelperContext<'a> {
    /// Creates a context for one engine.
    pub const fn new(config: &'a Configuration, engine: ProxyEngine) -> Self {
        Self { config, engine }
    }

    /// Registry of all helpers bound to this context.
    pub fn registry(self) -> Helpers<'a> {
        let mut helpers = Helpers::new();
        helpers.register("path", |text: &str| Ok(path(text)));
        helpers.register("url", url);
        helpers.register("join", |text: &str| Ok(join(text)));
        helpers.register("upstream", move |text: &str| self.upstream(text));
        helpers.register("port", move |text: &str| Ok(self.port(text)));
        helpers.register("proxy_rewrite", move |text: &str| self.proxy_rewrite(text));
        helpers.register("jenkins_rewrite", move |text: &str| self.jenkins_rewrite(text));
        helpers.register("jenkins_redirect", move |text: &str| {
            self.jenkins_redirect(text)
        });
        helpers.register("jenkins_report", move |text: &str| {
            self.jenkins_path(ArtifactKind::Report, text)
        });
        helpers.register("jenkins_artifact", move |text: &str| {
            self.jenkins_path(ArtifactKind::Artifact, text)
        });
        helpers.register("branch_maps", move |text: &str| self.branch_maps(text));
        helpers
    }
}
