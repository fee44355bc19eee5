//! CI artifact helpers.
//!
//! Artifacts are addressed as `job/branch/file`. With a direct artifact
//! server (`jenkins_direct`) the files are served from a static tree laid
//! out the same way; otherwise requests go to the CI job API.

use anyhow::{bail, Result};
use regex::Regex;
use std::sync::LazyLock;

use super::rewrite::{arguments, httpd_rewrite, nginx_rewrite, parse_flags, Target};
use super::HelperContext;
use crate::constants::JENKINS_PORT;
use crate::models::{ProxyEngine, RoutingGroup};

static SITE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(prediction|visualization)-site/[^/]+").expect("site pattern is valid")
});

static PREDICTION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^prediction/(.*)").expect("prediction pattern is valid"));

/// Kind of CI artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Published build report (`build-<job>`)
    Report,
    /// Archived artifact of the last stable build (`create-<job>`)
    Artifact,
}

/// A `job/branch/file` reference with references rewritten for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPath {
    /// CI job
    pub job: String,
    /// Branch of the job
    pub branch: String,
    /// File below the job's output, may be empty
    pub file: String,
}

impl HelperContext<'_> {
    /// Parses `job/branch/file` and converts its references.
    ///
    /// The routing group follows from the job as written, before conversion.
    pub fn job_path(&self, text: &str) -> Result<JobPath> {
        let mut parts = text.splitn(3, '/');
        let (Some(job), Some(branch)) = (parts.next(), parts.next()) else {
            bail!("expected 'job/branch/file', got '{text}'");
        };
        let file = parts.next().unwrap_or("");
        let group = RoutingGroup::for_job(job);
        Ok(JobPath {
            job: self.replace_matches(group, job)?,
            branch: self.replace_matches(group, branch)?,
            file: self.replace_matches(group, file)?,
        })
    }

    /// `jenkins_report` and `jenkins_artifact`: path of a CI artifact.
    pub fn jenkins_path(&self, kind: ArtifactKind, text: &str) -> Result<String> {
        let JobPath { job, branch, file } = self.job_path(text)?;
        if self.config.is_set("jenkins_direct") {
            // The jenkins_rewrite rule adds the direct tree's prefix
            return Ok(format!("{job}/{branch}/{file}"));
        }
        let jenkins_path = self.config.str("jenkins_path")?;
        Ok(match kind {
            ArtifactKind::Report => {
                format!("{jenkins_path}/job/build-{job}/job/{branch}/Visualization/{file}")
            }
            ArtifactKind::Artifact => format!(
                "{jenkins_path}/job/create-{job}/job/{branch}/lastStableBuild/artifact/{file}"
            ),
        })
    }

    /// `jenkins_rewrite`: `pattern path [flags]` routed to the artifact source.
    ///
    /// With a direct artifact server only prediction files and flagged rules
    /// are rewritten (others are served as is). Without one, nginx proxies
    /// through a separate rule and httpd proxies to the CI host.
    pub fn jenkins_rewrite(&self, text: &str) -> Result<String> {
        let args = arguments(text, 3);
        let [pattern, path, rest @ ..] = args.as_slice() else {
            bail!("expected 'pattern path [flags]', got '{text}'");
        };
        let tags = rest.first().copied().filter(|tags| !tags.is_empty());
        let mut flags = parse_flags(tags);

        if self.config.is_set("jenkins_direct") {
            if !(path.starts_with("prediction/")
                || path.starts_with("prediction-site/")
                || tags.is_some())
            {
                return Ok(String::new());
            }
            flags.push("END".to_string());
            let site_path = self.direct_path(path)?;
            return Ok(match self.engine {
                ProxyEngine::Nginx => nginx_rewrite(pattern, Target::Path(&site_path)),
                ProxyEngine::Httpd => httpd_rewrite(pattern, &site_path, &flags),
            });
        }

        match self.engine {
            ProxyEngine::Nginx => Ok(nginx_rewrite(pattern, Target::Path(*path))),
            ProxyEngine::Httpd => {
                flags.push("P".to_string());
                let host = self.config.str("jenkins_host")?;
                let url = format!("http://{host}:{JENKINS_PORT}{path}");
                Ok(httpd_rewrite(pattern, &url, &flags))
            }
        }
    }

    /// Location of a site or prediction file in the direct artifact tree.
    fn direct_path(&self, path: &str) -> Result<String> {
        let site_path = match SITE_PREFIX.captures(path) {
            Some(caps) => {
                let site = &caps[1];
                let group = if site == "visualization" {
                    RoutingGroup::Hub
                } else {
                    RoutingGroup::Prediction
                };
                let prefix = self.replace_matches(group, &format!("$hub/{site}"))?;
                format!("{prefix}{}", &path[caps[0].len()..])
            }
            None => path.to_string(),
        };
        Ok(PREDICTION_PREFIX
            .replace(&site_path, "/prediction/$1")
            .into_owned())
    }
}
