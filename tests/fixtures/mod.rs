//! Shared test fixtures for integration tests.
//!
//! Creates a small hub project in a temporary directory: configuration,
//! catalog, locales, settings and templates for both proxy engines.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Environment variables the binary reads; cleared so the host cannot leak in.
pub const ENV_VARS: [&str; 12] = [
    "NODE_ENV",
    "VISUALIZATION_ORGANIZATION",
    "VISUALIZATION_COMBINED",
    "VISUALIZATION_NAMES",
    "VISUALIZATION_SITE_CONFIGURATION",
    "VISUALIZATION_PROXY",
    "JENKINS_DIRECT",
    "REPO_ROOT",
    "SERVER_CERTIFICATE",
    "BRANCH_NAME",
    "USER_ID",
    "GROUP_ID",
];

/// Hub configuration with routing tables for the hub and prediction groups.
pub const CONFIG: &str = r#"{
    "proxy_nginx": true,
    "control_host": "control.gros.test",
    "visualization_server": "www.gros.test",
    "jenkins_host": "jenkins.gros.test",
    "www_host": "www.gros.test",
    "jenkins_path": "/jenkins",
    "jenkins_direct": "",
    "auth_cert": "auth.pem",
    "branch_maps_path": "/etc/httpd/maps",
    "proxy_port_in_redirect": false,
    "visualization_url": "/hub/$organization/",
    "prediction_url": "/prediction/$organization/",
    "blog_url": "http://blog.gros.test/",
    "download_url": "/downloads/",
    "hub_regex": "^/hub/(?<organization>[a-z]+)/",
    "hub_redirect": "/hub/$organization/",
    "hub_branch": "set $hub_branch master;",
    "hub_organizations": [
        {"organization": "ictu", "visualizations": ["timeline", "leaderboard"]},
        {"organization": "abc", "visualizations": ["timeline"]}
    ],
    "hub_mapping": {
        "hub": {
            "branch": {
                "input": "$organization",
                "default": "master",
                "output": {"ictu": "ictu-master", "abc": "abc-develop"}
            }
        },
        "prediction": {
            "branch_organization": {
                "input": "$organization",
                "output": {"ictu": "master"}
            }
        }
    }
}"#;

/// Catalog with one unlisted and one unproxied unit.
pub const CATALOG: &str = r#"{
    "groups": [
        {
            "id": "main",
            "items": [
                {"id": "timeline", "icon": ["fas", "chart-line"]},
                {"id": "leaderboard", "icon": ["fas", "trophy"], "url": "{{{visualization_url}}}leaderboard"},
                {"id": "prediction-site", "index": false, "icon": []},
                {"id": "heatmap", "nginx": false, "icon": []}
            ]
        }
    ]
}"#;

/// Default-locale messages.
pub const LOCALES: &str = r#"{
    "en": {"messages": {"main-title": "Main", "timeline-title": "Timeline"}},
    "nl": {"messages": {"main-title": "Hoofd"}}
}"#;

/// Build settings limiting the template list.
pub const SETTINGS: &str = r#"[render]
templates = ["{proxy}.conf", "{proxy}/visualization.conf", "caddy/www"]
"#;

/// Main proxy configuration for the pattern engine.
pub const NGINX_CONF: &str = "\
server_name {{control_hostname}}.{{control_domain}};
error_log /var/log/nginx/error.log {{error_log}};
proxy_redirect {{#port}}{{/port}};
{{#branch_maps}}hub{{/branch_maps}}
location /blog/ {
    {{#proxy_rewrite}}^/blog/(.*)$ {{{blog_url}}}$1{{/proxy_rewrite}}
}
";

/// Main proxy configuration for the directive engine.
pub const HTTPD_CONF: &str = "\
ServerName {{control_hostname}}.{{control_domain}}
LogLevel {{error_log}}
ProxyPreserveHost {{#port}}{{/port}}
{{#branch_maps}}hub{{/branch_maps}}
<Location /blog/>
    {{#proxy_rewrite}}^/blog/(.*)$ {{{blog_url}}}$1{{/proxy_rewrite}}
</Location>
";

/// Per-visualization rules, shared by both engines.
pub const VISUALIZATION_CONF: &str = "\
{{#visualization_names}}
# {{.}}
{{/visualization_names}}
";

/// Caddy site list.
pub const CADDY_WWW: &str = "\
{{#groups}}
{{#items}}
{{id}} {{{show}}} {{{download}}}
{{/items}}
{{/groups}}
";

/// OpenAPI template.
pub const OPENAPI: &str = "{\"servers\": [\"{{{prediction_url}}}\"], \"paths\": [{{{prediction_paths}}}]}\n";

/// Creates a complete project in a temporary directory.
pub fn create_project() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_project(dir.path());
    dir
}

/// Writes every project file below `root`.
pub fn write_project(root: &Path) {
    write(root, "config.json", CONFIG);
    write(root, "visualizations.json", CATALOG);
    write(root, "lib/locales.json", LOCALES);
    write(root, "vizhub.toml", SETTINGS);
    write(root, "nginx.conf.mustache", NGINX_CONF);
    write(root, "httpd.conf.mustache", HTTPD_CONF);
    write(root, "nginx/visualization.conf.mustache", VISUALIZATION_CONF);
    write(root, "httpd/visualization.conf.mustache", VISUALIZATION_CONF);
    write(root, "caddy/www.mustache", CADDY_WWW);
    write(root, "openapi.json.mustache", OPENAPI);
}

/// Writes a file below `root`, creating parent directories.
pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    fs::write(&path, content).expect("Failed to write fixture file");
}

/// Reads a file below `root`.
pub fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative))
        .unwrap_or_else(|e| panic!("Failed to read {relative}: {e}"))
}

/// Binary command with the host's build variables removed and fixed ids.
pub fn vizhub_command(bin: &str) -> Command {
    let mut command = Command::new(bin);
    for name in ENV_VARS {
        command.env_remove(name);
    }
    command.env_remove("RUST_LOG");
    command.env("USER_ID", "1000").env("GROUP_ID", "1000");
    command
}
