//! Application-wide constants.
//!
//! Names of environment variables, well-known files and the placeholder
//! conventions shared by the resolver, the helpers and the compiler.

/// The display name of the application.
pub const APP_NAME: &str = "Visualization Hub";

/// The binary name of the application (used in command examples).
pub const APP_BINARY_NAME: &str = "vizhub";

/// Placeholder inside `_url` values that stands for the organization id.
pub const ORGANIZATION_PLACEHOLDER: &str = "$organization";

/// Literal used for the organization in combined mode.
pub const COMBINED_ORGANIZATION: &str = "combined";

/// Suffix that marks a configuration key as a URL template.
pub const URL_KEY_SUFFIX: &str = "_url";

/// Build settings file looked up in the project root.
pub const SETTINGS_FILE: &str = "vizhub.toml";

/// Extension of template sources next to their rendered artifact.
pub const TEMPLATE_EXTENSION: &str = "mustache";

/// Control host used by the test environment when none is configured.
pub const TEST_CONTROL_HOST: &str = "control.gros.test";

/// Port of the CI server when it is reached through the reverse proxy.
pub const JENKINS_PORT: u16 = 8080;

/// Environment variable names consumed at start-up.
pub mod env {
    /// Deploy environment (`test`, `development`, `production`).
    pub const ENVIRONMENT: &str = "NODE_ENV";
    /// Organization id substituted into `_url` values.
    pub const ORGANIZATION: &str = "VISUALIZATION_ORGANIZATION";
    /// `"true"` selects combined mode.
    pub const COMBINED: &str = "VISUALIZATION_COMBINED";
    /// Space-separated allow-list of visualization ids.
    pub const NAMES: &str = "VISUALIZATION_NAMES";
    /// Alternative hub configuration file.
    pub const CONFIGURATION: &str = "VISUALIZATION_SITE_CONFIGURATION";
    /// Proxy engine selector (`nginx` or `httpd`).
    pub const PROXY: &str = "VISUALIZATION_PROXY";
    /// Direct artifact server override.
    pub const JENKINS_DIRECT: &str = "JENKINS_DIRECT";
    /// Repository root used by compose definitions.
    pub const REPO_ROOT: &str = "REPO_ROOT";
    /// Server certificate override.
    pub const SERVER_CERTIFICATE: &str = "SERVER_CERTIFICATE";
    /// Branch being built.
    pub const BRANCH_NAME: &str = "BRANCH_NAME";
    /// User id written into compose definitions.
    pub const USER_ID: &str = "USER_ID";
    /// Group id written into compose definitions.
    pub const GROUP_ID: &str = "GROUP_ID";
}
