//! Mustache-style text templates on top of `handlebars`, with a registry of
//! section helpers.
//!
//! The engine only substitutes values and invokes helpers. A section whose
//! name is a registered helper is rendered first with the current frames and
//! the rendered text is handed to the helper, so nested placeholders are
//! always resolved before a helper manipulates the string.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use vizhub::template::{Helpers, RenderOptions, Template};
//!
//! let mut helpers = Helpers::new();
//! helpers.register("upper", |text: &str| Ok(text.to_uppercase()));
//!
//! let template = Template::parse("{{#upper}}{{name}}{{/upper}}").unwrap();
//! let out = template
//!     .render(&json!({"name": "hub"}), &helpers, RenderOptions::default())
//!     .unwrap();
//! assert_eq!(out, "HUB");
//! ```

mod sections;

use std::collections::BTreeMap;
use std::fmt;

use handlebars::{Handlebars, RenderError, RenderErrorReason};
use serde_json::Value;

use sections::{BoundHelper, Section, SECTION_FALLBACK};

/// Signature of a section helper: rendered section body in, replacement out.
pub type HelperFn<'a> = Box<dyn Fn(&str) -> anyhow::Result<String> + Send + Sync + 'a>;

const TEMPLATE_NAME: &str = "template";

/// Template errors: unreadable or malformed sources, unresolved keys and helper failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Source that does not parse.
    Syntax {
        /// 1-based line of the error, when known
        line: Option<usize>,
        /// Parser message
        message: String,
    },
    /// A variable that resolves to nothing while rendering strictly.
    UnresolvedKey(String),
    /// A helper used as a plain variable instead of a section.
    HelperAsVariable(String),
    /// Any other failure reported by the engine.
    Render(String),
    /// Template source could not be read.
    Unreadable {
        /// Path of the template source
        path: String,
        /// I/O error description
        message: String,
    },
    /// A helper rejected its input.
    Helper {
        /// Helper name
        name: String,
        /// Failure description
        message: String,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax {
                line: Some(line),
                message,
            } => write!(f, "Invalid template syntax on line {line}: {message}"),
            Self::Syntax {
                line: None,
                message,
            } => write!(f, "Invalid template syntax: {message}"),
            Self::UnresolvedKey(name) => write!(f, "Unresolved key '{name}'"),
            Self::HelperAsVariable(name) => {
                write!(f, "Helper '{name}' must be used as a section")
            }
            Self::Render(message) => write!(f, "{message}"),
            Self::Unreadable { path, message } => {
                write!(f, "Cannot read template {path}: {message}")
            }
            Self::Helper { name, message } => write!(f, "Helper '{name}' failed: {message}"),
        }
    }
}

impl std::error::Error for TemplateError {}

impl From<handlebars::TemplateError> for TemplateError {
    fn from(e: handlebars::TemplateError) -> Self {
        Self::Syntax {
            line: e.pos().map(|(line, _)| line),
            message: e.reason().to_string(),
        }
    }
}

impl From<RenderError> for TemplateError {
    fn from(e: RenderError) -> Self {
        match e.reason() {
            RenderErrorReason::MissingVariable(name) => {
                Self::UnresolvedKey(name.clone().unwrap_or_default())
            }
            RenderErrorReason::NestedError(cause) => cause
                .downcast_ref::<TemplateError>()
                .cloned()
                .unwrap_or_else(|| Self::Render(e.to_string())),
            RenderErrorReason::TemplateError(cause) => Self::Syntax {
                line: cause.pos().map(|(line, _)| line),
                message: cause.reason().to_string(),
            },
            _ => Self::Render(e.to_string()),
        }
    }
}

/// Options for one render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    /// Fail on variables that resolve to nothing instead of rendering them empty
    pub strict: bool,
}

/// A parsed template.
#[derive(Debug, Clone)]
pub struct Template {
    compiled: handlebars::Template,
}

impl Template {
    /// Parses a template source.
    ///
    /// `{{.}}` is accepted as the mustache spelling of `{{this}}`.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let source = source.replace("{{.}}", "{{this}}");
        let compiled = handlebars::Template::compile(&source)?;
        Ok(Self { compiled })
    }

    /// Renders the template with `root` as the outermost frame.
    ///
    /// Helpers live in the root frame: they shadow root values of the same
    /// name but are shadowed by any nearer frame.
    pub fn render(
        &self,
        root: &Value,
        helpers: &Helpers<'_>,
        options: RenderOptions,
    ) -> Result<String, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(options.strict);
        registry.set_recursive_lookup(true);
        registry.register_escape_fn(escape_html);
        registry.register_helper(SECTION_FALLBACK, Box::new(Section));
        for (name, helper) in &helpers.entries {
            registry.register_helper(name, Box::new(BoundHelper::new(name, helper.as_ref())));
        }
        registry.register_template(TEMPLATE_NAME, self.compiled.clone());
        Ok(registry.render(TEMPLATE_NAME, root)?)
    }
}

/// Parses and renders in one step.
pub fn render_str(
    source: &str,
    root: &Value,
    helpers: &Helpers<'_>,
    options: RenderOptions,
) -> Result<String, TemplateError> {
    Template::parse(source)?.render(root, helpers, options)
}

/// Escapes text the way mustache does for `{{name}}`.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '/' => escaped.push_str("&#x2F;"),
            '`' => escaped.push_str("&#x60;"),
            '=' => escaped.push_str("&#x3D;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Registry of named section helpers.
#[derive(Default)]
pub struct Helpers<'a> {
    entries: BTreeMap<String, HelperFn<'a>>,
}

impl<'a> Helpers<'a> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Registers (or replaces) a helper.
    pub fn register<F>(&mut self, name: impl Into<String>, helper: F)
    where
        F: Fn(&str) -> anyhow::Result<String> + Send + Sync + 'a,
    {
        self.entries.insert(name.into(), Box::new(helper));
    }

    /// Returns true when a helper with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered helper names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Invokes a helper on already rendered text.
    pub fn call(&self, name: &str, rendered: &str) -> Result<String, TemplateError> {
        let helper = self
            .entries
            .get(name)
            .ok_or_else(|| TemplateError::UnresolvedKey(name.to_string()))?;
        sections::invoke(name, helper.as_ref(), rendered)
    }
}

impl fmt::Debug for Helpers<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(source: &str, root: &Value) -> String {
        render_str(source, root, &Helpers::new(), RenderOptions::default()).unwrap()
    }

    fn join_helpers() -> Helpers<'static> {
        let mut helpers = Helpers::new();
        helpers.register("join", |text: &str| {
            let mut chars = text.chars();
            chars.next_back();
            Ok(chars.as_str().to_string())
        });
        helpers
    }

    #[test]
    fn test_variables_and_escaping() {
        let root = json!({"host": "a/b", "n": 3, "flag": true, "nothing": null});
        assert_eq!(render("{{host}}", &root), "a&#x2F;b");
        assert_eq!(render("{{{host}}}", &root), "a/b");
        assert_eq!(render("{{&host}}", &root), "a/b");
        assert_eq!(render("{{n}} {{flag}} [{{nothing}}] [{{absent}}]", &root), "3 true [] []");
    }

    #[test]
    fn test_dotted_names() {
        let root = json!({"a": {"b": {"c": "deep"}}, "list": ["x", "y"]});
        assert_eq!(render("{{a.b.c}}", &root), "deep");
        assert_eq!(render("{{list.1}}", &root), "y");
    }

    #[test]
    fn test_sections_iterate_and_walk_up_frames() {
        let root = json!({
            "groups": [{"id": "g1", "items": [{"id": "a"}, {"id": "b"}]}, {"id": "g2", "items": []}],
            "suffix": "!"
        });
        assert_eq!(
            render(
                "{{#groups}}{{id}}:{{#items}}{{id}}{{suffix}}{{/items}};{{/groups}}",
                &root
            ),
            "g1:a!b!;g2:;"
        );
    }

    #[test]
    fn test_falsy_sections_and_else_branches() {
        let root = json!({"yes": true, "no": false, "empty": "", "none": [], "obj": {"k": "v"}});
        assert_eq!(render("{{#yes}}Y{{/yes}}{{#no}}N{{/no}}", &root), "Y");
        assert_eq!(render("{{#empty}}E{{else}}e{{/empty}}", &root), "e");
        assert_eq!(render("{{#none}}x{{else}}nothing{{/none}}", &root), "nothing");
        assert_eq!(render("{{#obj}}{{k}}{{/obj}}", &root), "v");
        assert_eq!(render("{{#unless absent}}fallback{{/unless}}", &root), "fallback");
    }

    #[test]
    fn test_current_item_escapes_values_not_text() {
        let root = json!({"names": ["<a>", "b"]});
        assert_eq!(render("{{#names}}{{.}}{{/names}}", &root), "&lt;a&gt;b");
        assert_eq!(render("{{#names}}[{{{.}}}]{{/names}}", &root), "[<a>][b]");
        assert_eq!(render("{{#names}}<{{this}}>{{/names}}", &root), "<&lt;a&gt;><b>");
    }

    #[test]
    fn test_standalone_lines_are_removed() {
        let root = json!({"list": ["x", "y"]});
        assert_eq!(
            render("begin\n  {{#list}}\n- {{.}}\n  {{/list}}\n{{! note }}\nend\n", &root),
            "begin\n- x\n- y\nend\n"
        );
        assert_eq!(render("a {{#list}}b{{/list}} c", &root), "a bb c");
    }

    #[test]
    fn test_helper_receives_rendered_body() {
        let mut helpers = Helpers::new();
        helpers.register("shout", |text: &str| Ok(format!("{}!", text.to_uppercase())));
        let root = json!({"name": "hub"});
        let out = render_str(
            "{{#shout}}{{name}}/x{{/shout}}",
            &root,
            &helpers,
            RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(out, "HUB/X!");
    }

    #[test]
    fn test_standalone_helper_body_starts_after_its_line() {
        let root = json!({"names": ["a", "b"]});
        let out = render_str(
            "{{#join}}\na,\n{{/join}}",
            &root,
            &join_helpers(),
            RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(out, "a,");

        let out = render_str(
            "x {{#join}}{{#names}}{{.}},{{/names}}{{/join}};",
            &root,
            &join_helpers(),
            RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(out, "x a,b;");
    }

    #[test]
    fn test_nearer_frame_shadows_helper() {
        let mut helpers = Helpers::new();
        helpers.register("url", |_: &str| Ok("helper".to_string()));
        let root = json!({"items": [{"url": "own"}]});
        let out = render_str(
            "{{#items}}{{#url}}[{{.}}]{{/url}}{{url}}{{/items}}|{{#url}}x{{/url}}",
            &root,
            &helpers,
            RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(out, "[own]own|helper");
    }

    #[test]
    fn test_helper_errors_are_reported() {
        let mut helpers = Helpers::new();
        helpers.register("fail", |_: &str| anyhow::bail!("bad input"));
        let err = render_str("{{#fail}}x{{/fail}}", &json!({}), &helpers, RenderOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            TemplateError::Helper {
                name: "fail".to_string(),
                message: "bad input".to_string()
            }
        );

        let err = render_str("{{fail}}", &json!({}), &helpers, RenderOptions::default())
            .unwrap_err();
        assert_eq!(err, TemplateError::HelperAsVariable("fail".to_string()));
        assert_eq!(
            helpers.call("fail", "x").unwrap_err().to_string(),
            "Helper 'fail' failed: bad input"
        );
    }

    #[test]
    fn test_strict_mode_rejects_unresolved_keys() {
        let strict = RenderOptions { strict: true };
        let err = render_str("{{missing}}", &json!({}), &Helpers::new(), strict).unwrap_err();
        assert_eq!(err, TemplateError::UnresolvedKey("missing".to_string()));
        assert_eq!(
            render_str("{{#missing}}x{{/missing}}", &json!({}), &Helpers::new(), strict).unwrap(),
            ""
        );
    }

    #[test]
    fn test_malformed_sources_are_syntax_errors() {
        for source in ["{{#a}}x", "{{#a}}x{{/b}}", "{{/never_opened}}\n", "a\n{{x"] {
            assert!(
                matches!(Template::parse(source), Err(TemplateError::Syntax { .. })),
                "{source} should not parse"
            );
        }
    }
}
