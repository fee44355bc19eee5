//! Section semantics for the handlebars registry.
//!
//! Blocks whose name is not a helper behave like mustache sections: lists
//! iterate, objects and other truthy values push a frame, falsy values render
//! the `{{else}}` branch. Registered helpers render their body first and
//! replace it with their own output.

use handlebars::{
    BlockContext, Context, Handlebars, Helper, HelperDef, HelperResult, JsonRender, Output,
    RenderContext, RenderError, RenderErrorReason, Renderable, ScopedJson, StringOutput,
};
use serde_json::Value;

use super::TemplateError;
use crate::models::is_truthy;

/// Registry hook for blocks without a helper of the same name.
pub(super) const SECTION_FALLBACK: &str = "blockHelperMissing";

type HelperBody<'h> = dyn Fn(&str) -> anyhow::Result<String> + Send + Sync + 'h;

/// Runs a helper and names it in the error.
pub(super) fn invoke(name: &str, helper: &HelperBody<'_>, rendered: &str) -> Result<String, TemplateError> {
    helper(rendered).map_err(|e| TemplateError::Helper {
        name: name.to_string(),
        message: format!("{e:#}"),
    })
}

fn nested(error: TemplateError) -> RenderError {
    RenderErrorReason::NestedError(Box::new(error)).into()
}

/// Mustache section over a context value.
pub(super) struct Section;

impl HelperDef for Section {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let value = rc.evaluate(ctx, h.name())?;
        render_section(&value, h, r, ctx, rc, out)
    }
}

/// A registered helper bound into one render call.
pub(super) struct BoundHelper<'h> {
    name: &'h str,
    helper: &'h HelperBody<'h>,
}

impl<'h> BoundHelper<'h> {
    pub(super) fn new(name: &'h str, helper: &'h HelperBody<'h>) -> Self {
        Self { name, helper }
    }
}

impl HelperDef for BoundHelper<'_> {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let own = rc.evaluate(ctx, self.name)?;
        if in_nearer_frame(&own) {
            if h.is_block() {
                return render_section(&own, h, r, ctx, rc, out);
            }
            let text = own.as_json().render();
            let text = if rc.is_disable_escape() {
                text
            } else {
                r.get_escape_fn()(&text)
            };
            out.write(&text)?;
            return Ok(());
        }
        if !h.is_block() {
            return Err(nested(TemplateError::HelperAsVariable(self.name.to_string())));
        }

        let mut body = StringOutput::new();
        if let Some(template) = h.template() {
            template.render(r, ctx, rc, &mut body)?;
        }
        let text = invoke(self.name, self.helper, &body.into_string()?).map_err(nested)?;
        out.write(&text)?;
        Ok(())
    }
}

/// Values found below the root frame shadow helpers.
fn in_nearer_frame(value: &ScopedJson<'_>) -> bool {
    match value.context_path() {
        Some(path) => path.len() > 1,
        None => !value.is_missing(),
    }
}

fn frame<'rc>(path: Option<&Vec<String>>, index: Option<usize>, value: &Value) -> BlockContext<'rc> {
    let mut block = BlockContext::new();
    match path {
        Some(path) => {
            let base = block.base_path_mut();
            base.clone_from(path);
            if let Some(index) = index {
                base.push(index.to_string());
            }
        }
        None => block.set_base_value(value.clone()),
    }
    block
}

fn render_section<'reg: 'rc, 'rc>(
    value: &ScopedJson<'rc>,
    h: &Helper<'rc>,
    r: &'reg Handlebars<'reg>,
    ctx: &'rc Context,
    rc: &mut RenderContext<'reg, 'rc>,
    out: &mut dyn Output,
) -> HelperResult {
    let json = value.as_json();
    let Some(body) = h.template() else {
        return Ok(());
    };

    match json {
        Value::Array(items) if !items.is_empty() => {
            for (index, item) in items.iter().enumerate() {
                rc.push_block(frame(value.context_path(), Some(index), item));
                let result = body.render(r, ctx, rc, out);
                rc.pop_block();
                result?;
            }
            Ok(())
        }
        Value::Bool(true) => body.render(r, ctx, rc, out),
        Value::Array(_) => render_inverse(h, r, ctx, rc, out),
        json if is_truthy(json) => {
            rc.push_block(frame(value.context_path(), None, json));
            let result = body.render(r, ctx, rc, out);
            rc.pop_block();
            result
        }
        _ => render_inverse(h, r, ctx, rc, out),
    }
}

fn render_inverse<'reg: 'rc, 'rc>(
    h: &Helper<'rc>,
    r: &'reg Handlebars<'reg>,
    ctx: &'rc Context,
    rc: &mut RenderContext<'reg, 'rc>,
    out: &mut dyn Output,
) -> HelperResult {
    match h.inverse() {
        Some(inverse) => inverse.render(r, ctx, rc, out),
        None => Ok(()),
    }
}
