//! Minimal substitution engine for the generated-source templates.
//!
//! Supported forms: `{{name}}` substitution and `{{#each xs}}…{{/each}}`
//! loops. Rendering is pure: the same template and context produce identical
//! bytes, and iteration follows the order lists were built in.

use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub enum TemplateValue {
    Str(String),
    List(Vec<TemplateContext>),
}

#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    values: IndexMap<String, TemplateValue>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values
            .insert(name.into(), TemplateValue::Str(value.into()));
        self
    }

    pub fn set_list(
        &mut self,
        name: impl Into<String>,
        items: Vec<TemplateContext>,
    ) -> &mut Self {
        self.values.insert(name.into(), TemplateValue::List(items));
        self
    }

    fn get(&self, name: &str) -> Option<&TemplateValue> {
        self.values.get(name)
    }
}

pub fn render(template: &str, context: &TemplateContext) -> String {
    render_scoped(template, &[context])
}

/// Inner scopes shadow outer ones, so loop bodies can still reach
/// file-level values.
fn render_scoped(template: &str, scopes: &[&TemplateContext]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            // Unterminated tag renders literally.
            out.push_str(&rest[open..]);
            return out;
        };
        let tag = after_open[..close].trim();
        let after_tag = strip_tag_newline(&after_open[close + 2..]);

        if let Some(list_name) = tag.strip_prefix("#each ") {
            let Some((body, tail)) = split_each_body(after_tag) else {
                // Unmatched loop renders literally from the open tag on.
                out.push_str(&rest[open..]);
                return out;
            };
            if let Some(TemplateValue::List(items)) = lookup(scopes, list_name.trim()) {
                for item in items {
                    let mut inner: Vec<&TemplateContext> = scopes.to_vec();
                    inner.push(item);
                    out.push_str(&render_scoped(body, &inner));
                }
            }
            rest = tail;
        } else {
            if let Some(TemplateValue::Str(value)) = lookup(scopes, tag) {
                out.push_str(value);
            }
            rest = &after_open[close + 2..];
        }
    }
    out.push_str(rest);
    out
}

fn lookup<'a>(scopes: &[&'a TemplateContext], name: &str) -> Option<&'a TemplateValue> {
    scopes.iter().rev().find_map(|scope| scope.get(name))
}

/// A loop tag standing at the end of a line consumes its newline, keeping
/// rendered blocks free of scaffolding blank lines.
fn strip_tag_newline(rest: &str) -> &str {
    rest.strip_prefix('\n').unwrap_or(rest)
}

/// Finds the body of a loop, honoring nested `{{#each}}` blocks. Returns the
/// body and the text after the matching `{{/each}}`.
fn split_each_body(input: &str) -> Option<(&str, &str)> {
    let mut depth = 1;
    let mut search = 0;

    while let Some(open) = input[search..].find("{{") {
        let at = search + open;
        let after = &input[at + 2..];
        let close = after.find("}}")?;
        let tag = after[..close].trim();

        if tag.starts_with("#each ") {
            depth += 1;
        } else if tag == "/each" {
            depth -= 1;
            if depth == 0 {
                let body = &input[..at];
                let tail = strip_tag_newline(&after[close + 2..]);
                return Some((body, tail));
            }
        }
        search = at + 2 + close + 2;
    }
    None
}

#[cfg(test)]
#[path = "../../tests/t_template.rs"]
mod tests;
