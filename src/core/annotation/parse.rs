//! Recursive-descent parser for annotation attribute bodies.
//!
//! The structural decoder reports where an attribute sits, not what it means;
//! the text from `@` through the closing parenthesis is parsed here with a
//! small hand-rolled grammar rather than another decoder round-trip:
//!
//! ```text
//! annotation := '@' ident '(' arg (',' arg)* ')'
//! arg        := [ident ':'] value
//! value      := '.' ident | string | bool | type '.self' | raw
//! ```

use crate::core::annotation::{
    ANNOTATION_PREFIX, ConfigurationAttribute, DependencyKind, TokenErrorKind,
};
use crate::core::types::{CompositeType, ConcreteType};

/// A successfully parsed dependency annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAnnotation {
    pub kind: DependencyKind,
    /// Expected parameter count from the `P<digits>` suffix; 0 for the bare
    /// prefix (and for an explicit `P0`, which is equivalent).
    pub arity: usize,
    /// The `type:` argument, with `.self` stripped.
    pub concrete_type: Option<ConcreteType>,
    /// Remaining arguments, in declaration order.
    pub attributes: Vec<ConfigurationAttribute>,
}

/// Parses one attribute text. Returns `Ok(None)` when the attribute is not
/// part of the annotation family (skipped silently per the lexing contract).
pub fn parse_annotation(text: &str) -> Result<Option<ParsedAnnotation>, TokenErrorKind> {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix('@') else {
        return Ok(None);
    };

    let ident_len = rest
        .find(|ch: char| !ch.is_alphanumeric() && ch != '_')
        .unwrap_or(rest.len());
    let (ident, tail) = rest.split_at(ident_len);

    let Some(arity) = parse_arity_suffix(ident) else {
        return Ok(None);
    };

    let tail = tail.trim();
    let Some(args_text) = tail.strip_prefix('(').and_then(|t| t.strip_suffix(')')) else {
        return Err(TokenErrorKind::InvalidAnnotation(trimmed.to_string()));
    };

    let mut kind = None;
    let mut concrete_type = None;
    let mut attributes = Vec::new();

    for arg in split_top_level(args_text) {
        let arg = arg.trim();
        if arg.is_empty() {
            continue;
        }
        match split_label(arg) {
            Some((label, value)) => match label {
                "kind" => {
                    kind = Some(parse_kind(value, trimmed)?);
                }
                "type" => {
                    let ty = strip_metatype(value);
                    let parsed = CompositeType::parse(ty).map_err(|_| {
                        TokenErrorKind::InvalidAnnotation(trimmed.to_string())
                    })?;
                    concrete_type = Some(ConcreteType(parsed));
                }
                _ => attributes.push(ConfigurationAttribute::parse(label, value)?),
            },
            None => {
                // A lone positional argument must be the kind enum case.
                kind = Some(parse_kind(arg, trimmed)?);
            }
        }
    }

    let Some(kind) = kind else {
        return Err(TokenErrorKind::InvalidAnnotation(trimmed.to_string()));
    };

    Ok(Some(ParsedAnnotation {
        kind,
        arity,
        concrete_type,
        attributes,
    }))
}

/// Parses a comment configuration line of the form
/// `// weaver: <target>.<name> = <value>`, where target is `self` or a
/// dependency name. Returns `Ok(None)` for comments outside the family.
pub fn parse_comment_configuration(
    line: &str,
) -> Result<Option<(String, ConfigurationAttribute)>, TokenErrorKind> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix("//") else {
        return Ok(None);
    };
    let rest = rest.trim_start();
    let lower = rest.to_lowercase();
    let Some(after_prefix) = lower
        .starts_with(ANNOTATION_PREFIX)
        .then(|| &rest[ANNOTATION_PREFIX.len()..])
    else {
        return Ok(None);
    };
    let Some(body) = after_prefix.trim_start().strip_prefix(':') else {
        return Ok(None);
    };

    let Some((lhs, value)) = body.split_once('=') else {
        return Err(TokenErrorKind::InvalidAnnotation(trimmed.to_string()));
    };
    let Some((target, name)) = lhs.trim().rsplit_once('.') else {
        return Err(TokenErrorKind::InvalidAnnotation(trimmed.to_string()));
    };

    let attribute = ConfigurationAttribute::parse(name.trim(), value.trim())?;
    Ok(Some((target.trim().to_string(), attribute)))
}

/// `""` and `P0` mean arity 0; `P<digits>` gives the count; anything else is
/// not part of the annotation family.
fn parse_arity_suffix(ident: &str) -> Option<usize> {
    let lower = ident.to_lowercase();
    let suffix = lower.strip_prefix(ANNOTATION_PREFIX)?;
    if suffix.is_empty() {
        return Some(0);
    }
    let digits = suffix.strip_prefix('p')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn parse_kind(value: &str, annotation: &str) -> Result<DependencyKind, TokenErrorKind> {
    DependencyKind::parse(value)
        .ok_or_else(|| TokenErrorKind::InvalidAnnotation(annotation.to_string()))
}

fn strip_metatype(value: &str) -> &str {
    value.trim().strip_suffix(".self").unwrap_or(value).trim()
}

/// Splits on commas not nested inside `()`, `<>`, `[]`, or string literals.
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut start = 0;
    let mut prev = '\0';

    for (i, ch) in input.char_indices() {
        if in_string {
            if ch == '"' && prev != '\\' {
                in_string = false;
            }
        } else {
            match ch {
                '"' => in_string = true,
                '(' | '<' | '[' => depth += 1,
                // The `>` of a closure arrow is not a bracket.
                '>' if prev == '-' => {}
                ')' | '>' | ']' => depth -= 1,
                ',' if depth == 0 => {
                    parts.push(&input[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
        }
        prev = ch;
    }
    if start < input.len() || !parts.is_empty() {
        parts.push(&input[start..]);
    }
    parts
}

/// Splits `label: value` when the prefix before a top-level `:` is a bare
/// identifier; other colons (e.g. inside a closure type) are left alone.
fn split_label(arg: &str) -> Option<(&str, &str)> {
    let colon = arg.find(':')?;
    let label = arg[..colon].trim();
    if label.is_empty()
        || !label
            .chars()
            .all(|ch| ch.is_alphanumeric() || ch == '_')
    {
        return None;
    }
    Some((label, arg[colon + 1..].trim()))
}
