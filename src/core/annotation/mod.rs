//! Dependency annotation model: kinds, configuration attributes, and the
//! parser for `@Weaver(...)` attribute bodies.

use std::fmt::{Display, Formatter};
use thiserror::Error;

use crate::core::types::Scope;

mod parse;

pub use parse::{ParsedAnnotation, parse_annotation, parse_comment_configuration};

/// The annotation prefix family. Matched case-insensitively, optionally
/// followed by `P<digits>` encoding an expected parameter count.
pub const ANNOTATION_PREFIX: &str = "weaver";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// Declares a concrete type with a build closure.
    Registration,
    /// States that some ancestor must register this.
    Reference,
    /// A value injected by the caller of `resolve`.
    Parameter,
}

impl DependencyKind {
    pub fn parse(case: &str) -> Option<DependencyKind> {
        match case.trim().trim_start_matches('.') {
            "registration" => Some(DependencyKind::Registration),
            "reference" => Some(DependencyKind::Reference),
            "parameter" => Some(DependencyKind::Parameter),
            _ => None,
        }
    }
}

impl Display for DependencyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DependencyKind::Registration => "registration",
            DependencyKind::Reference => "reference",
            DependencyKind::Parameter => "parameter",
        };
        write!(f, "{s}")
    }
}

/// A configuration attribute attached to a type or to a dependency. The name
/// set is closed; unknown names fail annotation parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationAttribute {
    /// Type-level: the type's dependencies never resolve through it.
    IsIsolated(bool),
    /// Expression used to build the instance instead of `T.init`.
    CustomBuilder(String),
    Scope(Scope),
    DoesSupportObjc(bool),
    /// Generate a setter alongside the getter.
    Setter(bool),
    /// The builder closure parameter is escaping.
    Escaping(bool),
    /// Expose the projected value of the property wrapper.
    Projected(bool),
    /// Lifted from attribute presence rather than an argument.
    Objc(bool),
}

impl ConfigurationAttribute {
    pub fn name(&self) -> &'static str {
        match self {
            ConfigurationAttribute::IsIsolated(_) => "isIsolated",
            ConfigurationAttribute::CustomBuilder(_) => "customBuilder",
            ConfigurationAttribute::Scope(_) => "scope",
            ConfigurationAttribute::DoesSupportObjc(_) => "doesSupportObjc",
            ConfigurationAttribute::Setter(_) => "setter",
            ConfigurationAttribute::Escaping(_) => "escaping",
            ConfigurationAttribute::Projected(_) => "projected",
            ConfigurationAttribute::Objc(_) => "objc",
        }
    }

    /// Routes a `name = value` pair into a typed attribute.
    pub fn parse(name: &str, value: &str) -> Result<ConfigurationAttribute, TokenErrorKind> {
        let value = value.trim();
        match name {
            "isIsolated" => Ok(ConfigurationAttribute::IsIsolated(parse_bool(name, value)?)),
            "customBuilder" => Ok(ConfigurationAttribute::CustomBuilder(unquote(value))),
            "scope" => match Scope::parse(value) {
                Some(scope) => Ok(ConfigurationAttribute::Scope(scope)),
                None => Err(TokenErrorKind::InvalidScope(value.to_string())),
            },
            "doesSupportObjc" => Ok(ConfigurationAttribute::DoesSupportObjc(parse_bool(
                name, value,
            )?)),
            "setter" => Ok(ConfigurationAttribute::Setter(parse_bool(name, value)?)),
            "escaping" => Ok(ConfigurationAttribute::Escaping(parse_bool(name, value)?)),
            "projected" => Ok(ConfigurationAttribute::Projected(parse_bool(name, value)?)),
            "objc" => Ok(ConfigurationAttribute::Objc(parse_bool(name, value)?)),
            _ => Err(TokenErrorKind::InvalidAnnotation(format!("{name} = {value}"))),
        }
    }
}

impl Display for ConfigurationAttribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationAttribute::IsIsolated(v) => write!(f, "isIsolated = {v}"),
            ConfigurationAttribute::CustomBuilder(v) => write!(f, "customBuilder = {v}"),
            ConfigurationAttribute::Scope(v) => write!(f, "scope = .{v}"),
            ConfigurationAttribute::DoesSupportObjc(v) => write!(f, "doesSupportObjc = {v}"),
            ConfigurationAttribute::Setter(v) => write!(f, "setter = {v}"),
            ConfigurationAttribute::Escaping(v) => write!(f, "escaping = {v}"),
            ConfigurationAttribute::Projected(v) => write!(f, "projected = {v}"),
            ConfigurationAttribute::Objc(v) => write!(f, "objc = {v}"),
        }
    }
}

/// What a configuration annotation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationTarget {
    /// The enclosing type (`self.…` in comment annotations).
    Type,
    /// A dependency declared in the same type, by name.
    Dependency(String),
}

impl Display for ConfigurationTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationTarget::Type => write!(f, "self"),
            ConfigurationTarget::Dependency(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenErrorKind {
    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("Invalid scope: {0}")]
    InvalidScope(String),
}

fn parse_bool(name: &str, value: &str) -> Result<bool, TokenErrorKind> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(TokenErrorKind::InvalidAnnotation(format!(
            "{name} = {value}"
        ))),
    }
}

fn unquote(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/t_annotation.rs"]
mod tests;
