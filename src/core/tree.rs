//! Abstract syntax tree of one compilation unit: injectable types nested
//! inside one another, with their dependencies and configuration in document
//! order.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::core::annotation::{ConfigurationAttribute, ConfigurationTarget};
use crate::core::diag::Span;
use crate::core::lexer::{
    ConfigurationAnnotationToken, ParameterAnnotation, ReferenceAnnotation, RegisterAnnotation,
};
use crate::core::types::AccessLevel;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Type(TypeDeclaration),
    Register(RegisterNode),
    Reference(ReferenceNode),
    Parameter(ParameterNode),
    Configuration(ConfigurationNode),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Type(node) => node.span,
            Expr::Register(node) => node.span,
            Expr::Reference(node) => node.span,
            Expr::Parameter(node) => node.span,
            Expr::Configuration(node) => node.span,
        }
    }

    /// The dependency name this node declares, if it declares one.
    pub fn dependency_name(&self) -> Option<&str> {
        match self {
            Expr::Register(node) => Some(&node.annotation.name),
            Expr::Reference(node) => Some(&node.annotation.name),
            Expr::Parameter(node) => Some(&node.annotation.name),
            _ => None,
        }
    }
}

/// The root of one parsed compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub path: PathBuf,
    pub imports: Vec<String>,
    pub types: Vec<Expr>,
}

impl File {
    pub fn type_declarations(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.types.iter().filter_map(|expr| match expr {
            Expr::Type(decl) => Some(decl),
            _ => None,
        })
    }
}

/// An injectable type with its nested children. Children keep document order;
/// generation depends on deterministic traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    pub name: String,
    pub access_level: AccessLevel,
    pub span: Span,
    pub children: Vec<Expr>,
    /// Type-targeted configuration (`self.…`).
    pub config: Vec<ConfigurationAttribute>,
}

impl TypeDeclaration {
    pub fn nested_types(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.children.iter().filter_map(|expr| match expr {
            Expr::Type(decl) => Some(decl),
            _ => None,
        })
    }

    pub fn registrations(&self) -> impl Iterator<Item = &RegisterNode> {
        self.children.iter().filter_map(|expr| match expr {
            Expr::Register(node) => Some(node),
            _ => None,
        })
    }

    pub fn references(&self) -> impl Iterator<Item = &ReferenceNode> {
        self.children.iter().filter_map(|expr| match expr {
            Expr::Reference(node) => Some(node),
            _ => None,
        })
    }

    pub fn parameters(&self) -> impl Iterator<Item = &ParameterNode> {
        self.children.iter().filter_map(|expr| match expr {
            Expr::Parameter(node) => Some(node),
            _ => None,
        })
    }

    /// Dependency-targeted configuration attributes for `name`, in document
    /// order.
    pub fn configuration_of(&self, name: &str) -> impl Iterator<Item = &ConfigurationAttribute> {
        self.children.iter().filter_map(move |expr| match expr {
            Expr::Configuration(node) => match &node.annotation.target {
                ConfigurationTarget::Dependency(target) if target == name => {
                    Some(&node.annotation.attribute)
                }
                _ => None,
            },
            _ => None,
        })
    }

    pub fn is_isolated(&self) -> bool {
        self.config.iter().any(|attr| {
            matches!(attr, ConfigurationAttribute::IsIsolated(true))
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterNode {
    pub annotation: RegisterAnnotation,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceNode {
    pub annotation: ReferenceAnnotation,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterNode {
    pub annotation: ParameterAnnotation,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationNode {
    pub annotation: ConfigurationAnnotationToken,
    pub span: Span,
}

impl Display for File {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "File({})", self.path.display())?;
        for import in &self.imports {
            writeln!(f, "  import {import}")?;
        }
        for expr in &self.types {
            fmt_expr(expr, f, 1)?;
        }
        Ok(())
    }
}

fn fmt_expr(expr: &Expr, f: &mut Formatter<'_>, depth: usize) -> std::fmt::Result {
    let pad = "  ".repeat(depth);
    match expr {
        Expr::Type(decl) => {
            writeln!(f, "{pad}{} {}", decl.access_level, decl.name)?;
            for child in &decl.children {
                fmt_expr(child, f, depth + 1)?;
            }
            Ok(())
        }
        Expr::Register(node) => writeln!(f, "{pad}register {}", node.annotation),
        Expr::Reference(node) => writeln!(f, "{pad}reference {}", node.annotation),
        Expr::Parameter(node) => writeln!(f, "{pad}parameter {}", node.annotation),
        Expr::Configuration(node) => writeln!(f, "{pad}config {}", node.annotation),
    }
}
