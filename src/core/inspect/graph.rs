//! The dependency graph derived from one AST. Nodes live in a vector and
//! edges are index pairs, so the graph itself owns no cyclic structure.

use std::collections::HashMap;

use crate::core::annotation::{ConfigurationAttribute, DependencyKind};
use crate::core::diag::Span;
use crate::core::tree::{Expr, File, TypeDeclaration};
use crate::core::types::{AbstractType, AccessLevel, ConcreteType, Scope};

pub type TypeId = usize;
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct TypeEntry {
    pub name: String,
    /// Dotted path through the enclosing types (`Outer.Inner`).
    pub qualified_name: String,
    /// Effective access, with `Default` already resolved against the parent.
    pub access_level: AccessLevel,
    pub parent: Option<TypeId>,
    pub is_isolated: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDependency {
    pub name: String,
    pub kind: DependencyKind,
    /// Declared or configured scope; `None` for references and parameters.
    pub scope: Option<Scope>,
    /// For parameters this is the parameter type.
    pub abstract_type: AbstractType,
    pub concrete_type: Option<ConcreteType>,
    /// Access as declared on the variable (unresolved).
    pub access_level: AccessLevel,
    pub declaring_type: TypeId,
    pub span: Span,
}

#[derive(Debug, Default)]
pub struct Graph {
    pub types: Vec<TypeEntry>,
    pub nodes: Vec<ResolvedDependency>,
    /// Dependency nodes per type, in document order. Parallel to `types`.
    pub by_type: Vec<Vec<NodeId>>,
    /// `(declaring type, dependency name)` index.
    pub index: HashMap<(TypeId, String), NodeId>,
    /// First type carrying each simple name, in document order.
    pub type_by_name: HashMap<String, TypeId>,
}

impl Graph {
    /// One pre-order walk over the AST, carrying the ancestor on the
    /// traversal stack.
    pub fn build(file: &File) -> Result<Graph, String> {
        let mut graph = Graph::default();
        for expr in &file.types {
            match expr {
                Expr::Type(decl) => graph.add_type(decl, None)?,
                other => {
                    return Err(format!("top-level expression is not a type: {other:?}"));
                }
            }
        }
        Ok(graph)
    }

    /// The ordered chain of enclosing types, innermost first.
    pub fn ancestors(&self, type_id: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        std::iter::successors(self.types[type_id].parent, move |&id| self.types[id].parent)
    }

    /// Registrations in document order across the whole unit.
    pub fn registrations(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter(|&id| self.nodes[id].kind == DependencyKind::Registration)
    }

    /// Finds the injectable type a registration's concrete type names, if it
    /// is declared in this unit.
    pub fn target_type(&self, node: NodeId) -> Option<TypeId> {
        let concrete = self.nodes[node].concrete_type.as_ref()?;
        let name = concrete.0.name()?;
        self.type_by_name.get(name).copied()
    }

    /// Walks the ancestor chain looking for a dependency with the given name.
    pub fn resolve_through_ancestors(&self, from: TypeId, name: &str) -> Option<NodeId> {
        self.ancestors(from)
            .find_map(|ancestor| self.index.get(&(ancestor, name.to_string())).copied())
    }

    fn add_type(&mut self, decl: &TypeDeclaration, parent: Option<TypeId>) -> Result<(), String> {
        let parent_access = parent
            .map(|id| self.types[id].access_level)
            .unwrap_or(AccessLevel::Internal);
        let qualified_name = match parent {
            Some(id) => format!("{}.{}", self.types[id].qualified_name, decl.name),
            None => decl.name.clone(),
        };

        let type_id = self.types.len();
        self.types.push(TypeEntry {
            name: decl.name.clone(),
            qualified_name,
            access_level: decl.access_level.resolved(parent_access),
            parent,
            is_isolated: decl.is_isolated(),
            span: decl.span,
        });
        self.by_type.push(Vec::new());
        self.type_by_name
            .entry(decl.name.clone())
            .or_insert(type_id);

        for child in &decl.children {
            match child {
                Expr::Type(nested) => self.add_type(nested, Some(type_id))?,
                Expr::Register(node) => {
                    let scope = self
                        .configured_scope(decl, &node.annotation.name)
                        .unwrap_or_default();
                    self.add_node(ResolvedDependency {
                        name: node.annotation.name.clone(),
                        kind: DependencyKind::Registration,
                        scope: Some(scope),
                        abstract_type: node.annotation.abstract_type.clone(),
                        concrete_type: Some(node.annotation.concrete_type.clone()),
                        access_level: node.annotation.access_level,
                        declaring_type: type_id,
                        span: node.span,
                    })?;
                }
                Expr::Reference(node) => {
                    self.add_node(ResolvedDependency {
                        name: node.annotation.name.clone(),
                        kind: DependencyKind::Reference,
                        scope: None,
                        abstract_type: node.annotation.abstract_type.clone(),
                        concrete_type: None,
                        access_level: node.annotation.access_level,
                        declaring_type: type_id,
                        span: node.span,
                    })?;
                }
                Expr::Parameter(node) => {
                    self.add_node(ResolvedDependency {
                        name: node.annotation.name.clone(),
                        kind: DependencyKind::Parameter,
                        scope: None,
                        abstract_type: AbstractType(node.annotation.parameter_type.clone()),
                        concrete_type: None,
                        access_level: node.annotation.access_level,
                        declaring_type: type_id,
                        span: node.span,
                    })?;
                }
                Expr::Configuration(_) => {}
            }
        }
        Ok(())
    }

    fn add_node(&mut self, node: ResolvedDependency) -> Result<(), String> {
        let key = (node.declaring_type, node.name.clone());
        let node_id = self.nodes.len();
        if self.index.insert(key, node_id).is_some() {
            // The parser rejects double declarations; seeing one here means
            // the AST was built by other means.
            return Err(format!(
                "duplicate dependency survived parsing: {}",
                node.name
            ));
        }
        self.by_type[node.declaring_type].push(node_id);
        self.nodes.push(node);
        Ok(())
    }

    /// A `scope` configuration attribute overrides the default; the last one
    /// in document order wins.
    fn configured_scope(&self, decl: &TypeDeclaration, name: &str) -> Option<Scope> {
        decl.configuration_of(name)
            .filter_map(|attr| match attr {
                ConfigurationAttribute::Scope(scope) => Some(*scope),
                _ => None,
            })
            .last()
    }
}
