//! Dependency-graph validation: every reference must be resolvable through
//! its ancestor chain, the build graph must be acyclic, and access and scope
//! rules must hold. The inspector never mutates the AST.

use crate::core::annotation::DependencyKind;
use crate::core::diag::SourceFile;
use crate::core::tree::File;
use crate::core::types::Scope;

mod errors;
mod graph;

pub use errors::{GraphErrorCause, InspectorError, InspectorErrorKind};
pub use graph::{Graph, NodeId, ResolvedDependency, TypeEntry, TypeId};

pub struct Inspector<'a> {
    file: &'a SourceFile,
}

impl<'a> Inspector<'a> {
    pub fn new(file: &'a SourceFile) -> Self {
        Inspector { file }
    }

    /// Builds the graph and proves the wiring invariants, failing fast on the
    /// first violation.
    pub fn inspect(&self, ast: &File) -> Result<Graph, InspectorError> {
        let graph = Graph::build(ast).map_err(|detail| {
            InspectorErrorKind::InvalidAst(detail).at(Default::default(), self.file)
        })?;

        self.check_access_levels(&graph)?;
        self.check_resolvability(&graph)?;
        self.check_acyclicity(&graph)?;
        self.check_scope_widths(&graph)?;
        Ok(graph)
    }

    /// A dependency's declared access level must not exceed its enclosing
    /// type's.
    fn check_access_levels(&self, graph: &Graph) -> Result<(), InspectorError> {
        for node in &graph.nodes {
            let enclosing = graph.types[node.declaring_type].access_level;
            if node.access_level.exceeds(enclosing) {
                return Err(self.unresolvable(node));
            }
        }
        Ok(())
    }

    /// Every reference must find an ancestor that registers the name, takes
    /// it as a parameter, or forwards the obligation with its own reference.
    /// Matching is by name first; the type must then agree.
    fn check_resolvability(&self, graph: &Graph) -> Result<(), InspectorError> {
        for node in &graph.nodes {
            if node.kind != DependencyKind::Reference {
                continue;
            }
            // An isolated type is built and satisfied by hand; its references
            // carry no resolution obligation.
            if graph.types[node.declaring_type].is_isolated {
                continue;
            }

            let Some(found) = graph.resolve_through_ancestors(node.declaring_type, &node.name)
            else {
                return Err(self.unresolvable(node));
            };

            let candidate = &graph.nodes[found];
            let matches = match candidate.kind {
                DependencyKind::Registration => {
                    candidate.abstract_type == node.abstract_type
                        || candidate
                            .concrete_type
                            .as_ref()
                            .is_some_and(|c| c.0 == node.abstract_type.0)
                }
                DependencyKind::Parameter | DependencyKind::Reference => {
                    candidate.abstract_type == node.abstract_type
                }
            };
            if !matches {
                return Err(self.unresolvable(node));
            }
        }
        Ok(())
    }

    /// Tarjan SCC over the registration build graph: no component of size
    /// greater than one and no self-loop. The error is reported at the
    /// lexically first node of the offending component.
    fn check_acyclicity(&self, graph: &Graph) -> Result<(), InspectorError> {
        let registrations: Vec<NodeId> = graph.registrations().collect();
        let position: std::collections::HashMap<NodeId, usize> = registrations
            .iter()
            .enumerate()
            .map(|(i, &node)| (node, i))
            .collect();

        // Edges go from a registration to the registrations the type it
        // builds depends on: sibling registrations directly, references via
        // the ancestor chain.
        let mut edges: Vec<Vec<usize>> = vec![Vec::new(); registrations.len()];
        for (from_index, &from) in registrations.iter().enumerate() {
            let Some(target) = graph.target_type(from) else {
                continue;
            };
            for &dep in &graph.by_type[target] {
                match graph.nodes[dep].kind {
                    DependencyKind::Registration => {
                        edges[from_index].push(position[&dep]);
                    }
                    DependencyKind::Reference => {
                        if let Some(resolved) =
                            graph.resolve_through_ancestors(target, &graph.nodes[dep].name)
                            && graph.nodes[resolved].kind == DependencyKind::Registration
                        {
                            edges[from_index].push(position[&resolved]);
                        }
                    }
                    DependencyKind::Parameter => {}
                }
            }
        }

        let components = tarjan_scc(registrations.len(), &edges);
        let mut offending: Option<NodeId> = None;
        for component in components {
            let cyclic = component.len() > 1
                || component
                    .iter()
                    .any(|&v| edges[v].contains(&v));
            if !cyclic {
                continue;
            }
            let first = component
                .iter()
                .map(|&v| registrations[v])
                .min_by_key(|&node| graph.nodes[node].span.start.offset)
                .expect("non-empty component");
            let replace = match offending {
                Some(current) => {
                    graph.nodes[first].span.start.offset
                        < graph.nodes[current].span.start.offset
                }
                None => true,
            };
            if replace {
                offending = Some(first);
            }
        }

        if let Some(node_id) = offending {
            let node = &graph.nodes[node_id];
            return Err(InspectorErrorKind::InvalidGraph {
                name: node.name.clone(),
                ty: node.abstract_type.0.clone(),
                cause: GraphErrorCause::CyclicDependency,
            }
            .at(node.span, self.file));
        }
        Ok(())
    }

    /// A container-lived registration must not capture a transient sibling of
    /// the type it builds: the long-lived instance would silently pin the
    /// transient one. References and parameters resolve at a wider scope or
    /// are caller-supplied, so they are exempt.
    fn check_scope_widths(&self, graph: &Graph) -> Result<(), InspectorError> {
        for from in graph.registrations() {
            let node = &graph.nodes[from];
            if !node.scope.unwrap_or_default().is_container_lived() {
                continue;
            }
            let Some(target) = graph.target_type(from) else {
                continue;
            };
            for &dep in &graph.by_type[target] {
                let dep_node = &graph.nodes[dep];
                if dep_node.kind == DependencyKind::Registration
                    && dep_node.scope == Some(Scope::Transient)
                {
                    return Err(self.unresolvable(node));
                }
            }
        }
        Ok(())
    }

    fn unresolvable(&self, node: &ResolvedDependency) -> InspectorError {
        InspectorErrorKind::InvalidGraph {
            name: node.name.clone(),
            ty: node.abstract_type.0.clone(),
            cause: GraphErrorCause::UnresolvableDependency,
        }
        .at(node.span, self.file)
    }
}

/// Iterative Tarjan strongly-connected-components over an index graph.
fn tarjan_scc(vertex_count: usize, edges: &[Vec<usize>]) -> Vec<Vec<usize>> {
    #[derive(Clone, Copy)]
    struct VertexState {
        index: Option<usize>,
        lowlink: usize,
        on_stack: bool,
    }

    let mut state = vec![
        VertexState {
            index: None,
            lowlink: 0,
            on_stack: false,
        };
        vertex_count
    ];
    let mut stack = Vec::new();
    let mut components = Vec::new();
    let mut next_index = 0;

    // Explicit work stack: (vertex, next edge position to visit).
    for root in 0..vertex_count {
        if state[root].index.is_some() {
            continue;
        }
        let mut work = vec![(root, 0usize)];
        while let Some(&mut (v, ref mut edge_pos)) = work.last_mut() {
            if *edge_pos == 0 {
                state[v].index = Some(next_index);
                state[v].lowlink = next_index;
                next_index += 1;
                stack.push(v);
                state[v].on_stack = true;
            }

            if let Some(&w) = edges[v].get(*edge_pos) {
                *edge_pos += 1;
                match state[w].index {
                    None => work.push((w, 0)),
                    Some(w_index) => {
                        if state[w].on_stack {
                            state[v].lowlink = state[v].lowlink.min(w_index);
                        }
                    }
                }
                continue;
            }

            // All edges of v visited; close out.
            work.pop();
            if let Some(&(parent, _)) = work.last() {
                let v_low = state[v].lowlink;
                state[parent].lowlink = state[parent].lowlink.min(v_low);
            }
            if state[v].index == Some(state[v].lowlink) {
                let mut component = Vec::new();
                loop {
                    let w = stack.pop().expect("tarjan stack underflow");
                    state[w].on_stack = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                components.push(component);
            }
        }
    }
    components
}

#[cfg(test)]
#[path = "../../tests/t_inspector.rs"]
mod tests;
