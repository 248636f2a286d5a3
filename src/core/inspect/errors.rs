use std::fmt::{Display, Formatter};
use thiserror::Error;

use crate::core::diag::{SourceFile, Span, SpannedError};
use crate::core::types::CompositeType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphErrorCause {
    CyclicDependency,
    UnresolvableDependency,
}

impl Display for GraphErrorCause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GraphErrorCause::CyclicDependency => "cyclic dependency",
            GraphErrorCause::UnresolvableDependency => "unresolvable dependency",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InspectorErrorKind {
    /// The AST broke a structural invariant the parser was supposed to hold.
    /// Surfacing this means an internal bug, not a user error.
    #[error("Invalid AST node: {0}")]
    InvalidAst(String),

    #[error("Invalid graph: {name}: {ty}: {cause}")]
    InvalidGraph {
        name: String,
        ty: CompositeType,
        cause: GraphErrorCause,
    },
}

pub type InspectorError = SpannedError<InspectorErrorKind>;

impl InspectorErrorKind {
    pub fn at(self, span: Span, file: &SourceFile) -> InspectorError {
        InspectorError::new(self, span, file.path.clone())
    }
}
