use thiserror::Error;

use crate::core::diag::{SourceFile, Span, SpannedError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserErrorKind {
    #[error("Unexpected token")]
    UnexpectedToken,

    #[error("Unexpected end of token stream")]
    UnexpectedEof,

    #[error("Configuration targets unknown dependency: {0}")]
    UnknownDependency(String),

    #[error("Dependency declared twice: {0}")]
    DependencyDoubleDeclaration(String),
}

pub type ParserError = SpannedError<ParserErrorKind>;

impl ParserErrorKind {
    pub fn at(self, span: Span, file: &SourceFile) -> ParserError {
        ParserError::new(self, span, file.path.clone())
    }
}
