//! Recursive-descent parser folding the token stream into the AST.
//!
//! Grammar:
//!
//! ```text
//! File           := Import* TopDecl*
//! TopDecl        := InjectableType | AnyDeclaration
//! InjectableType := InjectableTypeTok Body EndInjectableTypeTok
//! Body           := ( InjectableType | AnyDeclaration | Annotation )*
//! Annotation     := Register | Reference | Parameter | Configuration
//! ```

use std::collections::HashSet;

use crate::core::annotation::ConfigurationTarget;
use crate::core::diag::{SourceFile, file_end_span};
use crate::core::lexer::{Token, TokenKind};
use crate::core::tree::{
    ConfigurationNode, Expr, File, ParameterNode, ReferenceNode, RegisterNode, TypeDeclaration,
};

mod errors;

pub use errors::{ParserError, ParserErrorKind};

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    file: &'a SourceFile,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], file: &'a SourceFile) -> Self {
        Parser {
            tokens,
            pos: 0,
            file,
        }
    }

    pub fn parse(&mut self) -> Result<File, ParserError> {
        let mut imports = Vec::new();
        let mut types = Vec::new();

        // File := Import* TopDecl*
        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Import(module) => {
                    imports.push(module.clone());
                    self.advance();
                }
                _ => break,
            }
        }

        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::InjectableType(_) => {
                    types.push(Expr::Type(self.parse_injectable_type()?));
                }
                TokenKind::AnyDeclaration => {
                    types.extend(self.parse_any_declaration()?);
                }
                _ => {
                    return Err(
                        ParserErrorKind::UnexpectedToken.at(token.span, self.file)
                    );
                }
            }
        }

        Ok(File {
            path: self.file.path.clone(),
            imports,
            types,
        })
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected_eof(&self) -> ParserError {
        ParserErrorKind::UnexpectedEof.at(file_end_span(self.file), self.file)
    }

    /// InjectableType := InjectableTypeTok Body EndInjectableTypeTok
    fn parse_injectable_type(&mut self) -> Result<TypeDeclaration, ParserError> {
        let start = self.advance().ok_or_else(|| self.unexpected_eof())?;
        let TokenKind::InjectableType(type_token) = &start.kind else {
            return Err(ParserErrorKind::UnexpectedToken.at(start.span, self.file));
        };

        let mut children = Vec::new();
        let mut config = Vec::new();
        let mut declared_names: HashSet<String> = HashSet::new();

        loop {
            let Some(token) = self.peek() else {
                return Err(self.unexpected_eof());
            };
            match &token.kind {
                TokenKind::EndOfInjectableType => {
                    self.advance();
                    break;
                }
                TokenKind::InjectableType(_) => {
                    children.push(Expr::Type(self.parse_injectable_type()?));
                }
                TokenKind::AnyDeclaration => {
                    children.extend(self.parse_any_declaration()?);
                }
                TokenKind::Register(annotation) => {
                    self.declare(&mut declared_names, &annotation.name, token)?;
                    children.push(Expr::Register(RegisterNode {
                        annotation: annotation.clone(),
                        span: token.span,
                    }));
                    self.advance();
                }
                TokenKind::Reference(annotation) => {
                    self.declare(&mut declared_names, &annotation.name, token)?;
                    children.push(Expr::Reference(ReferenceNode {
                        annotation: annotation.clone(),
                        span: token.span,
                    }));
                    self.advance();
                }
                TokenKind::Parameter(annotation) => {
                    self.declare(&mut declared_names, &annotation.name, token)?;
                    children.push(Expr::Parameter(ParameterNode {
                        annotation: annotation.clone(),
                        span: token.span,
                    }));
                    self.advance();
                }
                TokenKind::Configuration(annotation) => {
                    match &annotation.target {
                        ConfigurationTarget::Type => {
                            config.push(annotation.attribute.clone());
                        }
                        ConfigurationTarget::Dependency(_) => {
                            children.push(Expr::Configuration(ConfigurationNode {
                                annotation: annotation.clone(),
                                span: token.span,
                            }));
                        }
                    }
                    self.advance();
                }
                TokenKind::Import(_) | TokenKind::EndOfAnyDeclaration => {
                    return Err(
                        ParserErrorKind::UnexpectedToken.at(token.span, self.file)
                    );
                }
            }
        }

        // Configuration may precede the dependency it targets, so unknown
        // targets are checked once the body is complete.
        for child in &children {
            if let Expr::Configuration(node) = child
                && let ConfigurationTarget::Dependency(name) = &node.annotation.target
                && !declared_names.contains(name)
            {
                return Err(
                    ParserErrorKind::UnknownDependency(name.clone()).at(node.span, self.file)
                );
            }
        }

        Ok(TypeDeclaration {
            name: type_token.name.clone(),
            access_level: type_token.access_level,
            span: start.span,
            children,
            config,
        })
    }

    /// Balances over an opaque declaration region (enum or extension body).
    /// Injectable types nested inside are still collected; loose dependency
    /// annotations are not legal there.
    fn parse_any_declaration(&mut self) -> Result<Vec<Expr>, ParserError> {
        let start = self.advance().ok_or_else(|| self.unexpected_eof())?;
        debug_assert!(matches!(start.kind, TokenKind::AnyDeclaration));

        let mut nested = Vec::new();
        loop {
            let Some(token) = self.peek() else {
                return Err(self.unexpected_eof());
            };
            match &token.kind {
                TokenKind::EndOfAnyDeclaration => {
                    self.advance();
                    break;
                }
                TokenKind::InjectableType(_) => {
                    nested.push(Expr::Type(self.parse_injectable_type()?));
                }
                TokenKind::AnyDeclaration => {
                    nested.extend(self.parse_any_declaration()?);
                }
                _ => {
                    return Err(
                        ParserErrorKind::UnexpectedToken.at(token.span, self.file)
                    );
                }
            }
        }
        Ok(nested)
    }

    fn declare(
        &self,
        declared_names: &mut HashSet<String>,
        name: &str,
        token: &Token,
    ) -> Result<(), ParserError> {
        if !declared_names.insert(name.to_string()) {
            return Err(ParserErrorKind::DependencyDoubleDeclaration(name.to_string())
                .at(token.span, self.file));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/t_parser.rs"]
mod tests;
