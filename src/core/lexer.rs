//! Turns a declaration dictionary stream plus raw source text into a flat
//! annotation token stream ordered by byte offset.

use std::fmt::{Display, Formatter};
use thiserror::Error;

use crate::core::annotation::{
    ConfigurationAttribute, ConfigurationTarget, DependencyKind, TokenErrorKind, parse_annotation,
    parse_comment_configuration,
};
use crate::core::decl::{AttributeKind, Declaration, DeclarationKind};
use crate::core::diag::{SourceFile, Span, SpannedError};
use crate::core::types::{AbstractType, AccessLevel, CompositeType, ConcreteType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    InjectableType(InjectableTypeToken),
    EndOfInjectableType,
    AnyDeclaration,
    EndOfAnyDeclaration,
    Register(RegisterAnnotation),
    Reference(ReferenceAnnotation),
    Parameter(ParameterAnnotation),
    Configuration(ConfigurationAnnotationToken),
    Import(String),
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::InjectableType(token) => write!(f, "InjectableType({token})"),
            TokenKind::EndOfInjectableType => write!(f, "EndOfInjectableType"),
            TokenKind::AnyDeclaration => write!(f, "AnyDeclaration"),
            TokenKind::EndOfAnyDeclaration => write!(f, "EndOfAnyDeclaration"),
            TokenKind::Register(annotation) => write!(f, "Register({annotation})"),
            TokenKind::Reference(annotation) => write!(f, "Reference({annotation})"),
            TokenKind::Parameter(annotation) => write!(f, "Parameter({annotation})"),
            TokenKind::Configuration(annotation) => write!(f, "Configuration({annotation})"),
            TokenKind::Import(module) => write!(f, "Import({module})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectableTypeToken {
    pub name: String,
    pub access_level: AccessLevel,
}

impl Display for InjectableTypeToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterAnnotation {
    pub name: String,
    pub abstract_type: AbstractType,
    pub concrete_type: ConcreteType,
    pub arity: usize,
    pub access_level: AccessLevel,
}

impl Display for RegisterAnnotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {} <- {}", self.name, self.concrete_type, self.abstract_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceAnnotation {
    pub name: String,
    pub abstract_type: AbstractType,
    pub arity: usize,
    pub access_level: AccessLevel,
}

impl Display for ReferenceAnnotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <- {}", self.name, self.abstract_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterAnnotation {
    pub name: String,
    pub parameter_type: CompositeType,
    pub arity: usize,
    pub access_level: AccessLevel,
}

impl Display for ParameterAnnotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <= {}", self.name, self.parameter_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationAnnotationToken {
    pub target: ConfigurationTarget,
    pub attribute: ConfigurationAttribute,
}

impl Display for ConfigurationAnnotationToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.target, self.attribute)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexerErrorKind {
    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(#[from] TokenErrorKind),
}

pub type LexerError = SpannedError<LexerErrorKind>;

impl LexerErrorKind {
    pub fn at(self, span: Span, file: &SourceFile) -> LexerError {
        LexerError::new(self, span, file.path.clone())
    }
}

pub struct Lexer<'a> {
    file: &'a SourceFile,
}

impl<'a> Lexer<'a> {
    pub fn new(file: &'a SourceFile) -> Self {
        Lexer { file }
    }

    /// Produces the token stream for one compilation unit, ordered by byte
    /// offset.
    pub fn tokenize(&self, declarations: &[Declaration]) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();

        self.lex_imports(&mut tokens);
        self.lex_comment_configurations(&mut tokens)?;
        for declaration in declarations {
            self.lex_declaration(declaration, &mut tokens)?;
        }

        tokens.sort_by_key(|token| token.span.start.offset);
        Ok(tokens)
    }

    /// `import` statements are lifted verbatim from the raw text.
    fn lex_imports(&self, tokens: &mut Vec<Token>) {
        let mut offset = 0;
        for line in self.file.source.split_inclusive('\n') {
            let trimmed = line.trim_start();
            if let Some(rest) = trimmed.strip_prefix("import ") {
                let module = rest.trim().trim_end_matches(';').trim().to_string();
                if !module.is_empty() {
                    let at = offset + (line.len() - trimmed.len());
                    let span = self.file.span(at, trimmed.trim_end().len());
                    tokens.push(Token::new(TokenKind::Import(module), span));
                }
            }
            offset += line.len();
        }
    }

    /// Comment configuration lines (`// weaver: <target>.<name> = <value>`)
    /// become configuration tokens at their own position; the parser folds
    /// them into the enclosing type by document order.
    fn lex_comment_configurations(&self, tokens: &mut Vec<Token>) -> Result<(), LexerError> {
        let mut offset = 0;
        for line in self.file.source.split_inclusive('\n') {
            let trimmed = line.trim_start();
            if trimmed.starts_with("//") {
                let at = offset + (line.len() - trimmed.len());
                let span = self.file.span(at, trimmed.trim_end().len());
                match parse_comment_configuration(trimmed) {
                    Ok(Some((target, attribute))) => {
                        let target = if target == "self" {
                            ConfigurationTarget::Type
                        } else {
                            ConfigurationTarget::Dependency(target)
                        };
                        tokens.push(Token::new(
                            TokenKind::Configuration(ConfigurationAnnotationToken {
                                target,
                                attribute,
                            }),
                            span,
                        ));
                    }
                    Ok(None) => {}
                    Err(cause) => {
                        return Err(LexerErrorKind::InvalidAnnotation(cause).at(span, self.file));
                    }
                }
            }
            offset += line.len();
        }
        Ok(())
    }

    fn lex_declaration(
        &self,
        declaration: &Declaration,
        tokens: &mut Vec<Token>,
    ) -> Result<(), LexerError> {
        let kind = declaration.kind;
        if kind.is_injectable() || kind.is_any_declaration() {
            // Declarations without a braced body cannot hold wiring.
            if !declaration.has_body() {
                return Ok(());
            }
            let Some(name) = declaration.name.clone() else {
                return Ok(());
            };

            let header_len = declaration
                .body_offset
                .map(|body| body.saturating_sub(declaration.offset))
                .unwrap_or(declaration.length);
            let start_span = self.file.span(declaration.offset, header_len);
            let end_span = self
                .file
                .span((declaration.offset + declaration.length).saturating_sub(1), 1);

            let (start, end) = if kind.is_injectable() {
                let token = InjectableTypeToken {
                    name,
                    access_level: AccessLevel::parse(
                        declaration.accessibility.as_deref().unwrap_or(""),
                    ),
                };
                (
                    TokenKind::InjectableType(token),
                    TokenKind::EndOfInjectableType,
                )
            } else {
                (TokenKind::AnyDeclaration, TokenKind::EndOfAnyDeclaration)
            };

            tokens.push(Token::new(start, start_span));
            for child in &declaration.substructure {
                self.lex_declaration(child, tokens)?;
            }
            tokens.push(Token::new(end, end_span));
            return Ok(());
        }

        if kind == DeclarationKind::VarInstance {
            self.lex_variable(declaration, tokens)?;
        }
        Ok(())
    }

    /// Property-wrapper annotations on an instance variable become dependency
    /// tokens; every extra argument and the `objc` attribute become
    /// configuration tokens targeted at the variable's name.
    fn lex_variable(
        &self,
        declaration: &Declaration,
        tokens: &mut Vec<Token>,
    ) -> Result<(), LexerError> {
        let mut annotated = false;
        let mut objc_spans = Vec::new();

        for attribute in &declaration.attributes {
            let span = self.file.span(attribute.offset, attribute.length);
            match attribute.kind {
                AttributeKind::Objc => objc_spans.push(span),
                AttributeKind::Custom => {
                    let text = self
                        .file
                        .source
                        .get(attribute.offset..attribute.offset + attribute.length)
                        .unwrap_or("");
                    let parsed = match parse_annotation(text) {
                        Ok(Some(parsed)) => parsed,
                        Ok(None) => continue,
                        Err(cause) => {
                            return Err(
                                LexerErrorKind::InvalidAnnotation(cause).at(span, self.file)
                            );
                        }
                    };

                    let Some(name) = declaration.name.clone() else {
                        continue;
                    };
                    let declared_type = self.declared_type(declaration, text, span)?;
                    let access_level = AccessLevel::parse(
                        declaration.accessibility.as_deref().unwrap_or(""),
                    );

                    let kind = match parsed.kind {
                        DependencyKind::Registration => {
                            let concrete = parsed
                                .concrete_type
                                .clone()
                                .unwrap_or_else(|| ConcreteType(declared_type.clone()));
                            TokenKind::Register(RegisterAnnotation {
                                name: name.clone(),
                                abstract_type: AbstractType(declared_type),
                                concrete_type: concrete,
                                arity: parsed.arity,
                                access_level,
                            })
                        }
                        DependencyKind::Reference => {
                            TokenKind::Reference(ReferenceAnnotation {
                                name: name.clone(),
                                abstract_type: AbstractType(
                                    parsed
                                        .concrete_type
                                        .clone()
                                        .map(|c| c.0)
                                        .unwrap_or(declared_type),
                                ),
                                arity: parsed.arity,
                                access_level,
                            })
                        }
                        DependencyKind::Parameter => {
                            TokenKind::Parameter(ParameterAnnotation {
                                name: name.clone(),
                                parameter_type: parsed
                                    .concrete_type
                                    .clone()
                                    .map(|c| c.0)
                                    .unwrap_or(declared_type),
                                arity: parsed.arity,
                                access_level,
                            })
                        }
                    };
                    tokens.push(Token::new(kind, span));
                    annotated = true;

                    for attr in parsed.attributes {
                        tokens.push(Token::new(
                            TokenKind::Configuration(ConfigurationAnnotationToken {
                                target: ConfigurationTarget::Dependency(name.clone()),
                                attribute: attr,
                            }),
                            span,
                        ));
                    }
                }
                AttributeKind::Other => {}
            }
        }

        if annotated && let Some(name) = &declaration.name {
            for span in objc_spans {
                tokens.push(Token::new(
                    TokenKind::Configuration(ConfigurationAnnotationToken {
                        target: ConfigurationTarget::Dependency(name.clone()),
                        attribute: ConfigurationAttribute::Objc(true),
                    }),
                    span,
                ));
            }
        }
        Ok(())
    }

    /// The variable's declared type, parsed from the decoder's `typename`.
    fn declared_type(
        &self,
        declaration: &Declaration,
        annotation_text: &str,
        span: Span,
    ) -> Result<CompositeType, LexerError> {
        let Some(typename) = declaration.typename.as_deref() else {
            return Err(LexerErrorKind::InvalidAnnotation(
                TokenErrorKind::InvalidAnnotation(annotation_text.to_string()),
            )
            .at(span, self.file));
        };
        CompositeType::parse(typename).map_err(|_| {
            LexerErrorKind::InvalidAnnotation(TokenErrorKind::InvalidAnnotation(
                typename.to_string(),
            ))
            .at(span, self.file)
        })
    }
}

#[cfg(test)]
#[path = "../tests/t_lexer.rs"]
mod tests;
