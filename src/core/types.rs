//! Host-language type expressions and the value model shared by the pipeline.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// A parsed host-language type expression. Equality is structural; rendering
/// is canonical and whitespace-insensitive on input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompositeType {
    Named {
        name: String,
        generics: Vec<CompositeType>,
    },
    Tuple(Vec<CompositeType>),
    Closure {
        params: Vec<CompositeType>,
        ret: Box<CompositeType>,
    },
    Optional(Box<CompositeType>),
}

impl CompositeType {
    pub fn named(name: impl Into<String>) -> Self {
        CompositeType::Named {
            name: name.into(),
            generics: Vec::new(),
        }
    }

    /// The head identifier of the type, if it has one. `Optional` unwraps to
    /// its inner type's name; tuples and closures have none.
    pub fn name(&self) -> Option<&str> {
        match self {
            CompositeType::Named { name, .. } => Some(name),
            CompositeType::Optional(inner) => inner.name(),
            _ => None,
        }
    }

    pub fn parse(input: &str) -> Result<Self, TypeParseError> {
        let mut cursor = TypeCursor::new(input);
        let ty = cursor.parse_type()?;
        cursor.skip_whitespace();
        if !cursor.at_end() {
            return Err(TypeParseError::TrailingInput(input.to_string()));
        }
        Ok(ty)
    }

    /// Canonical rendering. `parse(render(t)) == t` for all `t`.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl Display for CompositeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CompositeType::Named { name, generics } => {
                write!(f, "{name}")?;
                if !generics.is_empty() {
                    let inner = generics
                        .iter()
                        .map(|g| g.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    write!(f, "<{inner}>")?;
                }
                Ok(())
            }
            CompositeType::Tuple(components) => {
                let inner = components
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({inner})")
            }
            CompositeType::Closure { params, ret } => {
                let inner = params
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({inner}) -> {ret}")
            }
            CompositeType::Optional(inner) => write!(f, "Optional<{inner}>"),
        }
    }
}

impl FromStr for CompositeType {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompositeType::parse(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeParseError {
    #[error("Empty type expression")]
    Empty,

    #[error("Unbalanced brackets in type expression: {0}")]
    Unbalanced(String),

    #[error("Invalid type expression: {0}")]
    Invalid(String),

    #[error("Unexpected trailing input in type expression: {0}")]
    TrailingInput(String),
}

/// Char-cursor recursive descent over one type expression.
struct TypeCursor<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> TypeCursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn consume(&mut self, expected: char) -> Result<(), TypeParseError> {
        self.skip_whitespace();
        match self.advance() {
            Some(ch) if ch == expected => Ok(()),
            _ => Err(TypeParseError::Unbalanced(self.input.to_string())),
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_arrow(&mut self) -> bool {
        self.skip_whitespace();
        if self.peek() == Some('-') && self.chars.get(self.pos + 1) == Some(&'>') {
            self.pos += 2;
            true
        } else {
            false
        }
    }

    fn parse_type(&mut self) -> Result<CompositeType, TypeParseError> {
        self.skip_whitespace();
        let base = match self.peek() {
            None => return Err(TypeParseError::Empty),
            Some('(') => self.parse_parenthesized()?,
            Some(ch) if ch.is_alphanumeric() || ch == '_' => self.parse_named()?,
            Some(_) => return Err(TypeParseError::Invalid(self.input.to_string())),
        };
        Ok(self.wrap_optionals(base))
    }

    /// Trailing `?` marks, possibly stacked (`T??`).
    fn wrap_optionals(&mut self, mut ty: CompositeType) -> CompositeType {
        while self.eat('?') {
            ty = CompositeType::Optional(Box::new(ty));
        }
        ty
    }

    /// `( T, U, … )` as a tuple, `( params ) -> R` as a closure. A single
    /// parenthesized type without an arrow is the type itself.
    fn parse_parenthesized(&mut self) -> Result<CompositeType, TypeParseError> {
        self.consume('(')?;
        let mut components = Vec::new();
        self.skip_whitespace();
        if !self.eat(')') {
            loop {
                components.push(self.parse_type()?);
                if self.eat(',') {
                    continue;
                }
                self.consume(')')?;
                break;
            }
        }

        if self.eat_arrow() {
            let ret = self.parse_type()?;
            return Ok(CompositeType::Closure {
                params: components,
                ret: Box::new(ret),
            });
        }

        match components.len() {
            1 => Ok(components.into_iter().next().unwrap()),
            _ => Ok(CompositeType::Tuple(components)),
        }
    }

    /// `Name` or `Name<Generics>`; `Optional<T>` folds into the optional
    /// variant so that `T?` and `Optional<T>` compare equal.
    fn parse_named(&mut self) -> Result<CompositeType, TypeParseError> {
        let mut name = String::new();
        while let Some(ch) = self.peek()
            && (ch.is_alphanumeric() || ch == '_' || ch == '.')
        {
            name.push(ch);
            self.pos += 1;
        }
        if name.is_empty() {
            return Err(TypeParseError::Invalid(self.input.to_string()));
        }

        let mut generics = Vec::new();
        if self.eat('<') {
            loop {
                generics.push(self.parse_type()?);
                if self.eat(',') {
                    continue;
                }
                self.consume('>')?;
                break;
            }
        }

        if name == "Optional" && generics.len() == 1 {
            return Ok(CompositeType::Optional(Box::new(
                generics.into_iter().next().unwrap(),
            )));
        }

        Ok(CompositeType::Named { name, generics })
    }
}

/// The declared interface a dependency exposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbstractType(pub CompositeType);

/// The declared implementation behind a registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConcreteType(pub CompositeType);

impl AbstractType {
    pub fn parse(input: &str) -> Result<Self, TypeParseError> {
        CompositeType::parse(input).map(AbstractType)
    }
}

impl ConcreteType {
    pub fn parse(input: &str) -> Result<Self, TypeParseError> {
        CompositeType::parse(input).map(ConcreteType)
    }
}

impl Display for AbstractType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for ConcreteType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host-language access control, collapsed to the distinctions that matter
/// for wiring: exported, module-internal, or inherited from the enclosing
/// declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessLevel {
    Public,
    Internal,
    #[default]
    Default,
}

impl AccessLevel {
    /// Scans for the first access keyword in a declaration or accessibility
    /// string. `open` counts as public; `fileprivate`/`private` collapse to
    /// internal for wiring purposes.
    pub fn parse(input: &str) -> AccessLevel {
        const KEYWORDS: [(&str, AccessLevel); 5] = [
            ("public", AccessLevel::Public),
            ("open", AccessLevel::Public),
            ("internal", AccessLevel::Internal),
            ("fileprivate", AccessLevel::Internal),
            ("private", AccessLevel::Internal),
        ];
        KEYWORDS
            .iter()
            .filter_map(|(kw, level)| input.find(kw).map(|at| (at, *level)))
            .min_by_key(|(at, _)| *at)
            .map(|(_, level)| level)
            .unwrap_or(AccessLevel::Default)
    }

    /// Resolves `Default` against the enclosing declaration's level.
    pub fn resolved(self, enclosing: AccessLevel) -> AccessLevel {
        match self {
            AccessLevel::Default => match enclosing {
                AccessLevel::Default => AccessLevel::Internal,
                other => other,
            },
            other => other,
        }
    }

    /// `public` exceeds `internal`; nothing else orders.
    pub fn exceeds(self, other: AccessLevel) -> bool {
        self == AccessLevel::Public && other != AccessLevel::Public
    }
}

impl Display for AccessLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AccessLevel::Public => "public",
            AccessLevel::Internal => "internal",
            AccessLevel::Default => "internal",
        };
        write!(f, "{s}")
    }
}

/// Instance reuse rule for a registration. Runtime semantics live in
/// `core::runtime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// New instance per resolve.
    Transient,
    /// One instance per outermost resolve invocation.
    #[default]
    Graph,
    /// One instance per container.
    Container,
    /// Container-lived, released once no strong holder remains.
    Weak,
    /// Container-lived, built on first resolve.
    Lazy,
}

impl Scope {
    /// Parses `.graph`, `graph`, etc. The leading dot of the host-language
    /// enum case is accepted and stripped.
    pub fn parse(input: &str) -> Option<Scope> {
        let name = input.trim().trim_start_matches('.');
        match name {
            "transient" => Some(Scope::Transient),
            "graph" => Some(Scope::Graph),
            "container" => Some(Scope::Container),
            "weak" => Some(Scope::Weak),
            "lazy" => Some(Scope::Lazy),
            _ => None,
        }
    }

    /// Whether instances of this scope live as long as the container.
    pub fn is_container_lived(self) -> bool {
        matches!(self, Scope::Container | Scope::Weak | Scope::Lazy)
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Scope::Transient => "transient",
            Scope::Graph => "graph",
            Scope::Container => "container",
            Scope::Weak => "weak",
            Scope::Lazy => "lazy",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
#[path = "../tests/t_types.rs"]
mod tests;
