//! Contract of the structural source decoder.
//!
//! The decoder is an external collaborator: it parses host-language source
//! and hands back a tree of declaration dictionaries keyed by a fixed schema
//! (`kind`, `name`, `typename`, `offset`, `length`, `accessibility`,
//! `attributes`, `substructure`, `bodyOffset`). This module only models that
//! schema; the lexer consumes it together with the raw source text.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclarationKind {
    #[serde(rename = "class")]
    Class,
    #[serde(rename = "struct")]
    Struct,
    #[serde(rename = "enum")]
    Enum,
    #[serde(rename = "extension")]
    Extension,
    #[serde(rename = "var.instance")]
    VarInstance,
    #[serde(rename = "argument")]
    Argument,
    #[serde(other)]
    Other,
}

impl DeclarationKind {
    /// Class and struct declarations can carry wiring; enums and extensions
    /// are opaque regions the parser balances over.
    pub fn is_injectable(self) -> bool {
        matches!(self, DeclarationKind::Class | DeclarationKind::Struct)
    }

    pub fn is_any_declaration(self) -> bool {
        matches!(self, DeclarationKind::Enum | DeclarationKind::Extension)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeKind {
    /// A property-wrapper custom attribute (`@Weaver(...)`).
    #[serde(rename = "custom")]
    Custom,
    #[serde(rename = "objc")]
    Objc,
    #[serde(other)]
    Other,
}

/// An attribute record: the kind plus the byte range of its text in the raw
/// source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub kind: AttributeKind,
    pub offset: usize,
    pub length: usize,
}

/// One declaration dictionary as delivered by the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub kind: DeclarationKind,

    #[serde(default)]
    pub name: Option<String>,

    /// Declared type of a variable declaration, verbatim.
    #[serde(default)]
    pub typename: Option<String>,

    pub offset: usize,
    pub length: usize,

    /// Raw accessibility string (e.g. `source.lang.swift.accessibility.public`).
    #[serde(default)]
    pub accessibility: Option<String>,

    #[serde(default)]
    pub attributes: Vec<AttributeRecord>,

    #[serde(default)]
    pub substructure: Vec<Declaration>,

    #[serde(default, rename = "bodyOffset")]
    pub body_offset: Option<usize>,
}

impl Declaration {
    /// Whether the declaration has a braced body. `End…` tokens are only
    /// emitted for declarations that do.
    pub fn has_body(&self) -> bool {
        self.body_offset.is_some()
    }
}
