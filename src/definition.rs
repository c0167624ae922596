//! Definition types - the normalized record every language maps into.
//!
//! Surface syntaxes differ wildly (traits, mixins, delegates, data classes,
//! companion objects, extension functions); all of them land on one closed
//! [`DefKind`] enumeration plus boolean [`Modifiers`]. Adapters must pick from
//! this set and never invent kinds ad hoc.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ident::DefId;
use crate::language::Language;
use crate::{Error, Result};

/// Closed set of definition kinds.
///
/// Per-language mapping tables (see each adapter's `KIND_MAP`) translate
/// grammar node kinds into these. `Trait` also covers mixins and Ruby-style
/// modules; `Namespace` covers packages, namespaces and the per-file module
/// root; `Synthetic` marks definitions the extractor invented (e.g. for
/// dynamically attached members) rather than read from a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefKind {
    Class,
    Interface,
    Enum,
    Struct,
    Trait,
    Function,
    Method,
    Property,
    Field,
    Namespace,
    Variable,
    Synthetic,
}

impl DefKind {
    /// Get the string representation of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            DefKind::Class => "class",
            DefKind::Interface => "interface",
            DefKind::Enum => "enum",
            DefKind::Struct => "struct",
            DefKind::Trait => "trait",
            DefKind::Function => "function",
            DefKind::Method => "method",
            DefKind::Property => "property",
            DefKind::Field => "field",
            DefKind::Namespace => "namespace",
            DefKind::Variable => "variable",
            DefKind::Synthetic => "synthetic",
        }
    }

    /// Get all definition kinds
    pub fn all() -> &'static [DefKind] {
        &[
            DefKind::Class,
            DefKind::Interface,
            DefKind::Enum,
            DefKind::Struct,
            DefKind::Trait,
            DefKind::Function,
            DefKind::Method,
            DefKind::Property,
            DefKind::Field,
            DefKind::Namespace,
            DefKind::Variable,
            DefKind::Synthetic,
        ]
    }

    /// Kinds that can contain member definitions
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            DefKind::Class
                | DefKind::Interface
                | DefKind::Enum
                | DefKind::Struct
                | DefKind::Trait
                | DefKind::Namespace
        )
    }

    /// Kinds representing executable code
    pub fn is_callable(&self) -> bool {
        matches!(self, DefKind::Function | DefKind::Method)
    }
}

impl FromStr for DefKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "class" => Ok(DefKind::Class),
            "interface" => Ok(DefKind::Interface),
            "enum" => Ok(DefKind::Enum),
            "struct" => Ok(DefKind::Struct),
            "trait" | "mixin" | "module" => Ok(DefKind::Trait),
            "function" | "fn" | "def" => Ok(DefKind::Function),
            "method" => Ok(DefKind::Method),
            "property" => Ok(DefKind::Property),
            "field" => Ok(DefKind::Field),
            "namespace" | "package" => Ok(DefKind::Namespace),
            "variable" | "var" | "const" | "let" => Ok(DefKind::Variable),
            "synthetic" => Ok(DefKind::Synthetic),
            _ => Err(Error::Parse(format!("Unknown definition kind: {}", s))),
        }
    }
}

impl std::fmt::Display for DefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Visibility levels for definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// Structural modifier flags.
///
/// Generators, coroutines and async functions are represented purely
/// structurally through these flags; no control-flow semantics are modeled.
/// `value_semantics` marks data-class-like declarations, `singleton` marks
/// object/companion declarations, `synthesized` marks definitions inferred
/// from dynamic attachment rather than a declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    #[serde(rename = "override")]
    pub is_override: bool,
    #[serde(rename = "readonly")]
    pub is_readonly: bool,
    #[serde(rename = "async")]
    pub is_async: bool,
    #[serde(rename = "generator")]
    pub is_generator: bool,
    pub value_semantics: bool,
    pub singleton: bool,
    pub synthesized: bool,
}

/// One parameter in a signature. Types are opaque text, never resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), type_hint: None }
    }

    pub fn typed(name: impl Into<String>, type_hint: impl Into<String>) -> Self {
        Self { name: name.into(), type_hint: Some(type_hint.into()) }
    }
}

/// Callable signature: ordered parameters, optional return type, opaque
/// generic parameter names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Param>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub type_params: Vec<String>,
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match &p.type_hint {
                Some(t) => write!(f, "{}: {}", p.name, t)?,
                None => write!(f, "{}", p.name)?,
            }
        }
        write!(f, ")")?;
        if let Some(ret) = &self.return_type {
            write!(f, " -> {}", ret)?;
        }
        Ok(())
    }
}

/// A decorator/annotation attached to a definition: captured as ordered
/// metadata, never executed or type-checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decorator {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub arguments: Vec<String>,
}

/// Source span of a definition. Lines are 1-indexed, columns 0-indexed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self { start_line, start_col, end_line, end_col }
    }
}

/// A normalized definition extracted from source.
///
/// Every named (or synthetic) declaration becomes one of these, whatever the
/// language. The `container` field mirrors the Contains edge, so the
/// containment forest can be reconstructed from definitions alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    /// Stable identifier, derived from qualified name (see [`DefId`])
    pub id: DefId,
    /// The normalized kind
    pub kind: DefKind,
    /// Name as it appears in code, or a `scope#N` synthetic name
    pub name: String,
    /// Dot-joined path from the file's module root, e.g. `auth.Token.validate`
    pub qualified_name: String,
    /// Language the definition was extracted from
    pub language: Language,
    /// File path relative to the workspace root
    pub path: String,
    /// Source span
    pub span: Span,
    /// Visibility, when the grammar expresses one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    /// Structural modifier flags
    pub modifiers: Modifiers,
    /// Signature, for callables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    /// Doc comment immediately preceding the declaration, verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_comment: Option<String>,
    /// Decorators/annotations in source order
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub decorators: Vec<Decorator>,
    /// ID of the containing definition; `None` only for the module root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<DefId>,
    /// Whether the definition is part of the file's exported surface
    pub exported: bool,
}

impl Definition {
    /// Short one-line description for logs and debugging
    pub fn short_description(&self) -> String {
        match &self.signature {
            Some(sig) => format!("{} {}{}", self.kind, self.qualified_name, sig),
            None => format!("{} {}", self.kind, self.qualified_name),
        }
    }
}

impl PartialEq for Definition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Definition {}

impl std::hash::Hash for Definition {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
