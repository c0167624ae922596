//! Language adapter framework.
//!
//! Each language provides a tree-sitter grammar and a walker that maps AST
//! nodes to normalized definitions through an explicit kind table. The core
//! engine never sees language-specific logic.
//!
//! Files without a language adapter fall through to the plain-text adapter,
//! which emits zero definitions plus a diagnostic - the pipeline never aborts
//! on an unknown file type.

pub mod framework;
pub mod go;
pub mod javascript;
pub mod plain;
pub mod python;
pub mod rust;
pub mod typescript;
pub mod walker;

pub use framework::{AdapterRegistry, ExtractRequest, SyntaxAdapter, default_registry};
pub use plain::PlainTextAdapter;
pub use walker::Extraction;
