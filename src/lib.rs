//! # Cartograph - Structural code graph extraction
//!
//! Language-agnostic structural extraction for code-search pipelines.
//!
//! Cartograph provides:
//! - A normalized Definition record covering many surface syntaxes
//! - A language-agnostic structure graph (containment, inheritance, references)
//! - Tree-sitter based parsing with pluggable language adapters and error recovery
//! - Scope-stack name resolution within a file, dangling placeholders across files
//! - A concurrent job orchestrator merging per-file results into one code graph
//!
//! Workspace discovery, embedding computation and graph persistence are the
//! caller's concern; this crate takes `(path, language, bytes)` tuples in and
//! hands a queryable, serializable [`CodeGraph`] back.

pub mod adapter;
pub mod analyzer;
pub mod definition;
pub mod edge;
pub mod graph;
pub mod ident;
pub mod language;
pub mod orchestrator;
pub mod output;
pub mod scope;
pub mod unit;

// Re-exports for convenient access
pub use definition::{DefKind, Definition, Modifiers, Signature, Visibility};
pub use edge::{EdgeKind, EdgeTarget, StructureEdge};
pub use graph::CodeGraph;
pub use ident::DefId;
pub use language::Language;
pub use orchestrator::{CancelFlag, Orchestrator, SourceFile};
pub use unit::{Diagnostic, DiagnosticKind, ParseUnit};

/// Result type alias for Cartograph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Cartograph operations.
///
/// File-local conditions (syntax errors, unknown languages, encoding problems,
/// timeouts) are *diagnostics* on the [`ParseUnit`], not errors; only
/// conditions that prevent a component from operating at all surface here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No adapter registered for {0} and no fallback configured")]
    UnsupportedLanguage(String),

    #[error("Grammar error: {0}")]
    Grammar(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Worker pool failure: {0}")]
    WorkerPool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Status of a file relative to the graph it is being merged into
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    New,
    Modified,
    Unchanged,
}
