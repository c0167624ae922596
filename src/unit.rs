//! ParseUnit - the extraction result for one file.
//!
//! Units are immutable once produced: a worker builds one, hands it to the
//! orchestrator, and re-submission of changed content replaces the stored
//! unit wholesale rather than patching it.

use serde::{Deserialize, Serialize};

use crate::definition::{Definition, Span};
use crate::edge::StructureEdge;
use crate::language::Language;

/// File-local problem kinds. All of these are non-fatal: they are recorded on
/// the unit and surfaced in the job summary, never aborting the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Malformed construct; extraction continued past it
    SyntaxError,
    /// No adapter for the language; degraded plain-text handling
    UnsupportedLanguage,
    /// Content is not valid UTF-8; file skipped
    EncodingError,
    /// Per-file deadline exceeded; file skipped
    Timeout,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::SyntaxError => "syntax_error",
            DiagnosticKind::UnsupportedLanguage => "unsupported_language",
            DiagnosticKind::EncodingError => "encoding_error",
            DiagnosticKind::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One file-local diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Offending span, when one can be pinned down
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), span: None }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.span {
            Some(s) => write!(f, "{}: {} ({}:{}-{}:{})", self.kind, self.message, s.start_line, s.start_col, s.end_line, s.end_col),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Per-file extraction result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseUnit {
    /// File path relative to the workspace root
    pub path: String,
    /// Language the file was handled as
    pub language: Language,
    /// blake3 hex of the raw content, for idempotent re-submission
    pub content_hash: String,
    /// Extracted definitions, in declaration order
    pub definitions: Vec<Definition>,
    /// Structure edges, containment first
    pub edges: Vec<StructureEdge>,
    /// File-local diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseUnit {
    /// An empty unit carrying only diagnostics (skipped or degraded files).
    pub fn empty(
        path: impl Into<String>,
        language: Language,
        content_hash: impl Into<String>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            path: path.into(),
            language,
            content_hash: content_hash.into(),
            definitions: Vec::new(),
            edges: Vec::new(),
            diagnostics,
        }
    }

    /// Whether any diagnostic of the given kind is present.
    pub fn has_diagnostic(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }
}

/// blake3 hex digest of raw file content.
pub fn content_hash(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}
