//! Plain-text fallback adapter - degraded coverage for unknown file types.
//!
//! Emits zero definitions plus an `UnsupportedLanguage` diagnostic so the
//! pipeline records the gap without aborting. Structure-free by design: the
//! downstream embedding job can still chunk raw content on its side of the
//! boundary if it wants coverage for these files.

use crate::definition::DefKind;
use crate::language::Language;
use crate::unit::{Diagnostic, DiagnosticKind, ParseUnit};
use crate::Result;

use super::framework::{ExtractRequest, SyntaxAdapter};

/// Degraded adapter for files no grammar covers.
#[derive(Default)]
pub struct PlainTextAdapter;

impl PlainTextAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl SyntaxAdapter for PlainTextAdapter {
    fn language(&self) -> Language {
        Language::PlainText
    }

    fn display_name(&self) -> &'static str {
        "Plain text"
    }

    fn kind_map(&self) -> &'static [(&'static str, DefKind)] {
        &[]
    }

    fn extract(&self, req: &ExtractRequest<'_>) -> Result<ParseUnit> {
        let diagnostic = Diagnostic::new(
            DiagnosticKind::UnsupportedLanguage,
            format!("no syntax adapter for {}; handled as plain text", req.path),
        );
        Ok(ParseUnit::empty(
            req.path,
            Language::PlainText,
            req.content_hash,
            vec![diagnostic],
        ))
    }
}
