//! Core adapter framework
//!
//! Defines the trait all language adapters implement and the registry that
//! dispatches files to them.

use std::collections::HashMap;
use std::time::Duration;

use crate::definition::DefKind;
use crate::language::Language;
use crate::unit::{Diagnostic, DiagnosticKind, ParseUnit};
use crate::{Error, Result};

/// One file handed to an adapter for extraction.
///
/// Content arrives already decoded; encoding failures are handled upstream by
/// the orchestrator before an adapter ever runs.
#[derive(Debug)]
pub struct ExtractRequest<'a> {
    /// File path relative to the workspace root
    pub path: &'a str,
    /// Decoded file content
    pub source: &'a str,
    /// blake3 hex of the raw bytes
    pub content_hash: &'a str,
    /// Per-file parse deadline, if any
    pub timeout: Option<Duration>,
}

/// Trait for language adapters.
///
/// An adapter owns the full per-language pipeline: invoking the grammar,
/// walking the (possibly partial) tree, and emitting a [`ParseUnit`]. The
/// kind table is exposed so the mapping from grammar constructs to the closed
/// [`DefKind`] set stays explicit and reviewable.
pub trait SyntaxAdapter: Send + Sync {
    /// Language this adapter handles
    fn language(&self) -> Language;

    /// Human-readable name for logs
    fn display_name(&self) -> &'static str;

    /// Explicit grammar-node-kind to definition-kind table
    fn kind_map(&self) -> &'static [(&'static str, DefKind)];

    /// Extract a parse unit from one file
    fn extract(&self, req: &ExtractRequest<'_>) -> Result<ParseUnit>;
}

/// Registry of language adapters with an optional degraded fallback.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Language, Box<dyn SyntaxAdapter>>,
    fallback: Option<Box<dyn SyntaxAdapter>>,
}

impl AdapterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own language tag
    pub fn register(&mut self, adapter: impl SyntaxAdapter + 'static) {
        self.adapters.insert(adapter.language(), Box::new(adapter));
    }

    /// Install the degraded adapter used when no language matches
    pub fn set_fallback(&mut self, adapter: impl SyntaxAdapter + 'static) {
        self.fallback = Some(Box::new(adapter));
    }

    /// Look up the adapter for a language.
    ///
    /// Falls back to the degraded adapter when the language has no dedicated
    /// one; errors only when no fallback is configured either.
    pub fn lookup(&self, language: Language) -> Result<&dyn SyntaxAdapter> {
        if let Some(adapter) = self.adapters.get(&language) {
            return Ok(adapter.as_ref());
        }
        self.fallback
            .as_deref()
            .ok_or_else(|| Error::UnsupportedLanguage(language.to_string()))
    }

    /// Languages with a dedicated adapter
    pub fn supported(&self) -> impl Iterator<Item = Language> + '_ {
        self.adapters.keys().copied()
    }
}

/// Unit for a file whose parse deadline expired: no definitions, a `Timeout`
/// diagnostic, worker released.
pub(crate) fn timeout_unit(language: Language, req: &ExtractRequest<'_>) -> ParseUnit {
    ParseUnit::empty(
        req.path,
        language,
        req.content_hash,
        vec![Diagnostic::new(
            DiagnosticKind::Timeout,
            format!("parse deadline exceeded for {}", req.path),
        )],
    )
}

/// Create a registry with all built-in adapters and the plain-text fallback.
pub fn default_registry() -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    registry.register(super::python::PythonAdapter::new());
    registry.register(super::javascript::JavaScriptAdapter::new());
    registry.register(super::typescript::TypeScriptAdapter::new());
    registry.register(super::typescript::TypeScriptAdapter::tsx());
    registry.register(super::rust::RustAdapter::new());
    registry.register(super::go::GoAdapter::new());
    registry.set_fallback(super::plain::PlainTextAdapter::new());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestAdapter;

    impl SyntaxAdapter for TestAdapter {
        fn language(&self) -> Language {
            Language::Go
        }
        fn display_name(&self) -> &'static str {
            "test-go"
        }
        fn kind_map(&self) -> &'static [(&'static str, DefKind)] {
            &[]
        }
        fn extract(&self, req: &ExtractRequest<'_>) -> Result<ParseUnit> {
            Ok(ParseUnit::empty(req.path, Language::Go, req.content_hash, vec![]))
        }
    }

    #[test]
    fn test_lookup_dispatch() {
        let mut registry = AdapterRegistry::new();
        registry.register(TestAdapter);

        assert!(registry.lookup(Language::Go).is_ok());
        assert!(matches!(
            registry.lookup(Language::Python),
            Err(Error::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn test_fallback_catches_unknown() {
        let registry = default_registry();
        let adapter = registry.lookup(Language::PlainText).unwrap();
        assert_eq!(adapter.language(), Language::PlainText);
    }

    #[test]
    fn test_default_registry_covers_grammars() {
        let registry = default_registry();
        for lang in [
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::Tsx,
            Language::Rust,
            Language::Go,
        ] {
            let adapter = registry.lookup(lang).unwrap();
            assert_eq!(adapter.language(), lang);
        }
    }
}
