//! Syntax analyzer - tree-sitter wrapper with error recovery.
//!
//! Produces a concrete syntax tree plus diagnostics. Tree-sitter's own
//! recovery turns malformed constructs into ERROR/MISSING nodes and resumes
//! at the next recognizable boundary, so one broken construct near the top of
//! a file never suppresses what follows it; the analyzer surfaces each error
//! node as a `SyntaxError` diagnostic and extractors skip those subtrees.

use std::time::Duration;

use tree_sitter::{Node, Parser, Tree};

use crate::definition::Span;
use crate::language::Language;
use crate::unit::{Diagnostic, DiagnosticKind};
use crate::{Error, Result};

/// Upper bound on syntax diagnostics per file; a pathological file should not
/// drown the summary.
const MAX_SYNTAX_DIAGNOSTICS: usize = 64;

/// Result of analyzing one file: a (possibly partial) tree plus diagnostics.
pub struct Analysis {
    pub tree: Tree,
    pub diagnostics: Vec<Diagnostic>,
}

/// Look up the tree-sitter grammar for a language.
pub fn grammar(language: Language) -> Result<tree_sitter::Language> {
    let lang: tree_sitter::Language = match language {
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        Language::Rust => tree_sitter_rust::LANGUAGE.into(),
        Language::Go => tree_sitter_go::LANGUAGE.into(),
        Language::PlainText => {
            return Err(Error::UnsupportedLanguage("plaintext has no grammar".to_string()));
        }
    };
    Ok(lang)
}

/// Parse `source` as `language`.
///
/// Returns `Ok(None)` when the per-file deadline expires mid-parse; the
/// caller turns that into a `Timeout` diagnostic and releases the worker.
pub fn parse(language: Language, source: &str, timeout: Option<Duration>) -> Result<Option<Analysis>> {
    let grammar = grammar(language)?;

    let mut parser = Parser::new();
    parser
        .set_language(&grammar)
        .map_err(|e| Error::Grammar(format!("{}: {}", language, e)))?;
    if let Some(t) = timeout {
        #[allow(deprecated)]
        parser.set_timeout_micros(t.as_micros() as u64);
    }

    let tree = match parser.parse(source, None) {
        Some(tree) => tree,
        None => return Ok(None),
    };

    let diagnostics = collect_error_nodes(tree.root_node(), source);
    Ok(Some(Analysis { tree, diagnostics }))
}

/// Walk the tree collecting ERROR and MISSING nodes as diagnostics.
fn collect_error_nodes(root: Node, source: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if !root.has_error() {
        return diagnostics;
    }
    visit_errors(root, source, &mut diagnostics);
    diagnostics
}

fn visit_errors(node: Node, source: &str, out: &mut Vec<Diagnostic>) {
    if out.len() >= MAX_SYNTAX_DIAGNOSTICS {
        return;
    }
    if node.is_error() {
        let snippet = node
            .utf8_text(source.as_bytes())
            .unwrap_or("")
            .chars()
            .take(40)
            .collect::<String>();
        out.push(
            Diagnostic::new(
                DiagnosticKind::SyntaxError,
                format!("unrecognized construct near `{}`", snippet.trim()),
            )
            .with_span(node_span(&node)),
        );
        // Children of an ERROR node are noise; recovery resumes at its sibling.
        return;
    }
    if node.is_missing() {
        out.push(
            Diagnostic::new(DiagnosticKind::SyntaxError, format!("missing `{}`", node.kind()))
                .with_span(node_span(&node)),
        );
        return;
    }
    if !node.has_error() {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit_errors(child, source, out);
    }
}

/// Span of a tree-sitter node in our 1-based-line, 0-based-column convention.
pub fn node_span(node: &Node) -> Span {
    let start = node.start_position();
    let end = node.end_position();
    Span::new(
        start.row as u32 + 1,
        start.column as u32,
        end.row as u32 + 1,
        end.column as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_parse_has_no_diagnostics() {
        let analysis = parse(Language::Python, "def hello():\n    pass\n", None)
            .unwrap()
            .unwrap();
        assert!(analysis.diagnostics.is_empty());
        assert_eq!(analysis.tree.root_node().kind(), "module");
    }

    #[test]
    fn test_error_recovery_yields_partial_tree() {
        let source = "def broken(:\n\ndef fine():\n    pass\n";
        let analysis = parse(Language::Python, source, None).unwrap().unwrap();
        assert!(!analysis.diagnostics.is_empty());
        assert!(analysis.diagnostics.iter().all(|d| d.kind == DiagnosticKind::SyntaxError));
        // The tree still exists and contains the valid function after the error.
        let rendered = analysis.tree.root_node().to_sexp();
        assert!(rendered.contains("function_definition"));
    }

    #[test]
    fn test_syntax_diagnostics_carry_spans() {
        let source = "???;\n\nenum Color { Red, Green }\n";
        let analysis = parse(Language::Rust, source, None).unwrap().unwrap();
        let syntax: Vec<_> = analysis
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::SyntaxError)
            .collect();
        assert!(!syntax.is_empty());
        for d in syntax {
            let span = d.span.expect("syntax diagnostics carry spans");
            assert!(span.start_line >= 1);
            assert!(span.end_line < 3, "error span must not cover the valid enum");
        }
    }

    #[test]
    fn test_plaintext_has_no_grammar() {
        assert!(grammar(Language::PlainText).is_err());
    }
}
