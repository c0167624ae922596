//! Language identification for incoming files.
//!
//! Callers usually hand us a language tag along with the file content; when
//! they do not, detection runs extension first, then shebang, then a cheap
//! content sniff. Unknown files are not an error - the adapter registry
//! degrades them to plain-text handling.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A language this crate can attach a syntax adapter to.
///
/// Plain enum (not trait objects) so it is cheap to copy and pattern-matched
/// at dispatch boundaries. `PlainText` is the degraded fallback tag for files
/// no grammar covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Rust,
    Go,
    PlainText,
}

impl Language {
    /// Stable lowercase name, used in Definition IDs and serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::PlainText => "plaintext",
        }
    }

    /// Map a file extension to a language.
    pub fn from_extension(ext: &str) -> Option<Language> {
        match ext {
            "py" | "pyi" => Some(Language::Python),
            "js" | "mjs" | "cjs" | "jsx" => Some(Language::JavaScript),
            "ts" | "mts" | "cts" => Some(Language::TypeScript),
            "tsx" => Some(Language::Tsx),
            "rs" => Some(Language::Rust),
            "go" => Some(Language::Go),
            _ => None,
        }
    }

    /// Parse a loose language tag, case-insensitive.
    pub fn from_tag(s: &str) -> Option<Language> {
        match s.to_lowercase().as_str() {
            "python" | "py" => Some(Language::Python),
            "javascript" | "js" => Some(Language::JavaScript),
            "typescript" | "ts" => Some(Language::TypeScript),
            "tsx" => Some(Language::Tsx),
            "rust" | "rs" => Some(Language::Rust),
            "go" | "golang" => Some(Language::Go),
            "text" | "plaintext" => Some(Language::PlainText),
            _ => None,
        }
    }

    /// Detect the language of a file from its path and content.
    ///
    /// Extension wins; a shebang line breaks ties for extensionless scripts.
    pub fn detect(path: &str, content: &str) -> Option<Language> {
        if let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) {
            if let Some(lang) = Language::from_extension(ext) {
                return Some(lang);
            }
        }
        from_shebang(content)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sniff the interpreter out of a `#!` first line.
fn from_shebang(content: &str) -> Option<Language> {
    static SHEBANG: OnceLock<Regex> = OnceLock::new();
    let re = SHEBANG
        .get_or_init(|| Regex::new(r"^#!\s*\S*?(?:/|\benv\s+)(python|node|deno)[\d.]*\b").unwrap());

    let first_line = content.lines().next()?;
    let caps = re.captures(first_line)?;
    match caps.get(1)?.as_str() {
        "python" => Some(Language::Python),
        "node" | "deno" => Some(Language::JavaScript),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_detection() {
        assert_eq!(Language::detect("src/auth.py", ""), Some(Language::Python));
        assert_eq!(Language::detect("lib/db.ts", ""), Some(Language::TypeScript));
        assert_eq!(Language::detect("app/view.tsx", ""), Some(Language::Tsx));
        assert_eq!(Language::detect("main.rs", ""), Some(Language::Rust));
        assert_eq!(Language::detect("pkg/util.go", ""), Some(Language::Go));
        assert_eq!(Language::detect("README.md", ""), None);
    }

    #[test]
    fn test_shebang_detection() {
        assert_eq!(
            Language::detect("scripts/deploy", "#!/usr/bin/env python3\nimport os\n"),
            Some(Language::Python)
        );
        assert_eq!(
            Language::detect("bin/run", "#!/usr/bin/node\nconsole.log(1)\n"),
            Some(Language::JavaScript)
        );
        assert_eq!(Language::detect("Makefile", "all:\n\techo hi\n"), None);
    }

    #[test]
    fn test_tag_roundtrip() {
        for lang in [
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::Tsx,
            Language::Rust,
            Language::Go,
        ] {
            assert_eq!(Language::from_tag(lang.as_str()), Some(lang));
        }
    }
}
