//! Definition identity - stable across re-parses and incremental edits.
//!
//! An ID is derived from what a declaration *is* (language, file, kind,
//! qualified name), never from where it happens to sit in the file. Inserting
//! a line above a method must not change the method's ID, or incremental
//! diffing downstream sees phantom churn.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::definition::DefKind;
use crate::language::Language;

/// Stable identifier for a [`Definition`](crate::definition::Definition).
///
/// Hex of the first 16 bytes of a blake3 hash over
/// `(language, path, kind, qualified name, ordinal)`. The ordinal
/// disambiguates same-kind same-name siblings (overloads, re-declarations)
/// in declaration order, so identical content always reproduces identical
/// IDs while distinct declarations never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefId(String);

impl DefId {
    /// Derive the ID for a declaration.
    pub fn derive(
        language: Language,
        path: &str,
        kind: DefKind,
        qualified_name: &str,
        ordinal: u32,
    ) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(language.as_str().as_bytes());
        hasher.update(b"\0");
        hasher.update(path.as_bytes());
        hasher.update(b"\0");
        hasher.update(kind.as_str().as_bytes());
        hasher.update(b"\0");
        hasher.update(qualified_name.as_bytes());
        hasher.update(b"\0");
        hasher.update(&ordinal.to_le_bytes());

        let hash = hasher.finalize();
        let hex = hash.to_hex();
        DefId(hex.as_str()[..32].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
