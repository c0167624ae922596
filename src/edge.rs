//! Structure edges - typed relationships between definitions.
//!
//! Five edge kinds cover every structural relationship:
//! - `Contains`: container → member (from AST nesting)
//! - `Inherits`: type → base type
//! - `Implements`: type → interface/trait
//! - `References`: identifier use → definition
//! - `Overrides`: method → overridden base method
//!
//! An edge target is either a resolved [`DefId`] or a dangling name-only
//! placeholder kept for an external cross-file linking pass.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ident::DefId;

/// Kinds of structural relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Contains,
    Inherits,
    Implements,
    References,
    Overrides,
}

impl EdgeKind {
    /// Get the string representation of the edge kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "contains",
            EdgeKind::Inherits => "inherits",
            EdgeKind::Implements => "implements",
            EdgeKind::References => "references",
            EdgeKind::Overrides => "overrides",
        }
    }

    /// Get all edge kinds
    pub fn all() -> &'static [EdgeKind] {
        &[
            EdgeKind::Contains,
            EdgeKind::Inherits,
            EdgeKind::Implements,
            EdgeKind::References,
            EdgeKind::Overrides,
        ]
    }

    /// Edge kinds that tie a type to its supertypes
    pub fn is_hierarchy(&self) -> bool {
        matches!(self, EdgeKind::Inherits | EdgeKind::Implements)
    }
}

impl FromStr for EdgeKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contains" | "contain" => Ok(EdgeKind::Contains),
            "inherits" | "inherit" | "extends" => Ok(EdgeKind::Inherits),
            "implements" | "implement" => Ok(EdgeKind::Implements),
            "references" | "reference" | "ref" => Ok(EdgeKind::References),
            "overrides" | "override" => Ok(EdgeKind::Overrides),
            _ => Err(crate::Error::Parse(format!("Unknown edge kind: {}", s))),
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target of an edge: resolved within the file, or a dangling placeholder
/// awaiting external cross-file resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeTarget {
    Resolved(DefId),
    Dangling(String),
}

impl EdgeTarget {
    /// The resolved ID, if any
    pub fn def_id(&self) -> Option<&DefId> {
        match self {
            EdgeTarget::Resolved(id) => Some(id),
            EdgeTarget::Dangling(_) => None,
        }
    }

    /// The unresolved name, if any
    pub fn dangling_name(&self) -> Option<&str> {
        match self {
            EdgeTarget::Resolved(_) => None,
            EdgeTarget::Dangling(name) => Some(name),
        }
    }

    pub fn is_dangling(&self) -> bool {
        matches!(self, EdgeTarget::Dangling(_))
    }
}

/// A typed relationship between two definitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructureEdge {
    pub from: DefId,
    pub to: EdgeTarget,
    pub kind: EdgeKind,
}

impl StructureEdge {
    /// Create an edge with a resolved target
    pub fn resolved(from: DefId, to: DefId, kind: EdgeKind) -> Self {
        Self { from, to: EdgeTarget::Resolved(to), kind }
    }

    /// Create an edge with a dangling name-only target
    pub fn dangling(from: DefId, name: impl Into<String>, kind: EdgeKind) -> Self {
        Self { from, to: EdgeTarget::Dangling(name.into()), kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::DefKind;
    use crate::language::Language;

    fn sample_id(name: &str) -> DefId {
        DefId::derive(Language::Python, "test.py", DefKind::Function, name, 0)
    }

    #[test]
    fn test_edge_kind_roundtrip() {
        for kind in EdgeKind::all() {
            let parsed: EdgeKind = kind.as_str().parse().unwrap();
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn test_resolved_edge() {
        let edge = StructureEdge::resolved(sample_id("a"), sample_id("b"), EdgeKind::References);
        assert!(!edge.to.is_dangling());
        assert_eq!(edge.to.def_id(), Some(&sample_id("b")));
        assert_eq!(edge.to.dangling_name(), None);
    }

    #[test]
    fn test_dangling_edge() {
        let edge = StructureEdge::dangling(sample_id("a"), "ExternalBase", EdgeKind::Inherits);
        assert!(edge.to.is_dangling());
        assert_eq!(edge.to.dangling_name(), Some("ExternalBase"));
        assert_eq!(edge.to.def_id(), None);
    }

    #[test]
    fn test_hierarchy_predicate() {
        assert!(EdgeKind::Inherits.is_hierarchy());
        assert!(EdgeKind::Implements.is_hierarchy());
        assert!(!EdgeKind::Contains.is_hierarchy());
        assert!(!EdgeKind::References.is_hierarchy());
    }
}
