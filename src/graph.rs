//! Code graph - the accumulated extraction result across files.
//!
//! Keyed entirely by file path: a ParseUnit replaces its predecessor
//! wholesale, so the graph's content is a pure function of the set of stored
//! units and never depends on the order workers finished in. Units are kept
//! in a sorted map to make iteration and serialization deterministic.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::definition::Definition;
use crate::edge::StructureEdge;
use crate::ident::DefId;
use crate::unit::{Diagnostic, ParseUnit};
use crate::FileStatus;

/// Accumulated definitions and edges for an indexing run.
#[derive(Debug, Default)]
pub struct CodeGraph {
    /// Per-file units, sorted by path
    units: BTreeMap<String, ParseUnit>,
    /// Definition ID -> (path, index into that unit's definitions)
    by_id: HashMap<DefId, (String, usize)>,
    /// Name -> IDs, ordered for deterministic query output
    by_name: HashMap<String, BTreeSet<DefId>>,
}

impl CodeGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the stored unit for `path` already carries this content hash.
    pub fn is_current(&self, path: &str, content_hash: &str) -> bool {
        self.units
            .get(path)
            .map(|u| u.content_hash == content_hash)
            .unwrap_or(false)
    }

    /// Merge a unit, replacing any previous unit for the same path.
    ///
    /// Single-writer: only the orchestrator's coordinator calls this.
    pub fn insert_unit(&mut self, unit: ParseUnit) -> FileStatus {
        let status = if self.units.contains_key(&unit.path) {
            FileStatus::Modified
        } else {
            FileStatus::New
        };
        if status == FileStatus::Modified {
            self.unindex(&unit.path);
        }

        for (idx, def) in unit.definitions.iter().enumerate() {
            self.by_id.insert(def.id.clone(), (unit.path.clone(), idx));
            self.by_name.entry(def.name.clone()).or_default().insert(def.id.clone());
        }
        self.units.insert(unit.path.clone(), unit);
        status
    }

    /// Drop a file's unit (external deletion signal).
    pub fn remove_file(&mut self, path: &str) -> bool {
        if !self.units.contains_key(path) {
            return false;
        }
        self.unindex(path);
        self.units.remove(path);
        true
    }

    fn unindex(&mut self, path: &str) {
        let Some(old) = self.units.get(path) else {
            return;
        };
        for def in &old.definitions {
            self.by_id.remove(&def.id);
            if let Some(ids) = self.by_name.get_mut(&def.name) {
                ids.remove(&def.id);
                if ids.is_empty() {
                    self.by_name.remove(&def.name);
                }
            }
        }
    }

    /// Look up a definition by ID.
    pub fn definition(&self, id: &DefId) -> Option<&Definition> {
        let (path, idx) = self.by_id.get(id)?;
        self.units.get(path)?.definitions.get(*idx)
    }

    /// All definitions with a given name, in stable ID order.
    ///
    /// Lazy, finite and restartable: call again for a fresh pass.
    pub fn definitions_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Definition> + 'a {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.definition(id))
    }

    /// Edges whose resolved target is this definition (incoming edges).
    pub fn references<'a>(&'a self, id: &'a DefId) -> impl Iterator<Item = &'a StructureEdge> + 'a {
        self.all_edges().filter(move |e| e.to.def_id() == Some(id))
    }

    /// Edges originating at this definition.
    pub fn edges_from<'a>(&'a self, id: &'a DefId) -> impl Iterator<Item = &'a StructureEdge> + 'a {
        self.all_edges().filter(move |e| &e.from == id)
    }

    /// The stored unit for a file
    pub fn unit(&self, path: &str) -> Option<&ParseUnit> {
        self.units.get(path)
    }

    /// All units in path order
    pub fn units(&self) -> impl Iterator<Item = &ParseUnit> {
        self.units.values()
    }

    /// All definitions, file by file in path order
    pub fn all_definitions(&self) -> impl Iterator<Item = &Definition> {
        self.units.values().flat_map(|u| u.definitions.iter())
    }

    /// All edges, file by file in path order
    pub fn all_edges(&self) -> impl Iterator<Item = &StructureEdge> {
        self.units.values().flat_map(|u| u.edges.iter())
    }

    /// All diagnostics, file by file in path order
    pub fn all_diagnostics(&self) -> impl Iterator<Item = (&str, &Diagnostic)> {
        self.units
            .values()
            .flat_map(|u| u.diagnostics.iter().map(move |d| (u.path.as_str(), d)))
    }

    /// Summary statistics
    pub fn stats(&self) -> GraphStats {
        let definitions = self.units.values().map(|u| u.definitions.len()).sum();
        let mut edges = 0;
        let mut dangling = 0;
        for unit in self.units.values() {
            edges += unit.edges.len();
            dangling += unit.edges.iter().filter(|e| e.to.is_dangling()).count();
        }
        GraphStats {
            files: self.units.len(),
            definitions,
            edges,
            dangling_references: dangling,
        }
    }
}

/// Statistics about a code graph
#[derive(Debug, Clone, serde::Serialize)]
pub struct GraphStats {
    pub files: usize,
    pub definitions: usize,
    pub edges: usize,
    pub dangling_references: usize,
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Code Graph Statistics:")?;
        writeln!(f, "  Files: {}", self.files)?;
        writeln!(f, "  Definitions: {}", self.definitions)?;
        writeln!(
            f,
            "  Edges: {} ({} dangling references)",
            self.edges, self.dangling_references
        )
    }
}
