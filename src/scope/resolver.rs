//! Name resolver - turns pending uses into structure edges.
//!
//! Resolution algorithm:
//! 1. Search frames innermost-to-outermost, ending at the module scope
//! 2. Hit on a definition -> resolved edge
//! 3. Hit on a local -> resolved, no edge (locals are not graph nodes)
//! 4. No hit -> dangling name-only placeholder for the external linker
//!
//! Whole-workspace symbol resolution is deliberately not attempted here.

use std::collections::{HashMap, HashSet};

use crate::definition::{DefKind, Definition};
use crate::edge::{EdgeKind, EdgeTarget, StructureEdge};
use crate::ident::DefId;

use super::tree::{Binding, ScopeId, ScopeTree};

/// Resolve all pending supers and references into edges.
///
/// Hierarchy edges (Inherits/Implements) come first, then References, each in
/// recording order with duplicates collapsed, so output is deterministic for
/// a given walk.
pub fn resolve(tree: &ScopeTree) -> Vec<StructureEdge> {
    let mut edges = Vec::new();
    let mut seen = HashSet::new();

    for sup in tree.pending_supers() {
        let edge = match lookup_def(tree, sup.scope, &sup.name) {
            Lookup::Def(id) => StructureEdge::resolved(sup.from.clone(), id, sup.kind),
            // A local can never be a base type; unresolved bases stay dangling
            // under their hierarchy kind so the linker knows what to look for.
            Lookup::Local | Lookup::Missing => {
                StructureEdge::dangling(sup.from.clone(), sup.name.clone(), sup.kind)
            }
        };
        push_unique(&mut edges, &mut seen, edge);
    }

    for r in tree.pending_refs() {
        match lookup_def(tree, r.scope, &r.name) {
            Lookup::Def(id) => {
                if id != r.from {
                    let edge = StructureEdge::resolved(r.from.clone(), id, EdgeKind::References);
                    push_unique(&mut edges, &mut seen, edge);
                }
            }
            // Resolved to a local: structurally uninteresting, no edge.
            Lookup::Local => {}
            Lookup::Missing => {
                let edge = StructureEdge::dangling(r.from.clone(), r.name.clone(), EdgeKind::References);
                push_unique(&mut edges, &mut seen, edge);
            }
        }
    }

    edges
}

/// Derive Overrides edges from resolved hierarchy edges.
///
/// For every `Inherits`/`Implements` edge resolved within the file, a method
/// of the subtype whose name matches a method of the supertype overrides it.
/// Cross-file overrides are the external linker's job.
pub fn override_edges(definitions: &[Definition], hierarchy: &[StructureEdge]) -> Vec<StructureEdge> {
    let mut methods_by_container: HashMap<&DefId, Vec<(&str, &DefId)>> = HashMap::new();
    for def in definitions {
        if def.kind == DefKind::Method || def.kind == DefKind::Property {
            if let Some(container) = &def.container {
                methods_by_container
                    .entry(container)
                    .or_default()
                    .push((def.name.as_str(), &def.id));
            }
        }
    }

    let mut edges = Vec::new();
    for edge in hierarchy {
        if !edge.kind.is_hierarchy() {
            continue;
        }
        let EdgeTarget::Resolved(base_id) = &edge.to else {
            continue;
        };
        let (Some(sub_methods), Some(base_methods)) = (
            methods_by_container.get(&edge.from),
            methods_by_container.get(base_id),
        ) else {
            continue;
        };
        for (name, method_id) in sub_methods {
            if let Some((_, base_method)) = base_methods.iter().find(|(n, _)| n == name) {
                edges.push(StructureEdge::resolved(
                    (*method_id).clone(),
                    (*base_method).clone(),
                    EdgeKind::Overrides,
                ));
            }
        }
    }
    edges
}

enum Lookup {
    Def(DefId),
    Local,
    Missing,
}

fn lookup_def(tree: &ScopeTree, scope: ScopeId, name: &str) -> Lookup {
    match tree.lookup(scope, name) {
        Some(Binding::Def(id)) => Lookup::Def(id.clone()),
        Some(Binding::Local) => Lookup::Local,
        None => Lookup::Missing,
    }
}

fn push_unique(edges: &mut Vec<StructureEdge>, seen: &mut HashSet<StructureEdge>, edge: StructureEdge) {
    if seen.insert(edge.clone()) {
        edges.push(edge);
    }
}
