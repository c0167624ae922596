//! Scope tree data structure for name binding.
//!
//! Tracks the scope hierarchy, the names bound in each scope, and the
//! references waiting for resolution once the whole file has been walked.
//! Resolution runs after the walk because a use may legally precede its
//! definition within the same scope (hoisting, mutual recursion).

use std::collections::HashMap;

use crate::edge::EdgeKind;
use crate::ident::DefId;

/// Unique identifier for a scope frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The file's top-level module scope
    pub fn root() -> Self {
        Self(0)
    }
}

/// The kind of scope frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// File/module level scope
    Module,
    /// Class/struct/trait body
    Class,
    /// Function/method body
    Function,
    /// Braced block (if, for, match arms, ...)
    Block,
}

/// What a name in a scope is bound to.
///
/// `Local` marks function-local variables and parameters: a reference that
/// hits one is resolved (it is not dangling) but produces no edge, since
/// locals are not graph definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Def(DefId),
    Local,
}

/// A name use waiting for resolution
#[derive(Debug, Clone)]
pub struct PendingRef {
    pub scope: ScopeId,
    pub name: String,
    pub from: DefId,
}

/// An inheritance/implementation clause waiting for resolution
#[derive(Debug, Clone)]
pub struct PendingSuper {
    pub scope: ScopeId,
    pub name: String,
    pub from: DefId,
    pub kind: EdgeKind,
}

/// Scope tree for one file.
#[derive(Debug, Default)]
pub struct ScopeTree {
    next_id: u32,
    parents: HashMap<ScopeId, ScopeId>,
    kinds: HashMap<ScopeId, ScopeKind>,
    bindings: HashMap<(ScopeId, String), Binding>,
    refs: Vec<PendingRef>,
    supers: Vec<PendingSuper>,
}

impl ScopeTree {
    /// Create a scope tree with a root module scope
    pub fn new() -> Self {
        let mut tree = Self::default();
        tree.kinds.insert(ScopeId::root(), ScopeKind::Module);
        tree.next_id = 1;
        tree
    }

    /// Push a new child scope
    pub fn add_scope(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.next_id);
        self.next_id += 1;
        self.parents.insert(id, parent);
        self.kinds.insert(id, kind);
        id
    }

    /// Bind a definition's name in a scope
    pub fn bind(&mut self, scope: ScopeId, name: impl Into<String>, id: DefId) {
        self.bindings.insert((scope, name.into()), Binding::Def(id));
    }

    /// Bind a local (parameter, local variable) in a scope
    pub fn bind_local(&mut self, scope: ScopeId, name: impl Into<String>) {
        let key = (scope, name.into());
        // A definition binding for the same name wins over a local one.
        self.bindings.entry(key).or_insert(Binding::Local);
    }

    /// Record an identifier use for later resolution
    pub fn add_ref(&mut self, scope: ScopeId, name: impl Into<String>, from: DefId) {
        self.refs.push(PendingRef { scope, name: name.into(), from });
    }

    /// Record an inheritance/implementation clause for later resolution
    pub fn add_super(&mut self, scope: ScopeId, name: impl Into<String>, from: DefId, kind: EdgeKind) {
        self.supers.push(PendingSuper { scope, name: name.into(), from, kind });
    }

    /// Get the parent of a scope
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.parents.get(&scope).copied()
    }

    /// Get the kind of a scope
    pub fn kind(&self, scope: ScopeId) -> Option<ScopeKind> {
        self.kinds.get(&scope).copied()
    }

    /// Look up a name in a single frame
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<&Binding> {
        self.bindings.get(&(scope, name.to_string()))
    }

    /// Look up a name walking innermost-to-outermost
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Binding> {
        let mut current = Some(scope);
        while let Some(s) = current {
            if let Some(binding) = self.lookup_local(s, name) {
                return Some(binding);
            }
            current = self.parent(s);
        }
        None
    }

    pub fn pending_refs(&self) -> &[PendingRef] {
        &self.refs
    }

    pub fn pending_supers(&self) -> &[PendingSuper] {
        &self.supers
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
    fn test_scope_hierarchy() {
        let mut tree = ScopeTree::new();
        let class_scope = tree.add_scope(ScopeId::root(), ScopeKind::Class);
        let method_scope = tree.add_scope(class_scope, ScopeKind::Function);

        assert_eq!(tree.parent(method_scope), Some(class_scope));
        assert_eq!(tree.parent(class_scope), Some(ScopeId::root()));
        assert_eq!(tree.parent(ScopeId::root()), None);
        assert_eq!(tree.kind(ScopeId::root()), Some(ScopeKind::Module));
    }

    #[test]
    fn test_lookup_walks_chain() {
        let mut tree = ScopeTree::new();
        let class_scope = tree.add_scope(ScopeId::root(), ScopeKind::Class);
        let method_scope = tree.add_scope(class_scope, ScopeKind::Function);

        tree.bind(ScopeId::root(), "top", sample_id("top"));
        tree.bind(class_scope, "helper", sample_id("helper"));

        assert!(tree.lookup_local(method_scope, "helper").is_none());
        assert!(tree.lookup(method_scope, "helper").is_some());
        assert!(tree.lookup(method_scope, "top").is_some());
        assert!(tree.lookup(method_scope, "missing").is_none());
    }

    #[test]
    fn test_inner_binding_shadows_outer() {
        let mut tree = ScopeTree::new();
        let func_scope = tree.add_scope(ScopeId::root(), ScopeKind::Function);

        tree.bind(ScopeId::root(), "x", sample_id("outer_x"));
        tree.bind_local(func_scope, "x");

        assert_eq!(tree.lookup(func_scope, "x"), Some(&Binding::Local));
        assert_eq!(
            tree.lookup(ScopeId::root(), "x"),
            Some(&Binding::Def(sample_id("outer_x")))
        );
    }

    #[test]
    fn test_def_binding_wins_over_local() {
        let mut tree = ScopeTree::new();
        tree.bind(ScopeId::root(), "f", sample_id("f"));
        tree.bind_local(ScopeId::root(), "f");
        assert_eq!(tree.lookup(ScopeId::root(), "f"), Some(&Binding::Def(sample_id("f"))));
    }
}
