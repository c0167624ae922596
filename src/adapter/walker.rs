//! Shared extraction context for tree-sitter adapters.
//!
//! Owns everything a language walk accumulates: definitions, containment
//! edges, the scope tree, synthetic-name counters and same-name ordinals.
//! Adapters drive it through [`DefBuilder`] and it assembles the final
//! [`ParseUnit`] once the walk is done, running name resolution last so uses
//! may precede definitions.

use std::collections::HashMap;

use tree_sitter::Node;

use crate::definition::{DefKind, Decorator, Definition, Modifiers, Signature, Span, Visibility};
use crate::edge::{EdgeKind, StructureEdge};
use crate::ident::DefId;
use crate::language::Language;
use crate::scope::{self, ScopeId, ScopeKind, ScopeTree};
use crate::unit::{Diagnostic, ParseUnit};

/// Where a new definition hangs in the containment forest.
enum Parent {
    /// Directly under the file's module root
    Module,
    /// Under an already-emitted definition
    Def(DefId),
    /// Under a type known only by name (Rust `impl` blocks, Go receivers);
    /// containment is fixed up after the walk via module-scope lookup
    Named(String),
}

/// Extraction state for one file.
pub struct Extraction<'a> {
    pub language: Language,
    pub path: &'a str,
    pub source: &'a str,
    pub scopes: ScopeTree,
    defs: Vec<Definition>,
    contains: Vec<StructureEdge>,
    index: HashMap<DefId, usize>,
    ordinals: HashMap<(DefKind, String), u32>,
    synth: HashMap<String, u32>,
    deferred: Vec<(String, DefId)>,
    deferred_supers: Vec<(String, String, EdgeKind)>,
    module: DefId,
}

impl<'a> Extraction<'a> {
    /// Start extraction for a file, creating the synthetic per-file module
    /// definition every top-level declaration is contained by.
    pub fn new(language: Language, path: &'a str, source: &'a str) -> Self {
        let stem = file_stem(path);
        let module_id = DefId::derive(language, path, DefKind::Namespace, stem, 0);
        let end_line = source.lines().count().max(1) as u32;

        let module = Definition {
            id: module_id.clone(),
            kind: DefKind::Namespace,
            name: stem.to_string(),
            qualified_name: stem.to_string(),
            language,
            path: path.to_string(),
            span: Span::new(1, 0, end_line, 0),
            visibility: None,
            modifiers: Modifiers::default(),
            signature: None,
            doc_comment: None,
            decorators: Vec::new(),
            container: None,
            exported: false,
        };

        let mut index = HashMap::new();
        index.insert(module_id.clone(), 0);
        let mut ordinals = HashMap::new();
        ordinals.insert((DefKind::Namespace, stem.to_string()), 1);

        Self {
            language,
            path,
            source,
            scopes: ScopeTree::new(),
            defs: vec![module],
            contains: Vec::new(),
            index,
            ordinals,
            synth: HashMap::new(),
            deferred: Vec::new(),
            deferred_supers: Vec::new(),
            module: module_id,
        }
    }

    /// ID of the per-file module root
    pub fn module_id(&self) -> DefId {
        self.module.clone()
    }

    /// Qualified name of a previously emitted definition
    pub fn qualified_name(&self, id: &DefId) -> &str {
        &self.defs[self.index[id]].qualified_name
    }

    /// Whether a definition with this qualified name was already emitted
    pub fn has_qualified(&self, qualified_name: &str) -> bool {
        self.ordinals.keys().any(|(_, q)| q == qualified_name)
    }

    /// Begin a definition contained by the module root
    pub fn def(&mut self, name: impl Into<String>, kind: DefKind, span: Span) -> DefBuilder<'_, 'a> {
        DefBuilder {
            ctx: self,
            name: name.into(),
            kind,
            span,
            parent: Parent::Module,
            bind_scope: None,
            visibility: None,
            modifiers: Modifiers::default(),
            signature: None,
            doc_comment: None,
            decorators: Vec::new(),
            exported: false,
        }
    }

    /// Mint a synthetic name for an anonymous function in a scope,
    /// `<enclosingScope>#<ordinal>`.
    pub fn synthetic_name(&mut self, enclosing: &DefId) -> String {
        let qname = self.qualified_name(enclosing).to_string();
        let short = qname.rsplit('.').next().unwrap_or(&qname).to_string();
        let counter = self.synth.entry(qname).or_insert(0);
        let name = format!("{}#{}", short, counter);
        *counter += 1;
        name
    }

    /// Record an identifier use for post-walk resolution
    pub fn add_ref(&mut self, scope: ScopeId, name: impl Into<String>, from: &DefId) {
        self.scopes.add_ref(scope, name, from.clone());
    }

    /// Record an inheritance/implementation clause for post-walk resolution
    pub fn add_super(&mut self, scope: ScopeId, name: impl Into<String>, from: &DefId, kind: EdgeKind) {
        self.scopes.add_super(scope, name, from.clone(), kind);
    }

    /// Record a hierarchy clause whose *source* is only known by name
    /// (`impl Trait for Type`, Go embedded fields on out-of-file types). The
    /// edge is emitted at finish when the named type is defined in this file.
    pub fn add_deferred_super(
        &mut self,
        type_name: impl Into<String>,
        super_name: impl Into<String>,
        kind: EdgeKind,
    ) {
        self.deferred_supers.push((type_name.into(), super_name.into(), kind));
    }

    /// Open a child scope frame
    pub fn push_scope(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        self.scopes.add_scope(parent, kind)
    }

    /// Finish: fix up deferred containment, resolve names, assemble the unit.
    pub fn finish(mut self, content_hash: impl Into<String>, diagnostics: Vec<Diagnostic>) -> ParseUnit {
        // Members of impl-like blocks attach to their type when it is defined
        // in this file, otherwise to the module root so the containment
        // forest stays rooted.
        for (type_name, member) in std::mem::take(&mut self.deferred) {
            let container = match self.scopes.lookup(ScopeId::root(), &type_name) {
                Some(scope::Binding::Def(id)) => id.clone(),
                _ => self.module.clone(),
            };
            let idx = self.index[&member];
            self.defs[idx].container = Some(container.clone());
            self.contains.push(StructureEdge::resolved(container, member, EdgeKind::Contains));
        }

        for (type_name, super_name, kind) in std::mem::take(&mut self.deferred_supers) {
            let from = match self.scopes.lookup(ScopeId::root(), &type_name) {
                Some(scope::Binding::Def(id)) => id.clone(),
                _ => continue,
            };
            self.scopes.add_super(ScopeId::root(), super_name, from, kind);
        }

        let resolved = scope::resolve(&self.scopes);
        let overrides = scope::override_edges(&self.defs, &resolved);

        let mut edges = self.contains;
        edges.extend(resolved);
        edges.extend(overrides);

        ParseUnit {
            path: self.path.to_string(),
            language: self.language,
            content_hash: content_hash.into(),
            definitions: self.defs,
            edges,
            diagnostics,
        }
    }
}

/// Builder for one definition; `finish` mints the stable ID, emits the
/// containment edge and binds the name.
pub struct DefBuilder<'x, 'a> {
    ctx: &'x mut Extraction<'a>,
    name: String,
    kind: DefKind,
    span: Span,
    parent: Parent,
    bind_scope: Option<ScopeId>,
    visibility: Option<Visibility>,
    modifiers: Modifiers,
    signature: Option<Signature>,
    doc_comment: Option<String>,
    decorators: Vec<Decorator>,
    exported: bool,
}

impl DefBuilder<'_, '_> {
    /// Contain under an already-emitted definition
    pub fn contained_by(mut self, id: &DefId) -> Self {
        self.parent = Parent::Def(id.clone());
        self
    }

    /// Contain under a type known only by name; resolved after the walk
    pub fn member_of_named(mut self, type_name: impl Into<String>) -> Self {
        self.parent = Parent::Named(type_name.into());
        self
    }

    /// Bind the definition's name in a scope frame
    pub fn bind(mut self, scope: ScopeId) -> Self {
        self.bind_scope = Some(scope);
        self
    }

    pub fn visibility(mut self, v: Option<Visibility>) -> Self {
        self.visibility = v;
        self
    }

    pub fn modifiers(mut self, m: Modifiers) -> Self {
        self.modifiers = m;
        self
    }

    pub fn signature(mut self, sig: Signature) -> Self {
        self.signature = Some(sig);
        self
    }

    pub fn doc(mut self, doc: Option<String>) -> Self {
        self.doc_comment = doc;
        self
    }

    pub fn decorators(mut self, decorators: Vec<Decorator>) -> Self {
        self.decorators = decorators;
        self
    }

    pub fn exported(mut self, exported: bool) -> Self {
        self.exported = exported;
        self
    }

    /// Emit the definition and return its ID
    pub fn finish(self) -> DefId {
        let ctx = self.ctx;

        let (parent_qname, container, deferred_type) = match self.parent {
            Parent::Module => (ctx.qualified_name(&ctx.module.clone()).to_string(), Some(ctx.module.clone()), None),
            Parent::Def(id) => (ctx.qualified_name(&id).to_string(), Some(id), None),
            Parent::Named(type_name) => {
                let module_qname = ctx.qualified_name(&ctx.module.clone()).to_string();
                (format!("{}.{}", module_qname, type_name), None, Some(type_name))
            }
        };
        let qualified_name = format!("{}.{}", parent_qname, self.name);

        let key = (self.kind, qualified_name.clone());
        let ordinal = ctx.ordinals.entry(key).or_insert(0);
        let id = DefId::derive(ctx.language, ctx.path, self.kind, &qualified_name, *ordinal);
        *ordinal += 1;

        if let Some(container_id) = &container {
            ctx.contains.push(StructureEdge::resolved(container_id.clone(), id.clone(), EdgeKind::Contains));
        }
        if let Some(type_name) = deferred_type {
            ctx.deferred.push((type_name, id.clone()));
        }
        if let Some(scope) = self.bind_scope {
            ctx.scopes.bind(scope, self.name.clone(), id.clone());
        }

        let def = Definition {
            id: id.clone(),
            kind: self.kind,
            name: self.name,
            qualified_name,
            language: ctx.language,
            path: ctx.path.to_string(),
            span: self.span,
            visibility: self.visibility,
            modifiers: self.modifiers,
            signature: self.signature,
            doc_comment: self.doc_comment,
            decorators: self.decorators,
            container,
            exported: self.exported,
        };
        ctx.index.insert(id.clone(), ctx.defs.len());
        ctx.defs.push(def);
        id
    }
}

/// Text of a tree-sitter node
pub fn node_text<'s>(node: &Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// File stem used as the module root's name: `src/auth_service.py` -> `auth_service`
pub fn file_stem(path: &str) -> &str {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match base.split_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    }
}

/// Collect the comment block immediately above a node, verbatim.
///
/// Walks previous siblings while they are comments adjacent to the
/// declaration (no blank line in between). `skip_kinds` lets annotation
/// nodes (e.g. Rust `attribute_item`) sit between the comment and the
/// declaration without breaking adjacency. `accept` filters comment text so
/// languages with dedicated doc markers (`///`, `/**`) ignore plain remarks.
pub fn doc_comment_above(
    node: Node,
    source: &str,
    comment_kinds: &[&str],
    skip_kinds: &[&str],
    accept: impl Fn(&str) -> bool,
) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    let mut boundary_row = node.start_position().row;
    let mut current = node.prev_sibling();

    while let Some(sib) = current {
        let kind = sib.kind();
        if skip_kinds.contains(&kind) {
            boundary_row = sib.start_position().row;
            current = sib.prev_sibling();
            continue;
        }
        if !comment_kinds.contains(&kind) {
            break;
        }
        if sib.end_position().row + 1 < boundary_row {
            break;
        }
        let text = node_text(&sib, source);
        if !accept(text) {
            break;
        }
        parts.push(text);
        boundary_row = sib.start_position().row;
        current = sib.prev_sibling();
    }

    if parts.is_empty() {
        None
    } else {
        parts.reverse();
        Some(parts.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("src/auth.py"), "auth");
        assert_eq!(file_stem("pkg/conn_pool.go"), "conn_pool");
        assert_eq!(file_stem("component.test.tsx"), "component");
        assert_eq!(file_stem("Makefile"), "Makefile");
    }

    #[test]
    fn test_module_root_is_first_definition() {
        let ctx = Extraction::new(Language::Python, "src/auth.py", "x = 1\n");
        let unit = ctx.finish("hash", vec![]);
        assert_eq!(unit.definitions.len(), 1);
        assert_eq!(unit.definitions[0].kind, DefKind::Namespace);
        assert_eq!(unit.definitions[0].name, "auth");
        assert!(unit.definitions[0].container.is_none());
    }

    #[test]
    fn test_def_builder_containment() {
        let mut ctx = Extraction::new(Language::Python, "src/auth.py", "");
        let class_id = ctx.def("Token", DefKind::Class, Span::new(1, 0, 5, 0)).finish();
        let method_id = ctx
            .def("validate", DefKind::Method, Span::new(2, 4, 4, 0))
            .contained_by(&class_id)
            .finish();

        assert_eq!(ctx.qualified_name(&method_id), "auth.Token.validate");

        let unit = ctx.finish("hash", vec![]);
        let method = unit.definitions.iter().find(|d| d.id == method_id).unwrap();
        assert_eq!(method.container.as_ref(), Some(&class_id));
        assert!(unit.edges.iter().any(|e| {
            e.kind == EdgeKind::Contains && e.from == class_id && e.to.def_id() == Some(&method_id)
        }));
    }

    #[test]
    fn test_same_name_ordinals_stay_distinct() {
        let mut ctx = Extraction::new(Language::TypeScript, "api.ts", "");
        let a = ctx.def("get", DefKind::Function, Span::new(1, 0, 1, 10)).finish();
        let b = ctx.def("get", DefKind::Function, Span::new(2, 0, 2, 10)).finish();
        assert_ne!(a, b);
    }

    #[test]
    fn test_synthetic_names_get_ordinal_suffix() {
        let mut ctx = Extraction::new(Language::JavaScript, "app.js", "");
        let module = ctx.module_id();
        let first = ctx.synthetic_name(&module);
        let second = ctx.synthetic_name(&module);
        assert_eq!(first, "app#0");
        assert_eq!(second, "app#1");
    }

    #[test]
    fn test_deferred_member_attaches_to_named_type() {
        let mut ctx = Extraction::new(Language::Rust, "geo.rs", "");
        let struct_id = ctx
            .def("Point", DefKind::Struct, Span::new(1, 0, 3, 1))
            .bind(ScopeId::root())
            .finish();
        let method_id = ctx
            .def("norm", DefKind::Method, Span::new(6, 4, 8, 5))
            .member_of_named("Point")
            .finish();

        let unit = ctx.finish("hash", vec![]);
        let method = unit.definitions.iter().find(|d| d.id == method_id).unwrap();
        assert_eq!(method.container.as_ref(), Some(&struct_id));
        assert_eq!(method.qualified_name, "geo.Point.norm");
    }

    #[test]
    fn test_deferred_member_falls_back_to_module() {
        let mut ctx = Extraction::new(Language::Rust, "ext.rs", "");
        let module = ctx.module_id();
        let method_id = ctx
            .def("helper", DefKind::Method, Span::new(2, 4, 4, 5))
            .member_of_named("ExternalType")
            .finish();

        let unit = ctx.finish("hash", vec![]);
        let method = unit.definitions.iter().find(|d| d.id == method_id).unwrap();
        assert_eq!(method.container.as_ref(), Some(&module));
        assert_eq!(method.qualified_name, "ext.ExternalType.helper");
    }
}
