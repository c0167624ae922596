//! Python language adapter.
//!
//! Class/function extraction with decorator capture, docstrings, dataclass
//! and abstract-base detection, and synthetic definitions for lambdas. Scope
//! frames follow Python's function-level scoping: classes and functions open
//! frames, compound statements do not.

use tree_sitter::Node;

use crate::analyzer::{self, node_span};
use crate::definition::{DefKind, Decorator, Modifiers, Param, Signature, Visibility};
use crate::edge::EdgeKind;
use crate::ident::DefId;
use crate::language::Language;
use crate::scope::{ScopeId, ScopeKind};
use crate::unit::ParseUnit;
use crate::Result;

use super::framework::{timeout_unit, ExtractRequest, SyntaxAdapter};
use super::walker::{doc_comment_above, node_text, Extraction};

/// Grammar-node to definition-kind table.
///
/// `function_definition` lands on Method inside a class body, Property under
/// a `@property` decorator; `assignment` lands on Field at class level.
const KIND_MAP: &[(&str, DefKind)] = &[
    ("class_definition", DefKind::Class),
    ("function_definition", DefKind::Function),
    ("lambda", DefKind::Function),
    ("assignment", DefKind::Variable),
];

/// Python language adapter
#[derive(Default)]
pub struct PythonAdapter;

impl PythonAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl SyntaxAdapter for PythonAdapter {
    fn language(&self) -> Language {
        Language::Python
    }

    fn display_name(&self) -> &'static str {
        "Python"
    }

    fn kind_map(&self) -> &'static [(&'static str, DefKind)] {
        KIND_MAP
    }

    fn extract(&self, req: &ExtractRequest<'_>) -> Result<ParseUnit> {
        let Some(analysis) = analyzer::parse(Language::Python, req.source, req.timeout)? else {
            return Ok(timeout_unit(Language::Python, req));
        };

        let mut ctx = Extraction::new(Language::Python, req.path, req.source);
        let module = ctx.module_id();
        let state = WalkState {
            scope: ScopeId::root(),
            owner: module,
            class: None,
            in_class_body: false,
            in_init: false,
        };
        walk(&mut ctx, analysis.tree.root_node(), &state);
        Ok(ctx.finish(req.content_hash, analysis.diagnostics))
    }
}

#[derive(Clone)]
struct WalkState {
    scope: ScopeId,
    owner: DefId,
    class: Option<DefId>,
    in_class_body: bool,
    in_init: bool,
}

impl WalkState {
    /// Container for a definition emitted under this state; `None` means the
    /// module root.
    fn container(&self, ctx: &Extraction) -> Option<DefId> {
        if self.in_class_body {
            self.class.clone()
        } else if self.owner != ctx.module_id() {
            Some(self.owner.clone())
        } else {
            None
        }
    }
}

fn walk(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            // Recovery resumes at the sibling; nothing extractable inside.
            "ERROR" => continue,
            "decorated_definition" => {
                let decorators = collect_decorators(ctx, child);
                if let Some(definition) = child.child_by_field_name("definition") {
                    match definition.kind() {
                        "class_definition" => handle_class(ctx, child, definition, state, decorators),
                        "function_definition" => handle_function(ctx, child, definition, state, decorators),
                        _ => {}
                    }
                }
            }
            "class_definition" => handle_class(ctx, child, child, state, Vec::new()),
            "function_definition" => handle_function(ctx, child, child, state, Vec::new()),
            "expression_statement" => {
                if let Some(expr) = child.named_child(0) {
                    match expr.kind() {
                        "assignment" => handle_assignment(ctx, expr, state),
                        // Docstrings are picked up at the definition site.
                        "string" => {}
                        _ => walk(ctx, child, state),
                    }
                }
            }
            "call" => handle_call(ctx, child, state),
            "lambda" => {
                handle_lambda(ctx, child, state);
            }
            "import_statement" | "import_from_statement" | "future_import_statement" => {}
            _ => walk(ctx, child, state),
        }
    }
}

fn handle_class(
    ctx: &mut Extraction,
    anchor: Node,
    node: Node,
    state: &WalkState,
    decorators: Vec<Decorator>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();

    let mut modifiers = Modifiers::default();
    modifiers.value_semantics = decorators.iter().any(|d| trailing_segment(&d.name) == "dataclass");

    let mut supers: Vec<String> = Vec::new();
    if let Some(bases) = node.child_by_field_name("superclasses") {
        let mut cursor = bases.walk();
        for base in bases.named_children(&mut cursor) {
            match base.kind() {
                "identifier" | "attribute" => {
                    supers.push(node_text(&base, ctx.source).to_string());
                }
                // metaclass=... and other keyword arguments are not bases
                "keyword_argument" => {}
                _ => {}
            }
        }
    }
    if supers.iter().any(|s| trailing_segment(s) == "ABC" || trailing_segment(s) == "Protocol") {
        modifiers.is_abstract = true;
    }

    let doc = docstring(node, ctx.source);
    let container = state.container(ctx);
    let exported = state.scope == ScopeId::root() && !name.starts_with('_');

    let mut builder = ctx
        .def(&name, DefKind::Class, node_span(&anchor))
        .bind(state.scope)
        .visibility(Some(python_visibility(&name)))
        .modifiers(modifiers)
        .doc(doc)
        .decorators(decorators)
        .exported(exported);
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    let class_id = builder.finish();

    for base in supers {
        ctx.add_super(state.scope, base, &class_id, EdgeKind::Inherits);
    }

    if let Some(body) = node.child_by_field_name("body") {
        let class_scope = ctx.push_scope(state.scope, ScopeKind::Class);
        let inner = WalkState {
            scope: class_scope,
            owner: class_id.clone(),
            class: Some(class_id),
            in_class_body: true,
            in_init: false,
        };
        walk(ctx, body, &inner);
    }
}

fn handle_function(
    ctx: &mut Extraction,
    anchor: Node,
    node: Node,
    state: &WalkState,
    decorators: Vec<Decorator>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();

    let decorator_names: Vec<&str> = decorators.iter().map(|d| trailing_segment(&d.name)).collect();

    let kind = if state.in_class_body {
        if decorator_names.iter().any(|n| *n == "property" || *n == "cached_property") {
            DefKind::Property
        } else {
            DefKind::Method
        }
    } else {
        DefKind::Function
    };

    let mut modifiers = Modifiers::default();
    modifiers.is_async = has_keyword_child(node, "async");
    modifiers.is_static = decorator_names.contains(&"staticmethod");
    modifiers.is_abstract = decorator_names.iter().any(|n| n.ends_with("abstractmethod"));
    if let Some(body) = node.child_by_field_name("body") {
        modifiers.is_generator = contains_yield(body);
    }

    let signature = function_signature(ctx, node);
    let param_names: Vec<String> = signature.params.iter().map(|p| p.name.clone()).collect();
    let doc = docstring(node, ctx.source);
    let container = state.container(ctx);
    let exported = state.scope == ScopeId::root() && !name.starts_with('_');

    let mut builder = ctx
        .def(&name, kind, node_span(&anchor))
        .bind(state.scope)
        .visibility(Some(python_visibility(&name)))
        .modifiers(modifiers)
        .signature(signature)
        .doc(doc)
        .decorators(decorators)
        .exported(exported);
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    let def_id = builder.finish();

    if let Some(body) = node.child_by_field_name("body") {
        let func_scope = ctx.push_scope(state.scope, ScopeKind::Function);
        for param in &param_names {
            let bare = param.trim_start_matches('*');
            if !bare.is_empty() {
                ctx.scopes.bind_local(func_scope, bare);
            }
        }
        let inner = WalkState {
            scope: func_scope,
            owner: def_id,
            class: state.class.clone(),
            in_class_body: false,
            in_init: state.in_class_body && name == "__init__",
        };
        walk(ctx, body, &inner);
    }
}

fn handle_assignment(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let Some(left) = node.child_by_field_name("left") else {
        return;
    };
    let right = node.child_by_field_name("right");

    match left.kind() {
        "identifier" => {
            let name = node_text(&left, ctx.source).to_string();
            if state.in_class_body {
                emit_binding(ctx, &name, DefKind::Field, left, state);
            } else if state.scope == ScopeId::root() {
                emit_binding(ctx, &name, DefKind::Variable, left, state);
            } else {
                ctx.scopes.bind_local(state.scope, &name);
            }
        }
        "pattern_list" | "tuple_pattern" => {
            let mut cursor = left.walk();
            for target in left.named_children(&mut cursor) {
                if target.kind() == "identifier" {
                    let name = node_text(&target, ctx.source).to_string();
                    if state.scope == ScopeId::root() {
                        emit_binding(ctx, &name, DefKind::Variable, target, state);
                    } else {
                        ctx.scopes.bind_local(state.scope, &name);
                    }
                }
            }
        }
        "attribute" => handle_attribute_target(ctx, left, state),
        _ => {}
    }

    if let Some(value) = right {
        match value.kind() {
            "lambda" => {
                handle_lambda(ctx, value, state);
            }
            _ => walk(ctx, value, state),
        }
    }
}

/// `self.x = ...` inside `__init__` declares an instance field; `Type.x = ...`
/// at module level is dynamic attachment, modeled as a synthesized member.
fn handle_attribute_target(ctx: &mut Extraction, left: Node, state: &WalkState) {
    let (Some(object), Some(attr)) = (
        left.child_by_field_name("object"),
        left.child_by_field_name("attribute"),
    ) else {
        return;
    };
    if object.kind() != "identifier" {
        return;
    }
    let object_name = node_text(&object, ctx.source).to_string();
    let attr_name = node_text(&attr, ctx.source).to_string();

    if object_name == "self" {
        if !state.in_init {
            return;
        }
        let Some(class) = state.class.clone() else {
            return;
        };
        if member_exists(ctx, &class, &attr_name) {
            return;
        }
        ctx.def(&attr_name, DefKind::Field, node_span(&left))
            .contained_by(&class)
            .visibility(Some(python_visibility(&attr_name)))
            .finish();
    } else if state.scope == ScopeId::root() {
        let mut modifiers = Modifiers::default();
        modifiers.synthesized = true;
        ctx.def(&attr_name, DefKind::Field, node_span(&left))
            .member_of_named(object_name)
            .modifiers(modifiers)
            .finish();
    }
}

fn emit_binding(ctx: &mut Extraction, name: &str, kind: DefKind, node: Node, state: &WalkState) {
    let container = state.container(ctx);
    let exported = state.scope == ScopeId::root() && !name.starts_with('_');

    let mut builder = ctx
        .def(name, kind, node_span(&node))
        .bind(state.scope)
        .visibility(Some(python_visibility(name)))
        .exported(exported);
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    builder.finish();
}

/// Anonymous lambda: a Function definition with a synthetic
/// `<enclosingScope>#<ordinal>` name, addressable and linkable despite
/// having no declared identifier.
fn handle_lambda(ctx: &mut Extraction, node: Node, state: &WalkState) -> DefId {
    let name = ctx.synthetic_name(&state.owner);

    let mut signature = Signature::default();
    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            collect_param(ctx, param, &mut signature);
        }
    }
    let param_names: Vec<String> = signature.params.iter().map(|p| p.name.clone()).collect();
    let container = state.container(ctx);

    let mut builder = ctx.def(&name, DefKind::Function, node_span(&node)).signature(signature);
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    let lambda_id = builder.finish();

    if let Some(body) = node.child_by_field_name("body") {
        let lambda_scope = ctx.push_scope(state.scope, ScopeKind::Function);
        for param in &param_names {
            ctx.scopes.bind_local(lambda_scope, param.trim_start_matches('*'));
        }
        let inner = WalkState {
            scope: lambda_scope,
            owner: lambda_id.clone(),
            class: state.class.clone(),
            in_class_body: false,
            in_init: false,
        };
        walk(ctx, body, &inner);
    }
    lambda_id
}

fn handle_call(ctx: &mut Extraction, node: Node, state: &WalkState) {
    if let Some(function) = node.child_by_field_name("function") {
        match function.kind() {
            "identifier" => {
                let name = node_text(&function, ctx.source).to_string();
                ctx.add_ref(state.scope, name, &state.owner);
            }
            "attribute" => {
                if let Some(attr) = function.child_by_field_name("attribute") {
                    let name = node_text(&attr, ctx.source).to_string();
                    ctx.add_ref(state.scope, name, &state.owner);
                }
            }
            _ => {}
        }
    }
    if let Some(arguments) = node.child_by_field_name("arguments") {
        walk(ctx, arguments, state);
    }
}

fn collect_decorators(ctx: &Extraction, decorated: Node) -> Vec<Decorator> {
    let mut decorators = Vec::new();
    let mut cursor = decorated.walk();
    for child in decorated.named_children(&mut cursor) {
        if child.kind() != "decorator" {
            continue;
        }
        let Some(expr) = child.named_child(0) else {
            continue;
        };
        match expr.kind() {
            "identifier" | "attribute" => decorators.push(Decorator {
                name: node_text(&expr, ctx.source).to_string(),
                arguments: Vec::new(),
            }),
            "call" => {
                let name = expr
                    .child_by_field_name("function")
                    .map(|f| node_text(&f, ctx.source).to_string())
                    .unwrap_or_default();
                let mut arguments = Vec::new();
                if let Some(args) = expr.child_by_field_name("arguments") {
                    let mut args_cursor = args.walk();
                    for arg in args.named_children(&mut args_cursor) {
                        arguments.push(node_text(&arg, ctx.source).to_string());
                    }
                }
                decorators.push(Decorator { name, arguments });
            }
            _ => {}
        }
    }
    decorators
}

fn function_signature(ctx: &Extraction, node: Node) -> Signature {
    let mut signature = Signature::default();
    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            collect_param(ctx, param, &mut signature);
        }
    }
    signature.return_type = node
        .child_by_field_name("return_type")
        .map(|n| node_text(&n, ctx.source).to_string());
    if let Some(type_params) = node.child_by_field_name("type_parameters") {
        let mut cursor = type_params.walk();
        for tp in type_params.named_children(&mut cursor) {
            signature.type_params.push(node_text(&tp, ctx.source).to_string());
        }
    }
    signature
}

fn collect_param(ctx: &Extraction, param: Node, signature: &mut Signature) {
    match param.kind() {
        "identifier" => signature.params.push(Param::new(node_text(&param, ctx.source))),
        "typed_parameter" => {
            let name = param
                .named_child(0)
                .map(|n| node_text(&n, ctx.source))
                .unwrap_or("");
            match param.child_by_field_name("type") {
                Some(ty) => signature.params.push(Param::typed(name, node_text(&ty, ctx.source))),
                None => signature.params.push(Param::new(name)),
            }
        }
        "default_parameter" => {
            if let Some(name) = param.child_by_field_name("name") {
                signature.params.push(Param::new(node_text(&name, ctx.source)));
            }
        }
        "typed_default_parameter" => {
            let name = param
                .child_by_field_name("name")
                .map(|n| node_text(&n, ctx.source))
                .unwrap_or("");
            match param.child_by_field_name("type") {
                Some(ty) => signature.params.push(Param::typed(name, node_text(&ty, ctx.source))),
                None => signature.params.push(Param::new(name)),
            }
        }
        "list_splat_pattern" | "dictionary_splat_pattern" => {
            signature.params.push(Param::new(node_text(&param, ctx.source)));
        }
        _ => {}
    }
}

/// Docstring: a string expression as the first statement of the body,
/// attached verbatim.
fn docstring(node: Node, source: &str) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return comment_doc(node, source);
    }
    let expr = first.named_child(0)?;
    if expr.kind() == "string" {
        Some(node_text(&expr, source).to_string())
    } else {
        comment_doc(node, source)
    }
}

/// Fallback: a `#` comment block immediately above the declaration.
fn comment_doc(node: Node, source: &str) -> Option<String> {
    let anchor = match node.parent() {
        Some(p) if p.kind() == "decorated_definition" => p,
        _ => node,
    };
    doc_comment_above(anchor, source, &["comment"], &[], |_| true)
}

fn python_visibility(name: &str) -> Visibility {
    if name.starts_with('_') {
        Visibility::Private
    } else {
        Visibility::Public
    }
}

fn has_keyword_child(node: Node, keyword: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == keyword)
}

fn contains_yield(node: Node) -> bool {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "yield" => return true,
            // Nested callables own their yields.
            "function_definition" | "lambda" => continue,
            _ => {
                if contains_yield(child) {
                    return true;
                }
            }
        }
    }
    false
}

fn member_exists(ctx: &Extraction, class: &DefId, name: &str) -> bool {
    let qname = format!("{}.{}", ctx.qualified_name(class), name);
    ctx.has_qualified(&qname)
}

fn trailing_segment(dotted: &str) -> &str {
    dotted.rsplit('.').next().unwrap_or(dotted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::content_hash;

    fn extract(source: &str) -> ParseUnit {
        let adapter = PythonAdapter::new();
        let hash = content_hash(source.as_bytes());
        adapter
            .extract(&ExtractRequest {
                path: "pkg/shapes.py",
                source,
                content_hash: &hash,
                timeout: None,
            })
            .unwrap()
    }

    fn find<'u>(unit: &'u ParseUnit, name: &str) -> &'u crate::definition::Definition {
        unit.definitions
            .iter()
            .find(|d| d.name == name)
            .unwrap_or_else(|| panic!("definition {} not found", name))
    }

    #[test]
    fn test_class_with_methods() {
        let unit = extract(
            r#"class Shape:
    """Base shape."""

    def area(self):
        raise NotImplementedError

    def perimeter(self):
        raise NotImplementedError
"#,
        );

        let class = find(&unit, "Shape");
        assert_eq!(class.kind, DefKind::Class);
        assert_eq!(class.doc_comment.as_deref(), Some("\"\"\"Base shape.\"\"\""));

        let methods: Vec<_> = unit
            .definitions
            .iter()
            .filter(|d| d.kind == DefKind::Method)
            .collect();
        assert_eq!(methods.len(), 2);
        for m in methods {
            assert_eq!(m.container.as_ref(), Some(&class.id));
        }
    }

    #[test]
    fn test_inheritance_resolves_in_file() {
        let unit = extract(
            "class Shape:\n    pass\n\nclass Circle(Shape):\n    def area(self):\n        return 0\n",
        );
        let shape = find(&unit, "Shape");
        let circle = find(&unit, "Circle");

        let inherits: Vec<_> = unit.edges.iter().filter(|e| e.kind == EdgeKind::Inherits).collect();
        assert_eq!(inherits.len(), 1);
        assert_eq!(inherits[0].from, circle.id);
        assert_eq!(inherits[0].to.def_id(), Some(&shape.id));
    }

    #[test]
    fn test_abc_base_marks_abstract() {
        let unit = extract(
            "from abc import ABC, abstractmethod\n\nclass Shape(ABC):\n    @abstractmethod\n    def area(self):\n        ...\n",
        );
        assert!(find(&unit, "Shape").modifiers.is_abstract);
        assert!(find(&unit, "area").modifiers.is_abstract);
    }

    #[test]
    fn test_dataclass_maps_to_value_semantics() {
        let unit = extract(
            "from dataclasses import dataclass\n\n@dataclass\nclass Point:\n    x: int = 0\n",
        );
        let point = find(&unit, "Point");
        assert_eq!(point.kind, DefKind::Class);
        assert!(point.modifiers.value_semantics);
        assert_eq!(point.decorators.len(), 1);
        assert_eq!(point.decorators[0].name, "dataclass");
    }

    #[test]
    fn test_lambda_gets_synthetic_name() {
        let unit = extract("AREA = lambda r: 3.14 * r * r\n");
        let var = find(&unit, "AREA");
        assert_eq!(var.kind, DefKind::Variable);

        let synthetic = unit
            .definitions
            .iter()
            .find(|d| d.kind == DefKind::Function)
            .expect("lambda emitted as function");
        assert!(synthetic.name.contains('#'), "synthetic name has ordinal: {}", synthetic.name);
    }

    #[test]
    fn test_async_generator_flags() {
        let unit = extract(
            "async def fetch(url):\n    pass\n\ndef numbers():\n    yield 1\n",
        );
        assert!(find(&unit, "fetch").modifiers.is_async);
        assert!(!find(&unit, "fetch").modifiers.is_generator);
        assert!(find(&unit, "numbers").modifiers.is_generator);
    }

    #[test]
    fn test_init_fields_attach_to_class() {
        let unit = extract(
            "class Circle:\n    def __init__(self, radius):\n        self.radius = radius\n",
        );
        let circle = find(&unit, "Circle");
        let radius = find(&unit, "radius");
        assert_eq!(radius.kind, DefKind::Field);
        assert_eq!(radius.container.as_ref(), Some(&circle.id));
        assert!(!radius.modifiers.synthesized);
    }

    #[test]
    fn test_monkey_patch_is_synthesized() {
        let unit = extract(
            "class Widget:\n    pass\n\nWidget.count = 0\n",
        );
        let widget = find(&unit, "Widget");
        let count = find(&unit, "count");
        assert!(count.modifiers.synthesized);
        assert_eq!(count.container.as_ref(), Some(&widget.id));
    }

    #[test]
    fn test_call_reference_resolution() {
        let unit = extract(
            "def helper():\n    pass\n\ndef main():\n    helper()\n    missing()\n",
        );
        let helper = find(&unit, "helper");
        let main = find(&unit, "main");

        let refs: Vec<_> = unit.edges.iter().filter(|e| e.kind == EdgeKind::References).collect();
        assert!(refs.iter().any(|e| e.from == main.id && e.to.def_id() == Some(&helper.id)));
        assert!(refs.iter().any(|e| e.from == main.id && e.to.dangling_name() == Some("missing")));
    }

    #[test]
    fn test_private_names_not_exported() {
        let unit = extract("def _internal():\n    pass\n\ndef public():\n    pass\n");
        assert!(!find(&unit, "_internal").exported);
        assert_eq!(find(&unit, "_internal").visibility, Some(Visibility::Private));
        assert!(find(&unit, "public").exported);
    }

    #[test]
    fn test_signature_with_types() {
        let unit = extract("def scale(factor: float, *args) -> float:\n    return factor\n");
        let sig = find(&unit, "scale").signature.as_ref().unwrap();
        assert_eq!(sig.params.len(), 2);
        assert_eq!(sig.params[0].name, "factor");
        assert_eq!(sig.params[0].type_hint.as_deref(), Some("float"));
        assert_eq!(sig.params[1].name, "*args");
        assert_eq!(sig.return_type.as_deref(), Some("float"));
    }
}
