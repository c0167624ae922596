//! JavaScript language adapter, plus the shared ECMAScript walker.
//!
//! TypeScript is the same walk over a superset grammar, so the walker matches
//! both dialects' node kinds; TS-only kinds simply never appear in JS trees.
//! The [`TypeScriptAdapter`](super::typescript::TypeScriptAdapter) reuses
//! everything here.

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

/// Grammar-node to definition-kind table (JavaScript subset).
const KIND_MAP: &[(&str, DefKind)] = &[
    ("class_declaration", DefKind::Class),
    ("function_declaration", DefKind::Function),
    ("generator_function_declaration", DefKind::Function),
    ("method_definition", DefKind::Method),
    ("field_definition", DefKind::Field),
    ("variable_declarator", DefKind::Variable),
    ("arrow_function", DefKind::Function),
    ("function_expression", DefKind::Function),
];

/// JavaScript language adapter
#[derive(Default)]
pub struct JavaScriptAdapter;

impl JavaScriptAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl SyntaxAdapter for JavaScriptAdapter {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn display_name(&self) -> &'static str {
        "JavaScript"
    }

    fn kind_map(&self) -> &'static [(&'static str, DefKind)] {
        KIND_MAP
    }

    fn extract(&self, req: &ExtractRequest<'_>) -> Result<ParseUnit> {
        extract_ecma(Language::JavaScript, req)
    }
}

/// Shared entry point for JS/TS/TSX extraction.
pub(crate) fn extract_ecma(language: Language, req: &ExtractRequest<'_>) -> Result<ParseUnit> {
    let Some(analysis) = analyzer::parse(language, req.source, req.timeout)? else {
        return Ok(timeout_unit(language, req));
    };

    let mut ctx = Extraction::new(language, req.path, req.source);
    let module = ctx.module_id();
    let state = WalkState {
        scope: ScopeId::root(),
        owner: module,
        exported: false,
    };
    walk(&mut ctx, analysis.tree.root_node(), &state);
    Ok(ctx.finish(req.content_hash, analysis.diagnostics))
}

#[derive(Clone)]
struct WalkState {
    scope: ScopeId,
    owner: DefId,
    /// Inside an `export` statement
    exported: bool,
}

impl WalkState {
    fn container(&self, ctx: &Extraction) -> Option<DefId> {
        if self.owner != ctx.module_id() {
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
            "ERROR" | "comment" => continue,
            "export_statement" => {
                let exported = WalkState { exported: true, ..state.clone() };
                if let Some(declaration) = child.child_by_field_name("declaration") {
                    dispatch_declaration(ctx, declaration, &exported);
                } else if let Some(value) = child.child_by_field_name("value") {
                    // export default <expression>
                    if is_function_value(value.kind()) {
                        handle_anonymous_function(ctx, value, &exported);
                    } else {
                        walk(ctx, child, &exported);
                    }
                }
            }
            "import_statement" => {}
            _ => dispatch_declaration(ctx, child, state),
        }
    }
}

fn dispatch_declaration(ctx: &mut Extraction, node: Node, state: &WalkState) {
    match node.kind() {
        "ERROR" | "comment" => {}
        "class_declaration" | "abstract_class_declaration" => handle_class(ctx, node, state),
        "function_declaration" | "generator_function_declaration" => handle_function(ctx, node, state),
        "lexical_declaration" | "variable_declaration" => handle_var_declaration(ctx, node, state),
        "interface_declaration" => handle_interface(ctx, node, state),
        "enum_declaration" => handle_enum(ctx, node, state),
        "type_alias_declaration" => handle_type_alias(ctx, node, state),
        "internal_module" | "module" => handle_namespace(ctx, node, state),
        "statement_block" => {
            let block = ctx.push_scope(state.scope, ScopeKind::Block);
            let inner = WalkState { scope: block, ..state.clone() };
            walk(ctx, node, &inner);
        }
        "call_expression" => handle_call(ctx, node, state),
        "new_expression" => {
            if let Some(constructor) = node.child_by_field_name("constructor") {
                if constructor.kind() == "identifier" {
                    let name = node_text(&constructor, ctx.source).to_string();
                    ctx.add_ref(state.scope, name, &state.owner);
                }
            }
            if let Some(arguments) = node.child_by_field_name("arguments") {
                walk(ctx, arguments, state);
            }
        }
        kind if is_function_value(kind) => {
            handle_anonymous_function(ctx, node, state);
        }
        _ => walk(ctx, node, state),
    }
}

fn handle_class(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();

    let mut modifiers = Modifiers::default();
    modifiers.is_abstract = node.kind() == "abstract_class_declaration";

    let decorators = collect_decorators(ctx, node);
    let doc = jsdoc_above(anchor_for_doc(node), ctx.source);
    let container = state.container(ctx);

    let mut builder = ctx
        .def(&name, DefKind::Class, node_span(&node))
        .bind(state.scope)
        .modifiers(modifiers)
        .doc(doc)
        .decorators(decorators)
        .exported(state.exported);
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    let class_id = builder.finish();

    collect_heritage(ctx, node, state.scope, &class_id);

    if let Some(body) = node.child_by_field_name("body") {
        let class_scope = ctx.push_scope(state.scope, ScopeKind::Class);
        walk_class_body(ctx, body, class_scope, &class_id);
    }
}

/// `extends`/`implements` clauses; JS puts the base expression directly in
/// `class_heritage`, TS nests `extends_clause`/`implements_clause` inside it.
fn collect_heritage(ctx: &mut Extraction, class_node: Node, scope: ScopeId, class_id: &DefId) {
    let mut cursor = class_node.walk();
    for child in class_node.named_children(&mut cursor) {
        if child.kind() != "class_heritage" {
            continue;
        }
        let mut inner = child.walk();
        let mut saw_clause = false;
        for clause in child.named_children(&mut inner) {
            match clause.kind() {
                "extends_clause" => {
                    saw_clause = true;
                    add_heritage_names(ctx, clause, scope, class_id, EdgeKind::Inherits);
                }
                "implements_clause" => {
                    saw_clause = true;
                    add_heritage_names(ctx, clause, scope, class_id, EdgeKind::Implements);
                }
                _ => {}
            }
        }
        if !saw_clause {
            // JavaScript: `class_heritage` is just `extends <expression>`
            add_heritage_names(ctx, child, scope, class_id, EdgeKind::Inherits);
        }
    }
}

fn add_heritage_names(ctx: &mut Extraction, clause: Node, scope: ScopeId, from: &DefId, kind: EdgeKind) {
    let mut cursor = clause.walk();
    for target in clause.named_children(&mut cursor) {
        match target.kind() {
            "type_arguments" | "comment" => continue,
            _ => {
                let text = node_text(&target, ctx.source);
                let name = text.split('<').next().unwrap_or(text).trim().to_string();
                if !name.is_empty() {
                    ctx.add_super(scope, name, from, kind);
                }
            }
        }
    }
}

fn walk_class_body(ctx: &mut Extraction, body: Node, class_scope: ScopeId, class_id: &DefId) {
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "method_definition" | "abstract_method_signature" | "method_signature" => {
                handle_method(ctx, member, class_scope, class_id);
            }
            "field_definition" | "public_field_definition" => {
                handle_field(ctx, member, class_scope, class_id);
            }
            _ => {}
        }
    }
}

fn handle_method(ctx: &mut Extraction, node: Node, class_scope: ScopeId, class_id: &DefId) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();

    let mut modifiers = Modifiers::default();
    let mut kind = DefKind::Method;
    let mut visibility = None;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "static" => modifiers.is_static = true,
            "async" => modifiers.is_async = true,
            "*" => modifiers.is_generator = true,
            "get" | "set" => kind = DefKind::Property,
            "readonly" => modifiers.is_readonly = true,
            "override_modifier" => modifiers.is_override = true,
            "accessibility_modifier" => visibility = ts_visibility(node_text(&child, ctx.source)),
            _ => {}
        }
    }
    if node.kind() == "abstract_method_signature" || node.kind() == "method_signature" {
        modifiers.is_abstract = true;
    }

    let signature = callable_signature(ctx, node);
    let param_names: Vec<String> = signature.params.iter().map(|p| p.name.clone()).collect();
    let decorators = collect_decorators(ctx, node);
    let doc = jsdoc_above(node, ctx.source);

    let method_id = ctx
        .def(&name, kind, node_span(&node))
        .contained_by(class_id)
        .bind(class_scope)
        .visibility(visibility)
        .modifiers(modifiers)
        .signature(signature)
        .doc(doc)
        .decorators(decorators)
        .finish();

    if let Some(body) = node.child_by_field_name("body") {
        let method_scope = ctx.push_scope(class_scope, ScopeKind::Function);
        for param in &param_names {
            ctx.scopes.bind_local(method_scope, param.trim_start_matches("..."));
        }
        let inner = WalkState {
            scope: method_scope,
            owner: method_id,
            exported: false,
        };
        walk(ctx, body, &inner);
    }
}

fn handle_field(ctx: &mut Extraction, node: Node, class_scope: ScopeId, class_id: &DefId) {
    let Some(name_node) = node.child_by_field_name("property") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();

    let mut modifiers = Modifiers::default();
    let mut visibility = None;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "static" => modifiers.is_static = true,
            "readonly" => modifiers.is_readonly = true,
            "abstract" => modifiers.is_abstract = true,
            "accessibility_modifier" => visibility = ts_visibility(node_text(&child, ctx.source)),
            _ => {}
        }
    }

    let decorators = collect_decorators(ctx, node);
    let field_id = ctx
        .def(&name, DefKind::Field, node_span(&node))
        .contained_by(class_id)
        .bind(class_scope)
        .visibility(visibility)
        .modifiers(modifiers)
        .decorators(decorators)
        .finish();

    // A function-valued field is also an addressable callable.
    if let Some(value) = node.child_by_field_name("value") {
        if is_function_value(value.kind()) {
            let inner = WalkState {
                scope: class_scope,
                owner: field_id,
                exported: false,
            };
            handle_anonymous_function(ctx, value, &inner);
        }
    }
}

fn handle_function(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();

    let mut modifiers = Modifiers::default();
    modifiers.is_generator = node.kind() == "generator_function_declaration";
    modifiers.is_async = has_keyword_child(node, "async");

    let signature = callable_signature(ctx, node);
    let param_names: Vec<String> = signature.params.iter().map(|p| p.name.clone()).collect();
    let doc = jsdoc_above(anchor_for_doc(node), ctx.source);
    let container = state.container(ctx);

    let mut builder = ctx
        .def(&name, DefKind::Function, node_span(&node))
        .bind(state.scope)
        .modifiers(modifiers)
        .signature(signature)
        .doc(doc)
        .exported(state.exported);
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    let def_id = builder.finish();

    if let Some(body) = node.child_by_field_name("body") {
        let func_scope = ctx.push_scope(state.scope, ScopeKind::Function);
        for param in &param_names {
            ctx.scopes.bind_local(func_scope, param.trim_start_matches("..."));
        }
        let inner = WalkState {
            scope: func_scope,
            owner: def_id,
            exported: false,
        };
        walk(ctx, body, &inner);
    }
}

fn handle_var_declaration(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let readonly = node
        .child(0)
        .map(|c| c.kind() == "const")
        .unwrap_or(false);

    let mut cursor = node.walk();
    for declarator in node.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name_node) = declarator.child_by_field_name("name") else {
            continue;
        };
        if name_node.kind() != "identifier" {
            // Destructuring patterns bind locals only.
            continue;
        }
        let name = node_text(&name_node, ctx.source).to_string();
        // Module/namespace level declarations are definitions; function and
        // block locals only bind in their frame.
        let module_level = matches!(ctx.scopes.kind(state.scope), Some(ScopeKind::Module));

        if module_level {
            let mut modifiers = Modifiers::default();
            modifiers.is_readonly = readonly;
            let doc = jsdoc_above(anchor_for_doc(node), ctx.source);
            let container = state.container(ctx);

            let mut builder = ctx
                .def(&name, DefKind::Variable, node_span(&declarator))
                .bind(state.scope)
                .modifiers(modifiers)
                .doc(doc)
                .exported(state.exported);
            if let Some(container) = &container {
                builder = builder.contained_by(container);
            }
            builder.finish();
        } else {
            ctx.scopes.bind_local(state.scope, &name);
        }

        if let Some(value) = declarator.child_by_field_name("value") {
            if is_function_value(value.kind()) {
                handle_anonymous_function(ctx, value, state);
            } else {
                walk(ctx, value, state);
            }
        }
    }
}

/// Arrow functions and function expressions: Function definitions with a
/// synthetic `<enclosingScope>#<ordinal>` name so they stay addressable.
fn handle_anonymous_function(ctx: &mut Extraction, node: Node, state: &WalkState) -> DefId {
    let name = ctx.synthetic_name(&state.owner);

    let mut modifiers = Modifiers::default();
    modifiers.is_async = has_keyword_child(node, "async");
    modifiers.is_generator = has_keyword_child(node, "*");

    let signature = callable_signature(ctx, node);
    let param_names: Vec<String> = signature.params.iter().map(|p| p.name.clone()).collect();
    let container = state.container(ctx);

    let mut builder = ctx
        .def(&name, DefKind::Function, node_span(&node))
        .modifiers(modifiers)
        .signature(signature);
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    let def_id = builder.finish();

    if let Some(body) = node.child_by_field_name("body") {
        let func_scope = ctx.push_scope(state.scope, ScopeKind::Function);
        for param in &param_names {
            ctx.scopes.bind_local(func_scope, param.trim_start_matches("..."));
        }
        let inner = WalkState {
            scope: func_scope,
            owner: def_id.clone(),
            exported: false,
        };
        // Expression bodies (`x => x * 2`) have no statement block.
        if body.kind() == "statement_block" {
            walk(ctx, body, &inner);
        } else {
            dispatch_declaration(ctx, body, &inner);
        }
    }
    def_id
}

fn handle_interface(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();
    let doc = jsdoc_above(anchor_for_doc(node), ctx.source);
    let container = state.container(ctx);

    let mut builder = ctx
        .def(&name, DefKind::Interface, node_span(&node))
        .bind(state.scope)
        .doc(doc)
        .exported(state.exported);
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    let interface_id = builder.finish();

    // `interface A extends B, C`
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "extends_type_clause" || child.kind() == "extends_clause" {
            add_heritage_names(ctx, child, state.scope, &interface_id, EdgeKind::Inherits);
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        let iface_scope = ctx.push_scope(state.scope, ScopeKind::Class);
        let mut members = body.walk();
        for member in body.named_children(&mut members) {
            let Some(member_name) = member.child_by_field_name("name") else {
                continue;
            };
            let member_name = node_text(&member_name, ctx.source).to_string();
            match member.kind() {
                "property_signature" => {
                    ctx.def(&member_name, DefKind::Property, node_span(&member))
                        .contained_by(&interface_id)
                        .bind(iface_scope)
                        .finish();
                }
                "method_signature" => {
                    let mut modifiers = Modifiers::default();
                    modifiers.is_abstract = true;
                    let signature = callable_signature(ctx, member);
                    ctx.def(&member_name, DefKind::Method, node_span(&member))
                        .contained_by(&interface_id)
                        .bind(iface_scope)
                        .modifiers(modifiers)
                        .signature(signature)
                        .finish();
                }
                _ => {}
            }
        }
    }
}

fn handle_enum(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();
    let container = state.container(ctx);

    let mut builder = ctx
        .def(&name, DefKind::Enum, node_span(&node))
        .bind(state.scope)
        .exported(state.exported);
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    let enum_id = builder.finish();

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            let member_name = match member.kind() {
                "property_identifier" => Some(node_text(&member, ctx.source).to_string()),
                "enum_assignment" => member
                    .child_by_field_name("name")
                    .map(|n| node_text(&n, ctx.source).to_string()),
                _ => None,
            };
            if let Some(member_name) = member_name {
                ctx.def(&member_name, DefKind::Field, node_span(&member))
                    .contained_by(&enum_id)
                    .finish();
            }
        }
    }
}

/// Type aliases are named structural contracts; they land on Interface.
fn handle_type_alias(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();
    let container = state.container(ctx);

    let mut builder = ctx
        .def(&name, DefKind::Interface, node_span(&node))
        .bind(state.scope)
        .exported(state.exported);
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    builder.finish();
}

fn handle_namespace(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();
    let container = state.container(ctx);

    let mut builder = ctx
        .def(&name, DefKind::Namespace, node_span(&node))
        .bind(state.scope)
        .exported(state.exported);
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    let ns_id = builder.finish();

    if let Some(body) = node.child_by_field_name("body") {
        let ns_scope = ctx.push_scope(state.scope, ScopeKind::Module);
        let inner = WalkState {
            scope: ns_scope,
            owner: ns_id,
            exported: false,
        };
        walk(ctx, body, &inner);
    }
}

fn handle_call(ctx: &mut Extraction, node: Node, state: &WalkState) {
    if let Some(function) = node.child_by_field_name("function") {
        match function.kind() {
            "identifier" => {
                let name = node_text(&function, ctx.source).to_string();
                ctx.add_ref(state.scope, name, &state.owner);
            }
            "member_expression" => {
                if let Some(property) = function.child_by_field_name("property") {
                    let name = node_text(&property, ctx.source).to_string();
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

fn collect_decorators(ctx: &Extraction, node: Node) -> Vec<Decorator> {
    let mut decorators = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "decorator" {
            continue;
        }
        let Some(expr) = child.named_child(0) else {
            continue;
        };
        match expr.kind() {
            "identifier" | "member_expression" => decorators.push(Decorator {
                name: node_text(&expr, ctx.source).to_string(),
                arguments: Vec::new(),
            }),
            "call_expression" => {
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

/// Parameters + return type + generic parameter names.
pub(crate) fn callable_signature(ctx: &Extraction, node: Node) -> Signature {
    let mut signature = Signature::default();

    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "identifier" => signature.params.push(Param::new(node_text(&param, ctx.source))),
                "required_parameter" | "optional_parameter" => {
                    let name = param
                        .child_by_field_name("pattern")
                        .map(|n| node_text(&n, ctx.source))
                        .unwrap_or("");
                    match param.child_by_field_name("type") {
                        Some(ty) => signature
                            .params
                            .push(Param::typed(name, strip_annotation(node_text(&ty, ctx.source)))),
                        None => signature.params.push(Param::new(name)),
                    }
                }
                "assignment_pattern" => {
                    if let Some(left) = param.child_by_field_name("left") {
                        signature.params.push(Param::new(node_text(&left, ctx.source)));
                    }
                }
                "rest_pattern" | "object_pattern" | "array_pattern" => {
                    signature.params.push(Param::new(node_text(&param, ctx.source)));
                }
                _ => {}
            }
        }
    } else if let Some(single) = node.child_by_field_name("parameter") {
        // `x => x * 2` arrow shorthand
        signature.params.push(Param::new(node_text(&single, ctx.source)));
    }

    signature.return_type = node
        .child_by_field_name("return_type")
        .map(|n| strip_annotation(node_text(&n, ctx.source)).to_string());

    if let Some(type_params) = node.child_by_field_name("type_parameters") {
        let mut cursor = type_params.walk();
        for tp in type_params.named_children(&mut cursor) {
            signature.type_params.push(node_text(&tp, ctx.source).to_string());
        }
    }
    signature
}

fn strip_annotation(text: &str) -> &str {
    text.trim_start_matches(':').trim()
}

fn ts_visibility(text: &str) -> Option<Visibility> {
    match text {
        "public" => Some(Visibility::Public),
        "protected" => Some(Visibility::Protected),
        "private" => Some(Visibility::Private),
        _ => None,
    }
}

fn is_function_value(kind: &str) -> bool {
    matches!(kind, "arrow_function" | "function_expression" | "function" | "generator_function")
}

fn has_keyword_child(node: Node, keyword: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == keyword)
}

/// JSDoc block immediately above; exported declarations anchor on the
/// surrounding `export` statement since the comment sits above that.
fn anchor_for_doc(node: Node) -> Node {
    match node.parent() {
        Some(p) if p.kind() == "export_statement" => p,
        _ => node,
    }
}

fn jsdoc_above(node: Node, source: &str) -> Option<String> {
    doc_comment_above(node, source, &["comment"], &["decorator"], |text| {
        text.starts_with("/**")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::content_hash;

    fn extract(source: &str) -> ParseUnit {
        let adapter = JavaScriptAdapter::new();
        let hash = content_hash(source.as_bytes());
        adapter
            .extract(&ExtractRequest {
                path: "src/app.js",
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
    fn test_class_extends() {
        let unit = extract(
            "class Shape {\n  area() { return 0; }\n}\n\nclass Circle extends Shape {\n  area() { return 3.14; }\n}\n",
        );
        let shape = find(&unit, "Shape");
        let circle = find(&unit, "Circle");

        let inherits: Vec<_> = unit.edges.iter().filter(|e| e.kind == EdgeKind::Inherits).collect();
        assert_eq!(inherits.len(), 1);
        assert_eq!(inherits[0].from, circle.id);
        assert_eq!(inherits[0].to.def_id(), Some(&shape.id));

        // Same-name methods across the hierarchy produce an override edge.
        assert!(unit.edges.iter().any(|e| e.kind == EdgeKind::Overrides));
    }

    #[test]
    fn test_method_modifiers() {
        let unit = extract(
            "class Store {\n  static connect() {}\n  async load() {}\n  *entries() {}\n  get size() { return 0; }\n}\n",
        );
        assert!(find(&unit, "connect").modifiers.is_static);
        assert!(find(&unit, "load").modifiers.is_async);
        assert!(find(&unit, "entries").modifiers.is_generator);
        assert_eq!(find(&unit, "size").kind, DefKind::Property);
    }

    #[test]
    fn test_arrow_constant_gets_synthetic_function() {
        let unit = extract("const area = (r) => r * r;\n");
        let var = find(&unit, "area");
        assert_eq!(var.kind, DefKind::Variable);
        assert!(var.modifiers.is_readonly);

        let synthetic = unit
            .definitions
            .iter()
            .find(|d| d.kind == DefKind::Function)
            .expect("arrow function emitted");
        assert!(synthetic.name.contains('#'));
    }

    #[test]
    fn test_callback_lambda_is_distinct() {
        let unit = extract("const a = () => 1;\nconst b = () => 2;\n");
        let synthetics: Vec<_> = unit
            .definitions
            .iter()
            .filter(|d| d.kind == DefKind::Function)
            .collect();
        assert_eq!(synthetics.len(), 2);
        assert_ne!(synthetics[0].name, synthetics[1].name);
        assert_ne!(synthetics[0].id, synthetics[1].id);
    }

    #[test]
    fn test_export_flag() {
        let unit = extract("export function run() {}\n\nfunction helper() {}\n");
        assert!(find(&unit, "run").exported);
        assert!(!find(&unit, "helper").exported);
    }

    #[test]
    fn test_jsdoc_attached() {
        let unit = extract("/** Runs the job. */\nexport function run() {}\n");
        assert_eq!(find(&unit, "run").doc_comment.as_deref(), Some("/** Runs the job. */"));
    }

    #[test]
    fn test_call_references() {
        let unit = extract("function helper() {}\n\nfunction main() {\n  helper();\n  fetch('/x');\n}\n");
        let helper = find(&unit, "helper");
        let main = find(&unit, "main");

        let refs: Vec<_> = unit.edges.iter().filter(|e| e.kind == EdgeKind::References).collect();
        assert!(refs.iter().any(|e| e.from == main.id && e.to.def_id() == Some(&helper.id)));
        assert!(refs.iter().any(|e| e.from == main.id && e.to.dangling_name() == Some("fetch")));
    }

    #[test]
    fn test_class_field_counts() {
        let unit = extract("class Config {\n  host = 'localhost';\n  port = 8080;\n}\n");
        let config = find(&unit, "Config");
        let fields: Vec<_> = unit.definitions.iter().filter(|d| d.kind == DefKind::Field).collect();
        assert_eq!(fields.len(), 2);
        for f in fields {
            assert_eq!(f.container.as_ref(), Some(&config.id));
        }
    }
}
