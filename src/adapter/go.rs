//! Go language adapter.
//!
//! Structs, interfaces and functions extract directly; methods attach to
//! their receiver type by name the same way Rust impl methods do. Struct
//! embedding is Go's inheritance surface and becomes an Inherits edge.
//! Exported-ness follows the capitalization rule.

use tree_sitter::Node;

use crate::analyzer::{self, node_span};
use crate::definition::{DefKind, Modifiers, Param, Signature, Visibility};
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
/// A `type_spec` lands on Struct or Interface depending on its underlying
/// type; named types over non-composite types land on Interface like other
/// aliases.
const KIND_MAP: &[(&str, DefKind)] = &[
    ("function_declaration", DefKind::Function),
    ("method_declaration", DefKind::Method),
    ("struct_type", DefKind::Struct),
    ("interface_type", DefKind::Interface),
    ("type_spec", DefKind::Interface),
    ("field_declaration", DefKind::Field),
    ("method_elem", DefKind::Method),
    ("const_spec", DefKind::Variable),
    ("var_spec", DefKind::Variable),
];

/// Go language adapter
#[derive(Default)]
pub struct GoAdapter;

impl GoAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl SyntaxAdapter for GoAdapter {
    fn language(&self) -> Language {
        Language::Go
    }

    fn display_name(&self) -> &'static str {
        "Go"
    }

    fn kind_map(&self) -> &'static [(&'static str, DefKind)] {
        KIND_MAP
    }

    fn extract(&self, req: &ExtractRequest<'_>) -> Result<ParseUnit> {
        let Some(analysis) = analyzer::parse(Language::Go, req.source, req.timeout)? else {
            return Ok(timeout_unit(Language::Go, req));
        };

        let mut ctx = Extraction::new(Language::Go, req.path, req.source);
        let module = ctx.module_id();
        let state = WalkState { scope: ScopeId::root(), owner: module };
        walk(&mut ctx, analysis.tree.root_node(), &state);
        Ok(ctx.finish(req.content_hash, analysis.diagnostics))
    }
}

#[derive(Clone)]
struct WalkState {
    scope: ScopeId,
    owner: DefId,
}

fn walk(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "ERROR" | "comment" | "package_clause" | "import_declaration" => continue,
            "function_declaration" => handle_function(ctx, child, state),
            "method_declaration" => handle_method(ctx, child, state),
            "type_declaration" => handle_type_declaration(ctx, child, state),
            "const_declaration" | "var_declaration" => handle_value_declaration(ctx, child, state),
            "short_var_declaration" => {
                if let Some(left) = child.child_by_field_name("left") {
                    bind_identifier_locals(ctx, left, state.scope);
                }
                if let Some(right) = child.child_by_field_name("right") {
                    walk(ctx, right, state);
                }
            }
            "call_expression" => handle_call(ctx, child, state),
            "block" => {
                let block = ctx.push_scope(state.scope, ScopeKind::Block);
                let inner = WalkState { scope: block, owner: state.owner.clone() };
                walk(ctx, child, &inner);
            }
            "func_literal" => {
                handle_func_literal(ctx, child, state);
            }
            _ => walk(ctx, child, state),
        }
    }
}

fn handle_function(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();

    let signature = fn_signature(ctx, node);
    let param_names: Vec<String> = signature.params.iter().map(|p| p.name.clone()).collect();
    let doc = go_doc(node, ctx.source);

    let def_id = ctx
        .def(&name, DefKind::Function, node_span(&node))
        .bind(state.scope)
        .visibility(Some(go_visibility(&name)))
        .signature(signature)
        .doc(doc)
        .exported(is_exported(&name))
        .finish();

    walk_fn_body(ctx, node, state, def_id, &param_names);
}

fn handle_method(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();

    let Some(receiver_type) = receiver_type_name(ctx, node) else {
        return;
    };

    let signature = fn_signature(ctx, node);
    let param_names: Vec<String> = signature.params.iter().map(|p| p.name.clone()).collect();
    let doc = go_doc(node, ctx.source);

    let def_id = ctx
        .def(&name, DefKind::Method, node_span(&node))
        .member_of_named(&receiver_type)
        .visibility(Some(go_visibility(&name)))
        .signature(signature)
        .doc(doc)
        .exported(is_exported(&name))
        .finish();

    // The receiver binding (`func (p *Point) ...`) is a local in the body.
    let mut extra_locals = param_names.clone();
    if let Some(receiver_name) = receiver_binding_name(ctx, node) {
        extra_locals.push(receiver_name);
    }
    walk_fn_body(ctx, node, state, def_id, &extra_locals);
}

fn handle_type_declaration(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let mut cursor = node.walk();
    for spec in node.named_children(&mut cursor) {
        if spec.kind() != "type_spec" && spec.kind() != "type_alias" {
            continue;
        }
        let Some(name_node) = spec.child_by_field_name("name") else {
            continue;
        };
        let name = node_text(&name_node, ctx.source).to_string();
        let underlying = spec.child_by_field_name("type");

        // Doc sits above the whole declaration for single specs, above the
        // spec inside grouped `type (...)` blocks.
        let doc = go_doc(spec, ctx.source).or_else(|| go_doc(node, ctx.source));

        match underlying.map(|u| u.kind()) {
            Some("struct_type") => {
                let struct_id = ctx
                    .def(&name, DefKind::Struct, node_span(&spec))
                    .bind(state.scope)
                    .visibility(Some(go_visibility(&name)))
                    .doc(doc)
                    .exported(is_exported(&name))
                    .finish();
                if let Some(underlying) = underlying {
                    extract_struct_fields(ctx, underlying, &struct_id, &name);
                }
            }
            Some("interface_type") => {
                let iface_id = ctx
                    .def(&name, DefKind::Interface, node_span(&spec))
                    .bind(state.scope)
                    .visibility(Some(go_visibility(&name)))
                    .doc(doc)
                    .exported(is_exported(&name))
                    .finish();
                if let Some(underlying) = underlying {
                    extract_interface_members(ctx, underlying, &iface_id, &name);
                }
            }
            _ => {
                // Named type over a non-composite: a named contract.
                ctx.def(&name, DefKind::Interface, node_span(&spec))
                    .bind(state.scope)
                    .visibility(Some(go_visibility(&name)))
                    .doc(doc)
                    .exported(is_exported(&name))
                    .finish();
            }
        }
    }
}

fn extract_struct_fields(ctx: &mut Extraction, struct_type: Node, struct_id: &DefId, struct_name: &str) {
    let Some(field_list) = struct_type.named_child(0) else {
        return;
    };
    if field_list.kind() != "field_declaration_list" {
        return;
    }
    let mut cursor = field_list.walk();
    for field in field_list.named_children(&mut cursor) {
        if field.kind() != "field_declaration" {
            continue;
        }
        let mut named = Vec::new();
        let mut field_cursor = field.walk();
        for part in field.named_children(&mut field_cursor) {
            if part.kind() == "field_identifier" {
                named.push(node_text(&part, ctx.source).to_string());
            }
        }
        if named.is_empty() {
            // Embedded field: Go's inheritance surface.
            if let Some(ty) = field.child_by_field_name("type") {
                let base = embedded_type_name(ctx, ty);
                if !base.is_empty() {
                    ctx.add_deferred_super(struct_name, base, EdgeKind::Inherits);
                }
            }
            continue;
        }
        for field_name in named {
            let field_doc = go_doc(field, ctx.source);
            ctx.def(&field_name, DefKind::Field, node_span(&field))
                .contained_by(struct_id)
                .visibility(Some(go_visibility(&field_name)))
                .doc(field_doc)
                .exported(is_exported(&field_name))
                .finish();
        }
    }
}

fn extract_interface_members(
    ctx: &mut Extraction,
    interface_type: Node,
    iface_id: &DefId,
    iface_name: &str,
) {
    let mut cursor = interface_type.walk();
    for member in interface_type.named_children(&mut cursor) {
        match member.kind() {
            // Interface methods have no body: abstract by construction.
            "method_elem" | "method_spec" => {
                let Some(name_node) = member.child_by_field_name("name") else {
                    continue;
                };
                let name = node_text(&name_node, ctx.source).to_string();
                let mut modifiers = Modifiers::default();
                modifiers.is_abstract = true;
                let signature = fn_signature(ctx, member);
                ctx.def(&name, DefKind::Method, node_span(&member))
                    .contained_by(iface_id)
                    .visibility(Some(go_visibility(&name)))
                    .modifiers(modifiers)
                    .signature(signature)
                    .exported(is_exported(&name))
                    .finish();
            }
            // Embedded interface: inherits its contract.
            "type_identifier" | "qualified_type" | "type_elem" => {
                let base = embedded_type_name(ctx, member);
                if !base.is_empty() {
                    ctx.add_deferred_super(iface_name, base, EdgeKind::Inherits);
                }
            }
            _ => {}
        }
    }
}

fn handle_value_declaration(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let readonly = node.kind() == "const_declaration";
    let mut cursor = node.walk();
    for spec in node.named_children(&mut cursor) {
        if spec.kind() != "const_spec" && spec.kind() != "var_spec" {
            continue;
        }
        let mut spec_cursor = spec.walk();
        let names: Vec<String> = spec
            .named_children(&mut spec_cursor)
            .filter(|n| n.kind() == "identifier")
            .map(|n| node_text(&n, ctx.source).to_string())
            .collect();

        for name in names {
            if state.scope == ScopeId::root() {
                let mut modifiers = Modifiers::default();
                modifiers.is_readonly = readonly;
                let doc = go_doc(spec, ctx.source).or_else(|| go_doc(node, ctx.source));
                ctx.def(&name, DefKind::Variable, node_span(&spec))
                    .bind(state.scope)
                    .visibility(Some(go_visibility(&name)))
                    .modifiers(modifiers)
                    .doc(doc)
                    .exported(is_exported(&name))
                    .finish();
            } else {
                ctx.scopes.bind_local(state.scope, &name);
            }
        }

        if let Some(value) = spec.child_by_field_name("value") {
            walk(ctx, value, state);
        }
    }
}

/// Anonymous `func(...) {...}` literal: synthetic Function definition.
fn handle_func_literal(ctx: &mut Extraction, node: Node, state: &WalkState) -> DefId {
    let name = ctx.synthetic_name(&state.owner);
    let signature = fn_signature(ctx, node);
    let param_names: Vec<String> = signature.params.iter().map(|p| p.name.clone()).collect();
    let module = ctx.module_id();

    let mut builder = ctx.def(&name, DefKind::Function, node_span(&node)).signature(signature);
    if state.owner != module {
        builder = builder.contained_by(&state.owner.clone());
    }
    let def_id = builder.finish();

    walk_fn_body(ctx, node, state, def_id.clone(), &param_names);
    def_id
}

fn walk_fn_body(ctx: &mut Extraction, node: Node, state: &WalkState, owner: DefId, locals: &[String]) {
    let Some(body) = node.child_by_field_name("body") else {
        return;
    };
    let fn_scope = ctx.push_scope(state.scope, ScopeKind::Function);
    for local in locals {
        ctx.scopes.bind_local(fn_scope, local.as_str());
    }
    let inner = WalkState { scope: fn_scope, owner };
    walk(ctx, body, &inner);
}

fn handle_call(ctx: &mut Extraction, node: Node, state: &WalkState) {
    if let Some(function) = node.child_by_field_name("function") {
        match function.kind() {
            "identifier" => {
                let name = node_text(&function, ctx.source).to_string();
                ctx.add_ref(state.scope, name, &state.owner);
            }
            "selector_expression" => {
                if let Some(field) = function.child_by_field_name("field") {
                    let name = node_text(&field, ctx.source).to_string();
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

fn bind_identifier_locals(ctx: &mut Extraction, node: Node, scope: ScopeId) {
    if node.kind() == "identifier" {
        let name = node_text(&node, ctx.source).to_string();
        ctx.scopes.bind_local(scope, name);
        return;
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        bind_identifier_locals(ctx, child, scope);
    }
}

fn receiver_type_name(ctx: &Extraction, method: Node) -> Option<String> {
    let receiver = method.child_by_field_name("receiver")?;
    let mut cursor = receiver.walk();
    for param in receiver.named_children(&mut cursor) {
        if param.kind() == "parameter_declaration" {
            if let Some(ty) = param.child_by_field_name("type") {
                let name = embedded_type_name(ctx, ty);
                if !name.is_empty() {
                    return Some(name);
                }
            }
        }
    }
    None
}

fn receiver_binding_name(ctx: &Extraction, method: Node) -> Option<String> {
    let receiver = method.child_by_field_name("receiver")?;
    let mut cursor = receiver.walk();
    for param in receiver.named_children(&mut cursor) {
        if param.kind() == "parameter_declaration" {
            if let Some(name) = param.child_by_field_name("name") {
                return Some(node_text(&name, ctx.source).to_string());
            }
        }
    }
    None
}

/// Base type name with pointers, generics and package qualifiers stripped:
/// `*geo.Point` -> `Point`, `List[T]` -> `List`.
fn embedded_type_name(ctx: &Extraction, node: Node) -> String {
    let text = node_text(&node, ctx.source);
    let stripped = text.trim_start_matches('*');
    let no_generics = stripped.split('[').next().unwrap_or(stripped);
    no_generics
        .rsplit('.')
        .next()
        .unwrap_or(no_generics)
        .trim()
        .to_string()
}

fn fn_signature(ctx: &Extraction, node: Node) -> Signature {
    let mut signature = Signature::default();
    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            if param.kind() != "parameter_declaration" && param.kind() != "variadic_parameter_declaration" {
                continue;
            }
            let ty = param
                .child_by_field_name("type")
                .map(|t| node_text(&t, ctx.source).to_string());
            let mut names = Vec::new();
            let mut param_cursor = param.walk();
            for part in param.named_children(&mut param_cursor) {
                if part.kind() == "identifier" {
                    names.push(node_text(&part, ctx.source).to_string());
                }
            }
            if names.is_empty() {
                // Unnamed parameter: type-only, keep the type as the entry.
                if let Some(ty) = &ty {
                    signature.params.push(Param::new(ty.clone()));
                }
            } else {
                for name in names {
                    match &ty {
                        Some(ty) => signature.params.push(Param::typed(name, ty.clone())),
                        None => signature.params.push(Param::new(name)),
                    }
                }
            }
        }
    }
    signature.return_type = node
        .child_by_field_name("result")
        .map(|r| node_text(&r, ctx.source).to_string());
    if let Some(type_params) = node.child_by_field_name("type_parameters") {
        let mut cursor = type_params.walk();
        for tp in type_params.named_children(&mut cursor) {
            signature.type_params.push(node_text(&tp, ctx.source).to_string());
        }
    }
    signature
}

fn go_doc(node: Node, source: &str) -> Option<String> {
    doc_comment_above(node, source, &["comment"], &[], |_| true)
}

fn go_visibility(name: &str) -> Visibility {
    if is_exported(name) {
        Visibility::Public
    } else {
        Visibility::Private
    }
}

fn is_exported(name: &str) -> bool {
    name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}
