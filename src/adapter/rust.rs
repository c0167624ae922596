//! Rust language adapter.
//!
//! Structs, enums, traits and free functions extract directly; `impl` blocks
//! are not definitions themselves - their methods attach to the implemented
//! type by name, and `impl Trait for Type` becomes an Implements edge once
//! the walk knows the type's ID. Attributes are captured as decorators and
//! `#[derive(Copy, ...)]` marks value semantics.

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
/// `function_item` lands on Method inside traits and impl blocks; unions ride
/// along as structs; type aliases are named contracts and land on Interface.
const KIND_MAP: &[(&str, DefKind)] = &[
    ("struct_item", DefKind::Struct),
    ("union_item", DefKind::Struct),
    ("enum_item", DefKind::Enum),
    ("enum_variant", DefKind::Field),
    ("trait_item", DefKind::Trait),
    ("function_item", DefKind::Function),
    ("function_signature_item", DefKind::Method),
    ("mod_item", DefKind::Namespace),
    ("type_item", DefKind::Interface),
    ("const_item", DefKind::Variable),
    ("static_item", DefKind::Variable),
    ("field_declaration", DefKind::Field),
];

/// Rust language adapter
#[derive(Default)]
pub struct RustAdapter;

impl RustAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl SyntaxAdapter for RustAdapter {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn display_name(&self) -> &'static str {
        "Rust"
    }

    fn kind_map(&self) -> &'static [(&'static str, DefKind)] {
        KIND_MAP
    }

    fn extract(&self, req: &ExtractRequest<'_>) -> Result<ParseUnit> {
        let Some(analysis) = analyzer::parse(Language::Rust, req.source, req.timeout)? else {
            return Ok(timeout_unit(Language::Rust, req));
        };

        let mut ctx = Extraction::new(Language::Rust, req.path, req.source);
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
            "ERROR" | "line_comment" | "block_comment" | "attribute_item"
            | "inner_attribute_item" | "use_declaration" | "extern_crate_declaration" => continue,
            "struct_item" | "union_item" => handle_struct(ctx, child, state),
            "enum_item" => handle_enum(ctx, child, state),
            "trait_item" => handle_trait(ctx, child, state),
            "impl_item" => handle_impl(ctx, child, state),
            "function_item" => {
                handle_function(ctx, child, state, DefKind::Function, None);
            }
            "mod_item" => handle_mod(ctx, child, state),
            "const_item" | "static_item" => handle_const(ctx, child, state),
            "type_item" => handle_type_alias(ctx, child, state),
            "let_declaration" => {
                if let Some(pattern) = child.child_by_field_name("pattern") {
                    bind_pattern_locals(ctx, pattern, state.scope);
                }
                if let Some(value) = child.child_by_field_name("value") {
                    walk(ctx, value, state);
                }
            }
            "call_expression" => handle_call(ctx, child, state),
            "block" => {
                let block = ctx.push_scope(state.scope, ScopeKind::Block);
                let inner = WalkState { scope: block, owner: state.owner.clone() };
                walk(ctx, child, &inner);
            }
            _ => walk(ctx, child, state),
        }
    }
}

fn handle_struct(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();

    let decorators = collect_attributes(ctx, node);
    let mut modifiers = Modifiers::default();
    modifiers.value_semantics = derives(&decorators, "Copy");

    let visibility = item_visibility(ctx, node);
    let doc = rust_doc(node, ctx.source);
    let container = state.container(ctx);
    let signature = generics_signature(ctx, node);

    let mut builder = ctx
        .def(&name, DefKind::Struct, node_span(&node))
        .bind(state.scope)
        .visibility(visibility)
        .modifiers(modifiers)
        .doc(doc)
        .decorators(decorators)
        .exported(visibility == Some(Visibility::Public));
    if let Some(sig) = signature {
        builder = builder.signature(sig);
    }
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    let struct_id = builder.finish();

    if let Some(body) = node.child_by_field_name("body") {
        if body.kind() == "field_declaration_list" {
            let mut cursor = body.walk();
            for field in body.named_children(&mut cursor) {
                if field.kind() != "field_declaration" {
                    continue;
                }
                let Some(field_name) = field.child_by_field_name("name") else {
                    continue;
                };
                let field_name = node_text(&field_name, ctx.source).to_string();
                let field_vis = item_visibility(ctx, field);
                let field_doc = rust_doc(field, ctx.source);
                ctx.def(&field_name, DefKind::Field, node_span(&field))
                    .contained_by(&struct_id)
                    .visibility(field_vis)
                    .doc(field_doc)
                    .finish();
            }
        }
    }
}

fn handle_enum(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();

    let decorators = collect_attributes(ctx, node);
    let mut modifiers = Modifiers::default();
    modifiers.value_semantics = derives(&decorators, "Copy");

    let visibility = item_visibility(ctx, node);
    let doc = rust_doc(node, ctx.source);
    let container = state.container(ctx);

    let mut builder = ctx
        .def(&name, DefKind::Enum, node_span(&node))
        .bind(state.scope)
        .visibility(visibility)
        .modifiers(modifiers)
        .doc(doc)
        .decorators(decorators)
        .exported(visibility == Some(Visibility::Public));
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    let enum_id = builder.finish();

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for variant in body.named_children(&mut cursor) {
            if variant.kind() != "enum_variant" {
                continue;
            }
            let Some(variant_name) = variant.child_by_field_name("name") else {
                continue;
            };
            let variant_name = node_text(&variant_name, ctx.source).to_string();
            let variant_doc = rust_doc(variant, ctx.source);
            ctx.def(&variant_name, DefKind::Field, node_span(&variant))
                .contained_by(&enum_id)
                .doc(variant_doc)
                .finish();
        }
    }
}

fn handle_trait(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();

    let visibility = item_visibility(ctx, node);
    let doc = rust_doc(node, ctx.source);
    let decorators = collect_attributes(ctx, node);
    let container = state.container(ctx);

    let mut builder = ctx
        .def(&name, DefKind::Trait, node_span(&node))
        .bind(state.scope)
        .visibility(visibility)
        .doc(doc)
        .decorators(decorators)
        .exported(visibility == Some(Visibility::Public));
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    let trait_id = builder.finish();

    // Supertraits: `trait Shape: Draw + Debug`
    if let Some(bounds) = node.child_by_field_name("bounds") {
        let mut cursor = bounds.walk();
        for bound in bounds.named_children(&mut cursor) {
            let base = type_base_name(&bound, ctx.source);
            if !base.is_empty() {
                ctx.add_super(state.scope, base, &trait_id, EdgeKind::Inherits);
            }
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        let trait_scope = ctx.push_scope(state.scope, ScopeKind::Class);
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "function_item" => {
                    let inner = WalkState { scope: trait_scope, owner: trait_id.clone() };
                    handle_function(ctx, member, &inner, DefKind::Method, None);
                }
                "function_signature_item" => {
                    let inner = WalkState { scope: trait_scope, owner: trait_id.clone() };
                    handle_function(ctx, member, &inner, DefKind::Method, Some(true));
                }
                _ => {}
            }
        }
    }
}

fn handle_impl(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let Some(type_node) = node.child_by_field_name("type") else {
        return;
    };
    let type_name = type_base_name(&type_node, ctx.source);
    if type_name.is_empty() {
        return;
    }

    if let Some(trait_node) = node.child_by_field_name("trait") {
        let trait_name = type_base_name(&trait_node, ctx.source);
        if !trait_name.is_empty() {
            ctx.add_deferred_super(type_name.clone(), trait_name, EdgeKind::Implements);
        }
    }

    let Some(body) = node.child_by_field_name("body") else {
        return;
    };
    // Methods of one impl share a frame so `self.helper()` resolves to a
    // sibling method.
    let impl_scope = ctx.push_scope(state.scope, ScopeKind::Class);
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "function_item" => {
                let inner = WalkState { scope: impl_scope, owner: state.owner.clone() };
                handle_method_of(ctx, member, &inner, &type_name);
            }
            "const_item" => {
                if let Some(name_node) = member.child_by_field_name("name") {
                    let member_name = node_text(&name_node, ctx.source).to_string();
                    let vis = item_visibility(ctx, member);
                    ctx.def(&member_name, DefKind::Field, node_span(&member))
                        .member_of_named(&type_name)
                        .visibility(vis)
                        .finish();
                }
            }
            _ => {}
        }
    }
}

/// A method inside an `impl` block: attached to the type by name, static when
/// it takes no `self`.
fn handle_method_of(ctx: &mut Extraction, node: Node, state: &WalkState, type_name: &str) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();

    let mut modifiers = Modifiers::default();
    modifiers.is_async = has_fn_modifier(ctx, node, "async");
    modifiers.is_static = !has_self_parameter(node);

    let visibility = item_visibility(ctx, node);
    let signature = fn_signature(ctx, node);
    let param_names: Vec<String> = signature.params.iter().map(|p| p.name.clone()).collect();
    let doc = rust_doc(node, ctx.source);
    let decorators = collect_attributes(ctx, node);

    let method_id = ctx
        .def(&name, DefKind::Method, node_span(&node))
        .member_of_named(type_name)
        .bind(state.scope)
        .visibility(visibility)
        .modifiers(modifiers)
        .signature(signature)
        .doc(doc)
        .decorators(decorators)
        .exported(visibility == Some(Visibility::Public))
        .finish();

    walk_fn_body(ctx, node, state, method_id, &param_names);
}

fn handle_function(
    ctx: &mut Extraction,
    node: Node,
    state: &WalkState,
    kind: DefKind,
    force_abstract: Option<bool>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();

    let mut modifiers = Modifiers::default();
    modifiers.is_async = has_fn_modifier(ctx, node, "async");
    modifiers.is_abstract = force_abstract.unwrap_or(false);

    let visibility = item_visibility(ctx, node);
    let signature = fn_signature(ctx, node);
    let param_names: Vec<String> = signature.params.iter().map(|p| p.name.clone()).collect();
    let doc = rust_doc(node, ctx.source);
    let decorators = collect_attributes(ctx, node);
    let container = state.container(ctx);

    let mut builder = ctx
        .def(&name, kind, node_span(&node))
        .bind(state.scope)
        .visibility(visibility)
        .modifiers(modifiers)
        .signature(signature)
        .doc(doc)
        .decorators(decorators)
        .exported(visibility == Some(Visibility::Public));
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    let def_id = builder.finish();

    walk_fn_body(ctx, node, state, def_id, &param_names);
}

fn walk_fn_body(ctx: &mut Extraction, node: Node, state: &WalkState, owner: DefId, params: &[String]) {
    let Some(body) = node.child_by_field_name("body") else {
        return;
    };
    let fn_scope = ctx.push_scope(state.scope, ScopeKind::Function);
    for param in params {
        ctx.scopes.bind_local(fn_scope, param.as_str());
    }
    let inner = WalkState { scope: fn_scope, owner };
    walk(ctx, body, &inner);
}

fn handle_mod(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();

    let visibility = item_visibility(ctx, node);
    let doc = rust_doc(node, ctx.source);
    let container = state.container(ctx);

    let mut builder = ctx
        .def(&name, DefKind::Namespace, node_span(&node))
        .bind(state.scope)
        .visibility(visibility)
        .doc(doc)
        .exported(visibility == Some(Visibility::Public));
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    let mod_id = builder.finish();

    if let Some(body) = node.child_by_field_name("body") {
        let mod_scope = ctx.push_scope(state.scope, ScopeKind::Module);
        let inner = WalkState { scope: mod_scope, owner: mod_id };
        walk(ctx, body, &inner);
    }
}

fn handle_const(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();

    let visibility = item_visibility(ctx, node);
    let doc = rust_doc(node, ctx.source);
    let container = state.container(ctx);
    let mut modifiers = Modifiers::default();
    modifiers.is_readonly = node.kind() == "const_item";

    let mut builder = ctx
        .def(&name, DefKind::Variable, node_span(&node))
        .bind(state.scope)
        .visibility(visibility)
        .modifiers(modifiers)
        .doc(doc)
        .exported(visibility == Some(Visibility::Public));
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    builder.finish();
}

fn handle_type_alias(ctx: &mut Extraction, node: Node, state: &WalkState) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, ctx.source).to_string();

    let visibility = item_visibility(ctx, node);
    let doc = rust_doc(node, ctx.source);
    let container = state.container(ctx);

    let mut builder = ctx
        .def(&name, DefKind::Interface, node_span(&node))
        .bind(state.scope)
        .visibility(visibility)
        .doc(doc)
        .exported(visibility == Some(Visibility::Public));
    if let Some(container) = &container {
        builder = builder.contained_by(container);
    }
    builder.finish();
}

fn handle_call(ctx: &mut Extraction, node: Node, state: &WalkState) {
    if let Some(function) = node.child_by_field_name("function") {
        match function.kind() {
            "identifier" => {
                let name = node_text(&function, ctx.source).to_string();
                ctx.add_ref(state.scope, name, &state.owner);
            }
            "field_expression" => {
                if let Some(field) = function.child_by_field_name("field") {
                    let name = node_text(&field, ctx.source).to_string();
                    ctx.add_ref(state.scope, name, &state.owner);
                }
            }
            "scoped_identifier" => {
                if let Some(segment) = function.child_by_field_name("name") {
                    let name = node_text(&segment, ctx.source).to_string();
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

fn bind_pattern_locals(ctx: &mut Extraction, pattern: Node, scope: ScopeId) {
    match pattern.kind() {
        "identifier" => {
            let name = node_text(&pattern, ctx.source).to_string();
            ctx.scopes.bind_local(scope, name);
        }
        _ => {
            let mut cursor = pattern.walk();
            for child in pattern.named_children(&mut cursor) {
                bind_pattern_locals(ctx, child, scope);
            }
        }
    }
}

/// Attributes above an item, captured as decorators; `derive` arguments are
/// split out so individual trait names stay queryable.
fn collect_attributes(ctx: &Extraction, node: Node) -> Vec<Decorator> {
    let mut decorators = Vec::new();
    let mut current = node.prev_sibling();
    while let Some(sib) = current {
        match sib.kind() {
            "attribute_item" => {
                if let Some(attribute) = sib.named_child(0) {
                    let name = attribute
                        .named_child(0)
                        .map(|n| node_text(&n, ctx.source).to_string())
                        .unwrap_or_default();
                    let arguments = match attribute.child_by_field_name("arguments") {
                        Some(args) => {
                            let inner = node_text(&args, ctx.source)
                                .trim_start_matches('(')
                                .trim_end_matches(')');
                            if name == "derive" {
                                inner.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
                            } else if inner.is_empty() {
                                Vec::new()
                            } else {
                                vec![inner.to_string()]
                            }
                        }
                        None => Vec::new(),
                    };
                    decorators.push(Decorator { name, arguments });
                }
            }
            "line_comment" | "block_comment" => {}
            _ => break,
        }
        current = sib.prev_sibling();
    }
    decorators.reverse();
    decorators
}

fn derives(decorators: &[Decorator], trait_name: &str) -> bool {
    decorators
        .iter()
        .any(|d| d.name == "derive" && d.arguments.iter().any(|a| a == trait_name))
}

fn item_visibility(ctx: &Extraction, node: Node) -> Option<Visibility> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "visibility_modifier" {
            let text = node_text(&child, ctx.source);
            return Some(if text == "pub" {
                Visibility::Public
            } else {
                // pub(crate), pub(super), pub(in ...)
                Visibility::Protected
            });
        }
    }
    Some(Visibility::Private)
}

fn rust_doc(node: Node, source: &str) -> Option<String> {
    doc_comment_above(
        node,
        source,
        &["line_comment", "block_comment"],
        &["attribute_item"],
        |text| text.starts_with("///") || text.starts_with("/**"),
    )
}

fn fn_signature(ctx: &Extraction, node: Node) -> Signature {
    let mut signature = Signature::default();
    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "parameter" => {
                    let name = param
                        .child_by_field_name("pattern")
                        .map(|n| node_text(&n, ctx.source))
                        .unwrap_or("");
                    match param.child_by_field_name("type") {
                        Some(ty) => signature.params.push(Param::typed(name, node_text(&ty, ctx.source))),
                        None => signature.params.push(Param::new(name)),
                    }
                }
                "self_parameter" => {
                    signature.params.push(Param::new(node_text(&param, ctx.source)));
                }
                _ => {}
            }
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

/// Signature carrying only generic parameter names, for type definitions.
fn generics_signature(ctx: &Extraction, node: Node) -> Option<Signature> {
    let type_params = node.child_by_field_name("type_parameters")?;
    let mut signature = Signature::default();
    let mut cursor = type_params.walk();
    for tp in type_params.named_children(&mut cursor) {
        signature.type_params.push(node_text(&tp, ctx.source).to_string());
    }
    if signature.type_params.is_empty() {
        None
    } else {
        Some(signature)
    }
}

fn has_fn_modifier(ctx: &Extraction, node: Node, modifier: &str) -> bool {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "function_modifiers" {
            return node_text(&child, ctx.source)
                .split_whitespace()
                .any(|word| word == modifier);
        }
    }
    false
}

fn has_self_parameter(node: Node) -> bool {
    let Some(params) = node.child_by_field_name("parameters") else {
        return false;
    };
    let mut cursor = params.walk();
    params.named_children(&mut cursor).any(|p| p.kind() == "self_parameter")
}

/// Base name of a type node with generics and paths stripped:
/// `HashMap<K, V>` -> `HashMap`, `geo::Point` -> `Point`.
fn type_base_name(node: &Node, source: &str) -> String {
    let text = node_text(node, source);
    let no_generics = text.split('<').next().unwrap_or(text);
    no_generics
        .rsplit("::")
        .next()
        .unwrap_or(no_generics)
        .trim()
        .trim_start_matches('&')
        .to_string()
}
