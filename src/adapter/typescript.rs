//! TypeScript/TSX language adapter.
//!
//! Same walk as JavaScript over the superset grammar; the TS-only node kinds
//! (interfaces, enums, type aliases, namespaces, accessibility modifiers,
//! abstract members) are matched by the shared ECMAScript walker.

use crate::definition::DefKind;
use crate::language::Language;
use crate::unit::ParseUnit;
use crate::Result;

use super::framework::{ExtractRequest, SyntaxAdapter};
use super::javascript::extract_ecma;

/// Grammar-node to definition-kind table (TypeScript additions over the
/// JavaScript table).
const KIND_MAP: &[(&str, DefKind)] = &[
    ("class_declaration", DefKind::Class),
    ("abstract_class_declaration", DefKind::Class),
    ("interface_declaration", DefKind::Interface),
    ("enum_declaration", DefKind::Enum),
    ("type_alias_declaration", DefKind::Interface),
    ("internal_module", DefKind::Namespace),
    ("function_declaration", DefKind::Function),
    ("method_definition", DefKind::Method),
    ("abstract_method_signature", DefKind::Method),
    ("method_signature", DefKind::Method),
    ("property_signature", DefKind::Property),
    ("public_field_definition", DefKind::Field),
    ("variable_declarator", DefKind::Variable),
    ("arrow_function", DefKind::Function),
];

/// TypeScript language adapter; `tsx()` builds the TSX variant.
pub struct TypeScriptAdapter {
    language: Language,
}

impl TypeScriptAdapter {
    pub fn new() -> Self {
        Self { language: Language::TypeScript }
    }

    pub fn tsx() -> Self {
        Self { language: Language::Tsx }
    }
}

impl Default for TypeScriptAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxAdapter for TypeScriptAdapter {
    fn language(&self) -> Language {
        self.language
    }

    fn display_name(&self) -> &'static str {
        match self.language {
            Language::Tsx => "TSX",
            _ => "TypeScript",
        }
    }

    fn kind_map(&self) -> &'static [(&'static str, DefKind)] {
        KIND_MAP
    }

    fn extract(&self, req: &ExtractRequest<'_>) -> Result<ParseUnit> {
        extract_ecma(self.language, req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Visibility;
    use crate::edge::EdgeKind;
    use crate::unit::content_hash;

    fn extract(source: &str) -> ParseUnit {
        let adapter = TypeScriptAdapter::new();
        let hash = content_hash(source.as_bytes());
        adapter
            .extract(&ExtractRequest {
                path: "src/shapes.ts",
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
    fn test_abstract_class_hierarchy() {
        let unit = extract(
            "abstract class Shape {\n  abstract area(): number;\n}\n\nclass Circle extends Shape {\n  radius: number = 1;\n  area(): number { return Math.PI * this.radius ** 2; }\n}\n",
        );
        let shape = find(&unit, "Shape");
        let circle = find(&unit, "Circle");
        assert_eq!(shape.kind, DefKind::Class);
        assert!(shape.modifiers.is_abstract);
        assert_eq!(circle.kind, DefKind::Class);

        let inherits: Vec<_> = unit.edges.iter().filter(|e| e.kind == EdgeKind::Inherits).collect();
        assert_eq!(inherits.len(), 1);
        assert_eq!(inherits[0].from, circle.id);
        assert_eq!(inherits[0].to.def_id(), Some(&shape.id));

        // Circle.area overrides Shape.area
        let overrides: Vec<_> = unit.edges.iter().filter(|e| e.kind == EdgeKind::Overrides).collect();
        assert_eq!(overrides.len(), 1);
    }

    #[test]
    fn test_interface_and_implements() {
        let unit = extract(
            "interface Drawable {\n  draw(): void;\n}\n\nclass Sprite implements Drawable {\n  draw(): void {}\n}\n",
        );
        let drawable = find(&unit, "Drawable");
        let sprite = find(&unit, "Sprite");
        assert_eq!(drawable.kind, DefKind::Interface);

        let implements: Vec<_> = unit.edges.iter().filter(|e| e.kind == EdgeKind::Implements).collect();
        assert_eq!(implements.len(), 1);
        assert_eq!(implements[0].from, sprite.id);
        assert_eq!(implements[0].to.def_id(), Some(&drawable.id));
    }

    #[test]
    fn test_multiple_interfaces() {
        let unit = extract(
            "interface A { }\ninterface B { }\nclass C implements A, B { }\n",
        );
        let implements: Vec<_> = unit.edges.iter().filter(|e| e.kind == EdgeKind::Implements).collect();
        assert_eq!(implements.len(), 2);
    }

    #[test]
    fn test_enum_members() {
        let unit = extract("enum Color {\n  Red,\n  Green = 3,\n}\n");
        let color = find(&unit, "Color");
        assert_eq!(color.kind, DefKind::Enum);

        let members: Vec<_> = unit.definitions.iter().filter(|d| d.kind == DefKind::Field).collect();
        assert_eq!(members.len(), 2);
        for m in &members {
            assert_eq!(m.container.as_ref(), Some(&color.id));
        }
    }

    #[test]
    fn test_accessibility_and_readonly() {
        let unit = extract(
            "class Conn {\n  private readonly host: string = 'x';\n  protected open(): void {}\n}\n",
        );
        let host = find(&unit, "host");
        assert_eq!(host.visibility, Some(Visibility::Private));
        assert!(host.modifiers.is_readonly);
        assert_eq!(find(&unit, "open").visibility, Some(Visibility::Protected));
    }

    #[test]
    fn test_namespace_containment() {
        let unit = extract("namespace geometry {\n  export function area(): number { return 0; }\n}\n");
        let ns = find(&unit, "geometry");
        assert_eq!(ns.kind, DefKind::Namespace);
        let area = find(&unit, "area");
        assert_eq!(area.container.as_ref(), Some(&ns.id));
        assert_eq!(area.qualified_name, "shapes.geometry.area");
    }

    #[test]
    fn test_type_alias_and_generics() {
        let unit = extract(
            "export type Result<T> = { ok: boolean; value: T };\n\nfunction wrap<T>(value: T): Result<T> { return { ok: true, value }; }\n",
        );
        assert_eq!(find(&unit, "Result").kind, DefKind::Interface);
        let sig = find(&unit, "wrap").signature.as_ref().unwrap();
        assert!(!sig.type_params.is_empty());
        assert_eq!(sig.params[0].type_hint.as_deref(), Some("T"));
        assert_eq!(sig.return_type.as_deref(), Some("Result<T>"));
    }

    #[test]
    fn test_tsx_component_extraction() {
        let adapter = TypeScriptAdapter::tsx();
        let source = "export function Badge(props: { label: string }) {\n  return <span>{props.label}</span>;\n}\n";
        let hash = content_hash(source.as_bytes());
        let unit = adapter
            .extract(&ExtractRequest {
                path: "src/Badge.tsx",
                source,
                content_hash: &hash,
                timeout: None,
            })
            .unwrap();
        let badge = unit.definitions.iter().find(|d| d.name == "Badge").unwrap();
        assert_eq!(badge.kind, DefKind::Function);
        assert!(badge.exported);
    }
}
