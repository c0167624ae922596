//! Integration test suite — drives the whole pipeline through the
//! orchestrator: adapter dispatch, error-tolerant parsing, extraction, scope
//! resolution and graph merge, then checks the cross-component guarantees
//! (determinism, containment shape, error containment, diff stability) that
//! no single module can verify alone.

use std::collections::{HashMap, HashSet};

use cartograph::orchestrator::{CancelFlag, Orchestrator, SourceFile};
use cartograph::unit::DiagnosticKind;
use cartograph::{CodeGraph, DefId, DefKind, EdgeKind, Language};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn file(path: &str, source: &str) -> SourceFile {
    SourceFile::new(path, source.as_bytes().to_vec())
}

fn index(files: Vec<SourceFile>) -> CodeGraph {
    let orchestrator = Orchestrator::new();
    let (graph, summary) = orchestrator.index(files, &CancelFlag::new()).unwrap();
    assert_eq!(summary.failed(), 0, "unexpected failures: {}", summary);
    graph
}

fn def<'g>(graph: &'g CodeGraph, name: &str) -> &'g cartograph::Definition {
    graph
        .definitions_named(name)
        .next()
        .unwrap_or_else(|| panic!("definition {} not found", name))
}

fn serialize(graph: &CodeGraph) -> String {
    let mut out = Vec::new();
    cartograph::output::write_jsonl(graph, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

// ---------------------------------------------------------------------------
// Determinism and containment shape
// ---------------------------------------------------------------------------

/// Re-running extraction on byte-identical content yields identical IDs,
/// kinds and edges.
#[test]
fn determinism_across_runs() {
    let sources = || {
        vec![
            file(
                "svc/auth.py",
                "class Token:\n    def validate(self):\n        pass\n\ndef issue():\n    return Token()\n",
            ),
            file(
                "web/router.ts",
                "export interface Route { path: string; }\n\nexport function mount(route: Route): void {}\n",
            ),
            file(
                "core/pool.rs",
                "pub struct Pool { size: usize }\n\nimpl Pool {\n    pub fn acquire(&self) -> usize { self.size }\n}\n",
            ),
            file(
                "pkg/store.go",
                "package store\n\ntype Store struct {\n\tpath string\n}\n\nfunc (s *Store) Open() error { return nil }\n",
            ),
        ]
    };

    let first = serialize(&index(sources()));
    let second = serialize(&index(sources()));
    assert_eq!(first, second);
}

/// For every file, Contains edges form a tree rooted at the module
/// definition: no definition has two containers, every definition reaches
/// the root.
#[test]
fn containment_is_an_acyclic_forest() {
    let graph = index(vec![
        file(
            "shapes.py",
            "class Shape:\n    def area(self):\n        pass\n\nclass Group:\n    class Inner:\n        def m(self):\n            pass\n",
        ),
        file(
            "geo.rs",
            "pub mod inner {\n    pub struct P { pub x: f64 }\n}\n\npub fn top() {}\n",
        ),
    ]);

    for unit in graph.units() {
        let ids: HashSet<&DefId> = unit.definitions.iter().map(|d| &d.id).collect();
        let mut container_of: HashMap<&DefId, &DefId> = HashMap::new();

        for edge in unit.edges.iter().filter(|e| e.kind == EdgeKind::Contains) {
            let to = edge.to.def_id().expect("contains edges are always resolved");
            assert!(ids.contains(&edge.from), "contains edge from foreign id");
            assert!(ids.contains(to), "contains edge to foreign id");
            let previous = container_of.insert(to, &edge.from);
            assert!(previous.is_none(), "definition {} has two containers", to);
        }

        let root = &unit.definitions[0];
        assert_eq!(root.kind, DefKind::Namespace);
        assert!(root.container.is_none());

        // Every non-root definition walks up to the module root without cycles.
        for definition in &unit.definitions[1..] {
            let mut current = &definition.id;
            let mut steps = 0;
            while let Some(parent) = container_of.get(current) {
                current = parent;
                steps += 1;
                assert!(steps <= unit.definitions.len(), "containment cycle at {}", definition.id);
            }
            assert_eq!(current, &root.id, "{} is not rooted at the module", definition.qualified_name);
        }
    }
}

/// A class with N declared methods yields exactly N Method definitions whose
/// container is the class.
#[test]
fn method_count_invariant() {
    let graph = index(vec![file(
        "calc.py",
        "class Calculator:\n    def add(self, a, b):\n        return a + b\n\n    def sub(self, a, b):\n        return a - b\n\n    def mul(self, a, b):\n        return a * b\n",
    )]);

    let class = def(&graph, "Calculator");
    let methods: Vec<_> = graph
        .units()
        .flat_map(|u| u.definitions.iter())
        .filter(|d| d.kind == DefKind::Method)
        .collect();
    assert_eq!(methods.len(), 3);
    for method in methods {
        assert_eq!(method.container.as_ref(), Some(&class.id));
    }
}

// ---------------------------------------------------------------------------
// Error containment
// ---------------------------------------------------------------------------

/// A syntax error near the top of a file does not remove definitions that
/// start after the recovery point.
#[test]
fn syntax_error_does_not_suppress_later_definitions() {
    let graph = index(vec![file(
        "broken.rs",
        "???;\n\npub enum Color {\n    Red,\n    Green,\n}\n\npub struct Point {\n    pub x: f64,\n    pub y: f64,\n}\n",
    )]);

    assert_eq!(def(&graph, "Color").kind, DefKind::Enum);
    assert_eq!(def(&graph, "Point").kind, DefKind::Struct);

    let unit = graph.unit("broken.rs").unwrap();
    let syntax: Vec<_> = unit
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::SyntaxError)
        .collect();
    assert!(!syntax.is_empty());
    // The diagnostic covers only the invalid construct, not the valid items.
    let enum_start = def(&graph, "Color").span.start_line;
    for diagnostic in syntax {
        let span = diagnostic.span.expect("syntax errors carry spans");
        assert!(
            span.end_line < enum_start,
            "error span {:?} bleeds into the valid enum at line {}",
            span,
            enum_start
        );
    }
}

/// Same shape in Python: a broken construct, then a valid class.
#[test]
fn python_recovers_past_broken_construct() {
    let graph = index(vec![file(
        "partial.py",
        "???\n\nclass Survivor:\n    def ok(self):\n        pass\n",
    )]);

    let survivor = def(&graph, "Survivor");
    assert_eq!(survivor.kind, DefKind::Class);
    assert!(graph
        .unit("partial.py")
        .unwrap()
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::SyntaxError));
}

// ---------------------------------------------------------------------------
// Diff stability
// ---------------------------------------------------------------------------

/// Renaming one method produces exactly one removed and one added ID; all
/// other definition IDs survive the edit.
#[test]
fn rename_changes_exactly_one_id() {
    let before_src = "class Service:\n    def start(self):\n        pass\n\n    def stop(self):\n        pass\n\n    def status(self):\n        pass\n";
    let after_src = "class Service:\n    def start(self):\n        pass\n\n    def halt(self):\n        pass\n\n    def status(self):\n        pass\n";

    let before = index(vec![file("svc.py", before_src)]);
    let after = index(vec![file("svc.py", after_src)]);

    let before_ids: HashSet<DefId> = before.all_definitions().map(|d| d.id.clone()).collect();
    let after_ids: HashSet<DefId> = after.all_definitions().map(|d| d.id.clone()).collect();

    let removed: Vec<_> = before_ids.difference(&after_ids).collect();
    let added: Vec<_> = after_ids.difference(&before_ids).collect();
    assert_eq!(removed.len(), 1, "exactly the renamed method disappears");
    assert_eq!(added.len(), 1, "exactly the new name appears");

    assert_eq!(before.definitions_named("stop").count(), 1);
    assert_eq!(after.definitions_named("halt").count(), 1);
}

/// Inserting a declaration shifts later lines but no unchanged IDs.
#[test]
fn insertion_does_not_shift_ids() {
    let before = index(vec![file(
        "m.py",
        "def alpha():\n    pass\n\ndef omega():\n    pass\n",
    )]);
    let after = index(vec![file(
        "m.py",
        "def alpha():\n    pass\n\ndef inserted():\n    pass\n\ndef omega():\n    pass\n",
    )]);

    let before_omega = def(&before, "omega").id.clone();
    let after_omega = def(&after, "omega").id.clone();
    assert_eq!(before_omega, after_omega);
}

// ---------------------------------------------------------------------------
// Scenario A: inheritance across an abstract base
// ---------------------------------------------------------------------------

#[test]
fn scenario_inheritance_with_abstract_base() {
    let graph = index(vec![file(
        "shapes.ts",
        "abstract class Shape {\n  abstract area(): number;\n}\n\nclass Circle extends Shape {\n  radius: number = 1;\n  area(): number {\n    return Math.PI * this.radius ** 2;\n  }\n}\n",
    )]);

    let shape = def(&graph, "Shape");
    let circle = def(&graph, "Circle");
    assert_eq!(shape.kind, DefKind::Class);
    assert!(shape.modifiers.is_abstract);
    assert_eq!(circle.kind, DefKind::Class);

    let inherits: Vec<_> = graph
        .all_edges()
        .filter(|e| e.kind == EdgeKind::Inherits)
        .collect();
    assert_eq!(inherits.len(), 1);
    assert_eq!(inherits[0].from, circle.id);
    assert_eq!(inherits[0].to.def_id(), Some(&shape.id));

    let area = graph
        .definitions_named("area")
        .find(|d| d.container.as_ref() == Some(&circle.id))
        .expect("Circle.area extracted as a contained method");
    assert_eq!(area.kind, DefKind::Method);
}

/// The same shape expressed as Rust trait + impl.
#[test]
fn scenario_inheritance_rust_trait() {
    let graph = index(vec![file(
        "shapes.rs",
        "pub trait Shape {\n    fn area(&self) -> f64;\n}\n\npub struct Circle {\n    radius: f64,\n}\n\nimpl Shape for Circle {\n    fn area(&self) -> f64 {\n        std::f64::consts::PI * self.radius * self.radius\n    }\n}\n",
    )]);

    let shape = def(&graph, "Shape");
    let circle = def(&graph, "Circle");
    assert_eq!(shape.kind, DefKind::Trait);

    let implements: Vec<_> = graph
        .all_edges()
        .filter(|e| e.kind == EdgeKind::Implements)
        .collect();
    assert_eq!(implements.len(), 1);
    assert_eq!(implements[0].from, circle.id);
    assert_eq!(implements[0].to.def_id(), Some(&shape.id));

    let impl_area = graph
        .definitions_named("area")
        .find(|d| d.container.as_ref() == Some(&circle.id))
        .expect("impl method attached to Circle");
    assert!(graph
        .all_edges()
        .any(|e| e.kind == EdgeKind::Overrides && e.from == impl_area.id));
}

/// An out-of-file base class stays a dangling placeholder for the external
/// linker; it is never resolved in-file.
#[test]
fn unresolved_base_is_dangling() {
    let graph = index(vec![file(
        "ext.py",
        "class Widget(RemoteBase):\n    def render(self):\n        pass\n",
    )]);

    let widget = def(&graph, "Widget");
    let inherits: Vec<_> = graph
        .all_edges()
        .filter(|e| e.kind == EdgeKind::Inherits)
        .collect();
    assert_eq!(inherits.len(), 1);
    assert_eq!(inherits[0].from, widget.id);
    assert_eq!(inherits[0].to.dangling_name(), Some("RemoteBase"));
}

// ---------------------------------------------------------------------------
// Scenario B: invalid construct followed by valid enum and struct
// ---------------------------------------------------------------------------

#[test]
fn scenario_enum_and_struct_survive_invalid_prefix() {
    let graph = index(vec![file(
        "recover.rs",
        "???;\n\nenum Mode { On, Off }\n\nstruct Config { retries: u32 }\n",
    )]);

    let unit = graph.unit("recover.rs").unwrap();
    assert!(unit.diagnostics.iter().any(|d| d.kind == DiagnosticKind::SyntaxError));
    assert_eq!(def(&graph, "Mode").kind, DefKind::Enum);
    assert_eq!(def(&graph, "Config").kind, DefKind::Struct);
}

// ---------------------------------------------------------------------------
// Scenario C: anonymous functions stay addressable
// ---------------------------------------------------------------------------

#[test]
fn scenario_synthetic_names_are_distinct() {
    let graph = index(vec![file(
        "handlers.js",
        "const onOpen = () => connect();\nconst onClose = () => disconnect();\n\nfunction setup() {\n  register(() => teardown());\n}\n",
    )]);

    let synthetics: Vec<_> = graph
        .all_definitions()
        .filter(|d| d.kind == DefKind::Function && d.name.contains('#'))
        .collect();
    assert_eq!(synthetics.len(), 3);

    let names: HashSet<&str> = synthetics.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names.len(), 3, "synthetic names collide: {:?}", names);

    let ids: HashSet<&DefId> = synthetics.iter().map(|d| &d.id).collect();
    assert_eq!(ids.len(), 3);
}

// ---------------------------------------------------------------------------
// Cross-language batch and query surface
// ---------------------------------------------------------------------------

#[test]
fn mixed_language_batch_builds_one_graph() {
    let graph = index(vec![
        file("a.py", "class Alpha:\n    def go(self):\n        pass\n"),
        file("b.ts", "export class Beta {\n  go(): void {}\n}\n"),
        file("c.rs", "pub struct Gamma;\n\nimpl Gamma {\n    pub fn go(&self) {}\n}\n"),
        file("d.go", "package d\n\ntype Delta struct{}\n\nfunc (d Delta) Go() {}\n"),
        file("README.txt", "not code\n"),
    ]);

    assert_eq!(graph.stats().files, 5);
    assert_eq!(def(&graph, "Alpha").language, Language::Python);
    assert_eq!(def(&graph, "Beta").language, Language::TypeScript);
    assert_eq!(def(&graph, "Gamma").language, Language::Rust);
    assert_eq!(def(&graph, "Delta").language, Language::Go);

    // The unknown file degraded instead of aborting the batch.
    assert!(graph
        .unit("README.txt")
        .unwrap()
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::UnsupportedLanguage));

    // `go` is defined in three languages; the name query sees each once.
    assert_eq!(graph.definitions_named("go").count(), 3);

    // Restartable: a second pass yields the same result.
    assert_eq!(graph.definitions_named("go").count(), 3);
}

#[test]
fn references_query_follows_incoming_edges() {
    let graph = index(vec![file(
        "flow.py",
        "def sink():\n    pass\n\ndef caller_one():\n    sink()\n\ndef caller_two():\n    sink()\n",
    )]);

    let sink = def(&graph, "sink");
    let callers: HashSet<String> = graph
        .references(&sink.id)
        .filter(|e| e.kind == EdgeKind::References)
        .map(|e| e.from.to_string())
        .collect();
    assert_eq!(callers.len(), 2);
}
