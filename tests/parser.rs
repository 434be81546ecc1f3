//! Integration tests for holo-parser crate.

use holo_parser::{Feature, ParserOptions, parse, parse_with_options};
use holo_syntax::{Directive, NodeKind, Value};

// ============================================================================
// Elements
// ============================================================================

#[test]
fn test_element_with_properties() {
    let result = parse("orb \"Ball\" {\n  color: \"red\"\n  size: 2m\n  visible: true\n}\n");
    assert!(result.success, "{:?}", result.diagnostics);
    let ball = &result.ast;
    assert_eq!(ball.keyword(), "orb");
    assert_eq!(ball.property("color").and_then(Value::as_str), Some("red"));
    assert_eq!(ball.property("size").and_then(Value::as_f64), Some(2.0));
    assert_eq!(ball.property("visible").and_then(Value::as_bool), Some(true));
}

#[test]
fn test_element_id_marker() {
    let result = parse("cube #crate { }");
    assert!(result.success, "{:?}", result.diagnostics);
    assert_eq!(result.ast.id.as_deref(), Some("crate"));
    assert!(result.ast.name.is_none());
}

#[test]
fn test_nested_children() {
    let source = "composition \"World\" {\n  orb \"Sun\" { color: \"yellow\" }\n  group \"Props\" {\n    cube \"Box\" {}\n  }\n}\n";
    let result = parse(source);
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(matches!(&result.ast.kind, NodeKind::Composition { keyword } if keyword == "composition"));
    assert_eq!(result.ast.children.len(), 2);
    assert!(result.ast.find("Box").is_some());
    assert_eq!(result.ast.count(), 4);
}

#[test]
fn test_indented_body() {
    let result = parse("orb \"Ball\"\n  color: \"red\"\n  size: 2\n");
    assert!(result.success, "{:?}", result.diagnostics);
    assert_eq!(result.ast.properties.len(), 2);
    assert!(result.uses(Feature::Indentation));
}

#[test]
fn test_leading_directives_attach_to_element() {
    let result = parse("@grabbable\n@glowing(intensity: 2)\norb \"Ball\" {}\n");
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(result.ast.has_trait("grabbable"));
    let glowing = &result.ast.traits["glowing"];
    assert_eq!(glowing.get("intensity").and_then(Value::as_f64), Some(2.0));
    assert!(result.uses(Feature::Traits));
}

// ============================================================================
// Templates, logic and state machines
// ============================================================================

#[test]
fn test_template_and_using() {
    let source = "template \"Card\"(title, color) {\n  color: color\n}\nobject \"A\" using \"Card\" {}\n";
    let result = parse(source);
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(result.ast.is_fragment());

    let card = &result.ast.children[0];
    let NodeKind::Template { params } = &card.kind else {
        panic!("expected template, got {}", card.kind_name());
    };
    assert_eq!(params, &["title".to_string(), "color".to_string()]);
    assert_eq!(result.ast.children[1].template(), Some("Card"));
    assert!(result.uses(Feature::Templates));
}

#[test]
fn test_logic_block() {
    let source = "logic {\n  function spin(speed) { rotate(speed) }\n  on_click(event) { spin(2) }\n  let count = 0\n}\n";
    let result = parse(source);
    assert!(result.success, "{:?}", result.diagnostics);
    let NodeKind::Logic(block) = &result.ast.kind else {
        panic!("expected logic");
    };
    assert_eq!(block.functions[0].name, "spin");
    assert_eq!(block.functions[0].body, "rotate(speed)");
    assert_eq!(block.handlers[0].event, "on_click");
    assert_eq!(block.handlers[0].params, vec!["event".to_string()]);
    assert!(block.variables.contains_key("count"));
    assert!(result.uses(Feature::Logic));
}

#[test]
fn test_state_machine() {
    let source = "state_machine \"Door\" {\n  initial: closed\n  state closed {\n    on_entry { lock() }\n  }\n  state open {}\n  transitions {\n    closed -> open : push\n    open -> closed\n  }\n}\n";
    let result = parse(source);
    assert!(result.success, "{:?}", result.diagnostics);
    let NodeKind::StateMachine(machine) = &result.ast.kind else {
        panic!("expected state machine");
    };
    assert_eq!(machine.initial.as_deref(), Some("closed"));
    assert_eq!(machine.states.len(), 2);
    assert_eq!(machine.state("closed").and_then(|s| s.on_entry.as_deref()), Some("lock()"));
    assert_eq!(machine.transitions.len(), 2);
    assert_eq!(machine.transitions[0].event.as_deref(), Some("push"));
    assert_eq!(machine.transitions[1].event, None);
}

#[test]
fn test_state_machine_requires_initial() {
    let result = parse("state_machine \"Door\" {\n  state open {}\n}\n");
    assert!(!result.success);
    assert!(result.diagnostics.iter().any(|d| d.message.contains("initial")));
}

#[test]
fn test_export_marks_the_declaration() {
    let result = parse("export template \"Card\" {\n  color: \"red\"\n}\n");
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(matches!(result.ast.kind, NodeKind::Template { .. }));
    assert_eq!(result.ast.name.as_deref(), Some("Card"));
    assert!(result.ast.exported);
    assert_eq!(result.ast.loc.start.column, 1);

    let plain = parse("template \"Card\" {}");
    assert!(!plain.ast.exported);
}

#[test]
fn test_top_level_function() {
    let result = parse("function greet(name) { return name }\norb \"A\" {}\n");
    assert!(result.success, "{:?}", result.diagnostics);
    let greet = &result.ast.children[0];
    assert_eq!(greet.name.as_deref(), Some("greet"));
    let NodeKind::Function { params, body } = &greet.kind else {
        panic!("expected function, got {}", greet.kind_name());
    };
    assert_eq!(params, &vec!["name".to_string()]);
    assert_eq!(body, "return name");
    assert_eq!(result.ast.children[1].name.as_deref(), Some("A"));
}

#[test]
fn test_exported_function() {
    let result = parse("export function add(a, b) { return a + b }");
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(result.ast.exported);
    assert!(matches!(&result.ast.kind, NodeKind::Function { params, .. } if params.len() == 2));
}

// ============================================================================
// Values
// ============================================================================

#[test]
fn test_spread_in_array() {
    let result = parse("object \"A\" { items: [1, ...arr, 2] }");
    assert!(result.success, "{:?}", result.diagnostics);
    let Some(Value::Array(items)) = result.ast.property("items") else {
        panic!("expected array");
    };
    assert_eq!(items.len(), 3);
    assert!(matches!(&items[1], Value::Spread(inner) if **inner == Value::Reference("arr".into())));
    assert_eq!(result.ast.property("items").unwrap().to_string(), "[1, ...arr, 2]");
    assert!(result.uses(Feature::Spread));
}

#[test]
fn test_body_spread() {
    let result = parse("object \"A\" {\n  ...defaults\n  color: \"red\"\n}\n");
    assert!(result.success, "{:?}", result.diagnostics);
    assert_eq!(result.ast.spreads.len(), 1);
}

#[test]
fn test_interpolations_are_compiled() {
    let result = parse("text \"Score\" {\n  label: ${player.score}\n  hint: ${player.name}\n}\n");
    assert!(result.success, "{:?}", result.diagnostics);
    assert_eq!(result.compiled_expressions.len(), 2);
    assert_eq!(result.compiled_expressions["expr_0"], "player.score");
    assert_eq!(result.compiled_expressions["expr_1"], "player.name");
    assert!(matches!(result.ast.property("label"), Some(Value::Interpolation { id, .. }) if id == "expr_0"));
}

#[test]
fn test_ternary_is_right_associative() {
    let result = parse("object \"A\" { v: a ? 1 : b ? 2 : 3 }");
    assert!(result.success, "{:?}", result.diagnostics);
    let Some(Value::Ternary {
        condition,
        else_branch,
        ..
    }) = result.ast.property("v")
    else {
        panic!("expected ternary");
    };
    assert_eq!(**condition, Value::Reference("a".into()));
    let Value::Ternary {
        condition, then_branch, ..
    } = &**else_branch
    else {
        panic!("expected nested ternary in the else branch");
    };
    assert_eq!(**condition, Value::Reference("b".into()));
    assert_eq!(then_branch.as_f64(), Some(2.0));
}

// ============================================================================
// Directives and options
// ============================================================================

#[test]
fn test_for_loop_directive() {
    let result = parse("group \"Row\" {\n  @for item in items {\n    cube \"Cell\" {}\n  }\n}\n");
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(result.uses(Feature::ControlFlow));
    assert!(matches!(result.ast.directives[0], Directive::For { .. }));
}

#[test]
fn test_imports_can_be_disabled() {
    let source = "@import { Ball } from \"./shapes.holo\"\norb \"A\" {}\n";
    let enabled = parse(source);
    assert_eq!(enabled.imports.len(), 1);
    assert!(enabled.uses(Feature::Imports));

    let options = ParserOptions::default().enable_typescript_imports(false);
    let disabled = parse_with_options(source, &options);
    assert!(disabled.imports.is_empty());
    assert!(!disabled.warnings.is_empty());
}

#[test]
fn test_vr_traits_can_be_disabled() {
    let options = ParserOptions::default().enable_vr_traits(false);
    let result = parse_with_options("orb \"Ball\" @grabbable {}", &options);
    assert!(result.success);
    assert!(!result.warnings.is_empty());
    assert!(!result.uses(Feature::Traits));
}

#[test]
fn test_ast_serializes_to_json() {
    let result = parse("orb \"Ball\" @grabbable { color: \"red\" }");
    let json = serde_json::to_value(&result.ast).unwrap();
    assert_eq!(json["kind"]["kind"], "element");
    assert_eq!(json["name"], "Ball");
}
