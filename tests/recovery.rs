//! Error recovery tests for holo-parser.

use std::sync::mpsc;
use std::time::Duration;

use holo_diagnostic::{ErrorCode, apply_fixes};
use holo_parser::{MAX_NESTING_DEPTH, ParseResult, parse};

/// Run `f` on a thread with a large stack; deep inputs recurse deeply.
fn with_big_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    std::thread::Builder::new()
        .stack_size(32 << 20)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap()
}

/// Parse on another thread, failing the test if no result arrives in time.
fn parse_within(source: &str, limit: Duration) -> ParseResult {
    let (tx, rx) = mpsc::channel();
    let source = source.to_string();
    std::thread::spawn(move || {
        let _ = tx.send(parse(&source));
    });
    rx.recv_timeout(limit)
        .unwrap_or_else(|_| panic!("no parse result within {:?}", limit))
}

// ============================================================================
// Recovery locality
// ============================================================================

#[test]
fn test_broken_property_keeps_sibling_child() {
    let result = parse("object \"Parent\" { broken: ??? \n object \"Child\" {} }");
    assert!(!result.success);
    assert!(!result.diagnostics.is_empty());
    assert_eq!(result.ast.name.as_deref(), Some("Parent"));
    assert!(result.ast.child("Child").is_some());
}

#[test]
fn test_error_in_one_element_keeps_the_next() {
    let result = parse("orb \"A\" { color: }\norb \"B\" { size: 2 }\n");
    assert!(!result.success);
    assert_eq!(result.ast.children.len(), 2);
    let b = &result.ast.children[1];
    assert_eq!(b.name.as_deref(), Some("B"));
    assert!(b.property("size").is_some());
}

#[test]
fn test_bad_array_item_recovers_inside_list() {
    let result = parse("object \"A\" { items: [1, :, 3], size: 2 }");
    assert!(!result.success);
    assert!(result.ast.property("size").is_some());
}

#[test]
fn test_garbage_terminates() {
    for source in [") ] } : ,", "@@@@", "{{{{", "}}}}", "orb { orb { orb {", "\"\"\"", "@if", "a ? b"] {
        let result = parse(source);
        assert_eq!(result.success, result.diagnostics.is_empty(), "{:?}", source);
    }
}

#[test]
fn test_stray_closers_in_object_literal_terminate() {
    for source in [
        "object \"A\" { v: { a: 1 ) } }",
        "object \"A\" { v: { ] } }",
        "object \"A\" { v: { a: [1, 2) } }",
        "object \"A\" { v: { ) ] ) } }\norb \"B\" {}\n",
    ] {
        let result = parse_within(source, Duration::from_secs(5));
        assert!(!result.success, "{:?}", source);
        assert!(result.diagnostics.iter().any(|d| d.code == ErrorCode::UnexpectedToken));
    }
}

#[test]
fn test_stray_closer_keeps_the_rest_of_the_object() {
    let result = parse_within("object \"A\" { v: { a: 1 ) b: 2 }, size: 3 }", Duration::from_secs(5));
    assert!(!result.success);
    assert!(result.ast.property("size").is_some());
}

// ============================================================================
// Structural errors and their fixes
// ============================================================================

#[test]
fn test_missing_colon_fix() {
    let source = "orb \"A\" {\n  color \"red\"\n}\n";
    let result = parse(source);
    let diagnostic = result
        .diagnostics
        .iter()
        .find(|d| d.code == ErrorCode::MissingColon)
        .unwrap();
    assert_eq!(diagnostic.line, 2);
    assert_eq!(apply_fixes(source, &diagnostic.fixes), "orb \"A\" {\n  color: \"red\"\n}\n");
    assert!(result.ast.property("color").is_some());
}

#[test]
fn test_missing_quote_fix() {
    let source = "orb \"A\" {\n  name: \"Box\n}\n";
    let result = parse(source);
    let diagnostic = result
        .diagnostics
        .iter()
        .find(|d| d.code == ErrorCode::MissingQuote)
        .unwrap();
    assert_eq!(apply_fixes(source, &diagnostic.fixes), "orb \"A\" {\n  name: \"Box\"\n}\n");
}

#[test]
fn test_missing_brace_fix() {
    let source = "orb \"A\" {\n  color: \"red\"";
    let result = parse(source);
    let diagnostic = result
        .diagnostics
        .iter()
        .find(|d| d.code == ErrorCode::MissingBrace)
        .unwrap();
    let fixed = apply_fixes(source, &diagnostic.fixes);
    assert!(fixed.ends_with('}'));
    assert!(parse(&fixed).success);
}

// ============================================================================
// Limits
// ============================================================================

#[test]
fn test_deep_nesting_is_reported_not_fatal() {
    let result = with_big_stack(|| {
        let depth = MAX_NESTING_DEPTH + 50;
        let source = format!("object \"A\" {{ v: {}1{} }}", "[".repeat(depth), "]".repeat(depth));
        parse(&source)
    });
    assert!(!result.success);
    assert!(result.diagnostics.iter().any(|d| d.code == ErrorCode::NestingTooDeep));
}

#[test]
fn test_deeply_nested_elements() {
    let result = with_big_stack(|| {
        let depth = MAX_NESTING_DEPTH + 10;
        let source = format!("{}{}", "group {\n".repeat(depth), "}\n".repeat(depth));
        parse(&source)
    });
    assert!(result.diagnostics.iter().any(|d| d.code == ErrorCode::NestingTooDeep));
}

#[test]
fn test_error_count_is_capped() {
    let source = "orb \"A\" { color: }\n".repeat(150);
    let result = parse(&source);
    assert!(!result.success);
    assert_eq!(result.diagnostics.len(), 100);
}
