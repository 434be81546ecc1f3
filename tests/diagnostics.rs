//! Diagnostic engine and suggestion tests.

use holo_diagnostic::vocabulary::{KNOWN_GEOMETRIES, KNOWN_TRAITS};
use holo_diagnostic::{
    DiagnosticEngine, ErrorCode, RawFailure, Severity, apply_fixes, find_similar, levenshtein,
};
use holo_parser::{ParserOptions, parse, parse_with_options};

// ============================================================================
// Edit distance
// ============================================================================

#[test]
fn test_levenshtein() {
    assert_eq!(levenshtein("", ""), 0);
    assert_eq!(levenshtein("abc", ""), 3);
    assert_eq!(levenshtein("kitten", "sitting"), 3);
    assert_eq!(levenshtein("graable", "grabbable"), 2);
    assert_eq!(levenshtein("sphere", "sphere"), 0);
}

#[test]
fn test_find_similar_orders_by_distance() {
    let found = find_similar("spher", KNOWN_GEOMETRIES, 3, 3);
    assert_eq!(found[0].text, "sphere");
    assert_eq!(found[0].distance, 1);
    assert!(found.windows(2).all(|w| w[0].distance <= w[1].distance));
    assert!(found.len() <= 3);
}

#[test]
fn test_find_similar_ignores_case_and_exact_match() {
    assert_eq!(find_similar("SPHERE", KNOWN_GEOMETRIES, 1, 3)[0].text, "sphere");
    assert!(find_similar("sphere", KNOWN_GEOMETRIES, 0, 3).is_empty());
    assert!(find_similar("zzzzzzzzzz", KNOWN_TRAITS, 3, 3).is_empty());
}

// ============================================================================
// Codes
// ============================================================================

#[test]
fn test_error_code_names_are_unique() {
    let mut names: Vec<_> = ErrorCode::ALL.iter().map(|c| c.name()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), ErrorCode::ALL.len());
    for code in ErrorCode::ALL {
        assert_eq!(ErrorCode::from_name(code.name()), Some(*code));
        assert!(code.as_str().starts_with('E'));
    }
    assert_eq!(ErrorCode::MissingBrace.name(), "missing-brace");
    assert_eq!(ErrorCode::from_name("not-a-code"), None);
}

// ============================================================================
// Vocabulary diagnostics from the parser
// ============================================================================

#[test]
fn test_misspelled_trait_suggests_the_trait() {
    let result = parse("@graable\norb \"A\" {}\n");
    assert!(result.success);
    let warning = result
        .warnings
        .iter()
        .find(|d| d.code == ErrorCode::UnknownTrait)
        .unwrap();
    assert_eq!(warning.severity, Severity::Warning);
    assert!(warning.suggestions.iter().any(|s| s == "grabbable"));
    assert!(!warning.fixes.is_empty());
}

#[test]
fn test_strict_mode_promotes_vocabulary_warnings() {
    let options = ParserOptions::new().strict(true);
    let result = parse_with_options("@graable\norb \"A\" {}\n", &options);
    assert!(!result.success);
    assert!(result.diagnostics.iter().any(|d| d.code == ErrorCode::UnknownTrait));
}

#[test]
fn test_unknown_geometry_fix() {
    let source = "orb \"A\" { geometry: \"spehre\" }";
    let result = parse(source);
    assert!(result.success);
    let warning = result
        .warnings
        .iter()
        .find(|d| d.code == ErrorCode::UnknownGeometry)
        .unwrap();
    assert_eq!(warning.suggestions[0], "sphere");
    assert_eq!(
        apply_fixes(source, &warning.fixes[..1]),
        "orb \"A\" { geometry: \"sphere\" }"
    );
}

#[test]
fn test_model_geometry_is_accepted() {
    let result = parse("orb \"A\" { geometry: \"model/ship.glb\" }");
    assert!(result.warnings.iter().all(|d| d.code != ErrorCode::UnknownGeometry));
}

#[test]
fn test_misspelled_property() {
    let source = "orb \"A\" { positon: [0, 1, 0] }";
    let result = parse(source);
    let warning = result
        .warnings
        .iter()
        .find(|d| d.suggestions.iter().any(|s| s == "position"))
        .unwrap();
    assert_eq!(apply_fixes(source, &warning.fixes), "orb \"A\" { position: [0, 1, 0] }");
}

#[test]
fn test_near_keyword_warns() {
    let result = parse("obejct \"A\" {}\n");
    assert!(result.success);
    assert!(result.warnings.iter().any(|d| d.code == ErrorCode::UnknownKeyword));
    assert_eq!(result.ast.name.as_deref(), Some("A"));
}

// ============================================================================
// Enriching raw failures
// ============================================================================

#[test]
fn test_enrich_classifies_messages() {
    let engine = DiagnosticEngine::new(false);
    let cases = [
        ("unknown trait '@graable'", ErrorCode::UnknownTrait),
        ("unknown geometry 'spehre'", ErrorCode::UnknownGeometry),
        ("expected '}' after block", ErrorCode::MissingBrace),
        ("expected ':' after key", ErrorCode::MissingColon),
        ("unterminated string", ErrorCode::MissingQuote),
        ("nesting too deep", ErrorCode::NestingTooDeep),
        ("something odd happened", ErrorCode::SyntaxError),
    ];
    for (message, code) in cases {
        let diagnostic = engine.enrich(&RawFailure::new(message, 3, 7));
        assert_eq!(diagnostic.code, code, "{}", message);
        assert_eq!((diagnostic.line, diagnostic.column), (3, 7));
    }
}

#[test]
fn test_enrich_unknown_trait_suggestions() {
    let diagnostic = DiagnosticEngine::new(false).enrich(&RawFailure::new("unknown trait '@graable'", 1, 1));
    assert!(diagnostic.suggestions.iter().any(|s| s == "grabbable"));
}

#[test]
fn test_emit_renders_without_error() {
    let source = "orb \"A\" {\n  color \"red\"\n}\n";
    let result = parse(source);
    for diagnostic in result.all_diagnostics() {
        holo_diagnostic::emit(source, "scene.holo", diagnostic).unwrap();
    }
}
