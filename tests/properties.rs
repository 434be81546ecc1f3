//! Property-based tests over arbitrary input.

use std::sync::mpsc;
use std::time::Duration;

use holo_lexer::{TokenKind, tokenize};
use holo_parser::{ParseResult, parse};
use proptest::prelude::*;

/// Parse on another thread so a parser that stops making progress fails
/// the property instead of hanging the run.
fn parse_within(source: &str) -> Option<ParseResult> {
    let (tx, rx) = mpsc::channel();
    let source = source.to_string();
    std::thread::spawn(move || {
        let _ = tx.send(parse(&source));
    });
    rx.recv_timeout(Duration::from_secs(5)).ok()
}

/// Fragments that, glued together, make source that is almost valid.
fn holo_like() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        Just("orb".to_string()),
        Just("object".to_string()),
        Just("template".to_string()),
        Just("composition".to_string()),
        Just("\"Name\"".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        Just("[".to_string()),
        Just("]".to_string()),
        Just("(".to_string()),
        Just(")".to_string()),
        Just("{ a: 1 )".to_string()),
        Just("{ ]".to_string()),
        Just("x: {".to_string()),
        Just("=>".to_string()),
        Just(":".to_string()),
        Just(",".to_string()),
        Just("?".to_string()),
        Just("...".to_string()),
        Just("@grabbable".to_string()),
        Just("@if".to_string()),
        Just("${x}".to_string()),
        Just("\n".to_string()),
        Just("\n  ".to_string()),
        Just("\"".to_string()),
        "[a-z]{1,6}",
        "[0-9]{1,3}",
    ];
    prop::collection::vec(piece, 0..60).prop_map(|pieces| pieces.join(" "))
}

proptest! {
    #[test]
    fn parse_terminates_on_any_input(source in "\\PC{0,200}") {
        let result = parse_within(&source);
        prop_assert!(result.is_some(), "no result for {:?}", source);
        let result = result.unwrap();
        prop_assert_eq!(result.success, result.diagnostics.is_empty());
    }

    #[test]
    fn parse_terminates_on_structured_noise(source in holo_like()) {
        let result = parse_within(&source);
        prop_assert!(result.is_some(), "no result for {:?}", source);
        let result = result.unwrap();
        prop_assert_eq!(result.success, result.diagnostics.is_empty());
    }

    #[test]
    fn indents_and_dedents_balance(source in "[ a-z:{}\\n\\t#\"]{0,200}") {
        let tokens = tokenize(&source);
        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        prop_assert_eq!(indents, dedents);
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }
}
