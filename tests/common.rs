//! Integration tests for holo-common crate.

use holo_common::{BytePos, Location, Position, Span};

#[test]
fn test_span_merge() {
    let a = Span::from_usize(10, 20);
    let b = Span::from_usize(15, 30);
    let merged = a.merge(b);
    assert_eq!(merged.start.0, 10);
    assert_eq!(merged.end.0, 30);
}

#[test]
fn test_span_len_and_range() {
    let span = Span::from_usize(5, 15);
    assert_eq!(span.len(), 10);
    assert_eq!(span.range(), 5..15);
    assert!(Span::from_usize(5, 5).is_empty());
}

#[test]
fn test_span_offset() {
    let span = Span::new(BytePos(2), BytePos(4)).offset(10);
    assert_eq!(span, Span::from_usize(12, 14));
}

#[test]
fn test_location_merge_and_shift() {
    let a = Location::new(Position::new(2, 1), Position::new(2, 10));
    let b = Location::new(Position::new(5, 3), Position::new(7, 2));
    let merged = a.merge(b);
    assert_eq!(merged.start, Position::new(2, 1));
    assert_eq!(merged.end, Position::new(7, 2));

    let shifted = merged.offset_lines(3);
    assert_eq!(shifted.start.line, 5);
    assert_eq!(shifted.end.line, 10);
    assert!(shifted.contains_line(6));
    assert!(!shifted.contains_line(11));
}
