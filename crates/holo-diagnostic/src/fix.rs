//! Machine-applicable quick fixes.

use holo_common::{Position, Span};
use serde::{Deserialize, Serialize};

/// A text-range replacement that resolves (part of) a diagnostic.
///
/// An insertion is a replacement of an empty span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickFix {
    pub title: String,
    pub span: Span,
    pub line: u32,
    pub column: u32,
    pub replacement: String,
}

impl QuickFix {
    pub fn replace(
        title: impl Into<String>,
        span: Span,
        position: Position,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            span,
            line: position.line,
            column: position.column,
            replacement: replacement.into(),
        }
    }

    pub fn insert(
        title: impl Into<String>,
        at: Span,
        position: Position,
        text: impl Into<String>,
    ) -> Self {
        Self::replace(title, Span::new(at.start, at.start), position, text)
    }

    pub fn is_insertion(&self) -> bool {
        self.span.is_empty()
    }

    pub(crate) fn relocate(&mut self, lines: u32, bytes: u32) {
        self.line += lines;
        self.span = self.span.offset(bytes);
    }
}

/// Apply fixes to `source`.
///
/// Fixes are applied back to front so earlier offsets stay valid. A fix that
/// overlaps one already applied, or that does not land on character
/// boundaries, is skipped.
pub fn apply_fixes(source: &str, fixes: &[QuickFix]) -> String {
    let mut ordered: Vec<&QuickFix> = fixes.iter().collect();
    ordered.sort_by(|a, b| b.span.start.cmp(&a.span.start).then(b.span.end.cmp(&a.span.end)));

    let mut out = source.to_string();
    let mut floor = usize::MAX;

    for fix in ordered {
        let range = fix.span.range();
        if range.start > range.end
            || range.end > out.len()
            || range.end > floor
            || !out.is_char_boundary(range.start)
            || !out.is_char_boundary(range.end)
        {
            continue;
        }
        out.replace_range(range.clone(), &fix.replacement);
        floor = range.start;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(start: usize, end: usize, text: &str) -> QuickFix {
        QuickFix::replace("t", Span::from_usize(start, end), Position::START, text)
    }

    #[test]
    fn test_apply_in_any_order() {
        let source = "color \"red\"\ngeomety: \"cube\"";
        let fixes = vec![fix(12, 19, "geometry"), fix(5, 5, ":")];
        assert_eq!(apply_fixes(source, &fixes), "color: \"red\"\ngeometry: \"cube\"");
    }

    #[test]
    fn test_overlapping_fix_is_skipped() {
        let fixes = vec![fix(0, 4, "abcd"), fix(2, 6, "zz")];
        assert_eq!(apply_fixes("012345", &fixes), "01zz");
    }

    #[test]
    fn test_out_of_bounds_fix_is_skipped() {
        assert_eq!(apply_fixes("abc", &[fix(2, 10, "x")]), "abc");
    }
}
