//! Diagnostic types and builders.

use crate::{ErrorCode, QuickFix};
use holo_common::{Position, Span};
use serde::{Deserialize, Serialize};

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// A labeled span within a diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// A diagnostic message with suggestions, quick fixes, labels, notes and help.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
    pub line: u32,
    pub column: u32,
    /// Human "did you mean" candidates, best first.
    pub suggestions: Vec<String>,
    /// Machine-applicable edits.
    pub fixes: Vec<QuickFix>,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        code: ErrorCode,
        span: Span,
        position: Position,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            span,
            line: position.line,
            column: position.column,
            suggestions: vec![],
            fixes: vec![],
            labels: vec![],
            notes: vec![],
            help: None,
        }
    }

    pub fn error(code: ErrorCode, span: Span, position: Position, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, span, position, message)
    }

    pub fn warning(code: ErrorCode, span: Span, position: Position, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, span, position, message)
    }

    pub fn note(code: ErrorCode, span: Span, position: Position, message: impl Into<String>) -> Self {
        Self::new(Severity::Note, code, span, position, message)
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions.extend(suggestions.into_iter().map(Into::into));
        self
    }

    pub fn with_fix(mut self, fix: QuickFix) -> Self {
        self.fixes.push(fix);
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Move the diagnostic (and everything it points at) by `lines` lines and
    /// `bytes` bytes. Used when a chunk parsed in isolation is placed back into
    /// its document.
    pub fn relocate(&mut self, lines: u32, bytes: u32) {
        self.line += lines;
        self.span = self.span.offset(bytes);
        for label in &mut self.labels {
            label.span = label.span.offset(bytes);
        }
        for fix in &mut self.fixes {
            fix.relocate(lines, bytes);
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        };
        write!(
            f,
            "{}:{}: {}[{}]: {}",
            self.line, self.column, severity, self.code, self.message
        )?;
        if !self.suggestions.is_empty() {
            write!(f, " (did you mean {}?)", self.suggestions.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_suggestions() {
        let diag = Diagnostic::warning(
            ErrorCode::UnknownTrait,
            Span::from_usize(0, 8),
            Position::new(3, 5),
            "unknown trait '@graable'",
        )
        .with_suggestion("grabbable");

        assert_eq!(
            diag.to_string(),
            "3:5: warning[unknown-trait]: unknown trait '@graable' (did you mean grabbable?)"
        );
    }

    #[test]
    fn test_relocate_moves_fixes() {
        let mut diag = Diagnostic::error(
            ErrorCode::MissingColon,
            Span::from_usize(4, 9),
            Position::new(1, 5),
            "expected ':'",
        )
        .with_fix(QuickFix::insert("insert ':'", Span::from_usize(9, 9), Position::new(1, 10), ":"));

        diag.relocate(4, 100);
        assert_eq!(diag.line, 5);
        assert_eq!(diag.span.range(), 104..109);
        assert_eq!(diag.fixes[0].line, 5);
        assert_eq!(diag.fixes[0].span.range(), 109..109);
    }
}
