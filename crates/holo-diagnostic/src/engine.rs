//! Diagnostic enrichment: error taxonomy, suggestions and quick fixes.

use crate::suggest::suggest;
use crate::vocabulary::{ELEMENT_KEYWORDS, KNOWN_DIRECTIVES, KNOWN_GEOMETRIES, KNOWN_TRAITS, known_typo};
use crate::{Diagnostic, ErrorCode, QuickFix, Severity};
use holo_common::{Position, Span};

/// A failure as reported by something that does not know the taxonomy.
#[derive(Debug, Clone, Default)]
pub struct RawFailure {
    pub message: String,
    pub line: u32,
    pub column: u32,
    /// Byte range the failure points at. `span.start` is where `snippet` begins.
    pub span: Span,
    /// Source text starting at the failure, usually the rest of the line.
    pub snippet: Option<String>,
}

impl RawFailure {
    pub fn new(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            ..Self::default()
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// Builds coded diagnostics with "did you mean" candidates and quick fixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticEngine {
    strict: bool,
}

impl DiagnosticEngine {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Vocabulary issues are warnings unless running in strict mode.
    fn vocabulary_severity(&self) -> Severity {
        if self.strict {
            Severity::Error
        } else {
            Severity::Warning
        }
    }

    /// Classify a raw failure message and attach suggestions and fixes.
    pub fn enrich(&self, failure: &RawFailure) -> Diagnostic {
        let lower = failure.message.to_lowercase();
        let position = failure.position();
        let span = failure.span;
        let subject = quoted_subject(&failure.message);

        let mut diagnostic = if lower.contains("unknown trait") {
            let name = subject.unwrap_or_default();
            self.unknown_trait(name.trim_start_matches('@'), span, position)
        } else if lower.contains("unknown geometry") {
            self.unknown_geometry(&subject.unwrap_or_default(), span, position)
        } else if lower.contains("unknown keyword") || lower.contains("unknown element") {
            self.unknown_keyword(&subject.unwrap_or_default(), span, position)
        } else if lower.contains("unknown directive") {
            let name = subject.unwrap_or_default();
            self.unknown_directive(name.trim_start_matches('@'), span, position)
        } else if lower.contains("'}'") || lower.contains("brace") || lower.contains("unclosed") {
            self.missing_brace(Span::new(span.end, span.end), position)
        } else if lower.contains("':'") || lower.contains("colon") {
            let mut diag = Diagnostic::error(ErrorCode::MissingColon, span, position, &failure.message);
            if let Some(fix) = failure.snippet.as_deref().and_then(|s| colon_fix(s, span, position)) {
                diag = diag.with_fix(fix);
            }
            diag
        } else if lower.contains("unterminated") || lower.contains("quote") {
            let mut diag = Diagnostic::error(ErrorCode::MissingQuote, span, position, &failure.message);
            if let Some(fix) = failure.snippet.as_deref().and_then(|s| quote_fix(s, span, position)) {
                diag = diag.with_fix(fix);
            }
            diag
        } else {
            let code = if lower.contains("duplicate") {
                ErrorCode::DuplicateName
            } else if lower.contains("required") {
                ErrorCode::MissingRequired
            } else if lower.contains("invalid value") {
                ErrorCode::InvalidValue
            } else if lower.contains("too deep") || lower.contains("nesting") {
                ErrorCode::NestingTooDeep
            } else if lower.contains("unexpected") {
                ErrorCode::UnexpectedToken
            } else {
                ErrorCode::SyntaxError
            };
            Diagnostic::error(code, span, position, &failure.message)
        };

        if let Some(snippet) = &failure.snippet {
            for (offset, word) in words(snippet) {
                if let Some(fixed) = known_typo(word) {
                    let start = span.start.0 as usize + offset;
                    let word_span = Span::from_usize(start, start + word.len());
                    diagnostic = diagnostic
                        .with_suggestion(fixed)
                        .with_fix(QuickFix::replace(
                            format!("replace '{}' with '{}'", word, fixed),
                            word_span,
                            position,
                            fixed,
                        ));
                }
            }
        }

        if diagnostic.help.is_none()
            && let Some(help) = diagnostic.code.suggestion()
        {
            diagnostic = diagnostic.with_help(help);
        }

        diagnostic
    }

    /// `@name` where `name` is neither a directive nor a known trait.
    ///
    /// `span` covers the name without the `@`.
    pub fn unknown_trait(&self, name: &str, span: Span, position: Position) -> Diagnostic {
        let candidates = suggest(name, KNOWN_TRAITS);
        let diag = Diagnostic::warning(
            ErrorCode::UnknownTrait,
            span,
            position,
            format!("unknown trait '@{}'", name),
        )
        .with_severity(self.vocabulary_severity());
        with_candidates(diag, &candidates, span, position, |c| c.to_string())
    }

    pub fn unknown_directive(&self, name: &str, span: Span, position: Position) -> Diagnostic {
        let mut vocabulary: Vec<&'static str> = KNOWN_DIRECTIVES.to_vec();
        vocabulary.extend_from_slice(KNOWN_TRAITS);
        let candidates = suggest(name, &vocabulary);
        let diag = Diagnostic::warning(
            ErrorCode::UnknownDirective,
            span,
            position,
            format!("unknown directive '@{}'", name),
        )
        .with_severity(self.vocabulary_severity());
        with_candidates(diag, &candidates, span, position, |c| c.to_string())
    }

    /// An element keyword that looks like a misspelling of a known one.
    pub fn unknown_keyword(&self, word: &str, span: Span, position: Position) -> Diagnostic {
        let candidates = suggest(word, ELEMENT_KEYWORDS);
        let diag = Diagnostic::warning(
            ErrorCode::UnknownKeyword,
            span,
            position,
            format!("unknown keyword '{}'", word),
        )
        .with_severity(self.vocabulary_severity());
        with_candidates(diag, &candidates, span, position, |c| c.to_string())
    }

    /// A geometry value outside the built-in set. `span` covers the quoted
    /// literal, so fixes replace it with a quoted candidate.
    ///
    /// Always a warning: geometry checks never fail a parse.
    pub fn unknown_geometry(&self, value: &str, span: Span, position: Position) -> Diagnostic {
        let candidates = suggest(value, KNOWN_GEOMETRIES);
        let diag = Diagnostic::warning(
            ErrorCode::UnknownGeometry,
            span,
            position,
            format!("unknown geometry '{}'", value),
        );
        with_candidates(diag, &candidates, span, position, |c| format!("\"{}\"", c))
    }

    /// A property name that is a well-known misspelling.
    pub fn misspelled_property(&self, key: &str, span: Span, position: Position) -> Option<Diagnostic> {
        let fixed = known_typo(key)?;
        Some(
            Diagnostic::warning(
                ErrorCode::UnknownKeyword,
                span,
                position,
                format!("unknown property '{}'", key),
            )
            .with_suggestion(fixed)
            .with_fix(QuickFix::replace(
                format!("replace '{}' with '{}'", key, fixed),
                span,
                position,
                fixed,
            )),
        )
    }

    /// `at` is the point where the closing brace should be inserted.
    pub fn missing_brace(&self, at: Span, position: Position) -> Diagnostic {
        Diagnostic::error(ErrorCode::MissingBrace, at, position, "expected '}' to close block")
            .with_fix(QuickFix::insert("insert '}'", at, position, "}"))
            .with_help("add `}` to close the block")
    }

    /// `after_key` is the span of the property name.
    pub fn missing_colon(&self, key: &str, after_key: Span, position: Position) -> Diagnostic {
        let at = Span::new(after_key.end, after_key.end);
        Diagnostic::error(
            ErrorCode::MissingColon,
            after_key,
            position,
            format!("expected ':' after property '{}'", key),
        )
        .with_fix(QuickFix::insert("insert ':'", at, position, ":"))
    }

    /// `literal` covers the unterminated string including its opening quote.
    pub fn missing_quote(&self, literal: Span, quote: char, position: Position) -> Diagnostic {
        let at = Span::new(literal.end, literal.end);
        Diagnostic::error(
            ErrorCode::MissingQuote,
            literal,
            position,
            "unterminated string literal",
        )
        .with_fix(QuickFix::insert(format!("insert {}", quote), at, position, quote.to_string()))
    }
}

fn with_candidates(
    mut diag: Diagnostic,
    candidates: &[&'static str],
    span: Span,
    position: Position,
    render: impl Fn(&str) -> String,
) -> Diagnostic {
    for candidate in candidates {
        diag = diag
            .with_suggestion(*candidate)
            .with_fix(QuickFix::replace(
                format!("replace with '{}'", candidate),
                span,
                position,
                render(candidate),
            ));
    }
    diag
}

/// The first `'...'` or `"..."` quoted word in a message.
fn quoted_subject(message: &str) -> Option<String> {
    for quote in ['\'', '"'] {
        if let Some(start) = message.find(quote) {
            let rest = &message[start + 1..];
            if let Some(end) = rest.find(quote) {
                return Some(rest[..end].to_string());
            }
        }
    }
    None
}

/// Identifier-like words in `text` with their byte offsets.
fn words(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, ch) in text.char_indices() {
        let word_char = ch.is_alphanumeric() || ch == '_';
        match (word_char, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                out.push((s, &text[s..i]));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, &text[s..]));
    }
    out.into_iter()
}

/// `key value` → insert `:` after the key.
fn colon_fix(snippet: &str, span: Span, position: Position) -> Option<QuickFix> {
    let (offset, key) = words(snippet).next()?;
    if offset != snippet.len() - snippet.trim_start().len() {
        return None;
    }
    let at = span.start.0 as usize + offset + key.len();
    Some(QuickFix::insert("insert ':'", Span::from_usize(at, at), position, ":"))
}

/// Close the first string literal opened in `snippet` at the end of the line.
fn quote_fix(snippet: &str, span: Span, position: Position) -> Option<QuickFix> {
    let quote = snippet.chars().find(|c| *c == '"' || *c == '\'')?;
    let line = snippet.lines().next().unwrap_or("");
    let at = span.start.0 as usize + line.trim_end().len();
    Some(QuickFix::insert(
        format!("insert {}", quote),
        Span::from_usize(at, at),
        position,
        quote.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply_fixes;

    #[test]
    fn test_enrich_unknown_trait() {
        let engine = DiagnosticEngine::default();
        let diag = engine.enrich(&RawFailure::new("Unknown trait '@graable'", 2, 3));
        assert_eq!(diag.code, ErrorCode::UnknownTrait);
        assert_eq!(diag.severity, Severity::Warning);
        assert!(diag.suggestions.iter().any(|s| s == "grabbable"));
    }

    #[test]
    fn test_strict_promotes_vocabulary_issues() {
        let engine = DiagnosticEngine::new(true);
        let diag = engine.unknown_trait("graable", Span::DUMMY, Position::START);
        assert_eq!(diag.severity, Severity::Error);
        let geometry = engine.unknown_geometry("sphre", Span::DUMMY, Position::START);
        assert_eq!(geometry.severity, Severity::Warning);
    }

    #[test]
    fn test_enrich_missing_colon_fix() {
        let source = "  color \"red\"";
        let failure = RawFailure::new("Expected ':' after property", 1, 3)
            .with_span(Span::from_usize(2, 13))
            .with_snippet(&source[2..]);
        let diag = DiagnosticEngine::default().enrich(&failure);
        assert_eq!(diag.code, ErrorCode::MissingColon);
        assert_eq!(apply_fixes(source, &diag.fixes), "  color: \"red\"");
    }

    #[test]
    fn test_enrich_missing_quote_fix() {
        let source = "name: \"Box";
        let failure = RawFailure::new("Unterminated string", 1, 7)
            .with_span(Span::from_usize(0, 10))
            .with_snippet(source);
        let diag = DiagnosticEngine::default().enrich(&failure);
        assert_eq!(diag.code, ErrorCode::MissingQuote);
        assert_eq!(apply_fixes(source, &diag.fixes), "name: \"Box\"");
    }

    #[test]
    fn test_enrich_typo_in_snippet() {
        let source = "geomety: \"cube\"";
        let failure = RawFailure::new("unexpected token", 1, 1)
            .with_span(Span::from_usize(0, 7))
            .with_snippet(source);
        let diag = DiagnosticEngine::default().enrich(&failure);
        assert_eq!(diag.code, ErrorCode::UnexpectedToken);
        assert_eq!(diag.suggestions, vec!["geometry".to_string()]);
        assert_eq!(apply_fixes(source, &diag.fixes), "geometry: \"cube\"");
    }

    #[test]
    fn test_enrich_falls_back_to_syntax_error() {
        let diag = DiagnosticEngine::default().enrich(&RawFailure::new("something odd", 1, 1));
        assert_eq!(diag.code, ErrorCode::SyntaxError);
        assert!(diag.is_error());
    }
}
