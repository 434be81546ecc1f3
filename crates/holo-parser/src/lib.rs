//! Parser for HoloScript+.
//! HoloScript+ 语法分析器。
//!
//! A recursive descent parser producing a [`Node`] tree. The parser never
//! stops at the first error: it reports, synchronizes, and keeps going, so a
//! single parse yields every diagnostic it can find.
//!
//! ```
//! let result = holo_parser::parse("orb \"Ball\" { color: \"red\" }");
//! assert!(result.success);
//! assert_eq!(result.ast.name.as_deref(), Some("Ball"));
//! ```

mod directive;
mod expr;
mod options;
mod parser;
mod recovery;
mod result;

pub use options::ParserOptions;
pub use parser::{MAX_NESTING_DEPTH, Parser};
pub use result::{Feature, ParseResult};

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use holo_common::Location;
use holo_diagnostic::{DiagnosticEngine, RawFailure};
use holo_lexer::Lexer;
use holo_syntax::Node;
use tracing::{debug, warn};

/// Parse a document with default options.
pub fn parse(source: &str) -> ParseResult {
    parse_with_options(source, &ParserOptions::default())
}

/// Parse a document.
///
/// A fault inside the parser is turned into a `SyntaxError` diagnostic and
/// an empty fragment rather than escaping to the caller.
pub fn parse_with_options(source: &str, options: &ParserOptions) -> ParseResult {
    let tokens = Lexer::new(source).tokenize();
    let token_count = tokens.len();

    let outcome = catch_quietly(AssertUnwindSafe(|| {
        Parser::new(source, tokens, *options).parse()
    }));
    let result = outcome.unwrap_or_else(|payload| fault_result(payload, options));

    debug!(
        tokens = token_count,
        errors = result.diagnostics.len(),
        warnings = result.warnings.len(),
        features = result.features.len(),
        "parsed document"
    );
    result
}

fn fault_result(payload: Box<dyn Any + Send>, options: &ParserOptions) -> ParseResult {
    let detail = panic_message(payload.as_ref());
    warn!(%detail, "parser fault");

    let diagnostic = DiagnosticEngine::new(options.strict)
        .enrich(&RawFailure::new("internal parser fault", 1, 1))
        .with_note(detail);
    ParseResult {
        success: false,
        ast: Node::fragment(Vec::new(), Location::default()),
        diagnostics: vec![diagnostic],
        warnings: Vec::new(),
        compiled_expressions: Default::default(),
        imports: Vec::new(),
        features: Default::default(),
    }
}

thread_local! {
    static QUIET: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// `catch_unwind` without the panic hook's stderr report on this thread.
///
/// Other threads keep the previously installed hook. The payload is left to
/// the caller, which turns it into a diagnostic.
pub fn catch_quietly<R>(f: impl FnOnce() -> R + panic::UnwindSafe) -> std::thread::Result<R> {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !QUIET.with(Cell::get) {
                previous(info);
            }
        }));
    });

    let outer = QUIET.with(|quiet| quiet.replace(true));
    let outcome = panic::catch_unwind(f);
    QUIET.with(|quiet| quiet.set(outer));
    if outcome.is_err() {
        debug!("caught panic converted to a diagnostic");
    }
    outcome
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use holo_diagnostic::ErrorCode;

    #[test]
    fn test_empty_source() {
        let result = parse("");
        assert!(result.success);
        assert!(result.ast.is_fragment());
        assert!(result.ast.children.is_empty());
    }

    #[test]
    fn test_panic_payload_text() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }

    #[test]
    fn test_catch_quietly() {
        assert_eq!(catch_quietly(|| 7).ok(), Some(7));
        let caught = catch_quietly(|| -> u32 { panic!("quiet fault") });
        let payload = caught.err().map(|p| panic_message(p.as_ref()));
        assert_eq!(payload.as_deref(), Some("quiet fault"));
        // The flag is restored, so later panics on this thread are reported
        assert!(!QUIET.with(Cell::get));
    }

    #[test]
    fn test_fault_becomes_syntax_error() {
        let result = fault_result(Box::new("index out of range"), &ParserOptions::default());
        assert!(!result.success);
        assert_eq!(result.diagnostics[0].code, ErrorCode::SyntaxError);
        assert!(result.ast.is_fragment());
    }
}
