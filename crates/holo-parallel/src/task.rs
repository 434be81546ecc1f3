//! Parsing one file. Shared by the workers and the sequential path, so both
//! produce results of the same shape.

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use holo_common::{Position, Span};
use holo_diagnostic::{Diagnostic, ErrorCode};
use holo_parser::{catch_quietly, panic_message, parse_with_options};
use holo_syntax::{Node, NodeKind};

use crate::protocol::{Export, ParseTaskResult, SymbolKind, WorkerRequest};

/// Parse a request, turning a fault anywhere in the task into a failed
/// result with `worker-failure`.
pub fn execute(request: &WorkerRequest) -> ParseTaskResult {
    let start = Instant::now();
    match catch_quietly(AssertUnwindSafe(|| run_task(request))) {
        Ok(result) => result,
        Err(payload) => {
            let detail = panic_message(payload.as_ref());
            failure(&request.path, ErrorCode::WorkerFailure, detail, start.elapsed())
        }
    }
}

fn run_task(request: &WorkerRequest) -> ParseTaskResult {
    let start = Instant::now();
    let parsed = parse_with_options(&request.content, &request.options);
    let exports = collect_exports(&parsed.ast);

    let mut diagnostics = parsed.diagnostics;
    diagnostics.extend(parsed.warnings);

    ParseTaskResult {
        file_path: request.path.clone(),
        ast: Some(parsed.ast),
        success: parsed.success,
        diagnostics,
        exports,
        imports: parsed.imports,
        elapsed: start.elapsed(),
    }
}

/// A failed result carrying one error diagnostic.
pub(crate) fn failure(path: &str, code: ErrorCode, detail: String, elapsed: Duration) -> ParseTaskResult {
    let diagnostic = Diagnostic::error(code, Span::DUMMY, Position::START, code.description())
        .with_note(detail);
    ParseTaskResult::failed(path, diagnostic, elapsed)
}

/// Named top-level elements, templates, compositions and functions, with or
/// without `export`. The children of a composition root count as top level.
pub fn collect_exports(ast: &Node) -> Vec<Export> {
    let roots: &[Node] = if ast.is_fragment() {
        &ast.children
    } else {
        std::slice::from_ref(ast)
    };

    let mut exports = Vec::new();
    for node in roots {
        push_export(node, &mut exports);
        if matches!(node.kind, NodeKind::Composition { .. }) {
            for child in &node.children {
                push_export(child, &mut exports);
            }
        }
    }
    exports
}

fn push_export(node: &Node, exports: &mut Vec<Export>) {
    let kind = match node.kind {
        NodeKind::Element { .. } => SymbolKind::Element,
        NodeKind::Template { .. } => SymbolKind::Template,
        NodeKind::Composition { .. } => SymbolKind::Composition,
        NodeKind::Function { .. } => SymbolKind::Function,
        _ => return,
    };
    if let Some(name) = node.name.as_ref().or(node.id.as_ref()) {
        exports.push(Export {
            name: name.clone(),
            kind,
        });
    }
}
