//! Diagnostic and error reporting for HoloScript+.
//! HoloScript+ 的诊断和错误报告。
//!
//! Besides the diagnostic data types this crate holds the suggestion engine:
//! edit-distance lookups against closed vocabularies, quick fixes, and a
//! collector that bounds the number of diagnostics kept per parse.
//! Rendering goes through ariadne.

mod codes;
mod collector;
mod diagnostic;
mod engine;
mod fix;
pub mod suggest;
pub mod vocabulary;

pub use codes::ErrorCode;
pub use collector::{DiagnosticCollector, DiagnosticLimits};
pub use diagnostic::{Diagnostic, Label, Severity};
pub use engine::{DiagnosticEngine, RawFailure};
pub use fix::{QuickFix, apply_fixes};
pub use suggest::{Suggestion, find_similar, levenshtein};

use ariadne::{ColorGenerator, Label as AriadneLabel, Report, ReportKind, Source};

/// Render a diagnostic to stderr.
/// 将诊断信息渲染到标准错误输出。
pub fn emit(source: &str, filename: &str, diagnostic: &Diagnostic) -> std::io::Result<()> {
    let kind = match diagnostic.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Note => ReportKind::Advice,
    };

    let mut colors = ColorGenerator::new();
    let mut report = Report::build(kind, filename, diagnostic.span.start.0 as usize)
        .with_code(diagnostic.code.as_str())
        .with_message(format!("{} [{}]", diagnostic.message, diagnostic.code.name()));

    let primary_color = colors.next();
    report = report.with_label(
        AriadneLabel::new((filename, diagnostic.span.range()))
            .with_message(diagnostic.code.description())
            .with_color(primary_color),
    );

    for label in &diagnostic.labels {
        let color = colors.next();
        let ariadne_label = AriadneLabel::new((filename, label.span.range()))
            .with_message(&label.message)
            .with_color(color);
        report = report.with_label(ariadne_label);
    }

    for note in &diagnostic.notes {
        report = report.with_note(note);
    }

    if !diagnostic.suggestions.is_empty() {
        report = report.with_note(format!("did you mean: {}?", diagnostic.suggestions.join(", ")));
    }

    if let Some(help) = &diagnostic.help {
        report = report.with_help(help);
    } else if let Some(fix) = diagnostic.fixes.first() {
        report = report.with_help(&fix.title);
    }

    report
        .finish()
        .eprint((filename, Source::from(source)))
}
