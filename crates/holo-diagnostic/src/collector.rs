//! Bounded diagnostic collection.

use crate::{Diagnostic, Severity};
use serde::{Deserialize, Serialize};

/// Per-parse caps on the number of retained diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticLimits {
    pub max_errors: usize,
    pub max_warnings: usize,
}

impl Default for DiagnosticLimits {
    fn default() -> Self {
        Self {
            max_errors: 100,
            max_warnings: 50,
        }
    }
}

/// Collects diagnostics for a single parse, dropping any beyond the limits.
///
/// Notes count against the warning limit.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
    limits: DiagnosticLimits,
    dropped_errors: usize,
    dropped_warnings: usize,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: DiagnosticLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Record a diagnostic. Returns `false` if it was dropped.
    pub fn push(&mut self, diagnostic: Diagnostic) -> bool {
        match diagnostic.severity {
            Severity::Error => {
                if self.errors.len() >= self.limits.max_errors {
                    self.dropped_errors += 1;
                    return false;
                }
                self.errors.push(diagnostic);
            }
            Severity::Warning | Severity::Note => {
                if self.warnings.len() >= self.limits.max_warnings {
                    self.dropped_warnings += 1;
                    return false;
                }
                self.warnings.push(diagnostic);
            }
        }
        true
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Number of errors recorded, dropped ones included.
    pub fn error_count(&self) -> usize {
        self.errors.len() + self.dropped_errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len() + self.dropped_warnings
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// True once either limit has been hit and something was dropped.
    pub fn is_limited(&self) -> bool {
        self.dropped_errors > 0 || self.dropped_warnings > 0
    }

    pub fn dropped(&self) -> usize {
        self.dropped_errors + self.dropped_warnings
    }

    pub fn into_parts(self) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
        (self.errors, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use holo_common::{Position, Span};

    fn error() -> Diagnostic {
        Diagnostic::error(ErrorCode::UnexpectedToken, Span::DUMMY, Position::START, "x")
    }

    fn warning() -> Diagnostic {
        Diagnostic::warning(ErrorCode::UnknownTrait, Span::DUMMY, Position::START, "y")
    }

    #[test]
    fn test_limits_drop_silently() {
        let mut collector = DiagnosticCollector::with_limits(DiagnosticLimits {
            max_errors: 2,
            max_warnings: 1,
        });

        assert!(collector.push(error()));
        assert!(collector.push(error()));
        assert!(!collector.is_limited());
        assert!(!collector.push(error()));
        assert!(collector.is_limited());

        assert!(collector.push(warning()));
        assert!(!collector.push(warning()));

        assert_eq!(collector.errors().len(), 2);
        assert_eq!(collector.warnings().len(), 1);
        assert_eq!(collector.error_count(), 3);
        assert_eq!(collector.dropped(), 2);
    }

    #[test]
    fn test_default_limits() {
        let limits = DiagnosticLimits::default();
        assert_eq!(limits.max_errors, 100);
        assert_eq!(limits.max_warnings, 50);
    }
}
