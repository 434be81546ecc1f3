//! Parser configuration.

use holo_diagnostic::DiagnosticLimits;
use serde::{Deserialize, Serialize};

/// Options for a single parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Parse known `@trait` directives as traits. When off they are treated
    /// as unknown directives.
    pub enable_vr_traits: bool,
    /// Parse `@import`. When off it is treated as an unknown directive.
    pub enable_typescript_imports: bool,
    /// Unknown traits, directives and keywords become errors.
    pub strict: bool,
    /// Caps on the diagnostics kept per parse.
    pub limits: DiagnosticLimits,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            enable_vr_traits: true,
            enable_typescript_imports: true,
            strict: false,
            limits: DiagnosticLimits::default(),
        }
    }
}

impl ParserOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable_vr_traits(mut self, enable: bool) -> Self {
        self.enable_vr_traits = enable;
        self
    }

    pub fn enable_typescript_imports(mut self, enable: bool) -> Self {
        self.enable_typescript_imports = enable;
        self
    }

    /// Promote vocabulary warnings to errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn limits(mut self, limits: DiagnosticLimits) -> Self {
        self.limits = limits;
        self
    }
}
