//! The outcome of a parse.

use holo_diagnostic::Diagnostic;
use holo_syntax::{ImportDecl, Node};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Language features a document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    Traits,
    Templates,
    StateMachines,
    Logic,
    Spread,
    Interpolation,
    ControlFlow,
    Imports,
    Indentation,
    Environment,
    ArrowFunctions,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Traits => "traits",
            Feature::Templates => "templates",
            Feature::StateMachines => "state-machines",
            Feature::Logic => "logic",
            Feature::Spread => "spread",
            Feature::Interpolation => "interpolation",
            Feature::ControlFlow => "control-flow",
            Feature::Imports => "imports",
            Feature::Indentation => "indentation",
            Feature::Environment => "environment",
            Feature::ArrowFunctions => "arrow-functions",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a parse produces.
///
/// `success` is false whenever an error was reported, including errors the
/// limits dropped from `diagnostics`; warnings never affect it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub success: bool,
    pub ast: Node,
    /// Error-severity diagnostics
    pub diagnostics: Vec<Diagnostic>,
    /// Warnings and notes
    pub warnings: Vec<Diagnostic>,
    /// `expr_N` → expression text of every `${...}` in the document
    pub compiled_expressions: BTreeMap<String, String>,
    /// Imports the document declares; companions it needs at runtime
    pub imports: Vec<ImportDecl>,
    pub features: BTreeSet<Feature>,
}

impl ParseResult {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Errors followed by warnings.
    pub fn all_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().chain(self.warnings.iter())
    }

    pub fn uses(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}
