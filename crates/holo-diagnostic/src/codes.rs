//! Error codes for HoloScript+ diagnostics.

use serde::{Deserialize, Serialize};

/// Error codes for categorizing diagnostics.
///
/// Every code has a numeric identifier (`as_str`) and a stable kebab-case
/// name (`name`) that downstream tooling may match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    // Structural errors (E0100 - E0199)
    MissingBrace,
    MissingColon,
    MissingQuote,
    UnexpectedToken,
    SyntaxError,
    NestingTooDeep,

    // Vocabulary (E0200 - E0299)
    UnknownKeyword,
    UnknownTrait,
    UnknownGeometry,
    UnknownDirective,

    // Element-level (E0300 - E0399)
    TraitConflict,
    TraitRequires,
    InvalidValue,
    DuplicateName,
    MissingRequired,

    // Cross-file and worker (E0400 - E0499)
    UnresolvedImport,
    WorkerFailure,
    TaskTimeout,
}

impl ErrorCode {
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::MissingBrace,
        ErrorCode::MissingColon,
        ErrorCode::MissingQuote,
        ErrorCode::UnexpectedToken,
        ErrorCode::SyntaxError,
        ErrorCode::NestingTooDeep,
        ErrorCode::UnknownKeyword,
        ErrorCode::UnknownTrait,
        ErrorCode::UnknownGeometry,
        ErrorCode::UnknownDirective,
        ErrorCode::TraitConflict,
        ErrorCode::TraitRequires,
        ErrorCode::InvalidValue,
        ErrorCode::DuplicateName,
        ErrorCode::MissingRequired,
        ErrorCode::UnresolvedImport,
        ErrorCode::WorkerFailure,
        ErrorCode::TaskTimeout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            // Structural
            ErrorCode::MissingBrace => "E0100",
            ErrorCode::MissingColon => "E0101",
            ErrorCode::MissingQuote => "E0102",
            ErrorCode::UnexpectedToken => "E0103",
            ErrorCode::SyntaxError => "E0104",
            ErrorCode::NestingTooDeep => "E0105",

            // Vocabulary
            ErrorCode::UnknownKeyword => "E0200",
            ErrorCode::UnknownTrait => "E0201",
            ErrorCode::UnknownGeometry => "E0202",
            ErrorCode::UnknownDirective => "E0203",

            // Element
            ErrorCode::TraitConflict => "E0300",
            ErrorCode::TraitRequires => "E0301",
            ErrorCode::InvalidValue => "E0302",
            ErrorCode::DuplicateName => "E0303",
            ErrorCode::MissingRequired => "E0304",

            // Cross-file
            ErrorCode::UnresolvedImport => "E0400",
            ErrorCode::WorkerFailure => "E0401",
            ErrorCode::TaskTimeout => "E0402",
        }
    }

    /// The stable kebab-case identifier of this code.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::MissingBrace => "missing-brace",
            ErrorCode::MissingColon => "missing-colon",
            ErrorCode::MissingQuote => "missing-quote",
            ErrorCode::UnexpectedToken => "unexpected-token",
            ErrorCode::SyntaxError => "syntax-error",
            ErrorCode::NestingTooDeep => "nesting-too-deep",
            ErrorCode::UnknownKeyword => "unknown-keyword",
            ErrorCode::UnknownTrait => "unknown-trait",
            ErrorCode::UnknownGeometry => "unknown-geometry",
            ErrorCode::UnknownDirective => "unknown-directive",
            ErrorCode::TraitConflict => "trait-conflict",
            ErrorCode::TraitRequires => "trait-requires",
            ErrorCode::InvalidValue => "invalid-value",
            ErrorCode::DuplicateName => "duplicate-name",
            ErrorCode::MissingRequired => "missing-required",
            ErrorCode::UnresolvedImport => "unresolved-import",
            ErrorCode::WorkerFailure => "worker-failure",
            ErrorCode::TaskTimeout => "task-timeout",
        }
    }

    /// Look a code up by its kebab-case name.
    pub fn from_name(name: &str) -> Option<ErrorCode> {
        Self::ALL.iter().copied().find(|code| code.name() == name)
    }

    /// Structural errors always trigger parser synchronization.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ErrorCode::MissingBrace
                | ErrorCode::MissingColon
                | ErrorCode::MissingQuote
                | ErrorCode::UnexpectedToken
                | ErrorCode::SyntaxError
                | ErrorCode::NestingTooDeep
        )
    }

    /// Get a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::MissingBrace => "missing closing brace",
            ErrorCode::MissingColon => "missing colon between property name and value",
            ErrorCode::MissingQuote => "string literal is not terminated",
            ErrorCode::UnexpectedToken => "unexpected token",
            ErrorCode::SyntaxError => "syntax error",
            ErrorCode::NestingTooDeep => "nesting exceeds the maximum depth",
            ErrorCode::UnknownKeyword => "unknown keyword",
            ErrorCode::UnknownTrait => "unknown trait",
            ErrorCode::UnknownGeometry => "unknown geometry",
            ErrorCode::UnknownDirective => "unknown directive",
            ErrorCode::TraitConflict => "conflicting traits on the same element",
            ErrorCode::TraitRequires => "trait requires another trait",
            ErrorCode::InvalidValue => "invalid value",
            ErrorCode::DuplicateName => "duplicate name",
            ErrorCode::MissingRequired => "missing required declaration",
            ErrorCode::UnresolvedImport => "imported symbol is not exported by any file",
            ErrorCode::WorkerFailure => "worker failed while parsing",
            ErrorCode::TaskTimeout => "parse task timed out",
        }
    }

    /// Get a suggested fix for the error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ErrorCode::MissingBrace => Some("add `}` to close the block"),
            ErrorCode::MissingColon => Some("add `:` between the property name and its value"),
            ErrorCode::MissingQuote => Some("add a closing quote to terminate the string"),
            ErrorCode::NestingTooDeep => Some("flatten the structure or split it into templates"),
            ErrorCode::UnknownTrait => Some("check the trait name against the known trait list"),
            ErrorCode::UnknownGeometry => Some("use a built-in geometry or a `model/` path"),
            ErrorCode::UnresolvedImport => Some("check that the imported file exports this name"),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
