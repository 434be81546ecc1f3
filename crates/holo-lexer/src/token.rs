//! Token definitions for HoloScript+.

use holo_common::{Position, Span};
use serde::{Deserialize, Serialize};

/// A token with its kind, text and location.
///
/// `text` is the identifier name, the unescaped contents of a string, the raw
/// numeric literal (sign and unit suffix included), or the expression inside
/// `${...}`. For punctuation it is the punctuation itself; layout tokens have
/// empty text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            line: position.line,
            column: position.column,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// True for `Identifier` tokens spelling `word`.
    pub fn is_ident(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == word
    }
}

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    Identifier,
    String,
    /// A string literal cut off by the end of the line or input.
    UnterminatedString,
    Number,
    Boolean,
    Null,
    /// `${...}` captured as an opaque expression.
    Interpolation,

    // Delimiters
    LParen,     // (
    RParen,     // )
    LBracket,   // [
    RBracket,   // ]
    LBrace,     // {
    RBrace,     // }

    // Punctuation
    Colon,      // :
    Comma,      // ,
    Dot,        // .
    Semicolon,  // ;
    At,         // @
    Hash,       // #
    Equals,     // =

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    Bang,       // !
    EqEq,       // ==
    BangEq,     // !=
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=
    AndAnd,     // &&
    OrOr,       // ||
    Question,   // ?
    QuestionQuestion,   // ??
    QuestionQuestionEq, // ??=
    FatArrow,   // =>
    Arrow,      // ->
    Spread,     // ...
    PlusEq,     // +=
    MinusEq,    // -=

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl TokenKind {
    /// Returns the literal kind for a reserved word, if any.
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "true" | "false" => Some(TokenKind::Boolean),
            "null" => Some(TokenKind::Null),
            _ => None,
        }
    }

    /// Layout tokens carry no text and are skipped inside brace blocks.
    pub fn is_layout(&self) -> bool {
        matches!(
            self,
            TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent
        )
    }

    /// Tokens that can end a value. A `-` right after one of these is a
    /// binary minus, not the sign of a number.
    pub fn ends_value(&self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::String
                | TokenKind::Number
                | TokenKind::Boolean
                | TokenKind::Null
                | TokenKind::Interpolation
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }

    /// Tokens that may begin a value literal.
    pub fn starts_value(&self) -> bool {
        matches!(
            self,
            TokenKind::String
                | TokenKind::UnterminatedString
                | TokenKind::Number
                | TokenKind::Boolean
                | TokenKind::Null
                | TokenKind::Interpolation
                | TokenKind::LBracket
        )
    }

    /// A short human-readable name used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::String => "string",
            TokenKind::UnterminatedString => "unterminated string",
            TokenKind::Number => "number",
            TokenKind::Boolean => "boolean",
            TokenKind::Null => "null",
            TokenKind::Interpolation => "interpolation",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Semicolon => "';'",
            TokenKind::At => "'@'",
            TokenKind::Hash => "'#'",
            TokenKind::Equals => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Bang => "'!'",
            TokenKind::EqEq => "'=='",
            TokenKind::BangEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::LtEq => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::GtEq => "'>='",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::Question => "'?'",
            TokenKind::QuestionQuestion => "'??'",
            TokenKind::QuestionQuestionEq => "'??='",
            TokenKind::FatArrow => "'=>'",
            TokenKind::Arrow => "'->'",
            TokenKind::Spread => "'...'",
            TokenKind::PlusEq => "'+='",
            TokenKind::MinusEq => "'-='",
            TokenKind::Newline => "newline",
            TokenKind::Indent => "indent",
            TokenKind::Dedent => "dedent",
            TokenKind::Eof => "end of input",
        }
    }
}
