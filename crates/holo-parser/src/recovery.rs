//! Error recovery strategies for the parser.
//!
//! After an error the parser skips forward to a point where parsing can
//! sensibly resume, so one malformed statement does not hide the rest of the
//! document.

use holo_diagnostic::vocabulary::{COMPOSITION_KEYWORDS, STRUCTURAL_KEYWORDS, is_element_keyword};
use holo_lexer::{Token, TokenKind};

/// Tokens that end the construct currently being parsed.
pub const CLOSERS: &[TokenKind] = &[
    TokenKind::RBrace,
    TokenKind::RParen,
    TokenKind::RBracket,
    TokenKind::Eof,
];

/// Tokens that are synchronization points.
pub const SYNC_TOKENS: &[TokenKind] = &[TokenKind::RBrace, TokenKind::At, TokenKind::Eof];

/// Line structure tokens; synchronization points while layout is significant.
pub const LINE_ENDS: &[TokenKind] = &[TokenKind::Newline, TokenKind::Indent, TokenKind::Dedent];

/// Check if a token kind is in a set.
pub fn is_in_set(kind: TokenKind, set: &[TokenKind]) -> bool {
    set.contains(&kind)
}

pub fn is_closer(kind: TokenKind) -> bool {
    is_in_set(kind, CLOSERS)
}

/// Check if a token is a synchronization point.
pub fn is_sync_token(kind: TokenKind) -> bool {
    is_in_set(kind, SYNC_TOKENS)
}

/// Check if a token is a keyword that introduces an element.
pub fn starts_construct(token: &Token) -> bool {
    token.kind == TokenKind::Identifier && is_construct_keyword(&token.text)
}

pub fn is_construct_keyword(word: &str) -> bool {
    is_element_keyword(word) || STRUCTURAL_KEYWORDS.contains(&word) || COMPOSITION_KEYWORDS.contains(&word)
}

/// Delimiter kinds for recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterKind {
    Paren,   // )
    Bracket, // ]
    Brace,   // }
}

impl DelimiterKind {
    pub fn from_opening(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::LParen => Some(DelimiterKind::Paren),
            TokenKind::LBracket => Some(DelimiterKind::Bracket),
            TokenKind::LBrace => Some(DelimiterKind::Brace),
            _ => None,
        }
    }

    pub fn closing_token(&self) -> TokenKind {
        match self {
            DelimiterKind::Paren => TokenKind::RParen,
            DelimiterKind::Bracket => TokenKind::RBracket,
            DelimiterKind::Brace => TokenKind::RBrace,
        }
    }

    pub fn opening_token(&self) -> TokenKind {
        match self {
            DelimiterKind::Paren => TokenKind::LParen,
            DelimiterKind::Bracket => TokenKind::LBracket,
            DelimiterKind::Brace => TokenKind::LBrace,
        }
    }
}
