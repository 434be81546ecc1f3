//! Lexical analysis for HoloScript+.
//! HoloScript+ 词法分析模块。
//!
//! This crate provides the lexer that converts source code into tokens,
//! including the `Indent`/`Dedent` layout markers.
//! 本 crate 提供词法分析器，将源代码转换为 token 序列。

mod lexer;
mod token;

pub use lexer::{Lexer, TAB_WIDTH};
pub use token::{Token, TokenKind};

/// Tokenize `source` in one call.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}
