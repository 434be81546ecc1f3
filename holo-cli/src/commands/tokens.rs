//! The `holo tokens` command.

use crate::output;
use holo_lexer::{TokenKind, tokenize};

/// Print one token per line: position, kind and text.
pub fn run(file: &str) -> Result<(), String> {
    let source = output::read_source(file)?;
    for token in tokenize(&source) {
        match token.kind {
            TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent | TokenKind::Eof => {
                println!("{:>4}:{:<3} {:?}", token.line, token.column, token.kind)
            }
            _ => println!("{:>4}:{:<3} {:?} {:?}", token.line, token.column, token.kind, token.text),
        }
    }
    Ok(())
}
