//! The HoloScript+ lexer.
//! HoloScript+ 词法分析器。

use crate::token::{Token, TokenKind};
use holo_common::{Position, Span};

/// Columns a tab counts for when measuring indentation.
/// 计算缩进时一个制表符占的列数。
pub const TAB_WIDTH: usize = 4;

/// The HoloScript+ lexer.
/// HoloScript+ 词法分析器。
///
/// Converts source code into a sequence of tokens. The lexer never fails:
/// characters it does not recognise are skipped, leaving error reporting to
/// the parser.
/// 将源代码转换为 token 序列。词法分析器从不失败，无法识别的字符会被跳过。
pub struct Lexer<'src> {
    source: &'src str,
    /// Character iterator with position info
    /// 带位置信息的字符迭代器
    chars: std::iter::Peekable<std::str::CharIndices<'src>>,
    /// Current byte position in source
    /// 当前在源码中的字节位置
    pos: usize,
    line: u32,
    column: u32,
    /// Widths of the currently open indentation levels, innermost last
    /// 当前打开的缩进层级宽度，最内层在最后
    indent_stack: Vec<usize>,
    pending_dedents: usize,
    pending_indent: bool,
    at_line_start: bool,
    /// Whether the current logical line produced a token yet
    /// 当前逻辑行是否已经产生 token
    line_has_token: bool,
    /// Open `(` / `[` count; layout is ignored inside them
    /// 未闭合的 `(` / `[` 数量，其中不跟踪缩进
    group_depth: u32,
    last_kind: Option<TokenKind>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code.
    /// 为给定的源代码创建新的词法分析器。
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            pos: 0,
            line: 1,
            column: 1,
            indent_stack: vec![0],
            pending_dedents: 0,
            pending_indent: false,
            at_line_start: true,
            line_has_token: false,
            group_depth: 0,
            last_kind: None,
        }
    }

    /// Tokenize the entire source. The last token is always `Eof`.
    /// 对整个源代码进行词法分析，最后一个 token 总是 `Eof`。
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        tokens
    }

    /// Get the next token, flushing deferred layout tokens first.
    /// 获取下一个 token，先输出延迟的布局 token。
    fn next_token(&mut self) -> Token {
        loop {
            if self.pending_dedents > 0 {
                self.pending_dedents -= 1;
                return self.layout(TokenKind::Dedent);
            }
            if self.pending_indent {
                self.pending_indent = false;
                return self.layout(TokenKind::Indent);
            }
            if self.at_line_start && self.group_depth == 0 {
                self.at_line_start = false;
                self.measure_indentation();
                continue;
            }

            self.skip_trivia();

            let start = self.pos;
            let position = self.position();
            let Some(ch) = self.peek_char() else {
                return self.finish();
            };

            if ch == '\n' {
                self.advance();
                if self.group_depth > 0 {
                    continue;
                }
                self.at_line_start = true;
                if self.line_has_token {
                    self.line_has_token = false;
                    self.last_kind = Some(TokenKind::Newline);
                    return Token::new(
                        TokenKind::Newline,
                        "\n",
                        Span::from_usize(start, self.pos),
                        position,
                    );
                }
                continue;
            }

            self.advance();
            // Unrecognised characters produce nothing - 无法识别的字符不产生 token
            let Some((kind, text)) = self.scan(ch, start) else {
                continue;
            };

            match kind {
                TokenKind::LParen | TokenKind::LBracket => self.group_depth += 1,
                TokenKind::RParen | TokenKind::RBracket => {
                    self.group_depth = self.group_depth.saturating_sub(1)
                }
                _ => {}
            }
            self.line_has_token = true;
            self.last_kind = Some(kind);

            return Token::new(kind, text, Span::from_usize(start, self.pos), position);
        }
    }

    /// Scan one token whose first character has already been consumed.
    /// 扫描一个 token（首字符已被消耗）。
    fn scan(&mut self, ch: char, start: usize) -> Option<(TokenKind, String)> {
        let kind = match ch {
            // Single character tokens - 单字符 token
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '@' => TokenKind::At,
            '#' => TokenKind::Hash,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,

            // Dot or spread - 点或展开
            '.' => {
                if self.peek_nth(0) == Some('.') && self.peek_nth(1) == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::Spread
                } else {
                    TokenKind::Dot
                }
            }

            // Equals, EqEq, or FatArrow - 等号、双等号或胖箭头
            '=' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                    }
                    TokenKind::EqEq
                } else if self.peek_char() == Some('>') {
                    self.advance();
                    TokenKind::FatArrow
                } else {
                    TokenKind::Equals
                }
            }

            '!' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                    }
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                }
            }

            '<' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }

            '>' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }

            '&' => {
                if self.peek_char() != Some('&') {
                    return None;
                }
                self.advance();
                TokenKind::AndAnd
            }

            '|' => {
                if self.peek_char() != Some('|') {
                    return None;
                }
                self.advance();
                TokenKind::OrOr
            }

            // Question, null-coalescing, or null-coalescing assignment
            // 问号、空值合并或空值合并赋值
            '?' => {
                if self.peek_char() == Some('?') {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        TokenKind::QuestionQuestionEq
                    } else {
                        TokenKind::QuestionQuestion
                    }
                } else {
                    TokenKind::Question
                }
            }

            '+' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }

            // Minus, Arrow, MinusEq, or a negative number
            // 减号、箭头、减等于或负数
            '-' => {
                if self.peek_char() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::MinusEq
                } else if self.peek_nth(0).is_some_and(|c| c.is_ascii_digit())
                    && !self.last_kind.is_some_and(|k| k.ends_value())
                {
                    return Some(self.number(start));
                } else {
                    TokenKind::Minus
                }
            }

            // String literal, either quote style - 字符串字面量（两种引号）
            '"' | '\'' => return Some(self.string_literal(ch)),

            // Interpolation ${...} - 插值表达式
            '$' if self.peek_nth(0) == Some('{') => return Some(self.interpolation()),

            // Numbers - 数字
            '0'..='9' => return Some(self.number(start)),

            // Identifiers and keywords - 标识符和关键字
            c if is_ident_start(c) => return Some(self.identifier(start)),

            _ => return None,
        };

        Some((kind, self.source[start..self.pos].to_string()))
    }

    /// Emit the layout tokens still owed at end of input, then `Eof`.
    /// 在输入结束时输出剩余的布局 token，然后输出 `Eof`。
    fn finish(&mut self) -> Token {
        let span = Span::from_usize(self.pos, self.pos);
        let position = self.position();

        if self.line_has_token {
            self.line_has_token = false;
            self.last_kind = Some(TokenKind::Newline);
            return Token::new(TokenKind::Newline, "", span, position);
        }
        if self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            return self.layout(TokenKind::Dedent);
        }
        Token::new(TokenKind::Eof, "", span, position)
    }

    fn layout(&mut self, kind: TokenKind) -> Token {
        self.last_kind = Some(kind);
        Token::new(
            kind,
            "",
            Span::from_usize(self.pos, self.pos),
            self.position(),
        )
    }

    /// Measure the indentation of a new logical line and queue layout tokens.
    /// Blank and comment-only lines leave the indentation stack untouched.
    /// 测量新逻辑行的缩进并排队布局 token。空行和纯注释行不影响缩进栈。
    fn measure_indentation(&mut self) {
        let mut width = 0;
        while let Some(ch) = self.peek_char() {
            match ch {
                ' ' => width += 1,
                '\t' => width += TAB_WIDTH,
                '\r' => {}
                _ => break,
            }
            self.advance();
        }

        match self.peek_char() {
            None | Some('\n') => return,
            Some('/') if self.peek_nth(1) == Some('/') => {
                self.skip_line_comment();
                return;
            }
            Some('#') => {
                self.skip_line_comment();
                return;
            }
            Some('/') if self.peek_nth(1) == Some('*') => {
                self.skip_block_comment();
                self.skip_inline_whitespace();
                if matches!(self.peek_char(), None | Some('\n')) {
                    return;
                }
            }
            _ => {}
        }

        let current = self.indent_stack.last().copied().unwrap_or(0);
        if width > current {
            self.indent_stack.push(width);
            self.pending_indent = true;
        } else if width < current {
            while self.indent_stack.len() > 1
                && self.indent_stack.last().is_some_and(|&w| w > width)
            {
                self.indent_stack.pop();
                self.pending_dedents += 1;
            }
            // Dedent to a width that was never opened: treat it as a new level
            // 缩进回退到从未打开过的宽度：视为新层级
            if self.indent_stack.last().is_some_and(|&w| w < width) {
                self.indent_stack.push(width);
                self.pending_indent = true;
            }
        }
    }

    /// Advance to the next character, tracking line and column.
    /// 前进到下一个字符，同时跟踪行号和列号。
    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.pos = pos + ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        result
    }

    /// Peek at the next character without consuming it.
    /// 查看下一个字符但不消耗它。
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    /// Peek at the nth character ahead.
    /// 查看前方第 n 个字符。
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n).map(|(_, ch)| ch)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn skip_inline_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\r') = self.peek_char() {
            self.advance();
        }
    }

    /// Skip spaces and comments, stopping at a newline.
    /// 跳过空格和注释，在换行处停止。
    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(' ' | '\t' | '\r') => {
                    self.advance();
                }
                Some('/') if self.peek_nth(1) == Some('/') => self.skip_line_comment(),
                Some('/') if self.peek_nth(1) == Some('*') => self.skip_block_comment(),
                Some('#') if !self.hash_starts_id() => self.skip_line_comment(),
                _ => break,
            }
        }
    }

    /// `#` directly followed by a name after other tokens on the line is an
    /// element id marker; anywhere else it starts a comment.
    fn hash_starts_id(&self) -> bool {
        self.line_has_token && self.peek_nth(1).is_some_and(is_ident_start)
    }

    /// Skip a line comment, leaving the newline in place.
    /// 跳过行注释，保留换行符。
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip a block comment (/* ... */). Unterminated comments run to the end.
    /// 跳过块注释（/* ... */）。未终止的注释延续到末尾。
    fn skip_block_comment(&mut self) {
        self.advance(); // /
        self.advance(); // *
        while let Some((_, ch)) = self.advance() {
            if ch == '*' && self.peek_char() == Some('/') {
                self.advance();
                break;
            }
        }
    }

    /// Parse a string literal. The opening quote is already consumed.
    /// 解析字符串字面量（开头引号已被消耗）。
    fn string_literal(&mut self, quote: char) -> (TokenKind, String) {
        let mut value = String::new();

        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    if value.ends_with('\r') {
                        value.pop();
                    }
                    return (TokenKind::UnterminatedString, value);
                }
                Some(c) if c == quote => {
                    self.advance();
                    return (TokenKind::String, value);
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('n') => value.push('\n'),   // newline - 换行
                        Some('t') => value.push('\t'),   // tab - 制表符
                        Some('r') => value.push('\r'),   // carriage return - 回车
                        Some('\\') => value.push('\\'),  // backslash - 反斜杠
                        Some('"') => value.push('"'),    // double quote - 双引号
                        Some('\'') => value.push('\''),  // single quote - 单引号
                        None | Some('\n') => {
                            value.push('\\');
                            continue;
                        }
                        // Unknown escapes pass through - 未知转义原样保留
                        Some(other) => {
                            value.push('\\');
                            value.push(other);
                        }
                    }
                    self.advance();
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }
    }

    /// Capture `${...}` as one token, counting braces so nested `{}` stay
    /// inside the expression.
    /// 将 `${...}` 作为一个 token 捕获，计算花括号深度。
    fn interpolation(&mut self) -> (TokenKind, String) {
        self.advance(); // {
        let mut expr = String::new();
        let mut depth = 1u32;

        while let Some((_, ch)) = self.advance() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            expr.push(ch);
        }

        (TokenKind::Interpolation, expr.trim().to_string())
    }

    /// Parse a number literal with optional sign, fraction, exponent and unit.
    /// 解析数字字面量，可带符号、小数、指数和单位。
    fn number(&mut self, start: usize) -> (TokenKind, String) {
        self.eat_digits();

        // Decimal part - 小数部分
        if self.peek_char() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.eat_digits();
        }

        // Exponent - 指数部分
        if let Some('e' | 'E') = self.peek_char() {
            let has_exponent = match self.peek_nth(1) {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => self.peek_nth(2).is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if has_exponent {
                self.advance();
                if let Some('+' | '-') = self.peek_char() {
                    self.advance();
                }
                self.eat_digits();
            }
        }

        // Unit suffix (2m, 90deg, 50%) - 单位后缀
        if self.peek_char() == Some('%') {
            self.advance();
        } else {
            while let Some(ch) = self.peek_char() {
                if ch.is_alphabetic() {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        (TokenKind::Number, self.source[start..self.pos].to_string())
    }

    fn eat_digits(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Parse an identifier or literal keyword.
    /// 解析标识符或字面量关键字。
    fn identifier(&mut self, start: usize) -> (TokenKind, String) {
        while let Some(ch) = self.peek_char() {
            if is_ident_continue(ch) {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.pos];
        let kind = TokenKind::keyword_from_str(text).unwrap_or(TokenKind::Identifier);
        (kind, text.to_string())
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_indent_and_dedent() {
        let source = "object \"A\"\n  color: 1\nobject \"B\"\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Identifier,
                TokenKind::String,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Dedent,
                TokenKind::Identifier,
                TokenKind::String,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unclosed_indentation_is_closed_at_eof() {
        let tokens = kinds("a\n  b\n    c");
        let indents = tokens.iter().filter(|k| **k == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|k| **k == TokenKind::Dedent).count();
        assert_eq!(indents, 2);
        assert_eq!(dedents, 2);
        assert_eq!(tokens.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn test_layout_ignored_inside_brackets() {
        let tokens = kinds("items: [\n    1,\n    2\n]\n");
        assert!(!tokens.contains(&TokenKind::Indent));
        assert_eq!(tokens.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
    }

    #[test]
    fn test_negative_number_vs_minus() {
        let tokens = Lexer::new("x: -2\ny: a-2").tokenize();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert!(texts.contains(&"-2"));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Minus));
    }

    #[test]
    fn test_hash_id_versus_comment() {
        let tokens = kinds("orb #ball # trailing comment\n# full line\n");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Identifier,
                TokenKind::Hash,
                TokenKind::Identifier,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }
}
