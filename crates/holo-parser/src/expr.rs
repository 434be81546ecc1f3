//! Value and expression parsing.
//!
//! Precedence, lowest first: `??`, `||`, `&&`, `?:`, equality, comparison,
//! additive, multiplicative, unary, postfix.

use holo_lexer::TokenKind;
use holo_syntax::{ArrowBody, ArrowParam, BinaryOp, ObjectEntry, UnaryOp, Value};

use crate::parser::Parser;
use crate::recovery::{DelimiterKind, is_closer};
use crate::result::Feature;

impl Parser<'_> {
    /// Parse a value. On failure an error is reported, `value_failed` is set
    /// and `Value::Null` stands in for the missing value.
    pub(crate) fn parse_value(&mut self) -> Value {
        if !self.enter() {
            self.skip_value();
            self.value_failed = true;
            return Value::Null;
        }
        let value = self.parse_coalesce();
        self.leave();
        value
    }

    /// Skip one value-shaped construct without reading past a closer.
    fn skip_value(&mut self) {
        let kind = self.current_kind();
        if !is_closer(kind) && !kind.is_layout() {
            self.skip_balanced();
        }
    }

    fn parse_coalesce(&mut self) -> Value {
        let mut left = self.parse_or();
        while self.eat(TokenKind::QuestionQuestion) || self.eat(TokenKind::QuestionQuestionEq) {
            let right = self.parse_or();
            left = binary(BinaryOp::Coalesce, left, right);
        }
        left
    }

    fn parse_or(&mut self) -> Value {
        let mut left = self.parse_and();
        while self.eat(TokenKind::OrOr) {
            let right = self.parse_and();
            left = binary(BinaryOp::Or, left, right);
        }
        left
    }

    fn parse_and(&mut self) -> Value {
        let mut left = self.parse_ternary();
        while self.eat(TokenKind::AndAnd) {
            let right = self.parse_ternary();
            left = binary(BinaryOp::And, left, right);
        }
        left
    }

    /// `cond ? a : b`, right associative.
    fn parse_ternary(&mut self) -> Value {
        let failed_before = self.value_failed;
        let condition = self.parse_equality();
        // A condition that already failed leaves the `?` to synchronization
        if (self.value_failed && !failed_before) || !self.eat(TokenKind::Question) {
            return condition;
        }

        let then_branch = self.parse_value();
        let else_branch = if self.eat(TokenKind::Colon) {
            if self.enter() {
                let value = self.parse_ternary();
                self.leave();
                value
            } else {
                self.skip_value();
                self.value_failed = true;
                Value::Null
            }
        } else {
            self.unexpected("in conditional expression, expected ':'");
            self.value_failed = true;
            Value::Null
        };

        Value::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    fn parse_equality(&mut self) -> Value {
        let mut left = self.parse_comparison();
        loop {
            let op = match self.current_kind() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::BangEq => BinaryOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison();
            left = binary(op, left, right);
        }
        left
    }

    fn parse_comparison(&mut self) -> Value {
        let mut left = self.parse_additive();
        loop {
            let op = match self.current_kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive();
            left = binary(op, left, right);
        }
        left
    }

    fn parse_additive(&mut self) -> Value {
        let mut left = self.parse_multiplicative();
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative();
            left = binary(op, left, right);
        }
        left
    }

    fn parse_multiplicative(&mut self) -> Value {
        let mut left = self.parse_unary();
        loop {
            let op = match self.current_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary();
            left = binary(op, left, right);
        }
        left
    }

    fn parse_unary(&mut self) -> Value {
        let mut ops = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::Bang => ops.push(UnaryOp::Not),
                TokenKind::Minus => ops.push(UnaryOp::Neg),
                _ => break,
            }
            self.advance();
        }

        let mut value = self.parse_postfix();
        while let Some(op) = ops.pop() {
            value = Value::Unary {
                op,
                operand: Box::new(value),
            };
        }
        value
    }

    /// `.member` continues across lines; `[index]` and `(args)` only apply on
    /// the line of the value they follow.
    fn parse_postfix(&mut self) -> Value {
        let mut value = self.parse_primary();
        loop {
            let same_line = self.current().line == self.previous_line();
            match self.current_kind() {
                TokenKind::Dot => {
                    self.advance();
                    if self.check(TokenKind::Identifier) {
                        let property = self.current().text.clone();
                        self.advance();
                        value = Value::Member {
                            object: Box::new(value),
                            property,
                        };
                    } else {
                        self.unexpected("after '.', expected a property name");
                        self.value_failed = true;
                        break;
                    }
                }
                TokenKind::LBracket if same_line => {
                    self.advance();
                    let index = self.parse_value();
                    self.expect_closing(DelimiterKind::Bracket);
                    value = Value::Index {
                        object: Box::new(value),
                        index: Box::new(index),
                    };
                }
                TokenKind::LParen if same_line => {
                    self.advance();
                    let args = self.parse_sequence(DelimiterKind::Paren);
                    value = Value::Call {
                        callee: Box::new(value),
                        args,
                    };
                }
                _ => break,
            }
        }
        value
    }

    fn parse_primary(&mut self) -> Value {
        let token = self.current().clone();
        match token.kind {
            TokenKind::String => {
                self.advance();
                Value::String(token.text)
            }
            TokenKind::UnterminatedString => {
                self.report_unterminated(&token);
                self.advance();
                Value::String(token.text)
            }
            TokenKind::Number => {
                self.advance();
                Value::number(&token.text)
            }
            TokenKind::Boolean => {
                self.advance();
                Value::Bool(token.text == "true")
            }
            TokenKind::Null => {
                self.advance();
                Value::Null
            }
            TokenKind::Interpolation => {
                self.advance();
                self.features.insert(Feature::Interpolation);
                let id = format!("expr_{}", self.expressions.len());
                self.expressions.insert(id.clone(), token.text.clone());
                Value::Interpolation {
                    id,
                    expression: token.text,
                }
            }
            TokenKind::Identifier if self.peek_kind(1) == TokenKind::FatArrow => self.parse_arrow(),
            TokenKind::Identifier => {
                self.advance();
                Value::Reference(token.text)
            }
            TokenKind::LParen if self.arrow_ahead() => self.parse_arrow(),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_value();
                self.expect_closing(DelimiterKind::Paren);
                inner
            }
            TokenKind::LBracket => {
                self.advance();
                Value::Array(self.parse_sequence(DelimiterKind::Bracket))
            }
            TokenKind::LBrace => self.parse_object(),
            _ => {
                self.unexpected("where a value was expected");
                self.value_failed = true;
                self.skip_value();
                Value::Null
            }
        }
    }

    /// Comma separated values up to the closing delimiter, which is
    /// consumed. Items may be spreads; a trailing comma is allowed.
    fn parse_sequence(&mut self, delimiter: DelimiterKind) -> Vec<Value> {
        let closer = delimiter.closing_token();
        let mut items = Vec::new();

        loop {
            if self.eat(closer) {
                break;
            }
            if is_closer(self.current_kind()) {
                self.expect_closing(delimiter);
                return items;
            }

            self.value_failed = false;
            let item = if self.eat(TokenKind::Spread) {
                self.features.insert(Feature::Spread);
                Value::Spread(Box::new(self.parse_value()))
            } else {
                self.parse_value()
            };
            items.push(item);

            if self.value_failed {
                self.recover_in_list();
            }
            if !self.eat(TokenKind::Comma) && !self.check(closer) {
                self.expect_closing(delimiter);
                return items;
            }
        }

        // Any failure inside was recovered; the cursor is past the closer
        self.value_failed = false;
        items
    }

    /// `{ key: value, "quoted": value, short, ...base }`
    pub(crate) fn parse_object(&mut self) -> Value {
        let open = self.current().clone();
        self.advance(); // {
        let mut entries = Vec::new();

        loop {
            let token = self.current().clone();
            match token.kind {
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    let diagnostic = self.engine.missing_brace(
                        holo_common::Span::new(token.span.start, token.span.start),
                        self.end_position(),
                    );
                    self.report(diagnostic.with_label(holo_diagnostic::Label::new(
                        open.span,
                        "object opened here",
                    )));
                    self.value_failed = true;
                    return Value::Object(entries);
                }
                TokenKind::Comma | TokenKind::Semicolon => self.advance(),
                TokenKind::Spread => {
                    self.advance();
                    self.features.insert(Feature::Spread);
                    entries.push(ObjectEntry::Spread(self.parse_value()));
                    if self.value_failed {
                        self.recover_in_list();
                    }
                }
                TokenKind::Identifier
                | TokenKind::String
                | TokenKind::Number
                | TokenKind::Boolean
                | TokenKind::Null => {
                    self.advance();
                    let value = if self.eat(TokenKind::Colon) || self.eat(TokenKind::Equals) {
                        self.parse_value()
                    } else if token.kind == TokenKind::Identifier
                        && matches!(self.current_kind(), TokenKind::Comma | TokenKind::RBrace)
                    {
                        Value::Reference(token.text.clone())
                    } else {
                        let diagnostic =
                            self.engine
                                .missing_colon(&token.text, token.span, token.position());
                        self.report(diagnostic);
                        self.parse_value()
                    };
                    entries.push(ObjectEntry::Field {
                        key: token.text,
                        value,
                    });
                    if self.value_failed {
                        self.recover_in_list();
                    }
                }
                _ => {
                    self.unexpected("in object literal");
                    self.value_failed = true;
                    // A stray ')' or ']' is consumed here; list recovery stops at closers
                    if matches!(token.kind, TokenKind::RParen | TokenKind::RBracket) {
                        self.advance();
                    } else {
                        self.skip_value();
                    }
                    self.recover_in_list();
                }
            }
        }

        self.value_failed = false;
        Value::Object(entries)
    }

    /// Is the `(` at the cursor the start of an arrow function's parameters?
    fn arrow_ahead(&self) -> bool {
        let mut i = 1;
        if self.raw_kind(i) != TokenKind::RParen {
            loop {
                if self.raw_kind(i) == TokenKind::Spread {
                    i += 1;
                }
                if self.raw_kind(i) != TokenKind::Identifier {
                    return false;
                }
                i += 1;
                match self.raw_kind(i) {
                    TokenKind::Comma => i += 1,
                    TokenKind::RParen => break,
                    _ => return false,
                }
            }
        }
        self.raw_kind(i + 1) == TokenKind::FatArrow
    }

    /// `x => expr`, `(a, ...rest) => expr` or `() => { block }`.
    fn parse_arrow(&mut self) -> Value {
        self.features.insert(Feature::ArrowFunctions);
        let mut params = Vec::new();

        if self.check(TokenKind::Identifier) {
            params.push(ArrowParam {
                name: self.current().text.clone(),
                rest: false,
            });
            self.advance();
        } else {
            self.advance(); // (
            while !self.eat(TokenKind::RParen) {
                let rest = self.eat(TokenKind::Spread);
                if rest {
                    self.features.insert(Feature::Spread);
                }
                params.push(ArrowParam {
                    name: self.current().text.clone(),
                    rest,
                });
                self.advance();
                self.eat(TokenKind::Comma);
            }
        }
        self.eat(TokenKind::FatArrow);

        let body = if self.check(TokenKind::LBrace) {
            ArrowBody::Block(self.capture_block().unwrap_or_default())
        } else {
            ArrowBody::Expr(Box::new(self.parse_value()))
        };
        Value::Arrow { params, body }
    }

    fn expect_closing(&mut self, delimiter: DelimiterKind) {
        if !self.eat(delimiter.closing_token()) {
            let expected = delimiter.closing_token().describe();
            self.unexpected(&format!("where {} was expected", expected));
            self.value_failed = true;
        }
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Value {
    Value::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use crate::{ParserOptions, parse_with_options};
    use holo_syntax::{BinaryOp, Value};

    fn value_of(source: &str) -> Value {
        let result = parse_with_options(&format!("object {{ v: {} }}", source), &ParserOptions::default());
        assert!(result.success, "{}: {:?}", source, result.diagnostics);
        result.ast.properties["v"].clone()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(value_of("1 + 2 * 3").to_string(), "1 + 2 * 3");
        assert_eq!(value_of("(1 + 2) * 3").to_string(), "(1 + 2) * 3");
        let Value::Binary { op, .. } = value_of("a || b && c") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Or);
    }

    #[test]
    fn test_coalesce_binds_loosest() {
        let Value::Binary { op, right, .. } = value_of("a ?? b || c") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Coalesce);
        assert!(matches!(*right, Value::Binary { op: BinaryOp::Or, .. }));
    }

    #[test]
    fn test_ternary_is_right_associative() {
        let value = value_of("a ? 1 : b ? 2 : 3");
        let Value::Ternary { else_branch, .. } = value else {
            panic!("expected ternary");
        };
        assert!(matches!(*else_branch, Value::Ternary { .. }));
    }

    #[test]
    fn test_postfix_chain() {
        assert_eq!(value_of("scene.objects[0].position(1, 2)").to_string(), "scene.objects[0].position(1, 2)");
    }

    #[test]
    fn test_arrow_functions() {
        assert_eq!(value_of("(a, ...rest) => a + 1").to_string(), "(a, ...rest) => a + 1");
        assert_eq!(value_of("x => x * 2").to_string(), "(x) => x * 2");
        assert!(matches!(value_of("() => { play() }"), Value::Arrow { .. }));
    }

    #[test]
    fn test_object_shorthand_and_spread() {
        assert_eq!(value_of("{ a, ...base, b: 2 }").to_string(), "{ a: a, ...base, b: 2 }");
    }

    #[test]
    fn test_unary_stack() {
        assert_eq!(value_of("!!ready").to_string(), "!!ready");
        assert_eq!(value_of("-x").to_string(), "-x");
    }
}
