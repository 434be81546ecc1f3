//! Writing values back as HoloScript+ source.

use crate::{ArrowBody, BinaryOp, ObjectEntry, Value};
use std::fmt;

/// Quote a string, escaping what the lexer unescapes.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn is_bare_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Binding strength of a value when it appears as an operand.
fn precedence(value: &Value) -> u8 {
    match value {
        Value::Arrow { .. } => 0,
        Value::Binary { op, .. } => op.precedence(),
        Value::Ternary { .. } => 4,
        Value::Unary { .. } => 9,
        _ => 10,
    }
}

struct Operand<'a>(&'a Value, u8);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if precedence(self.0) < self.1 {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

fn comma_separated<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for ObjectEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectEntry::Field { key, value } if is_bare_key(key) => write!(f, "{}: {}", key, value),
            ObjectEntry::Field { key, value } => write!(f, "{}: {}", escape_string(key), value),
            ObjectEntry::Spread(value) => write!(f, "...{}", Operand(value, 10)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(&escape_string(s)),
            Value::Number { raw, .. } => f.write_str(raw),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => f.write_str("null"),
            Value::Array(items) => {
                f.write_str("[")?;
                comma_separated(f, items)?;
                f.write_str("]")
            }
            Value::Object(entries) if entries.is_empty() => f.write_str("{}"),
            Value::Object(entries) => {
                f.write_str("{ ")?;
                comma_separated(f, entries)?;
                f.write_str(" }")
            }
            Value::Reference(name) => f.write_str(name),
            Value::Interpolation { expression, .. } => write!(f, "${{{}}}", expression),
            Value::Binary { op, left, right } => {
                let prec = op.precedence();
                // `??` chains nest to the right, everything else to the left
                let (left_min, right_min) = if *op == BinaryOp::Coalesce {
                    (prec + 1, prec)
                } else {
                    (prec, prec + 1)
                };
                write!(
                    f,
                    "{} {} {}",
                    Operand(left, left_min),
                    op.as_str(),
                    Operand(right, right_min)
                )
            }
            Value::Unary { op, operand } => write!(f, "{}{}", op.as_str(), Operand(operand, 9)),
            Value::Ternary {
                condition,
                then_branch,
                else_branch,
            } => write!(
                f,
                "{} ? {} : {}",
                Operand(condition, 5),
                then_branch,
                Operand(else_branch, 4)
            ),
            Value::Spread(inner) => write!(f, "...{}", Operand(inner, 10)),
            Value::Call { callee, args } => {
                write!(f, "{}(", Operand(callee, 10))?;
                comma_separated(f, args)?;
                f.write_str(")")
            }
            Value::Member { object, property } => write!(f, "{}.{}", Operand(object, 10), property),
            Value::Index { object, index } => write!(f, "{}[{}]", Operand(object, 10), index),
            Value::Arrow { params, body } => {
                f.write_str("(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if param.rest {
                        f.write_str("...")?;
                    }
                    f.write_str(&param.name)?;
                }
                f.write_str(") => ")?;
                match body {
                    ArrowBody::Expr(expr) => write!(f, "{}", expr),
                    ArrowBody::Block(block) => write!(f, "{{{}}}", block),
                }
            }
        }
    }
}
