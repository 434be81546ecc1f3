//! Property values and expressions.
//! 属性值与表达式。

use serde::{Deserialize, Serialize};

/// A property value. Expressions are values too, so that a property can hold
/// `hp > 0 ? "alive" : "dead"` without a separate expression tree.
/// 属性值。表达式也是值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// String literal / 字符串字面量
    String(String),
    /// Number literal, unit suffix kept apart / 数字字面量（单位单独保存）
    Number {
        value: f64,
        unit: Option<String>,
        /// The literal as written, e.g. `-2.5m`
        raw: String,
    },
    /// Boolean literal / 布尔字面量
    Bool(bool),
    /// `null`
    Null,
    /// `[a, b, ...rest]` / 数组
    Array(Vec<Value>),
    /// `{ key: value, ...base }` / 对象
    Object(Vec<ObjectEntry>),
    /// Bare identifier / 标识符引用
    Reference(String),
    /// `${...}` placeholder; `id` keys the compiled expression table
    /// 插值占位符
    Interpolation { id: String, expression: String },
    /// Binary operation / 二元运算
    Binary {
        op: BinaryOp,
        left: Box<Value>,
        right: Box<Value>,
    },
    /// Unary operation / 一元运算
    Unary { op: UnaryOp, operand: Box<Value> },
    /// `cond ? a : b` / 三元表达式
    Ternary {
        condition: Box<Value>,
        then_branch: Box<Value>,
        else_branch: Box<Value>,
    },
    /// `...expr` inside an array, object or argument list / 展开
    Spread(Box<Value>),
    /// `f(args)` / 函数调用
    Call { callee: Box<Value>, args: Vec<Value> },
    /// `obj.prop` / 成员访问
    Member { object: Box<Value>, property: String },
    /// `obj[index]` / 索引访问
    Index { object: Box<Value>, index: Box<Value> },
    /// `(a, ...rest) => body` / 箭头函数
    Arrow { params: Vec<ArrowParam>, body: ArrowBody },
}

impl Value {
    /// Build a number value from a raw literal such as `2m`, `-0.5` or `50%`.
    pub fn number(raw: &str) -> Value {
        let split = raw
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_alphabetic() || *c == '%')
            .last()
            .map(|(i, _)| i)
            .unwrap_or(raw.len());
        let (digits, unit) = raw.split_at(split);
        Value::Number {
            value: digits.parse().unwrap_or(0.0),
            unit: (!unit.is_empty()).then(|| unit.to_string()),
            raw: raw.to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_spread(&self) -> bool {
        matches!(self, Value::Spread(_))
    }

    /// Look up a field of an object value.
    pub fn field(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(entries) => entries.iter().rev().find_map(|entry| match entry {
                ObjectEntry::Field { key: k, value } if k == key => Some(value),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Identifiers this value refers to, in source order.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Value::Reference(name) => out.push(name),
            Value::Array(items) => items.iter().for_each(|v| v.collect_references(out)),
            Value::Object(entries) => {
                for entry in entries {
                    match entry {
                        ObjectEntry::Field { value, .. } | ObjectEntry::Spread(value) => {
                            value.collect_references(out)
                        }
                    }
                }
            }
            Value::Binary { left, right, .. } => {
                left.collect_references(out);
                right.collect_references(out);
            }
            Value::Unary { operand, .. } | Value::Spread(operand) => operand.collect_references(out),
            Value::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.collect_references(out);
                then_branch.collect_references(out);
                else_branch.collect_references(out);
            }
            Value::Call { callee, args } => {
                callee.collect_references(out);
                args.iter().for_each(|v| v.collect_references(out));
            }
            Value::Member { object, .. } => object.collect_references(out),
            Value::Index { object, index } => {
                object.collect_references(out);
                index.collect_references(out);
            }
            Value::Arrow { body, .. } => {
                if let ArrowBody::Expr(expr) = body {
                    expr.collect_references(out);
                }
            }
            Value::String(_)
            | Value::Number { .. }
            | Value::Bool(_)
            | Value::Null
            | Value::Interpolation { .. } => {}
        }
    }
}

/// One entry of an object literal.
/// 对象字面量中的一项。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectEntry {
    Field { key: String, value: Value },
    Spread(Value),
}

/// Binary operator.
/// 二元运算符。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Coalesce, // ??
    Or,       // ||
    And,      // &&
    Eq,       // ==
    Ne,       // !=
    Lt,       // <
    Le,       // <=
    Gt,       // >
    Ge,       // >=
    Add,      // +
    Sub,      // -
    Mul,      // *
    Div,      // /
    Mod,      // %
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Coalesce => "??",
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }

    /// Binding strength, higher binds tighter. Ternaries sit between
    /// `&&` (3) and equality (5).
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Coalesce => 1,
            BinaryOp::Or => 2,
            BinaryOp::And => 3,
            BinaryOp::Eq | BinaryOp::Ne => 5,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 6,
            BinaryOp::Add | BinaryOp::Sub => 7,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 8,
        }
    }
}

/// Unary operator.
/// 一元运算符。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not, // !
    Neg, // -
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        }
    }
}

/// An arrow function parameter. `rest` marks `...name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrowParam {
    pub name: String,
    pub rest: bool,
}

/// Arrow function body: an expression, or a block kept as raw source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum ArrowBody {
    Expr(Box<Value>),
    Block(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_units() {
        assert_eq!(
            Value::number("2m"),
            Value::Number {
                value: 2.0,
                unit: Some("m".into()),
                raw: "2m".into()
            }
        );
        assert_eq!(Value::number("50%").as_f64(), Some(50.0));
        assert_eq!(Value::number("-1.5e2").as_f64(), Some(-150.0));

        let Value::Number { unit, .. } = Value::number("1e5px") else {
            panic!("expected number");
        };
        assert_eq!(unit.as_deref(), Some("px"));
    }

    #[test]
    fn test_references() {
        let value = Value::Ternary {
            condition: Box::new(Value::Reference("a".into())),
            then_branch: Box::new(Value::Spread(Box::new(Value::Reference("b".into())))),
            else_branch: Box::new(Value::Null),
        };
        assert_eq!(value.references(), vec!["a", "b"]);
    }
}
