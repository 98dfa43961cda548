//! Composable boolean tests over entries.
//!
//! A [`Predicate`] is a small expression tree: leaf tests look at one field
//! of an object entry, and `&`, `|` and `!` combine them. Evaluation is a
//! single recursive function over the tree.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use regex::Regex;
use serde_json::Value;

use crate::entry::Entry;
use crate::Result;

/// Comparison operators for field tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=` equals
    Eq,
    /// `<>` or `!=` not equals
    NotEq,
    /// `>` greater than
    Gt,
    /// `<` less than
    Lt,
    /// `>=` greater or equal
    Gte,
    /// `<=` less or equal
    Lte,
}

/// A pure boolean test over a single entry.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// The entry has `field` and its scalar value compares true against `expected`.
    Compare {
        field: String,
        op: CompareOp,
        expected: Value,
    },
    /// The entry has `field` and its string value matches `pattern`.
    Matches { field: String, pattern: Regex },
    /// The entry is an object containing `field`.
    Exists { field: String },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

/// Entry has a child named `field` whose scalar value equals `expected`.
pub fn make_child_query(field: impl Into<String>, expected: impl Into<Value>) -> Predicate {
    Predicate::compare(field, CompareOp::Eq, expected)
}

impl Predicate {
    pub fn compare(field: impl Into<String>, op: CompareOp, expected: impl Into<Value>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            expected: expected.into(),
        }
    }

    /// Regular-expression test on a string field.
    pub fn regex(field: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(Predicate::Matches {
            field: field.into(),
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Predicate::Exists {
            field: field.into(),
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    /// Evaluate against an entry.
    pub fn matches(&self, entry: &Entry<'_>) -> bool {
        evaluate(self, entry.value())
    }
}

fn evaluate(predicate: &Predicate, value: &Value) -> bool {
    match predicate {
        Predicate::Compare {
            field,
            op,
            expected,
        } => field_scalars(value, field).any(|actual| compare(actual, *op, expected)),
        Predicate::Matches { field, pattern } => field_scalars(value, field)
            .any(|actual| actual.as_str().is_some_and(|s| pattern.is_match(s))),
        Predicate::Exists { field } => value
            .as_object()
            .is_some_and(|map| map.contains_key(field.as_str())),
        Predicate::And(a, b) => evaluate(a, value) && evaluate(b, value),
        Predicate::Or(a, b) => evaluate(a, value) || evaluate(b, value),
        Predicate::Not(p) => !evaluate(p, value),
    }
}

/// Scalars stored under `field`. An array field contributes its scalar elements.
fn field_scalars<'v>(value: &'v Value, field: &str) -> impl Iterator<Item = &'v Value> {
    let items: &'v [Value] = match value.as_object().and_then(|map| map.get(field)) {
        Some(Value::Array(items)) => items,
        Some(member) => std::slice::from_ref(member),
        None => &[],
    };
    items
        .iter()
        .filter(|v| !matches!(v, Value::Object(_) | Value::Array(_)))
}

fn compare(actual: &Value, op: CompareOp, expected: &Value) -> bool {
    match op {
        CompareOp::Eq => values_equal(actual, expected),
        CompareOp::NotEq => !values_equal(actual, expected),
        CompareOp::Gt => values_cmp(actual, expected) == Some(Ordering::Greater),
        CompareOp::Lt => values_cmp(actual, expected) == Some(Ordering::Less),
        CompareOp::Gte => matches!(
            values_cmp(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        CompareOp::Lte => matches!(
            values_cmp(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

/// Exact equality; numbers compare by value so `1` equals `1.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => values_cmp(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

fn values_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(n1), Value::Number(n2)) => match (n1.as_i64(), n2.as_i64()) {
            (Some(i1), Some(i2)) => Some(i1.cmp(&i2)),
            _ => n1.as_f64()?.partial_cmp(&n2.as_f64()?),
        },
        (Value::String(s1), Value::String(s2)) => Some(s1.cmp(s2)),
        (Value::Bool(b1), Value::Bool(b2)) => Some(b1.cmp(b2)),
        _ => None,
    }
}

impl BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Predicate) -> Predicate {
        self.or(rhs)
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Predicate) -> Predicate {
        self.and(rhs)
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }
}

/// `(field, expected)` is sugar for [`make_child_query`].
impl<F, V> From<(F, V)> for Predicate
where
    F: Into<String>,
    V: Into<Value>,
{
    fn from((field, expected): (F, V)) -> Self {
        make_child_query(field, expected)
    }
}

impl From<&Predicate> for Predicate {
    fn from(predicate: &Predicate) -> Self {
        predicate.clone()
    }
}

// Regex has no PartialEq; patterns compare by source text.
impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Predicate::Compare {
                    field: f1,
                    op: o1,
                    expected: e1,
                },
                Predicate::Compare {
                    field: f2,
                    op: o2,
                    expected: e2,
                },
            ) => f1 == f2 && o1 == o2 && e1 == e2,
            (
                Predicate::Matches {
                    field: f1,
                    pattern: p1,
                },
                Predicate::Matches {
                    field: f2,
                    pattern: p2,
                },
            ) => f1 == f2 && p1.as_str() == p2.as_str(),
            (Predicate::Exists { field: f1 }, Predicate::Exists { field: f2 }) => f1 == f2,
            (Predicate::And(a1, b1), Predicate::And(a2, b2))
            | (Predicate::Or(a1, b1), Predicate::Or(a2, b2)) => a1 == a2 && b1 == b2,
            (Predicate::Not(p1), Predicate::Not(p2)) => p1 == p2,
            _ => false,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::NotEq => write!(f, "<>"), // Canonical form (shell-friendly)
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lte => write!(f, "<="),
        }
    }
}

/// Renders in path-expression syntax, e.g. `type=Progressing | status=True`.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare {
                field,
                op,
                expected,
            } => {
                write_name(f, field)?;
                write!(f, "{}", op)?;
                write_literal(f, expected)
            }
            Predicate::Matches { field, pattern } => {
                write_name(f, field)?;
                f.write_str("~=")?;
                write_quoted(f, pattern.as_str())
            }
            Predicate::Exists { field } => write_name(f, field),
            Predicate::And(a, b) => {
                write_operand(f, a, matches!(**a, Predicate::Or(..)))?;
                f.write_str(" & ")?;
                write_operand(f, b, matches!(**b, Predicate::Or(..) | Predicate::And(..)))
            }
            Predicate::Or(a, b) => {
                write_operand(f, a, false)?;
                f.write_str(" | ")?;
                write_operand(f, b, matches!(**b, Predicate::Or(..)))
            }
            Predicate::Not(p) => {
                f.write_str("!")?;
                write_operand(f, p, matches!(**p, Predicate::Or(..) | Predicate::And(..)))
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, p: &Predicate, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({})", p)
    } else {
        write!(f, "{}", p)
    }
}

/// Characters allowed in an unquoted field name.
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Characters that end an unquoted literal.
pub(crate) fn is_literal_delimiter(c: char) -> bool {
    c.is_whitespace() || "[]()&|\"!=<>~".contains(c)
}

/// Type a bare literal: integers, floats, booleans and null, otherwise a string.
pub(crate) fn bare_literal(word: &str) -> Value {
    match word {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    if let Ok(i) = word.parse::<i64>() {
        return Value::from(i);
    }
    if let Some(n) = word
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(serde_json::Number::from_f64)
    {
        return Value::Number(n);
    }
    Value::String(word.to_string())
}

/// All-digit names are quoted so `[0]` stays an index selector.
pub(crate) fn write_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let bare = !name.is_empty()
        && name.chars().all(is_name_char)
        && !name.chars().all(|c| c.is_ascii_digit());
    if bare {
        f.write_str(name)
    } else {
        write_quoted(f, name)
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => {
            let bare = !s.is_empty()
                && !s.chars().any(is_literal_delimiter)
                && bare_literal(s) == *value;
            if bare {
                f.write_str(s)
            } else {
                write_quoted(f, s)
            }
        }
        other => write!(f, "{}", other),
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        if c == '"' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{}", c)?;
    }
    f.write_str("\"")
}
