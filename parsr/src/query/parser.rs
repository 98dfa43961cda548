//! Query parser for the path-expression micro-language.

use std::fmt;

use tracing::debug;

use crate::collection::{Collection, WILDCARD};
use crate::predicate::{
    bare_literal, is_literal_delimiter, is_name_char, write_name, CompareOp, Predicate,
};
use crate::{Error, Result};

/// A parsed query: steps applied left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub steps: Vec<Step>,
}

/// One navigation or filter step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Field descent: `name` or `"name"`
    Descend(String),
    /// Every child of the current entries: bare `*`
    Wildcard,
    /// Recursive descent: `..name`
    Find(String),
    /// Filter at the current level: `[expr]`
    Where(Predicate),
    /// Index selection: `[N]`
    Nth(usize),
}

/// Filter operator as written, before the literal is known.
enum FilterOp {
    Compare(CompareOp),
    Regex,
}

/// A field name as written. Only a bare `*` is the wildcard.
enum FieldName {
    Key(String),
    Wildcard,
}

/// A literal value as written in a filter.
enum Literal<'s> {
    Quoted(String),
    Bare(&'s str),
}

impl Literal<'_> {
    /// Quoted literals are always strings; bare ones are typed.
    fn into_value(self) -> serde_json::Value {
        match self {
            Literal::Quoted(s) => serde_json::Value::String(s),
            Literal::Bare(word) => bare_literal(word),
        }
    }

    fn text(&self) -> &str {
        match self {
            Literal::Quoted(s) => s.as_str(),
            Literal::Bare(word) => *word,
        }
    }
}

/// Parse a query string into steps.
pub fn parse_query(input: &str) -> Result<Query> {
    let mut query = Query::default();
    let input = input.trim();

    if input.is_empty() || input == "." {
        return Ok(query);
    }

    // A leading '.' is optional: ".status" is "status"
    let mut remaining = input;
    if remaining.starts_with('.') && !remaining.starts_with("..") {
        remaining = &remaining[1..];
    }

    let mut first = true;
    while !remaining.is_empty() {
        if let Some(after) = remaining.strip_prefix("..") {
            let (name, rest) = parse_name(after)?;
            let FieldName::Key(name) = name else {
                return Err(Error::Parse(format!("Wildcard cannot follow '..' in '{}'", input)));
            };
            query.steps.push(Step::Find(name));
            remaining = rest;
        } else if remaining.starts_with('[') {
            let (step, rest) = parse_selector(remaining)?;
            query.steps.push(step);
            remaining = rest;
        } else {
            let after = if first {
                remaining
            } else {
                remaining
                    .strip_prefix('.')
                    .ok_or_else(|| unexpected(remaining, "'.' or '['"))?
            };
            let (name, rest) = parse_name(after)?;
            query.steps.push(match name {
                FieldName::Key(name) => Step::Descend(name),
                FieldName::Wildcard => Step::Wildcard,
            });
            remaining = rest;
        }
        first = false;
    }

    Ok(query)
}

fn unexpected(input: &str, expected: &str) -> Error {
    if input.is_empty() {
        Error::Parse(format!("Expected {} at end of query", expected))
    } else {
        Error::Parse(format!("Expected {} at '{}'", expected, input))
    }
}

/// Parse a field name: bare word, quoted string or `*`.
fn parse_name(input: &str) -> Result<(FieldName, &str)> {
    if input.starts_with('"') {
        let (name, rest) = parse_quoted(input)?;
        return Ok((FieldName::Key(name), rest));
    }
    if let Some(rest) = input.strip_prefix(WILDCARD) {
        return Ok((FieldName::Wildcard, rest));
    }

    let end = input.find(|c: char| !is_name_char(c)).unwrap_or(input.len());
    if end == 0 {
        return Err(unexpected(input, "field name"));
    }
    Ok((FieldName::Key(input[..end].to_string()), &input[end..]))
}

/// Parse a double-quoted string; `\` escapes the next character.
fn parse_quoted(input: &str) -> Result<(String, &str)> {
    let mut value = String::new();
    let mut chars = input.char_indices().skip(1);

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((value, &input[i + 1..])),
            '\\' => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            _ => value.push(c),
        }
    }

    Err(Error::Parse(format!("Unterminated string in '{}'", input)))
}

/// Parse `[N]` or `[expr]`.
fn parse_selector(input: &str) -> Result<(Step, &str)> {
    let inner = input[1..].trim_start();

    let digits = inner
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(inner.len());
    if digits > 0 {
        if let Some(rest) = inner[digits..].trim_start().strip_prefix(']') {
            let index = inner[..digits]
                .parse()
                .map_err(|_| Error::Parse(format!("Invalid index '{}'", &inner[..digits])))?;
            return Ok((Step::Nth(index), rest));
        }
    }

    let (predicate, rest) = parse_or(inner)?;
    let after = rest.trim_start();
    let rest = after.strip_prefix(']').ok_or_else(|| unexpected(after, "']'"))?;
    Ok((Step::Where(predicate), rest))
}

fn parse_or(input: &str) -> Result<(Predicate, &str)> {
    let (mut left, mut remaining) = parse_and(input)?;
    loop {
        let Some(after) = remaining.trim_start().strip_prefix('|') else {
            break;
        };
        let (right, rest) = parse_and(after)?;
        left = left | right;
        remaining = rest;
    }
    Ok((left, remaining))
}

fn parse_and(input: &str) -> Result<(Predicate, &str)> {
    let (mut left, mut remaining) = parse_unary(input)?;
    loop {
        let Some(after) = remaining.trim_start().strip_prefix('&') else {
            break;
        };
        let (right, rest) = parse_unary(after)?;
        left = left & right;
        remaining = rest;
    }
    Ok((left, remaining))
}

fn parse_unary(input: &str) -> Result<(Predicate, &str)> {
    let input = input.trim_start();

    if let Some(after) = input.strip_prefix('!') {
        let (inner, rest) = parse_unary(after)?;
        return Ok((!inner, rest));
    }

    if let Some(after) = input.strip_prefix('(') {
        let (inner, rest) = parse_or(after)?;
        let after = rest.trim_start();
        let rest = after.strip_prefix(')').ok_or_else(|| unexpected(after, "')'"))?;
        return Ok((inner, rest));
    }

    parse_comparison(input)
}

/// Parse `field`, `field<op>literal` or `field~=pattern`.
fn parse_comparison(input: &str) -> Result<(Predicate, &str)> {
    let (FieldName::Key(field), rest) = parse_name(input)? else {
        return Err(unexpected(input, "field name"));
    };

    let Some((op, after_op)) = try_parse_op(rest.trim_start()) else {
        return Ok((Predicate::exists(field), rest));
    };

    let (literal, rest) = parse_literal(after_op.trim_start())?;
    let predicate = match op {
        FilterOp::Compare(op) => Predicate::compare(field, op, literal.into_value()),
        FilterOp::Regex => Predicate::regex(field, literal.text())?,
    };
    Ok((predicate, rest))
}

fn try_parse_op(input: &str) -> Option<(FilterOp, &str)> {
    // Order matters: check 2-char ops before 1-char
    let (op, op_len) = if input.starts_with("~=") {
        (FilterOp::Regex, 2)
    } else if input.starts_with("<>") || input.starts_with("!=") {
        (FilterOp::Compare(CompareOp::NotEq), 2)
    } else if input.starts_with(">=") {
        (FilterOp::Compare(CompareOp::Gte), 2)
    } else if input.starts_with("<=") {
        (FilterOp::Compare(CompareOp::Lte), 2)
    } else if input.starts_with('=') {
        (FilterOp::Compare(CompareOp::Eq), 1)
    } else if input.starts_with('>') {
        (FilterOp::Compare(CompareOp::Gt), 1)
    } else if input.starts_with('<') {
        (FilterOp::Compare(CompareOp::Lt), 1)
    } else {
        return None;
    };

    Some((op, &input[op_len..]))
}

fn parse_literal(input: &str) -> Result<(Literal<'_>, &str)> {
    if input.starts_with('"') {
        let (s, rest) = parse_quoted(input)?;
        return Ok((Literal::Quoted(s), rest));
    }

    let end = input.find(is_literal_delimiter).unwrap_or(input.len());
    if end == 0 {
        return Err(unexpected(input, "value"));
    }
    Ok((Literal::Bare(&input[..end]), &input[end..]))
}

impl Query {
    /// True for the empty query, which returns its input unchanged.
    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    /// Apply every step to `root`.
    pub fn eval<'a>(&self, root: &Collection<'a>) -> Result<Collection<'a>> {
        let mut current = root.clone();
        for step in &self.steps {
            current = match step {
                Step::Descend(name) => current.get_key(name),
                Step::Wildcard => current.get(WILDCARD),
                Step::Find(name) => current.find(name),
                Step::Where(predicate) => current.filter(predicate),
                Step::Nth(index) => current.select(*index)?,
            };
        }

        debug!(query = %self, matched = current.len(), "evaluated query");
        Ok(current)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str(".");
        }

        for (i, step) in self.steps.iter().enumerate() {
            match step {
                Step::Descend(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    write_name(f, name)?;
                }
                Step::Wildcard => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(WILDCARD)?;
                }
                Step::Find(name) => {
                    f.write_str("..")?;
                    write_name(f, name)?;
                }
                Step::Where(predicate) => write!(f, "[{}]", predicate)?,
                Step::Nth(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}
