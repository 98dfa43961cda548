//! Entries: single nodes of a decoded document.

use std::fmt;
use std::sync::OnceLock;

use serde_json::Value;

/// Display name of the root entry.
pub const ROOT_NAME: &str = "<root>";

/// The kind of value an entry wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => ValueKind::Object,
            Value::Array(_) => ValueKind::Array,
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Bool(_) => ValueKind::Bool,
            Value::Null => ValueKind::Null,
        }
    }

    /// Strings, numbers, booleans and null are scalars.
    pub fn is_scalar(self) -> bool {
        !matches!(self, ValueKind::Object | ValueKind::Array)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Object => "object",
            ValueKind::Array => "array",
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Bool => "boolean",
            ValueKind::Null => "null",
        };
        f.write_str(s)
    }
}

/// The key through which an entry was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Name<'a> {
    /// The document root (not a real key)
    Root,
    /// An object key
    Key(&'a str),
}

impl<'a> Name<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Name::Root => ROOT_NAME,
            Name::Key(key) => key,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Name::Root)
    }
}

impl fmt::Display for Name<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of a decoded document plus the key used to reach it.
///
/// Entries borrow from the document and never modify it. The children of an
/// object or array entry are derived from its value on first access and then
/// reused for the lifetime of the entry.
#[derive(Clone)]
pub struct Entry<'a> {
    name: Name<'a>,
    /// Position within the array this entry was flattened out of.
    index: Option<usize>,
    value: &'a Value,
    children: OnceLock<Vec<Entry<'a>>>,
}

impl<'a> Entry<'a> {
    pub(crate) fn new(name: Name<'a>, index: Option<usize>, value: &'a Value) -> Self {
        Self {
            name,
            index,
            value,
            children: OnceLock::new(),
        }
    }

    /// The root entry of a document.
    pub fn root(value: &'a Value) -> Self {
        Self::new(Name::Root, None, value)
    }

    pub fn name(&self) -> Name<'a> {
        self.name
    }

    /// Array position, for entries produced by flattening an array.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn kind(&self) -> ValueKind {
        ValueKind::of(self.value)
    }

    pub fn is_scalar(&self) -> bool {
        self.kind().is_scalar()
    }

    /// Value stored under `key`, if this entry wraps an object that has it.
    pub fn field(&self, key: &str) -> Option<&'a Value> {
        self.value.as_object().and_then(|map| map.get(key))
    }

    /// Child entries: one per key for an object, one per element for an array.
    ///
    /// Array elements keep this entry's name and record their position.
    /// Scalars have no children.
    pub fn children(&self) -> &[Entry<'a>] {
        self.children.get_or_init(|| match self.value {
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| Entry::new(Name::Key(key), None, value))
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| Entry::new(self.name, Some(i), item))
                .collect(),
            _ => Vec::new(),
        })
    }
}

impl PartialEq for Entry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.index == other.index && self.value == other.value
    }
}

impl fmt::Debug for Entry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name.as_str())
            .field("index", &self.index)
            .field("value", self.value)
            .finish()
    }
}

/// Renders as `name` or `name[index]`.
impl fmt::Display for Entry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{}]", self.name, i),
            None => write!(f, "{}", self.name),
        }
    }
}
