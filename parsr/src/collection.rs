//! Collections: ordered, possibly-empty query results.
//!
//! Every navigation step returns a new [`Collection`]; none of them modify
//! the receiver or the document. A step that finds nothing returns an empty
//! collection rather than an error, so chains like
//! `doc.get("status").get("conditions").where_(p)` never fail because an
//! intermediate field is absent.

use std::collections::HashSet;
use std::ops::Index;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::entry::{Entry, Name, ValueKind, ROOT_NAME};
use crate::predicate::Predicate;
use crate::{Error, Result};

/// Reserved field name that selects every child of every entry.
pub const WILDCARD: &str = "*";

/// What `values_with` does with an entry that is not a scalar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositePolicy {
    /// Fail with [`Error::NotScalar`] naming the entry.
    #[default]
    Error,
    /// Leave the entry out of the projection.
    Skip,
}

/// An ordered sequence of entries produced by one query step.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<'a> {
    /// Last descent step, for diagnostics.
    name: String,
    entries: Vec<Entry<'a>>,
}

/// Wrap a decoded document as a root collection of one entry.
pub fn from_dict(document: &Value) -> Collection<'_> {
    Collection::new(ROOT_NAME, vec![Entry::root(document)])
}

impl<'a> Collection<'a> {
    pub fn new(name: impl Into<String>, entries: Vec<Entry<'a>>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry<'a>] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry<'a>> {
        self.entries.iter()
    }

    pub fn first(&self) -> Option<&Entry<'a>> {
        self.entries.first()
    }

    /// Entry at `index`, failing outside `[0, len)`.
    pub fn nth(&self, index: usize) -> Result<&Entry<'a>> {
        self.entries.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    /// Collection holding only the entry at `index`.
    pub fn select(&self, index: usize) -> Result<Collection<'a>> {
        let entry = self.nth(index)?.clone();
        Ok(Collection::new(self.name.clone(), vec![entry]))
    }

    /// Follow `field` from every entry; `*` selects every child.
    ///
    /// Use [`Collection::get_key`] to reach a member literally named `*`.
    pub fn get(&self, field: &str) -> Collection<'a> {
        if field == WILDCARD {
            self.wildcard()
        } else {
            self.get_key(field)
        }
    }

    /// Follow the member named exactly `field` from every entry.
    ///
    /// Object entries contribute the value stored under `field`; an array
    /// stored there is flattened into one entry per element, each named
    /// `field`. Array entries search each of their elements. Entries
    /// without the field contribute nothing. Results keep parent order,
    /// then array order.
    pub fn get_key(&self, field: &str) -> Collection<'a> {
        let mut out = Vec::new();
        for entry in &self.entries {
            descend(entry.value(), field, &mut out);
        }

        trace!(field, from = self.len(), matched = out.len(), "descend");
        Collection::new(field, out)
    }

    /// Every child of every entry, with object members holding arrays flattened.
    fn wildcard(&self) -> Collection<'a> {
        let mut out = Vec::new();
        for entry in &self.entries {
            let is_object = entry.kind() == ValueKind::Object;
            for child in entry.children() {
                if is_object && child.kind() == ValueKind::Array {
                    out.extend(child.children().iter().cloned());
                } else {
                    out.push(child.clone());
                }
            }
        }

        trace!(from = self.len(), matched = out.len(), "wildcard");
        Collection::new(WILDCARD, out)
    }

    /// Recursive descent: every value stored under `field` at any depth
    /// below these entries, in document order.
    pub fn find(&self, field: &str) -> Collection<'a> {
        let mut out = Vec::new();
        for entry in &self.entries {
            find_in(entry.value(), field, &mut out);
        }

        trace!(field, from = self.len(), matched = out.len(), "find");
        Collection::new(field, out)
    }

    /// Keep the entries that satisfy `predicate`, in order.
    ///
    /// Accepts a [`Predicate`] or a `(field, expected)` pair.
    pub fn where_(&self, predicate: impl Into<Predicate>) -> Collection<'a> {
        self.filter(&predicate.into())
    }

    /// Borrowed form of [`Collection::where_`] for reusable predicates.
    pub fn filter(&self, predicate: &Predicate) -> Collection<'a> {
        let entries: Vec<Entry<'a>> = self
            .entries
            .iter()
            .filter(|entry| predicate.matches(entry))
            .cloned()
            .collect();

        trace!(%predicate, from = self.len(), matched = entries.len(), "filter");
        Collection::new(self.name.clone(), entries)
    }

    /// Scalar values in collection order.
    ///
    /// Fails on the first entry that wraps an object or array.
    pub fn values(&self) -> Result<Vec<Value>> {
        self.values_with(CompositePolicy::Error)
    }

    pub fn values_with(&self, policy: CompositePolicy) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if entry.is_scalar() {
                values.push(entry.value().clone());
                continue;
            }
            match policy {
                CompositePolicy::Error => {
                    return Err(Error::NotScalar {
                        name: entry.to_string(),
                        kind: entry.kind(),
                    })
                }
                CompositePolicy::Skip => trace!(entry = %entry, "skipping composite entry"),
            }
        }
        Ok(values)
    }

    /// Scalar values with duplicates removed, keeping first occurrences.
    pub fn unique_values(&self) -> Result<Vec<Value>> {
        // Keyed on the JSON text, so "1" and 1 stay distinct
        let mut seen = HashSet::new();
        let mut values = self.values()?;
        values.retain(|value| seen.insert(value.to_string()));
        Ok(values)
    }

    /// Names of the entries, in order.
    pub fn names(&self) -> Vec<Name<'a>> {
        self.entries.iter().map(Entry::name).collect()
    }

    pub fn kinds(&self) -> Vec<ValueKind> {
        self.entries.iter().map(Entry::kind).collect()
    }
}

fn descend<'a>(value: &'a Value, field: &str, out: &mut Vec<Entry<'a>>) {
    match value {
        Value::Object(map) => {
            if let Some((key, member)) = map.get_key_value(field) {
                push_member(key, member, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                descend(item, field, out);
            }
        }
        _ => {}
    }
}

fn find_in<'a>(value: &'a Value, field: &str, out: &mut Vec<Entry<'a>>) {
    match value {
        Value::Object(map) => {
            for (key, member) in map {
                if key == field {
                    push_member(key, member, out);
                }
                find_in(member, field, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                find_in(item, field, out);
            }
        }
        _ => {}
    }
}

/// An object member becomes one entry, or one per element if it is an array.
fn push_member<'a>(key: &'a str, member: &'a Value, out: &mut Vec<Entry<'a>>) {
    match member {
        Value::Array(items) => out.extend(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| Entry::new(Name::Key(key), Some(i), item)),
        ),
        _ => out.push(Entry::new(Name::Key(key), None, member)),
    }
}

impl<'a> Index<usize> for Collection<'a> {
    type Output = Entry<'a>;

    fn index(&self, index: usize) -> &Entry<'a> {
        &self.entries[index]
    }
}

impl<'c, 'a> IntoIterator for &'c Collection<'a> {
    type Item = &'c Entry<'a>;
    type IntoIter = std::slice::Iter<'c, Entry<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for Collection<'a> {
    type Item = Entry<'a>;
    type IntoIter = std::vec::IntoIter<Entry<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
