//! Owned documents and ingestion from decoded data.

use std::io::Read;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::collection::{from_dict, Collection};
use crate::{Error, Result};

/// A decoded document that owns its value.
///
/// Use [`from_dict`] to query a value you already hold; use `Document` when
/// the tree has to be decoded or converted first.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    value: Value,
}

impl Document {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Convert any serializable value (maps must have string keys).
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Result<Self> {
        Ok(Self::new(serde_json::to_value(data)?))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(Self::new(serde_json::from_reader(reader)?))
    }

    /// Decode TOML. Datetimes become their RFC 3339 text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let value: toml::Value = toml::from_str(text).map_err(|e| Error::Toml(e.to_string()))?;
        Ok(Self::new(toml_to_json(value)))
    }

    /// Load a file, decoding `.toml` files as TOML and everything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        debug!(path = %path.display(), is_toml, bytes = contents.len(), "loading document");
        if is_toml {
            Self::from_toml_str(&contents)
        } else {
            Self::from_json_str(&contents)
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Root collection of one entry wrapping the whole document.
    pub fn root(&self) -> Collection<'_> {
        from_dict(&self.value)
    }
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        // nan and inf have no JSON form
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}
