//! Error types for parsr operations.

use crate::entry::ValueKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ingest error: {0}")]
    Ingest(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Query parse error: {0}")]
    Parse(String),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Entry {name} holds {kind}, not a scalar")]
    NotScalar { name: String, kind: ValueKind },

    #[error("Index {index} out of range for collection of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
