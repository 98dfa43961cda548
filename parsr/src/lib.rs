//! parsr: read-only tree queries over decoded documents.
//!
//! Wrap decoded JSON-like data with [`from_dict`] (or a [`Document`]), then
//! descend with [`Collection::get`], filter with [`Collection::where_`] and
//! read out scalars with [`Collection::values`].

pub mod collection;
pub mod config;
pub mod document;
pub mod entry;
pub mod error;
pub mod predicate;
pub mod query;

pub use collection::{from_dict, Collection, CompositePolicy, WILDCARD};
pub use config::Config;
pub use document::Document;
pub use entry::{Entry, Name, ValueKind, ROOT_NAME};
pub use error::{Error, Result};
pub use predicate::{make_child_query, CompareOp, Predicate};
pub use query::{parse_query, Query, Step};
