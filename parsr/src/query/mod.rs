//! Path-expression micro-language for tree queries.
//!
//! # Syntax Overview
//!
//! Full pattern: `step(.step)*`
//!
//! - **Descent**: `status.conditions` follows a field (`*` takes every child)
//! - **Quoted names**: `metadata."kubernetes.io/name"`, or `"*"` for a key literally named `*`
//! - **Recursive descent**: `..reason` finds a field at any depth
//! - **Filters**: `[type=Progressing | status=True]`, with `&`, `!` and parentheses
//! - **Operators**: `=`, `<>` (or `!=`), `~=` regex, `>`, `<`, `>=`, `<=`
//! - **Existence**: `[reason]` keeps entries that have the field
//! - **Index**: `[0]` keeps the n-th entry

mod parser;

pub use parser::{parse_query, Query, Step};
