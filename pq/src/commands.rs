//! CLI command implementations.

use std::io::{self, Read};
use std::path::Path;

use parsr::config::OUTPUT_FORMATS;
use parsr::{parse_query, CompositePolicy, Config, Document, Error, Result};
use serde_json::Value;
use tracing::debug;

/// Options for `pq query`.
pub struct QueryOptions<'a> {
    /// Overrides config.output_format when set
    pub format: Option<&'a str>,
    pub skip_composite: bool,
    pub toml: bool,
}

/// Read the document from a file, or stdin when no file (or "-") is given.
fn read_document(file: Option<&Path>, toml: bool) -> Result<Document> {
    let text = match file {
        Some(path) if path != Path::new("-") => {
            if !toml {
                return Document::load(path);
            }
            std::fs::read_to_string(path)?
        }
        _ => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            input
        }
    };

    if toml {
        Document::from_toml_str(&text)
    } else {
        Document::from_json_str(&text)
    }
}

/// Strings print unquoted; other scalars print as JSON.
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn query(config: &Config, expr: &str, file: Option<&Path>, opts: &QueryOptions) -> Result<()> {
    let format = opts.format.unwrap_or(config.output_format.as_str());
    if !OUTPUT_FORMATS.contains(&format) {
        return Err(Error::Config(format!(
            "Unknown format '{}' (expected one of: {})",
            format,
            OUTPUT_FORMATS.join(", ")
        )));
    }

    // Parse before reading so bad expressions fail without waiting on stdin
    let query = parse_query(expr)?;
    let doc = read_document(file, opts.toml)?;
    let result = query.eval(&doc.root())?;
    debug!(%query, format, matched = result.len(), "query");

    match format {
        "values" => {
            let policy = if opts.skip_composite {
                CompositePolicy::Skip
            } else {
                config.composite_values
            };
            for value in result.values_with(policy)? {
                println!("{}", render_scalar(&value));
            }
        }
        "count" => println!("{}", result.len()),
        _ => {
            let values: Vec<&Value> = result.iter().map(|entry| entry.value()).collect();
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
    }

    Ok(())
}

pub fn names(expr: &str, file: Option<&Path>, toml: bool) -> Result<()> {
    let query = parse_query(expr)?;
    let doc = read_document(file, toml)?;
    let result = query.eval(&doc.root())?;

    for entry in &result {
        for child in entry.children() {
            println!("{}", child);
        }
    }

    Ok(())
}

pub fn parse(expr: &str) -> Result<()> {
    println!("{}", parse_query(expr)?);
    Ok(())
}

pub fn show_config(config: &Config) -> Result<()> {
    println!("# {}", config.config_path().display());
    print!("{}", config.to_toml()?);
    Ok(())
}
