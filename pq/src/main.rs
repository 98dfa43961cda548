//! pq: query JSON and TOML documents with parsr path expressions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

mod commands;

const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Parser)]
#[command(name = "pq")]
#[command(about = "Query JSON and TOML documents with path expressions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a path expression against a document
    #[command(visible_alias = "q")]
    Query {
        /// Path expression (e.g., status.conditions[type=Progressing].reason)
        expr: String,

        /// Document to read (reads stdin if not provided or "-")
        file: Option<PathBuf>,

        /// Output format: json, values, count (default from config)
        #[arg(short = 'f', long = "format")]
        format: Option<String>,

        /// Drop object/array entries from values output instead of failing
        #[arg(long = "skip-composite")]
        skip_composite: bool,

        /// Decode the document as TOML regardless of extension
        #[arg(long = "toml")]
        toml: bool,
    },

    /// List the child names of each matched entry
    #[command(visible_alias = "n")]
    Names {
        /// Path expression
        expr: String,

        /// Document to read (reads stdin if not provided or "-")
        file: Option<PathBuf>,

        /// Decode the document as TOML regardless of extension
        #[arg(long = "toml")]
        toml: bool,
    },

    /// Print the canonical form of a path expression
    Parse {
        /// Path expression
        expr: String,
    },

    /// Show the effective configuration
    Config,
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Install the subscriber before anything else can log.
///
/// `RUST_LOG` wins when set. Otherwise the filter starts at `warn` and the
/// returned handle lets the configured `log_level` replace it.
fn init_logging() -> Option<FilterHandle> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        let fmt_layer = fmt::layer().with_writer(std::io::stderr);
        tracing_subscriber::registry().with(filter).with(fmt_layer).init();
        return None;
    }

    let (filter, handle) = reload::Layer::new(EnvFilter::new(DEFAULT_LOG_LEVEL));
    let fmt_layer = fmt::layer().with_writer(std::io::stderr);
    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
    Some(handle)
}

fn load_config(handle: Option<&FilterHandle>) -> parsr::Result<parsr::Config> {
    let config = parsr::Config::load()?;

    if let Some(handle) = handle {
        match EnvFilter::try_new(&config.log_level) {
            Ok(filter) => {
                if let Err(e) = handle.reload(filter) {
                    warn!(error = %e, "failed to apply configured log level");
                }
            }
            Err(e) => warn!(log_level = %config.log_level, error = %e, "ignoring invalid log level"),
        }
    }

    debug!(root = %config.root.display(), "configuration loaded");
    Ok(config)
}

fn run(command: Commands, handle: Option<&FilterHandle>) -> parsr::Result<()> {
    // parse needs no configuration, so a broken config file cannot block it
    if let Commands::Parse { expr } = &command {
        return commands::parse(expr);
    }

    let config = load_config(handle)?;
    match command {
        Commands::Query { expr, file, format, skip_composite, toml } => {
            let opts = commands::QueryOptions {
                format: format.as_deref(),
                skip_composite,
                toml,
            };
            commands::query(&config, &expr, file.as_deref(), &opts)
        }
        Commands::Names { expr, file, toml } => commands::names(&expr, file.as_deref(), toml),
        Commands::Parse { expr } => commands::parse(&expr),
        Commands::Config => commands::show_config(&config),
    }
}

fn main() {
    let cli = Cli::parse();
    let handle = init_logging();

    if let Err(e) = run(cli.command, handle.as_ref()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
