//! Configuration for parsr tools.
//!
//! PARSR_ROOT resolution order:
//! 1. Explicit path passed to Config::with_root() / Config::load_from()
//! 2. PARSR_ROOT environment variable
//! 3. Default: platform config dir (e.g. ~/.config/parsr)

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collection::CompositePolicy;
use crate::{Error, Result};

/// Output formats understood by the CLI.
pub const OUTPUT_FORMATS: [&str; 3] = ["json", "values", "count"];

/// parsr configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding config.toml.
    #[serde(skip)]
    pub root: PathBuf,

    /// What value projection does with object/array entries.
    #[serde(default)]
    pub composite_values: CompositePolicy,

    /// Default output format: json, values or count.
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// Log filter used when RUST_LOG is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_output_format() -> String {
    "json".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Create a new config rooted at the given directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            composite_values: CompositePolicy::default(),
            output_format: default_output_format(),
            log_level: default_log_level(),
        }
    }

    /// Load config from PARSR_ROOT/config.toml, or create default.
    pub fn load() -> Result<Self> {
        let root = resolve_root()?;
        Self::load_from(&root)
    }

    /// Load config from a specific root.
    pub fn load_from(root: &Path) -> Result<Self> {
        let config_path = root.join("config.toml");

        if !config_path.exists() {
            debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::with_root(root));
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.root = root.to_path_buf();
        config.validate()?;

        debug!(path = %config_path.display(), "loaded config");
        Ok(config)
    }

    /// Save config to PARSR_ROOT/config.toml.
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(self.config_path(), self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    fn validate(&self) -> Result<()> {
        if !OUTPUT_FORMATS.contains(&self.output_format.as_str()) {
            return Err(Error::Config(format!(
                "Unknown output_format '{}' (expected one of: {})",
                self.output_format,
                OUTPUT_FORMATS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Resolve PARSR_ROOT using the standard resolution order.
fn resolve_root() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("PARSR_ROOT") {
        return Ok(PathBuf::from(path));
    }

    if let Some(proj_dirs) = ProjectDirs::from("", "", "parsr") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = std::env::var("HOME")
        .map_err(|_| Error::Config("Could not determine home directory".to_string()))?;
    Ok(PathBuf::from(home).join(".config/parsr"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_with_root() {
        let config = Config::with_root("/tmp/test-parsr");
        assert_eq!(config.root, PathBuf::from("/tmp/test-parsr"));
        assert_eq!(config.composite_values, CompositePolicy::Error);
        assert_eq!(config.output_format, "json");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.config_path(), PathBuf::from("/tmp/test-parsr/config.toml"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load_from(tmp.path()).unwrap();
        assert_eq!(config, Config::with_root(tmp.path()));
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("nested");

        let mut config = Config::with_root(&root);
        config.composite_values = CompositePolicy::Skip;
        config.output_format = "values".to_string();
        config.save().unwrap();

        let loaded = Config::load_from(&root).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "composite_values = \"skip\"\n").unwrap();

        let config = Config::load_from(tmp.path()).unwrap();
        assert_eq!(config.composite_values, CompositePolicy::Skip);
        assert_eq!(config.output_format, "json");
    }

    #[test]
    fn test_invalid_config() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "composite_values = \"maybe\"\n").unwrap();
        assert!(matches!(Config::load_from(tmp.path()), Err(Error::Config(_))));

        std::fs::write(tmp.path().join("config.toml"), "output_format = \"xml\"\n").unwrap();
        assert!(matches!(Config::load_from(tmp.path()), Err(Error::Config(_))));
    }
}
