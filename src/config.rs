//! Configuration file.
//!
//! ```toml
//! database_url = "sqlite::memory:"
//! mode = "sqlcmdex"
//! continue_on_error = false
//! log_level = "debug"
//!
//! [variables]
//! db = "master"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ScriptError, ScriptResult};
use crate::options::{ExecutionMode, ParseOptions};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG: &str = "sqlscript.toml";

/// Settings read from `sqlscript.toml`; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Database connection URL
    pub database_url: Option<String>,
    pub mode: Option<ExecutionMode>,
    pub continue_on_error: Option<bool>,
    /// tracing filter directive, e.g. `info` or `sqlscript=debug`
    pub log_level: Option<String>,
    pub variables: BTreeMap<String, String>,
}

impl Config {
    pub fn from_toml_str(content: &str) -> ScriptResult<Self> {
        toml::from_str(content).map_err(|e| ScriptError::Config(e.to_string()))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `./sqlscript.toml`, then
    /// `<config dir>/sqlscript/config.toml`; defaults when neither exists.
    pub fn load(explicit: Option<&Path>) -> ScriptResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::candidates().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("sqlscript").join("config.toml"));
        }
        paths
    }

    fn from_file(path: &Path) -> ScriptResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScriptError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Merge into parse options; explicit values win over file values.
    pub fn parse_options(
        &self,
        mode: Option<ExecutionMode>,
        variables: BTreeMap<String, String>,
    ) -> ParseOptions {
        let mut merged = self.variables.clone();
        merged.extend(variables);
        ParseOptions::builder()
            .mode(mode.or(self.mode).unwrap_or_default())
            .variables(merged)
            .continue_on_error(self.continue_on_error.unwrap_or(true))
            .build()
    }
}
