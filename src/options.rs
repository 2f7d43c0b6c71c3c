//! Parse options and execution mode.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScriptError;

/// Script dialect level for one parse pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Plain SQL: no directives, no substitution.
    Normal,
    /// Script `:SETVAR` may override caller-supplied variables.
    #[default]
    SqlCmd,
    /// Caller-supplied variables win over script `:SETVAR`.
    SqlCmdEx,
}

impl ExecutionMode {
    /// Whether directives and `$(name)` substitution are active.
    pub fn is_scripting(self) -> bool {
        self != Self::Normal
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "normal",
            Self::SqlCmd => "sqlcmd",
            Self::SqlCmdEx => "sqlcmdex",
        };
        f.write_str(name)
    }
}

impl FromStr for ExecutionMode {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "sqlcmd" => Ok(Self::SqlCmd),
            "sqlcmdex" => Ok(Self::SqlCmdEx),
            other => Err(ScriptError::Config(format!(
                "Invalid mode '{}'. Expected: normal, sqlcmd or sqlcmdex",
                other
            ))),
        }
    }
}

/// Caller-supplied settings for a parse pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub mode: ExecutionMode,
    /// Variables injected before the script runs.
    pub variables: BTreeMap<String, String>,
    /// Initial error policy; `:ON ERROR` may change it mid-script.
    pub continue_on_error: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::SqlCmd,
            variables: BTreeMap::new(),
            continue_on_error: true,
        }
    }
}

impl ParseOptions {
    /// Create a new options builder
    pub fn builder() -> ParseOptionsBuilder {
        ParseOptionsBuilder::default()
    }
}

/// Builder for ParseOptions
#[derive(Debug, Default)]
pub struct ParseOptionsBuilder {
    options: ParseOptions,
}

impl ParseOptionsBuilder {
    /// Set the execution mode
    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.options.mode = mode;
        self
    }

    /// Add one caller-supplied variable
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.variables.insert(name.into(), value.into());
        self
    }

    /// Add several caller-supplied variables
    pub fn variables<K, V>(mut self, variables: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.options
            .variables
            .extend(variables.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the initial error policy
    pub fn continue_on_error(mut self, value: bool) -> Self {
        self.options.continue_on_error = value;
        self
    }

    /// Build the options
    pub fn build(self) -> ParseOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("Normal".parse::<ExecutionMode>().unwrap(), ExecutionMode::Normal);
        assert_eq!("SQLCMD".parse::<ExecutionMode>().unwrap(), ExecutionMode::SqlCmd);
        assert_eq!(" sqlcmdex ".parse::<ExecutionMode>().unwrap(), ExecutionMode::SqlCmdEx);
        assert!("osql".parse::<ExecutionMode>().is_err());
    }

    #[test]
    fn test_mode_display_round_trips() {
        for mode in [ExecutionMode::Normal, ExecutionMode::SqlCmd, ExecutionMode::SqlCmdEx] {
            assert_eq!(mode.to_string().parse::<ExecutionMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_builder() {
        let options = ParseOptions::builder()
            .mode(ExecutionMode::SqlCmdEx)
            .variable("db", "master")
            .variables([("a", "1")])
            .continue_on_error(false)
            .build();
        assert_eq!(options.mode, ExecutionMode::SqlCmdEx);
        assert_eq!(options.variables.len(), 2);
        assert!(!options.continue_on_error);
    }
}
