//! Per-pass script state.

use crate::options::{ExecutionMode, ParseOptions};
use crate::variables::VariableStore;

/// Mutable state of one parse pass: the variable store and the error policy.
///
/// The batch parser is the only writer while a pass runs. Build a fresh
/// context for every pass.
#[derive(Debug, Clone)]
pub struct ScriptContext {
    mode: ExecutionMode,
    variables: VariableStore,
    continue_on_error: bool,
}

impl ScriptContext {
    /// Seed a context from caller options.
    ///
    /// Caller variables are only loaded when directives are active; in
    /// `SqlCmdEx` mode they are protected from script `:SETVAR`.
    pub fn new(options: &ParseOptions) -> Self {
        let mut variables = VariableStore::new();
        if options.mode.is_scripting() {
            let overridable = options.mode == ExecutionMode::SqlCmd;
            for (name, value) in &options.variables {
                variables.insert(name, value, overridable);
            }
        }
        Self {
            mode: options.mode,
            variables,
            continue_on_error: options.continue_on_error,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn continue_on_error(&self) -> bool {
        self.continue_on_error
    }

    pub(crate) fn set_continue_on_error(&mut self, value: bool) {
        self.continue_on_error = value;
        tracing::debug!("ContinueOnError set to {}", value);
    }

    pub(crate) fn set_variable(&mut self, name: &str, value: &str) {
        self.variables.set(name, value);
    }

    /// Substitute variables; returns the text untouched in normal mode.
    pub fn expand(&self, text: &str) -> String {
        if !self.mode.is_scripting() || text.is_empty() {
            return text.to_string();
        }
        self.variables.expand(text)
    }
}

impl Default for ScriptContext {
    fn default() -> Self {
        Self::new(&ParseOptions::default())
    }
}
