//! Error types for sqlscript.

use thiserror::Error;

/// The main error type for script parsing and execution.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script could not be split into batches.
    ///
    /// Raised for unterminated literals and comments, misplaced or malformed
    /// `GO` separators, malformed directives and unknown `:` commands.
    #[error("{}", describe_malformed(.line, .column, .message))]
    Malformed {
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    /// Cancellation was requested before the next batch was produced.
    #[error("Operation cancelled")]
    Cancelled,

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Batch execution error.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScriptError {
    /// Create a malformed-script error at the given position.
    pub fn malformed(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            line: Some(line),
            column: Some(column),
            message: message.into(),
        }
    }

    /// Create a malformed-script error without position information.
    pub fn malformed_at_unknown(message: impl Into<String>) -> Self {
        Self::Malformed {
            line: None,
            column: None,
            message: message.into(),
        }
    }

    /// Position of a malformed-script error, if known.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Self::Malformed {
                line: Some(line),
                column: Some(column),
                ..
            } => Some((*line, *column)),
            _ => None,
        }
    }
}

fn describe_malformed(line: &Option<usize>, column: &Option<usize>, message: &str) -> String {
    if line.is_none() && column.is_none() {
        return message.to_string();
    }
    format!(
        "Line {}, Column {}: {}",
        line.unwrap_or(0),
        column.unwrap_or(0),
        message
    )
}

/// Result type alias for sqlscript operations.
pub type ScriptResult<T> = Result<T, ScriptError>;
