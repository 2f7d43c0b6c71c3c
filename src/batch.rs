//! Assembled SQL batches.

use serde::Serialize;

/// A unit of SQL text between `GO` separators, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlBatch {
    /// Substituted SQL with directive lines removed and comments kept.
    pub text: String,
    /// Line of the first content element.
    pub start_line: usize,
    /// Column of the first content element.
    pub start_column: usize,
    /// Repeat count from `GO n`; may be zero or negative.
    pub exec_count: i32,
}

impl SqlBatch {
    /// Whether the runner should execute this batch at all.
    pub fn is_executable(&self) -> bool {
        self.exec_count > 0
    }
}
