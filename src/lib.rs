//! # sqlscript: SQLCMD-style script processing
//!
//! Splits T-SQL scripts into batches on `GO` lines, applies `:SETVAR` and
//! `:ON ERROR` directives, substitutes `$(name)` variables, and runs the
//! batches against a database.
//!
//! ## Quick Example
//!
//! ```
//! use sqlscript::prelude::*;
//!
//! let options = ParseOptions::builder().variable("table", "users").build();
//! let mut ctx = ScriptContext::new(&options);
//!
//! let batches = parse_script("SELECT * FROM $(table)\nGO 2\n", &mut ctx).unwrap();
//! assert_eq!(batches[0].text, "SELECT * FROM users\n");
//! assert_eq!(batches[0].exec_count, 2);
//! ```
//!
//! ## Modes
//!
//! | Mode       | Directives | Substitution | Caller variables |
//! |------------|------------|--------------|------------------|
//! | `Normal`   | no         | no           | ignored          |
//! | `SqlCmd`   | yes        | yes          | overridable      |
//! | `SqlCmdEx` | yes        | yes          | locked           |

pub mod args;
pub mod batch;
pub mod config;
pub mod context;
pub mod element;
pub mod engine;
pub mod error;
pub mod options;
pub mod parser;
pub mod scanner;
pub mod variables;

pub use batch::SqlBatch;
pub use context::ScriptContext;
pub use error::{ScriptError, ScriptResult};
pub use options::{ExecutionMode, ParseOptions};
pub use parser::{parse_script, BatchParser, CancelToken};

pub mod prelude {
    pub use crate::batch::SqlBatch;
    pub use crate::context::ScriptContext;
    pub use crate::engine::{
        ExecutionListener, ExecutionResult, ExecutionResultCode, NoopListener, ScriptEngine,
    };
    pub use crate::error::*;
    pub use crate::options::{ExecutionMode, ParseOptions};
    pub use crate::parser::{parse_script, BatchParser, CancelToken};
}
