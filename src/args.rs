//! Caller-supplied variable arguments.
//!
//! Accepts `name=value` in one argument or `name value` as two consecutive
//! arguments, the forms a `-v` command-line option collects.

use std::collections::BTreeMap;

use nom::{
    bytes::complete::take_till1,
    character::complete::char,
    combinator::rest,
    sequence::separated_pair,
    IResult,
};

use crate::error::{ScriptError, ScriptResult};

fn assignment(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(take_till1(|c| c == '='), char('='), rest)(input)
}

/// Collect variable arguments into a name → value map; later duplicates win.
///
/// # Example
///
/// ```
/// use sqlscript::args::parse_variable_args;
///
/// let args = ["db=master".to_string(), "title".to_string(), "a = b".to_string()];
/// let vars = parse_variable_args(&args).unwrap();
/// assert_eq!(vars["db"], "master");
/// assert_eq!(vars["title"], "a = b");
/// ```
pub fn parse_variable_args(args: &[String]) -> ScriptResult<BTreeMap<String, String>> {
    let mut variables = BTreeMap::new();
    let mut pending: Option<&str> = None;

    for arg in args {
        if let Some(name) = pending.take() {
            variables.insert(name.to_string(), arg.clone());
            continue;
        }

        if arg.contains('=') {
            let (_, (name, value)) = assignment(arg).map_err(|_| {
                ScriptError::Config(format!("Missing variable name in '{}'", arg))
            })?;
            variables.insert(name.to_string(), value.to_string());
        } else {
            pending = Some(arg.as_str());
        }
    }

    if let Some(name) = pending {
        return Err(ScriptError::Config(format!(
            "Missing value for scripting variable '{}'",
            name
        )));
    }

    Ok(variables)
}
