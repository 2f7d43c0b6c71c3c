#![allow(dead_code)]

use sqlscript::{parse_script, ExecutionMode, ParseOptions, ScriptContext, ScriptResult, SqlBatch};

pub fn options(mode: ExecutionMode) -> ParseOptions {
    ParseOptions::builder().mode(mode).build()
}

pub fn options_with(mode: ExecutionMode, vars: &[(&str, &str)]) -> ParseOptions {
    ParseOptions::builder()
        .mode(mode)
        .variables(vars.iter().copied())
        .build()
}

/// Parse a script and return its batches together with the final context.
pub fn parse_ctx(sql: &str, options: &ParseOptions) -> ScriptResult<(Vec<SqlBatch>, ScriptContext)> {
    let mut context = ScriptContext::new(options);
    let batches = parse_script(sql, &mut context)?;
    Ok((batches, context))
}

pub fn parse(sql: &str, options: &ParseOptions) -> ScriptResult<Vec<SqlBatch>> {
    parse_ctx(sql, options).map(|(batches, _)| batches)
}

pub fn texts(batches: &[SqlBatch]) -> Vec<&str> {
    batches.iter().map(|b| b.text.as_str()).collect()
}
