//! Batch parser.
//!
//! Pulls elements from the [`Scanner`], interprets `GO`, `:SETVAR` and
//! `:ON ERROR` lines, substitutes variables and yields [`SqlBatch`]es.
//!
//! # Script Overview
//!
//! ```text
//! :SETVAR db master          ── directive, removed from output
//! USE $(db);                 ─┐
//! /* GO inside comment */     ├─ batch text (substituted, comments kept)
//! SELECT '$(db) GO';         ─┘
//! GO 2                       ── separator, exec_count = 2
//! ```

use std::str::Chars;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::batch::SqlBatch;
use crate::context::ScriptContext;
use crate::element::{Element, ElementKind, EndedBy};
use crate::error::{ScriptError, ScriptResult};
use crate::scanner::Scanner;

/// Cooperative cancellation flag shared between a caller and a running pass.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Single-pass iterator of batches over one script.
///
/// Stops after the first error. A new pass needs a new parser and a new
/// [`ScriptContext`].
pub struct BatchParser<'c, I: Iterator<Item = char>> {
    scanner: Scanner<I>,
    context: &'c mut ScriptContext,
    cancel: Option<CancelToken>,
    pending: Vec<String>,
    start: Option<(usize, usize)>,
    finished: bool,
}

impl<'s, 'c> BatchParser<'c, Chars<'s>> {
    /// Parser over an in-memory script.
    pub fn for_script(script: &'s str, context: &'c mut ScriptContext) -> Self {
        Self::new(script.chars(), context)
    }
}

impl<'c, I: Iterator<Item = char>> BatchParser<'c, I> {
    pub fn new(chars: I, context: &'c mut ScriptContext) -> Self {
        Self {
            scanner: Scanner::new(chars),
            context,
            cancel: None,
            pending: Vec::new(),
            start: None,
            finished: false,
        }
    }

    /// Check `token` before producing each batch.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The pass state, including variables set so far.
    pub fn context(&self) -> &ScriptContext {
        self.context
    }

    /// Produce the next batch, or `None` at the end of the script.
    pub fn next_batch(&mut self) -> ScriptResult<Option<SqlBatch>> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            self.pending.clear();
            self.start = None;
            return Err(ScriptError::Cancelled);
        }

        while let Some(mut element) = self.scanner.next_element()? {
            if element.kind == ElementKind::Text {
                match self.classify_line(&element)? {
                    Line::Separator(count) => {
                        if let Some(batch) = self.flush(count) {
                            return Ok(Some(batch));
                        }
                        continue;
                    }
                    Line::Directive => continue,
                    Line::Content => {}
                }
            }

            if self.context.mode().is_scripting() && !element.kind.is_comment() {
                element.text = self.context.expand(&element.text);
            }
            self.append(element);
        }

        Ok(self.flush(1))
    }

    fn classify_line(&mut self, element: &Element) -> ScriptResult<Line> {
        let tokens: Vec<&str> = element.text.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            return Ok(Line::Content);
        };

        if first.eq_ignore_ascii_case("GO") {
            return self.separator_count(element, &tokens).map(Line::Separator);
        }
        if first.starts_with(':') && self.context.mode().is_scripting() {
            self.directive(element, &tokens)?;
            return Ok(Line::Directive);
        }
        Ok(Line::Content)
    }

    fn separator_count(&self, element: &Element, tokens: &[&str]) -> ScriptResult<i32> {
        let malformed = || {
            ScriptError::malformed(
                element.line,
                element.column,
                "Incorrect syntax was encountered while parsing GO.",
            )
        };

        if !element.ended_by.is_line_end() {
            return Err(malformed());
        }
        let Some(raw) = tokens.get(1) else {
            return Ok(1);
        };

        let count = self.context.expand(raw);
        count.trim().parse::<i32>().map_err(|e| {
            tracing::debug!("GO count '{}' rejected: {}", count, e);
            malformed()
        })
    }

    fn directive(&mut self, element: &Element, tokens: &[&str]) -> ScriptResult<()> {
        let command = tokens[0];
        let malformed = || {
            ScriptError::malformed(
                element.line,
                element.column,
                format!("Incorrect syntax was encountered while parsing {}.", command),
            )
        };

        if command.eq_ignore_ascii_case(":SETVAR") {
            let value = match (tokens.len(), element.ended_by) {
                // The value is the quoted element that follows, possibly spanning lines.
                (2, EndedBy::Next(ElementKind::DoubleQuotedString)) => {
                    match self.scanner.next_element()? {
                        Some(quoted) if quoted.kind == ElementKind::DoubleQuotedString => {
                            quoted.inner_text().unwrap_or_default()
                        }
                        other => {
                            tracing::debug!(
                                ":SETVAR parsing failed. Next element kind: {:?}",
                                other.map(|e| e.kind)
                            );
                            return Err(malformed());
                        }
                    }
                }
                (3, ended_by) if ended_by.is_line_end() => tokens[2].to_string(),
                (len, ended_by) => {
                    tracing::debug!(
                        ":SETVAR parsing failed. Tokens: {}. Ended by: {:?}",
                        len,
                        ended_by
                    );
                    return Err(malformed());
                }
            };
            self.context.set_variable(tokens[1], &value);
            return Ok(());
        }

        if !element.ended_by.is_line_end() {
            return Err(malformed());
        }

        if command.eq_ignore_ascii_case(":ON") {
            if tokens.len() != 3 || !tokens[1].eq_ignore_ascii_case("ERROR") {
                return Err(malformed());
            }
            let policy = tokens[2];
            if policy.eq_ignore_ascii_case("IGNORE") {
                self.context.set_continue_on_error(true);
            } else if policy.eq_ignore_ascii_case("EXIT") {
                self.context.set_continue_on_error(false);
            } else {
                return Err(malformed());
            }
            return Ok(());
        }

        Err(ScriptError::malformed(
            element.line,
            element.column,
            "Incorrect syntax near ':'.",
        ))
    }

    fn append(&mut self, element: Element) {
        if self.start.is_none() {
            self.start = Some((element.line, element.column));
        }
        self.pending.push(element.text);
    }

    fn flush(&mut self, exec_count: i32) -> Option<SqlBatch> {
        if self.pending.is_empty() {
            return None;
        }
        let (start_line, start_column) = self.start.take().unwrap_or((1, 1));
        Some(SqlBatch {
            text: std::mem::take(&mut self.pending).concat(),
            start_line,
            start_column,
            exec_count,
        })
    }
}

/// How a text element's line is interpreted.
enum Line {
    Separator(i32),
    Directive,
    Content,
}

impl<I: Iterator<Item = char>> Iterator for BatchParser<'_, I> {
    type Item = ScriptResult<SqlBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_batch() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Parse a whole script into batches with a fresh pass over `context`.
///
/// # Example
///
/// ```
/// use sqlscript::{parse_script, ScriptContext};
///
/// let mut ctx = ScriptContext::default();
/// let batches = parse_script(":SETVAR n 2\nSELECT $(n)\nGO 3", &mut ctx).unwrap();
/// assert_eq!(batches.len(), 1);
/// assert_eq!(batches[0].text, "SELECT 2\n");
/// assert_eq!(batches[0].exec_count, 3);
/// ```
pub fn parse_script(script: &str, context: &mut ScriptContext) -> ScriptResult<Vec<SqlBatch>> {
    BatchParser::for_script(script, context).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ExecutionMode, ParseOptions};

    fn ctx(mode: ExecutionMode) -> ScriptContext {
        ScriptContext::new(&ParseOptions::builder().mode(mode).build())
    }

    #[test]
    fn test_single_batch_without_separator() {
        let mut ctx = ctx(ExecutionMode::SqlCmd);
        let batches = parse_script("SELECT 1;\nSELECT 2;", &mut ctx).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].text, "SELECT 1;\nSELECT 2;");
        assert_eq!(batches[0].exec_count, 1);
        assert_eq!((batches[0].start_line, batches[0].start_column), (1, 1));
    }

    #[test]
    fn test_batch_start_position() {
        let mut ctx = ctx(ExecutionMode::SqlCmd);
        let batches = parse_script("SELECT 1\nGO\n:SETVAR a b\n  SELECT 2\nGO", &mut ctx).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!((batches[1].start_line, batches[1].start_column), (4, 1));
        assert_eq!(batches[1].text, "  SELECT 2\n");
    }

    #[test]
    fn test_go_must_end_line() {
        let mut ctx = ctx(ExecutionMode::SqlCmd);
        let err = parse_script("SELECT 1\nGO /* c */\n", &mut ctx).unwrap_err();
        assert_eq!(err.position(), Some((2, 1)));
    }

    #[test]
    fn test_go_word_prefix_is_content() {
        let mut ctx = ctx(ExecutionMode::SqlCmd);
        let batches = parse_script("GOTO label\nGO", &mut ctx).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].text, "GOTO label\n");
    }

    #[test]
    fn test_comments_are_not_substituted() {
        let options = ParseOptions::builder().variable("x", "1").build();
        let mut ctx = ScriptContext::new(&options);
        let batches = parse_script("-- $(x)\n/* $(x) */ SELECT $(x)", &mut ctx).unwrap();
        assert_eq!(batches[0].text, "-- $(x)\n/* $(x) */ SELECT 1");
    }

    #[test]
    fn test_stops_after_error() {
        let mut ctx = ctx(ExecutionMode::SqlCmd);
        let mut parser = BatchParser::for_script("SELECT 1\nGO\n:BOGUS\nSELECT 2\nGO", &mut ctx);
        assert!(parser.next().unwrap().is_ok());
        assert!(parser.next().unwrap().is_err());
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_cancellation_between_batches() {
        let mut ctx = ctx(ExecutionMode::SqlCmd);
        let token = CancelToken::new();
        let mut parser =
            BatchParser::for_script("SELECT 1\nGO\nSELECT 2\nGO", &mut ctx).with_cancel(token.clone());
        assert_eq!(parser.next().unwrap().unwrap().text, "SELECT 1\n");
        token.cancel();
        assert!(matches!(parser.next(), Some(Err(ScriptError::Cancelled))));
        assert!(parser.next().is_none());
    }
}
