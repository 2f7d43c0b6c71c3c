//! Element scanner.
//!
//! Splits a character stream into [`Element`]s: text runs, comments, quoted
//! strings and bracketed identifiers. Text runs end at every line terminator
//! (which they include) and right before any special element, recording what
//! stopped them in [`Element::ended_by`].
//!
//! ```text
//! GO 3 -- again\n
//! ──┬─ ────┬─────
//!   │      └── SingleLineComment (terminator included)
//!   └── Text, ended_by = Next(SingleLineComment)
//! ```

use std::iter::Peekable;
use std::str::Chars;

use crate::element::{Element, ElementKind, EndedBy};
use crate::error::{ScriptError, ScriptResult};

/// Hand-written scanner with one character of lookahead and a single pushback slot.
pub struct Scanner<I: Iterator<Item = char>> {
    chars: Peekable<I>,
    pushback: Option<char>,
    line: usize,
    column: usize,
}

impl<'a> Scanner<Chars<'a>> {
    /// Scanner over an in-memory script.
    pub fn for_script(script: &'a str) -> Self {
        Self::new(script.chars())
    }
}

impl<I: Iterator<Item = char>> Scanner<I> {
    pub fn new(chars: I) -> Self {
        Self {
            chars: chars.peekable(),
            pushback: None,
            line: 1,
            column: 1,
        }
    }

    /// Position (line, column) of the next character to be read.
    pub fn cursor(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = match self.pushback.take() {
            Some(pushed) => pushed,
            None => self.chars.next()?,
        };
        self.advance(ch);
        Some(ch)
    }

    fn peek_char(&mut self) -> Option<char> {
        match self.pushback {
            Some(pushed) => Some(pushed),
            None => self.chars.peek().copied(),
        }
    }

    /// Hand `ch` back so the next read returns it; `(line, column)` is where it was read.
    fn unread_char(&mut self, ch: char, line: usize, column: usize) -> ScriptResult<()> {
        if self.pushback.is_some() {
            return Err(ScriptError::malformed_at_unknown(
                "character pushback slot is already occupied",
            ));
        }
        self.pushback = Some(ch);
        self.line = line;
        self.column = column;
        Ok(())
    }

    // `\r` alone never moves the cursor; `\r\n` counts as one line break.
    fn advance(&mut self, ch: char) {
        match ch {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\r' => {}
            _ => self.column += 1,
        }
    }

    /// Scan the next element, or `None` once the input is exhausted.
    pub fn next_element(&mut self) -> ScriptResult<Option<Element>> {
        let (line, column) = self.cursor();
        let mut text = String::new();

        loop {
            let (at_line, at_column) = self.cursor();
            let Some(ch) = self.read_char() else {
                if text.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(Element::text(text, line, column, EndedBy::EndOfStream)));
            };
            let next = self.peek_char();

            if let Some(kind) = special_start(ch, next) {
                if !text.is_empty() {
                    self.unread_char(ch, at_line, at_column)?;
                    return Ok(Some(Element::text(text, line, column, EndedBy::Next(kind))));
                }
                let raw = match kind {
                    ElementKind::SingleLineComment => self.read_line_comment(ch),
                    ElementKind::MultiLineComment => self.read_block_comment(ch, line, column)?,
                    _ => self.read_delimited(ch, line, column)?,
                };
                return Ok(Some(Element::new(kind, raw, line, column)));
            }

            if ch == '\n' || ch == '\r' {
                text.push(ch);
                if ch == '\r' && next == Some('\n') {
                    if let Some(lf) = self.read_char() {
                        text.push(lf);
                    }
                }
                return Ok(Some(Element::text(text, line, column, EndedBy::EndOfLine)));
            }

            text.push(ch);
        }
    }

    fn read_line_comment(&mut self, first: char) -> String {
        let mut raw = String::from(first);
        if let Some(second) = self.read_char() {
            raw.push(second);
        }

        while let Some(ch) = self.read_char() {
            raw.push(ch);
            if ch == '\r' {
                if self.peek_char() == Some('\n') {
                    if let Some(lf) = self.read_char() {
                        raw.push(lf);
                    }
                }
                break;
            }
            if ch == '\n' {
                break;
            }
        }
        raw
    }

    fn read_block_comment(&mut self, first: char, line: usize, column: usize) -> ScriptResult<String> {
        let mut raw = String::from(first);
        if let Some(star) = self.read_char() {
            raw.push(star);
        }

        let mut depth = 1usize;
        while depth > 0 {
            let ch = self.read_char().ok_or_else(|| {
                ScriptError::malformed(line, column, "Unexpected end of input inside multi-line comment")
            })?;
            raw.push(ch);

            let next = self.peek_char();
            if ch == '*' && next == Some('/') {
                if let Some(slash) = self.read_char() {
                    raw.push(slash);
                }
                depth -= 1;
            } else if ch == '/' && next == Some('*') {
                if let Some(star) = self.read_char() {
                    raw.push(star);
                }
                depth += 1;
            }
        }
        Ok(raw)
    }

    fn read_delimited(&mut self, open: char, line: usize, column: usize) -> ScriptResult<String> {
        let close = ElementKind::closing_delimiter(open);
        let mut raw = String::from(open);

        loop {
            let ch = self.read_char().ok_or_else(|| {
                ScriptError::malformed(line, column, "Unexpected end of input in quoted section")
            })?;
            raw.push(ch);

            if ch == close {
                if self.peek_char() == Some(close) {
                    if let Some(escaped) = self.read_char() {
                        raw.push(escaped);
                    }
                    continue;
                }
                return Ok(raw);
            }
        }
    }
}

/// Kind of the special element starting at `ch`, given the character after it.
fn special_start(ch: char, next: Option<char>) -> Option<ElementKind> {
    match (ch, next) {
        ('\'', _) => Some(ElementKind::SingleQuotedString),
        ('"', _) => Some(ElementKind::DoubleQuotedString),
        ('[', _) => Some(ElementKind::BracketedIdentifier),
        ('-', Some('-')) => Some(ElementKind::SingleLineComment),
        ('/', Some('*')) => Some(ElementKind::MultiLineComment),
        _ => None,
    }
}

impl<I: Iterator<Item = char>> Iterator for Scanner<I> {
    type Item = ScriptResult<Element>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_element().transpose()
    }
}
