//! Lexical elements produced by the scanner.

/// Classification of a scanned element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Plain script text up to the next special element or line end.
    Text,
    /// `-- ...` through the line terminator.
    SingleLineComment,
    /// `/* ... */`, possibly nested.
    MultiLineComment,
    /// `'...'` with `''` as an escaped quote.
    SingleQuotedString,
    /// `"..."` with `""` as an escaped quote.
    DoubleQuotedString,
    /// `[...]` with `]]` as an escaped bracket.
    BracketedIdentifier,
}

impl ElementKind {
    /// Quoted strings and bracketed identifiers.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            Self::SingleQuotedString | Self::DoubleQuotedString | Self::BracketedIdentifier
        )
    }

    pub fn is_comment(self) -> bool {
        matches!(self, Self::SingleLineComment | Self::MultiLineComment)
    }

    /// Closing delimiter for a literal opened by `open`.
    pub fn closing_delimiter(open: char) -> char {
        match open {
            '[' => ']',
            other => other,
        }
    }
}

/// What terminated a [`ElementKind::Text`] element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndedBy {
    /// The element's own trailing line terminator.
    EndOfLine,
    EndOfStream,
    /// A special element starts right after this one.
    Next(ElementKind),
    /// Not applicable (non-text elements).
    Unknown,
}

impl EndedBy {
    /// True when nothing but a comment can follow on the same line.
    ///
    /// `GO` and directives are only accepted when their text run ends this way.
    pub fn is_line_end(self) -> bool {
        matches!(
            self,
            Self::EndOfLine | Self::EndOfStream | Self::Next(ElementKind::SingleLineComment)
        )
    }
}

/// One lexical unit of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementKind,
    /// Raw text; literal kinds include their delimiters.
    pub text: String,
    /// 1-based line of the first character.
    pub line: usize,
    /// 1-based column of the first character.
    pub column: usize,
    pub ended_by: EndedBy,
}

impl Element {
    pub fn new(kind: ElementKind, text: String, line: usize, column: usize) -> Self {
        Self {
            kind,
            text,
            line,
            column,
            ended_by: EndedBy::Unknown,
        }
    }

    pub fn text(text: String, line: usize, column: usize, ended_by: EndedBy) -> Self {
        Self {
            kind: ElementKind::Text,
            text,
            line,
            column,
            ended_by,
        }
    }

    /// Content of a literal with delimiters stripped and doubled closing
    /// delimiters collapsed.
    ///
    /// Returns `None` for text and comment elements.
    ///
    /// # Example
    ///
    /// ```
    /// use sqlscript::element::{Element, ElementKind};
    ///
    /// let element = Element::new(ElementKind::SingleQuotedString, "'it''s'".into(), 1, 1);
    /// assert_eq!(element.inner_text().as_deref(), Some("it's"));
    /// ```
    pub fn inner_text(&self) -> Option<String> {
        if !self.kind.is_literal() {
            return None;
        }
        let mut chars = self.text.chars();
        chars.next()?;
        let close = chars.next_back()?;
        let doubled: String = [close, close].iter().collect();
        Some(chars.as_str().replace(&doubled, &close.to_string()))
    }
}
