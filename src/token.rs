//! The token definition for the filter splitter.

/// A token is a single unit of a filter string, with a specific kind and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

/// The kind of a token.
///
/// The splitter only cares about grouping and the two logical keywords;
/// everything else (field names, operators, values, commas) is an opaque word.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    And,    // "AND"
    Or,     // "OR"
    LParen, // (
    RParen, // )

    /// Any run of characters that is neither whitespace nor a parenthesis.
    Word(&'a str),
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}
