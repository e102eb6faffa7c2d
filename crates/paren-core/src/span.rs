use serde::{Deserialize, Serialize};

/// A zero-based position in a document.
///
/// Columns follow the lexer's character-stepping rule: a `\n` starts a new
/// line and resets the column to 0, every other character advances the
/// column by one. There is no tab expansion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Position { line, character }
    }
}

/// A half-open range: `start <= p < end` in (line, character) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    /// Whether `position` falls inside this range. The end position is
    /// exclusive.
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position < self.end
    }

    /// The range from the start of `self` to the end of `other`.
    pub fn to(self, other: Range) -> Range {
        Range {
            start: self.start,
            end: other.end,
        }
    }
}

/// A range inside a named document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub uri: String,
    pub range: Range,
}
