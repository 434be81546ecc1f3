//! Line and column tracking.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 1-based line/column position.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const START: Position = Position { line: 1, column: 1 };

    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::START
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A start/end pair of positions, as carried by every AST node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    pub start: Position,
    pub end: Position,
}

impl Location {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Location) -> Location {
        Location {
            start: std::cmp::min(self.start, other.start),
            end: std::cmp::max(self.end, other.end),
        }
    }

    /// Move the location down by `delta` lines. Columns are unchanged.
    pub fn offset_lines(self, delta: u32) -> Location {
        Location {
            start: Position::new(self.start.line + delta, self.start.column),
            end: Position::new(self.end.line + delta, self.end.column),
        }
    }

    pub fn contains_line(&self, line: u32) -> bool {
        self.start.line <= line && line <= self.end.line
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}-{:?}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_lines() {
        let loc = Location::new(Position::new(1, 3), Position::new(2, 1));
        let moved = loc.offset_lines(10);
        assert_eq!(moved.start, Position::new(11, 3));
        assert_eq!(moved.end, Position::new(12, 1));
        assert!(moved.contains_line(12));
        assert!(!moved.contains_line(2));
    }
}
