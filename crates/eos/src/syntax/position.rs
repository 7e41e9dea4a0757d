//! Source positions
//!
//! Positions follow the usual editor convention: lines and columns start at 1, columns count characters (not
//! bytes). The byte offset is kept next to them so text can be sliced back out of the source.
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
    pub byte: usize,
}

impl Pos {
    pub const INITIAL: Pos = Pos {
        line: 1,
        column: 1,
        byte: 0,
    };
}

/// A span of source text in a named file
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Range {
    pub filename: String,
    pub start: Pos,
    pub end: Pos,
}

impl Range {
    /// Range covering `self` up to the end of `other`
    pub fn to(&self, other: &Range) -> Range {
        Range {
            filename: self.filename.clone(),
            start: self.start,
            end: other.end,
        }
    }

    /// The text this range points at
    pub fn slice<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.start.byte..self.end.byte)
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{},{}-{},{}",
            self.filename, self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

/// Maps byte offsets of one source text to [Pos]
#[derive(Debug, Clone)]
pub struct LineIndex {
    filename: String,
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(filename: impl Into<String>, source: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();

        Self {
            filename: filename.into(),
            line_starts,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn pos(&self, source: &str, byte: usize) -> Pos {
        let byte = byte.min(source.len());
        let line = match self.line_starts.binary_search(&byte) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = source
            .get(line_start..byte)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(byte - line_start);

        Pos {
            line: line + 1,
            column: column + 1,
            byte,
        }
    }

    pub fn range(&self, source: &str, span: std::ops::Range<usize>) -> Range {
        Range {
            filename: self.filename.clone(),
            start: self.pos(source, span.start),
            end: self.pos(source, span.end),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn positions() {
        let source = "a = 1\n# é comment\n";
        let index = LineIndex::new("main.tf", source);

        assert_eq!(index.pos(source, 0), Pos::INITIAL);
        assert_eq!(
            index.pos(source, 6),
            Pos {
                line: 2,
                column: 1,
                byte: 6
            }
        );
        // columns count characters, `é` is two bytes
        assert_eq!(index.pos(source, 10).column, 4);
        // the end of a line comment lands on column 1 of the next line
        assert_eq!(
            index.pos(source, source.len()),
            Pos {
                line: 3,
                column: 1,
                byte: source.len()
            }
        );
    }
}
