use std::fmt;

/// A location in a document. `line` and `column` are 1-based, `offset` is a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Position {
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self { line, column, offset }
    }

    pub fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Line start table for a single text snapshot.
///
/// Built once per analysis pass; every checker converts byte offsets through it so
/// columns are counted in Unicode scalar values, matching what editors display.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = Vec::with_capacity(text.len() / 32 + 1);
        line_starts.push(0);
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { text, line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset into a position. Offsets past the end clamp to the end of text,
    /// offsets inside a multi-byte character snap back to its first byte.
    pub fn position(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while offset > 0 && !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.line_starts[line_idx];
        let column = self.text[line_start..offset].chars().count() as u32 + 1;
        Position::new(line_idx as u32 + 1, column, offset)
    }

    /// Byte offset of a 1-based line/column pair, clamped to the line's end.
    pub fn offset(&self, line: u32, column: u32) -> usize {
        let Some(&line_start) = self.line_starts.get(line.saturating_sub(1) as usize) else {
            return self.text.len();
        };
        let line_text = self.line_text_from(line_start);
        let skip = column.saturating_sub(1) as usize;
        match line_text.char_indices().nth(skip) {
            Some((idx, _)) => line_start + idx,
            None => line_start + line_text.len(),
        }
    }

    /// Text of a 1-based line without its terminator.
    pub fn line_text(&self, line: u32) -> &'a str {
        match self.line_starts.get(line.saturating_sub(1) as usize) {
            Some(&start) if line > 0 => self.line_text_from(start),
            _ => "",
        }
    }

    /// Number of characters between `offset` and the end of its line.
    pub fn chars_to_line_end(&self, offset: usize) -> usize {
        let rest = &self.text[offset.min(self.text.len())..];
        let end = rest.find('\n').unwrap_or(rest.len());
        rest[..end].trim_end_matches('\r').chars().count()
    }

    fn line_text_from(&self, start: usize) -> &'a str {
        let rest = &self.text[start..];
        let end = rest.find('\n').unwrap_or(rest.len());
        rest[..end].trim_end_matches('\r')
    }
}

/// Helper to convert a byte offset to a line/column position without building an index.
pub fn offset_to_position(text: &str, offset: usize) -> Position {
    LineIndex::new(text).position(offset)
}
