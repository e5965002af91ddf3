use dosescript_core::Diagnostic;
use ropey::Rope;
use tower_lsp::lsp_types::{Position, Range, TextDocumentContentChangeEvent};

// LSP UTF-16 position to rope char index, clamped to the end of the line.
pub(crate) fn position_to_char_idx(text: &Rope, pos: Position) -> usize {
    let line_idx = pos.line as usize;
    if line_idx >= text.len_lines() {
        return text.len_chars();
    }
    let line_start = text.line_to_char(line_idx);
    let line = text.line(line_idx);
    let target = pos.character as usize;

    if let Some(s) = line.as_str()
        && s.is_ascii()
    {
        return line_start + target.min(line_len_chars(text, line_idx));
    }

    let mut seen_utf16 = 0usize;
    let mut chars = 0usize;
    for ch in line.chars() {
        if ch == '\n' || ch == '\r' {
            break;
        }
        let width = ch.len_utf16();
        if seen_utf16 + width > target {
            break;
        }
        seen_utf16 += width;
        chars += 1;
    }
    line_start + chars
}

/// Byte offset in the rope's text for an LSP position.
pub(crate) fn position_to_byte(text: &Rope, pos: Position) -> usize {
    text.char_to_byte(position_to_char_idx(text, pos))
}

pub(crate) fn char_idx_to_position(text: &Rope, char_idx: usize) -> Position {
    let char_idx = char_idx.min(text.len_chars());
    let line_idx = text.char_to_line(char_idx);
    let line_start = text.line_to_char(line_idx);
    let character: usize = text.slice(line_start..char_idx).chars().map(char::len_utf16).sum();
    Position::new(line_idx as u32, character as u32)
}

/// Line length in chars without its terminator.
fn line_len_chars(text: &Rope, line_idx: usize) -> usize {
    let line = text.line(line_idx);
    let mut len = line.len_chars();
    while len > 0 && matches!(line.char(len - 1), '\n' | '\r') {
        len -= 1;
    }
    len
}

/// Apply one content change. Returns the char index right after the inserted text, which is
/// where the editor's caret sits after typing.
pub(crate) fn apply_change(text: &mut Rope, change: &TextDocumentContentChangeEvent) -> usize {
    let Some(range) = &change.range else {
        *text = Rope::from_str(&change.text);
        return text.len_chars();
    };
    let a = position_to_char_idx(text, range.start);
    let b = position_to_char_idx(text, range.end);
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    if start != end {
        text.remove(start..end);
    }
    if !change.text.is_empty() {
        text.insert(start, &change.text);
    }
    start + change.text.chars().count()
}

/// Editor range covered by a 1-based diagnostic; lines outside the document clamp to it.
pub(crate) fn diagnostic_range(text: &Rope, diagnostic: &Diagnostic) -> Range {
    let last_line = text.len_lines().saturating_sub(1);
    let line_idx = (diagnostic.line.max(1) as usize - 1).min(last_line);
    let line_len = line_len_chars(text, line_idx);
    let column = (diagnostic.column.max(1) as usize - 1).min(line_len);
    let line_start = text.line_to_char(line_idx);
    let start = line_start + column;
    let end = line_start + (column + diagnostic.length.max(1)).min(line_len);
    Range::new(char_idx_to_position(text, start), char_idx_to_position(text, end.max(start)))
}

/// Innermost unclosed call before the cursor: callee name and the index of the argument
/// being typed.
pub(crate) fn find_call_before_cursor(prefix: &str) -> Option<(String, usize)> {
    let bytes = prefix.as_bytes();
    let mut depth = 0i32;
    let mut commas = 0usize;
    let mut i = bytes.len();
    while i > 0 {
        i -= 1;
        match bytes[i] {
            b')' | b']' | b'}' => depth += 1,
            b'[' | b'{' if depth > 0 => depth -= 1,
            b'[' | b'{' => return None,
            b'(' if depth > 0 => depth -= 1,
            b'(' => {
                let head = prefix[..i].trim_end();
                let name_start = head
                    .char_indices()
                    .rev()
                    .take_while(|(_, c)| c.is_alphanumeric() || *c == '_' || *c == '$')
                    .last()
                    .map(|(idx, _)| idx)?;
                let name = &head[name_start..];
                return Some((name.to_string(), commas));
            }
            b',' if depth == 0 => commas += 1,
            b';' if depth == 0 => return None,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use dosescript_core::{DiagnosticSource, Severity};

    fn change(range: Option<Range>, text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range,
            range_length: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_position_to_char_idx_handles_utf16() {
        let rope = Rope::from_str("let s = '😀x';\nnext");
        // The emoji takes two UTF-16 units.
        let idx = position_to_char_idx(&rope, Position::new(0, 11));
        assert_eq!(rope.char(idx), 'x');
        assert_eq!(position_to_char_idx(&rope, Position::new(0, 99)), 13);
        assert_eq!(position_to_char_idx(&rope, Position::new(5, 0)), rope.len_chars());
    }

    #[test]
    fn test_apply_change_returns_caret() {
        let mut rope = Rope::from_str("let a = 1;\nlet b = 2;");
        let range = Range::new(Position::new(1, 8), Position::new(1, 9));
        let caret = apply_change(&mut rope, &change(Some(range), "weight"));
        assert_eq!(rope.to_string(), "let a = 1;\nlet b = weight;");
        assert_eq!(caret, 25);

        let caret = apply_change(&mut rope, &change(None, "x"));
        assert_eq!(rope.to_string(), "x");
        assert_eq!(caret, 1);
    }

    #[test]
    fn test_diagnostic_range() {
        let rope = Rope::from_str("var x = 1;\nlog(wieght);\n");
        let d = Diagnostic::at(DiagnosticSource::Identifiers, Severity::Warning, 2, 5, "unknown").with_length(6);
        let range = diagnostic_range(&rope, &d);
        assert_eq!(range.start, Position::new(1, 4));
        assert_eq!(range.end, Position::new(1, 10));

        let past = Diagnostic::at(DiagnosticSource::Compile, Severity::Error, 9, 40, "eof");
        let range = diagnostic_range(&rope, &past);
        assert_eq!(range.start.line, 2);
    }

    #[test]
    fn test_find_call_before_cursor() {
        assert_eq!(find_call_before_cursor("roundTo(dose, "), Some(("roundTo".to_string(), 1)));
        assert_eq!(
            find_call_before_cursor("addNormalResult('a', clamp(x, 1, 2), "),
            Some(("addNormalResult".to_string(), 2))
        );
        assert_eq!(find_call_before_cursor("let x = [1, "), None);
        assert_eq!(find_call_before_cursor("f(1); g"), None);
    }
}
