#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Whether `s` is a syntactically valid identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => chars.all(is_ident_continue),
        _ => false,
    }
}

/// The word surrounding a caret, as a half-open byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl WordSpan {
    /// Part of the word left of the caret; this is what completion filters on.
    pub fn prefix_at<'t>(&self, source: &'t str, caret: usize) -> &'t str {
        let caret = floor_char_boundary(source, caret).clamp(self.start, self.end);
        &source[self.start..caret]
    }
}

/// Largest char boundary of `text` at or before `offset`.
pub fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Scan left and right from `offset` over identifier characters.
pub fn word_at(text: &str, offset: usize) -> WordSpan {
    let offset = floor_char_boundary(text, offset);

    let start = text[..offset]
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_ident_continue(*c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(offset);
    let end = text[offset..]
        .char_indices()
        .find(|(_, c)| !is_ident_continue(*c))
        .map(|(i, _)| offset + i)
        .unwrap_or(text.len());

    WordSpan {
        start,
        end,
        text: text[start..end].to_string(),
    }
}

/// An identifier occurrence found by [`scan_identifiers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentOccurrence<'a> {
    pub offset: usize,
    pub name: &'a str,
}

/// Every identifier-shaped token of `text`, skipping numeric literals such as `1e5` or `0x1F`.
///
/// Intended for sanitized text, where literal contents are already blank.
pub fn scan_identifiers(text: &str) -> Vec<IdentOccurrence<'_>> {
    let mut out = Vec::new();
    let mut iter = text.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if c.is_ascii_digit() {
            while let Some(&(_, n)) = iter.peek() {
                if is_ident_continue(n) || n == '.' {
                    iter.next();
                } else {
                    break;
                }
            }
        } else if is_ident_start(c) {
            let mut end = i + c.len_utf8();
            while let Some(&(j, n)) = iter.peek() {
                if is_ident_continue(n) {
                    end = j + n.len_utf8();
                    iter.next();
                } else {
                    break;
                }
            }
            out.push(IdentOccurrence {
                offset: i,
                name: &text[i..end],
            });
        }
    }
    out
}

/// Previous non-whitespace character before `offset`, with its byte index.
pub fn prev_non_space(text: &str, offset: usize) -> Option<(usize, char)> {
    text[..offset].char_indices().rev().find(|(_, c)| !c.is_whitespace())
}

/// Next non-whitespace character at or after `offset`, with its byte index.
pub fn next_non_space(text: &str, offset: usize) -> Option<(usize, char)> {
    text[offset..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, c)| (offset + i, c))
}

/// Word ending right before `offset` (after skipping whitespace), if any.
pub fn prev_word(text: &str, offset: usize) -> Option<(usize, &str)> {
    let (idx, c) = prev_non_space(text, offset)?;
    if !is_ident_continue(c) {
        return None;
    }
    let end = idx + c.len_utf8();
    let span = word_at(text, end);
    Some((span.start, &text[span.start..end]))
}
