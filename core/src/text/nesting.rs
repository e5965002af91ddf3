//! Bracket-depth helpers over sanitized text. All brackets count toward one shared depth,
//! which is good enough once literals and comments are blank.

#[inline]
fn is_open(b: u8) -> bool {
    matches!(b, b'(' | b'[' | b'{')
}

#[inline]
fn is_close(b: u8) -> bool {
    matches!(b, b')' | b']' | b'}')
}

/// Index of the bracket closing the one at `open`.
pub fn matching_close(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if !bytes.get(open).copied().is_some_and(is_open) {
        return None;
    }
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if is_open(b) {
            depth += 1;
        } else if is_close(b) {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Index of the bracket opening the one at `close`.
pub fn matching_open(text: &str, close: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if !bytes.get(close).copied().is_some_and(is_close) {
        return None;
    }
    let mut depth = 0usize;
    for i in (0..=close).rev() {
        let b = bytes[i];
        if is_close(b) {
            depth += 1;
        } else if is_open(b) {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Split on commas at bracket depth 0. Each piece carries its byte offset within `text`.
pub fn split_top_level(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b if is_open(b) => depth += 1,
            b if is_close(b) => depth -= 1,
            b',' if depth == 0 => {
                out.push((start, &text[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push((start, &text[start..]));
    out
}

/// First `=` at depth 0 that is a plain assignment (not `==`, `=>`, `<=`, `>=`, `!=`).
pub fn top_level_assign(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b if is_open(b) => depth += 1,
            b if is_close(b) => depth -= 1,
            b'=' if depth == 0 => {
                let prev = if i > 0 { bytes[i - 1] } else { b' ' };
                let next = bytes.get(i + 1).copied().unwrap_or(b' ');
                if next != b'=' && next != b'>' && !matches!(prev, b'=' | b'!' | b'<' | b'>') {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
