/// What the sanitizer blanks out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeMode {
    /// Comments and the contents of string/template literals. Quote characters stay.
    Full,
    /// Comments only; literals are left intact.
    CommentsOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    Str(char),
    Template,
    TemplateExpr(u32),
}

/// Produce a copy of `text` with comments (and optionally literal contents) replaced by spaces.
///
/// The result has exactly the same byte length as the input and keeps every line break, so
/// byte offsets and line/column positions computed on either copy are interchangeable.
pub fn sanitize(text: &str, mode: SanitizeMode) -> String {
    let mut out: Vec<u8> = Vec::with_capacity(text.len());
    let mut state = State::Code;
    let mut chars = text.char_indices().peekable();

    let blank_literals = mode == SanitizeMode::Full;

    while let Some((_, c)) = chars.next() {
        let next = chars.peek().map(|(_, n)| *n);
        match state {
            State::Code => match c {
                '/' if next == Some('/') => {
                    chars.next();
                    out.extend_from_slice(b"  ");
                    state = State::LineComment;
                }
                '/' if next == Some('*') => {
                    chars.next();
                    out.extend_from_slice(b"  ");
                    state = State::BlockComment;
                }
                '"' | '\'' => {
                    push_char(&mut out, c);
                    state = State::Str(c);
                }
                '`' => {
                    push_char(&mut out, c);
                    state = State::Template;
                }
                _ => push_char(&mut out, c),
            },
            State::LineComment => {
                if c == '\n' {
                    out.push(b'\n');
                    state = State::Code;
                } else {
                    blank(&mut out, c);
                }
            }
            State::BlockComment => {
                if c == '*' && next == Some('/') {
                    chars.next();
                    out.extend_from_slice(b"  ");
                    state = State::Code;
                } else {
                    blank(&mut out, c);
                }
            }
            State::Str(quote) => {
                if c == '\n' {
                    // Unterminated; the string checker reports it.
                    out.push(b'\n');
                    state = State::Code;
                } else if c == '\\' {
                    literal(&mut out, c, blank_literals);
                    if let Some((_, escaped)) = chars.next() {
                        if escaped == '\n' {
                            out.push(b'\n');
                        } else {
                            literal(&mut out, escaped, blank_literals);
                        }
                    }
                } else if c == quote {
                    push_char(&mut out, c);
                    state = State::Code;
                } else {
                    literal(&mut out, c, blank_literals);
                }
            }
            State::Template => {
                if c == '\\' {
                    literal(&mut out, c, blank_literals);
                    if let Some((_, escaped)) = chars.next() {
                        literal(&mut out, escaped, blank_literals);
                    }
                } else if c == '`' {
                    push_char(&mut out, c);
                    state = State::Code;
                } else if c == '$' && next == Some('{') {
                    chars.next();
                    literal(&mut out, '$', blank_literals);
                    literal(&mut out, '{', blank_literals);
                    state = State::TemplateExpr(1);
                } else {
                    literal(&mut out, c, blank_literals);
                }
            }
            State::TemplateExpr(depth) => {
                match c {
                    '{' => state = State::TemplateExpr(depth + 1),
                    '}' if depth == 1 => state = State::Template,
                    '}' => state = State::TemplateExpr(depth - 1),
                    _ => {}
                }
                literal(&mut out, c, blank_literals);
            }
        }
    }

    // Blanking only ever substitutes ASCII spaces for whole characters, so the buffer stays valid UTF-8.
    String::from_utf8(out).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

fn blank(out: &mut Vec<u8>, c: char) {
    match c {
        '\n' => out.push(b'\n'),
        '\r' => out.push(b'\r'),
        _ => out.extend(std::iter::repeat_n(b' ', c.len_utf8())),
    }
}

fn literal(out: &mut Vec<u8>, c: char, blank_literals: bool) {
    if blank_literals {
        blank(out, c);
    } else {
        push_char(out, c);
    }
}
