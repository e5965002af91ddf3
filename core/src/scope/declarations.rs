use crate::text::{
    is_ident_continue, is_ident_start, matching_close, next_non_space, scan_identifiers, split_top_level,
    top_level_assign,
};

/// A name introduced by a `let`/`const`/`var` declarator list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarator {
    pub name: String,
    /// Byte offset of the name relative to the scanned text.
    pub offset: usize,
    /// The initializer is a function expression or an arrow function.
    pub is_function: bool,
}

/// Binding names of a parameter list such as `a, b = 2, {c, d: e}, ...rest`.
pub fn param_names(params: &str) -> Vec<String> {
    let mut out = Vec::new();
    for (_, piece) in split_top_level(params) {
        let piece = piece.trim().trim_start_matches("...");
        let binding = match top_level_assign(piece) {
            Some(eq) => &piece[..eq],
            None => piece,
        };
        out.extend(binding_names(binding));
    }
    out
}

/// Identifiers bound by a (possibly destructuring) pattern. Keys followed by `:` are
/// property names, not bindings.
fn binding_names(pattern: &str) -> Vec<String> {
    scan_identifiers(pattern)
        .into_iter()
        .filter(|occ| {
            let after = occ.offset + occ.name.len();
            !matches!(next_non_space(pattern, after), Some((_, ':')))
        })
        .map(|occ| occ.name.to_string())
        .collect()
}

/// Declarators following a `let`/`const`/`var` keyword. `text` starts right after the keyword;
/// scanning stops at the end of the declaration statement.
pub fn declarator_names(text: &str) -> Vec<Declarator> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        match bytes[i] {
            b'{' | b'[' => {
                let Some(close) = matching_close(text, i) else {
                    break;
                };
                let base = i + 1;
                for name in binding_names(&text[base..close]) {
                    out.push(Declarator {
                        name,
                        offset: base,
                        is_function: false,
                    });
                }
                i = close + 1;
            }
            _ => {
                let Some(c) = text[i..].chars().next() else {
                    break;
                };
                if !is_ident_start(c) {
                    break;
                }
                let start = i;
                let end = text[start..]
                    .char_indices()
                    .find(|(_, ch)| !is_ident_continue(*ch))
                    .map(|(k, _)| start + k)
                    .unwrap_or(text.len());
                let init_end = initializer_end(text, end);
                out.push(Declarator {
                    name: text[start..end].to_string(),
                    offset: start,
                    is_function: initializer_is_function(&text[end..init_end]),
                });
                i = end;
            }
        }

        let stop = initializer_end(text, i);
        if stop < bytes.len() && bytes[stop] == b',' {
            i = stop + 1;
        } else {
            break;
        }
    }
    out
}

/// End of a declarator's initializer: the next depth-0 `,`, `;`, unmatched closer, or a line
/// break that ends the statement.
fn initializer_end(text: &str, from: usize) -> usize {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                if depth == 0 {
                    return i;
                }
                depth -= 1;
            }
            b',' | b';' if depth == 0 => return i,
            b'\n' if depth == 0 && !statement_continues(text, from, i) => return i,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

fn statement_continues(text: &str, from: usize, newline: usize) -> bool {
    const CONTINUATION: &[char] = &['=', '+', '-', '*', '/', '%', '?', ':', '&', '|', '(', ',', '.', '<', '>'];
    let before = text[from..newline].trim_end();
    if before.is_empty() {
        return true;
    }
    if before.ends_with(CONTINUATION) {
        return true;
    }
    text[newline..].trim_start().starts_with(CONTINUATION)
}

fn initializer_is_function(rest: &str) -> bool {
    let rest = rest.trim_start();
    let Some(init) = rest.strip_prefix('=') else {
        return false;
    };
    if init.starts_with(['=', '>']) {
        return false;
    }
    let init = init.trim_start();
    let init = init.strip_prefix("async").map(str::trim_start).unwrap_or(init);
    if init.starts_with("function") && !init["function".len()..].starts_with(is_ident_continue) {
        return true;
    }
    let after_params = if init.starts_with('(') {
        matching_close(init, 0).map(|close| &init[close + 1..])
    } else {
        let ident_len = init
            .char_indices()
            .find(|(_, c)| !is_ident_continue(*c))
            .map(|(k, _)| k)
            .unwrap_or(init.len());
        (ident_len > 0).then(|| &init[ident_len..])
    };
    after_params.is_some_and(|tail| tail.trim_start().starts_with("=>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<String> {
        declarator_names(text).into_iter().map(|d| d.name).collect()
    }

    #[test]
    fn test_param_names() {
        assert_eq!(param_names("a, b = 2, ...rest"), vec!["a", "b", "rest"]);
        assert_eq!(param_names("{dose, unit: u}, [x, y]"), vec!["dose", "u", "x", "y"]);
        assert!(param_names("  ").is_empty());
    }

    #[test]
    fn test_declarator_lists() {
        assert_eq!(names(" a = 1, b = f(2, 3), c;"), vec!["a", "b", "c"]);
        assert_eq!(names(" {low, high} = range;"), vec!["low", "high"]);
        assert_eq!(names(" i = 0; i < 10; i++"), vec!["i"]);
        assert_eq!(names(" k of list"), vec!["k"]);
    }

    #[test]
    fn test_declaration_ends_at_line_break() {
        assert_eq!(names(" a = 1\nb = 2"), vec!["a"]);
        assert_eq!(names(" a = 1 +\n  2, b = 3"), vec!["a", "b"]);
        assert_eq!(names(" a = [\n1,\n2], b"), vec!["a", "b"]);
    }

    #[test]
    fn test_function_initializers() {
        let decls = declarator_names(" f = function (x) { return x; }, g = (a, b) => a, h = v => v, n = 3");
        let flags: Vec<(&str, bool)> = decls.iter().map(|d| (d.name.as_str(), d.is_function)).collect();
        assert_eq!(flags, vec![("f", true), ("g", true), ("h", true), ("n", false)]);
    }
}
