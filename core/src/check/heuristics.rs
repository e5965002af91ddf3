use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{CheckContext, Checker};
use crate::diag::{Diagnostic, DiagnosticSource};
use crate::text::{is_ident_continue, matching_close, next_non_space, top_level_assign};

static JUMP_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\b(return|break|continue|throw)\b").ok());
static WHILE_TRUE_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\bwhile\s*\(\s*(?:true|1)\s*\)").ok());
static FOR_EVER_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\bfor\s*\(\s*;\s*;\s*\)").ok());
static CONDITION_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\b(if|while)\s*\(").ok());

/// Line endings after which a statement clearly continues on the next line.
const CONTINUATION: &[char] = &['+', '-', '*', '/', '%', '=', '(', '[', ',', '?', ':', '&', '|', '.'];

/// Common-mistake detection over sanitized text.
pub struct HeuristicChecker;

impl Checker for HeuristicChecker {
    fn name(&self) -> &'static str {
        "heuristics"
    }

    fn source(&self) -> DiagnosticSource {
        DiagnosticSource::Heuristics
    }

    fn best_effort(&self) -> bool {
        true
    }

    fn check(&self, cx: &CheckContext<'_>) -> Result<Vec<Diagnostic>> {
        let mut out = Vec::new();
        jump_statements(cx, &mut out);
        loose_equality(cx, &mut out);
        infinite_loops(cx, &mut out);
        conditions(cx, &mut out);
        mixed_quotes(cx, &mut out);
        Ok(out)
    }
}

/// Missing `;` after `return`/`break`/`continue`/`throw`, and a bare `return` whose value sits
/// on the next line.
fn jump_statements(cx: &CheckContext<'_>, out: &mut Vec<Diagnostic>) {
    let Some(re) = JUMP_RE.as_ref() else {
        return;
    };
    let code = cx.code.as_str();

    for m in re.find_iter(code) {
        if code[..m.start()].ends_with('.') {
            continue;
        }
        let line_end = code[m.end()..].find('\n').map_or(code.len(), |i| m.end() + i);
        let rest = &code[m.end()..line_end];
        if rest.contains(';') {
            continue;
        }
        let tail = rest.trim_end();
        if tail.ends_with(['}', '{']) || tail.ends_with(CONTINUATION) {
            continue;
        }

        if m.as_str() == "return" && tail.trim().is_empty() && next_line_has_value(code, line_end) {
            out.push(
                Diagnostic::warning(
                    DiagnosticSource::Heuristics,
                    cx.position(m.start()),
                    "'return' on its own line returns undefined; the expression on the next line is never returned",
                )
                .with_length(m.as_str().len()),
            );
            continue;
        }

        let end = m.end() + tail.len();
        out.push(Diagnostic::info(
            DiagnosticSource::Heuristics,
            cx.position(end),
            format!("Missing semicolon after '{}' statement", m.as_str()),
        ));
    }
}

fn next_line_has_value(code: &str, line_end: usize) -> bool {
    match next_non_space(code, line_end) {
        Some((idx, c)) => {
            !matches!(c, '}' | ';') && !code[idx..].starts_with("case") && !code[idx..].starts_with("default")
        }
        None => false,
    }
}

/// `== null`, `!= undefined` and the mirrored forms.
fn loose_equality(cx: &CheckContext<'_>, out: &mut Vec<Diagnostic>) {
    let code = cx.code.as_str();
    let bytes = code.as_bytes();

    for i in 0..bytes.len().saturating_sub(1) {
        if bytes[i + 1] != b'=' || !matches!(bytes[i], b'=' | b'!') {
            continue;
        }
        let prev = if i > 0 { bytes[i - 1] } else { b' ' };
        if matches!(prev, b'=' | b'!' | b'<' | b'>') || bytes.get(i + 2) == Some(&b'=') {
            continue;
        }

        let right = code[i + 2..].trim_start();
        let left = code[..i].trim_end();
        let against = ["null", "undefined"].into_iter().find(|&word| {
            (right.starts_with(word) && !right[word.len()..].starts_with(is_ident_continue))
                || (left.ends_with(word) && !left[..left.len() - word.len()].ends_with(is_ident_continue))
        });
        let Some(word) = against else {
            continue;
        };

        let op = &code[i..i + 2];
        out.push(
            Diagnostic::warning(
                DiagnosticSource::Heuristics,
                cx.position(i),
                format!("Loose comparison '{op} {word}'; use '{op}= {word}' for a strict check"),
            )
            .with_length(2),
        );
    }
}

fn infinite_loops(cx: &CheckContext<'_>, out: &mut Vec<Diagnostic>) {
    let code = cx.code.as_str();
    for re in [WHILE_TRUE_RE.as_ref(), FOR_EVER_RE.as_ref()].into_iter().flatten() {
        for m in re.find_iter(code) {
            out.push(
                Diagnostic::warning(
                    DiagnosticSource::Heuristics,
                    cx.position(m.start()),
                    "Possible infinite loop: make sure the loop body always reaches a break",
                )
                .with_length(m.as_str().chars().count()),
            );
        }
    }
}

/// Empty `if ()`/`while ()` conditions and assignments used as conditions.
fn conditions(cx: &CheckContext<'_>, out: &mut Vec<Diagnostic>) {
    let Some(re) = CONDITION_RE.as_ref() else {
        return;
    };
    let code = cx.code.as_str();

    for caps in re.captures_iter(code) {
        let (Some(whole), Some(keyword)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let open = whole.end() - 1;
        let Some(close) = matching_close(code, open) else {
            continue;
        };
        let inner = &code[open + 1..close];
        if inner.trim().is_empty() {
            out.push(Diagnostic::error(
                DiagnosticSource::Heuristics,
                cx.position(keyword.start()),
                format!("Empty condition in '{}'", keyword.as_str()),
            ));
            continue;
        }
        if let Some(eq) = top_level_assign(inner)
            && !inner[..eq].ends_with(['+', '-', '*', '/', '%', '&', '|', '^'])
        {
            out.push(Diagnostic::warning(
                DiagnosticSource::Heuristics,
                cx.position(open + 1 + eq),
                format!("Assignment in '{}' condition; did you mean '==='?", keyword.as_str()),
            ));
        }
    }
}

/// Both `'` and `"` literals on the same line.
fn mixed_quotes(cx: &CheckContext<'_>, out: &mut Vec<Diagnostic>) {
    let mut line_start = 0usize;
    let mut single = false;
    let mut double = false;
    let mut open: Option<char> = None;
    let mut escaped = false;

    for (i, c) in cx.comment_free.char_indices() {
        if c == '\n' {
            if single && double {
                out.push(Diagnostic::info(
                    DiagnosticSource::Heuristics,
                    cx.position(line_start),
                    "Mixed quote styles on one line; prefer a single style",
                ));
            }
            line_start = i + 1;
            single = false;
            double = false;
            if open != Some('`') {
                open = None;
            }
            escaped = false;
            continue;
        }

        match open {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => open = None,
            Some(_) => {}
            None => match c {
                '\'' => {
                    single = true;
                    open = Some(c);
                }
                '"' => {
                    double = true;
                    open = Some(c);
                }
                '`' => open = Some(c),
                _ => {}
            },
        }
    }
    if single && double {
        out.push(Diagnostic::info(
            DiagnosticSource::Heuristics,
            cx.position(line_start),
            "Mixed quote styles on one line; prefer a single style",
        ));
    }
}
