use anyhow::Result;

use super::{CheckContext, Checker};
use crate::diag::{Diagnostic, DiagnosticSource};
use crate::text::{LineIndex, Position};

#[derive(Debug, Clone, Copy)]
struct Frame {
    open: char,
    position: Position,
    expected: char,
}

fn closer_for(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        _ => None,
    }
}

fn unclosed(frame: &Frame) -> Diagnostic {
    Diagnostic::error(
        DiagnosticSource::Brackets,
        frame.position,
        format!("Unclosed bracket '{}', expected '{}'", frame.open, frame.expected),
    )
}

/// Stack-based balance check over sanitized `code`.
///
/// A mismatched closer resynchronises against the nearest compatible opener below the top of
/// the stack; every frame skipped on the way is reported as unclosed. A closer with no
/// compatible opener is reported and ignored.
pub fn match_brackets(code: &str, lines: &LineIndex<'_>) -> Vec<Diagnostic> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut out = Vec::new();

    for (offset, c) in code.char_indices() {
        if let Some(expected) = closer_for(c) {
            stack.push(Frame {
                open: c,
                position: lines.position(offset),
                expected,
            });
            continue;
        }
        if !matches!(c, ')' | ']' | '}') {
            continue;
        }

        let position = lines.position(offset);
        let Some(top) = stack.last() else {
            out.push(Diagnostic::error(
                DiagnosticSource::Brackets,
                position,
                format!("Unexpected closing bracket '{c}'"),
            ));
            continue;
        };
        if top.expected == c {
            stack.pop();
            continue;
        }

        match stack.iter().rposition(|f| f.expected == c) {
            Some(idx) => {
                out.extend(stack[idx + 1..].iter().rev().map(unclosed));
                stack.truncate(idx);
            }
            None => {
                out.push(Diagnostic::error(
                    DiagnosticSource::Brackets,
                    position,
                    format!("Bracket mismatch: expected '{}', found '{}'", top.expected, c),
                ));
            }
        }
    }

    out.extend(stack.iter().rev().map(unclosed));
    out
}

pub struct BracketChecker;

impl Checker for BracketChecker {
    fn name(&self) -> &'static str {
        "brackets"
    }

    fn source(&self) -> DiagnosticSource {
        DiagnosticSource::Brackets
    }

    fn check(&self, cx: &CheckContext<'_>) -> Result<Vec<Diagnostic>> {
        Ok(match_brackets(&cx.code, &cx.lines))
    }
}
