use anyhow::Result;

use super::{CheckContext, Checker};
use crate::diag::{Diagnostic, DiagnosticSource};
use crate::text::{matching_close, next_non_space, prev_non_space, prev_word, scan_identifiers};

/// Words with a meaning in some positions that are not in the keyword table.
const CONTEXTUAL: &[&str] = &["async", "await", "yield", "get", "set", "static", "arguments"];

pub struct IdentifierChecker;

impl Checker for IdentifierChecker {
    fn name(&self) -> &'static str {
        "identifiers"
    }

    fn source(&self) -> DiagnosticSource {
        DiagnosticSource::Identifiers
    }

    fn best_effort(&self) -> bool {
        true
    }

    fn check(&self, cx: &CheckContext<'_>) -> Result<Vec<Diagnostic>> {
        let code = cx.code.as_str();
        let mut out = Vec::new();

        for occ in scan_identifiers(code) {
            let name = occ.name;
            let start = occ.offset;
            let end = start + name.len();
            if cx.lang.is_keyword(name) || CONTEXTUAL.contains(&name) {
                continue;
            }

            let before = prev_non_space(code, start);
            let after = next_non_space(code, end);
            if matches!(before, Some((_, '.'))) || matches!(after, Some((_, '.'))) {
                continue;
            }
            // Object literal key.
            if matches!(after, Some((_, ':'))) && matches!(before, Some((_, '{' | ','))) {
                continue;
            }
            if matches!(prev_word(code, start), Some((_, "typeof"))) {
                continue;
            }
            if is_method_definition(code, end) {
                continue;
            }
            if cx.is_known(name, start) {
                continue;
            }

            let at = cx.position(start);
            let length = name.chars().count();
            if is_plain_assignment(code, end) {
                out.push(
                    Diagnostic::error(
                        DiagnosticSource::Identifiers,
                        at,
                        format!("'{name}' is assigned without declaration; declare it with let, const or var"),
                    )
                    .with_length(length),
                );
                continue;
            }

            let mut message = format!("Undefined variable '{name}'");
            if let Some(hint) = suggest(name, &cx.known_names(start)) {
                message.push_str(&format!("; did you mean '{hint}'?"));
            }
            out.push(Diagnostic::warning(DiagnosticSource::Identifiers, at, message).with_length(length));
        }
        Ok(out)
    }
}

/// `name = …` with a single `=`, not `==`, `===` or `=>`.
fn is_plain_assignment(code: &str, name_end: usize) -> bool {
    let Some((idx, '=')) = next_non_space(code, name_end) else {
        return false;
    };
    !matches!(code.as_bytes().get(idx + 1), Some(b'=' | b'>'))
}

/// `name(…) {` in an object literal or class-like body.
fn is_method_definition(code: &str, name_end: usize) -> bool {
    let Some((open, '(')) = next_non_space(code, name_end) else {
        return false;
    };
    matching_close(code, open).is_some_and(|close| matches!(next_non_space(code, close + 1), Some((_, '{'))))
}

/// Closest candidate within edit distance 2, for "did you mean" hints.
pub fn suggest(name: &str, candidates: &[String]) -> Option<String> {
    let limit = 2.min(name.chars().count().saturating_sub(1));
    candidates
        .iter()
        .filter(|c| c.as_str() != name)
        .map(|c| (levenshtein(name, c), c))
        .filter(|(d, _)| *d <= limit)
        .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)))
        .map(|(_, c)| c.clone())
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}
