use anyhow::Result;

use super::{CheckContext, Checker};
use crate::diag::{Diagnostic, DiagnosticSource};

pub struct StringChecker;

impl Checker for StringChecker {
    fn name(&self) -> &'static str {
        "strings"
    }

    fn source(&self) -> DiagnosticSource {
        DiagnosticSource::Strings
    }

    /// Quote balance on the comment-free text. `'` and `"` literals must close on their own
    /// line; template literals may span lines and are only reported when the text ends inside one.
    fn check(&self, cx: &CheckContext<'_>) -> Result<Vec<Diagnostic>> {
        let text = cx.comment_free.as_str();
        let mut out = Vec::new();
        let mut open: Option<(char, usize)> = None;
        let mut escaped = false;

        for (offset, c) in text.char_indices() {
            let Some((quote, start)) = open else {
                if matches!(c, '\'' | '"' | '`') {
                    open = Some((c, offset));
                }
                continue;
            };

            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '\n' if quote != '`' => {
                    out.push(unterminated(cx, quote, start));
                    open = None;
                }
                c if c == quote => open = None,
                _ => {}
            }
        }

        if let Some((quote, start)) = open {
            out.push(unterminated(cx, quote, start));
        }
        Ok(out)
    }
}

fn unterminated(cx: &CheckContext<'_>, quote: char, start: usize) -> Diagnostic {
    let what = if quote == '`' { "template literal" } else { "string literal" };
    Diagnostic::error(
        DiagnosticSource::Strings,
        cx.position(start),
        format!("Unterminated {what}: missing closing {quote}"),
    )
    .with_length(cx.lines.chars_to_line_end(start))
}
