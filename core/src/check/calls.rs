use anyhow::{Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;

use super::identifiers::suggest;
use super::{CheckContext, Checker};
use crate::diag::{Diagnostic, DiagnosticSource};
use crate::lang::{FunctionSignature, ValueKind};
use crate::text::{
    is_ident_continue, is_identifier, matching_close, next_non_space, prev_non_space, prev_word, split_top_level,
};

static CALL_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*\s*\(").ok());
static NUMBER_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:0[xX][0-9a-fA-F]+|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)$").ok()
});
static METHOD_CALL_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][\w$.\[\]]*\.([A-Za-z_$][\w$]*)\s*\(").ok());
static PLAIN_CALL_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[A-Za-z_$][\w$.]*\s*\(").ok());

/// Keywords that take a parenthesised clause and look like calls.
const PSEUDO_CALLS: &[&str] = &["if", "for", "while", "switch", "catch"];

/// What a single call argument looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentClass {
    String,
    Number,
    Boolean,
    Null,
    ArrayLiteral,
    ObjectLiteral,
    ArrayMethodCall,
    FunctionCall,
    KnownIdentifier,
    UnknownIdentifier,
    InvalidCharacters,
    Empty,
    Expression,
}

impl ArgumentClass {
    /// Value kind of a literal argument, when it is obvious from the text.
    fn literal_kind(self) -> Option<ValueKind> {
        match self {
            ArgumentClass::String => Some(ValueKind::String),
            ArgumentClass::Number => Some(ValueKind::Number),
            ArgumentClass::Boolean => Some(ValueKind::Boolean),
            ArgumentClass::ArrayLiteral => Some(ValueKind::Array),
            ArgumentClass::ObjectLiteral => Some(ValueKind::Object),
            _ => None,
        }
    }
}

/// Classify one argument.
///
/// `literal` is the argument with comments removed, `code` the same span with literal contents
/// blanked as well; both have equal length. `offset` is where the argument starts in the document.
pub fn classify_argument(cx: &CheckContext<'_>, literal: &str, code: &str, offset: usize) -> ArgumentClass {
    let arg = literal.trim();
    let shape = code.trim();
    if arg.is_empty() {
        return ArgumentClass::Empty;
    }
    if arg.starts_with(['\'', '"', '`']) && shape.len() >= 2 && shape.ends_with(&arg[..1]) {
        return ArgumentClass::String;
    }
    if NUMBER_RE.as_ref().is_some_and(|re| re.is_match(arg)) {
        return ArgumentClass::Number;
    }
    match arg {
        "true" | "false" => return ArgumentClass::Boolean,
        "null" | "undefined" => return ArgumentClass::Null,
        _ => {}
    }
    if shape.chars().any(|c| !is_allowed(c)) {
        return ArgumentClass::InvalidCharacters;
    }
    if wrapped(shape, '[') {
        return ArgumentClass::ArrayLiteral;
    }
    if wrapped(shape, '{') {
        return ArgumentClass::ObjectLiteral;
    }
    if shape.ends_with(')') {
        if let Some(caps) = METHOD_CALL_RE.as_ref().and_then(|re| re.captures(shape))
            && cx.lang.is_array_method(&caps[1])
            && wraps_to_end(shape, caps.get(0).map_or(0, |m| m.end()) - 1)
        {
            return ArgumentClass::ArrayMethodCall;
        }
        if let Some(m) = PLAIN_CALL_RE.as_ref().and_then(|re| re.find(shape))
            && wraps_to_end(shape, m.end() - 1)
        {
            return ArgumentClass::FunctionCall;
        }
    }
    if is_identifier(arg) {
        let leading = literal.len() - literal.trim_start().len();
        return if cx.is_known(arg, offset + leading) {
            ArgumentClass::KnownIdentifier
        } else {
            ArgumentClass::UnknownIdentifier
        };
    }
    ArgumentClass::Expression
}

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || c.is_whitespace() || "_$.+-*/%()[]{}<>=!&|?:,'\"`^~".contains(c)
}

/// `shape` opens with `open` and its matching closer is the final character.
fn wrapped(shape: &str, open: char) -> bool {
    shape.starts_with(open) && wraps_to_end(shape, 0)
}

fn wraps_to_end(shape: &str, open: usize) -> bool {
    matching_close(shape, open) == Some(shape.len() - 1)
}

pub struct CallChecker;

impl Checker for CallChecker {
    fn name(&self) -> &'static str {
        "calls"
    }

    fn source(&self) -> DiagnosticSource {
        DiagnosticSource::Calls
    }

    fn check(&self, cx: &CheckContext<'_>) -> Result<Vec<Diagnostic>> {
        let Some(call_re) = CALL_RE.as_ref() else {
            return Err(anyhow!("call pattern failed to compile"));
        };
        let code = cx.code.as_str();
        let declared = cx.scope.all_declared();
        let mut out = Vec::new();

        for m in call_re.find_iter(code) {
            let name_start = m.start();
            if code[..name_start].chars().next_back().is_some_and(is_ident_continue) {
                continue;
            }
            let open = m.end() - 1;
            let name = code[name_start..open].trim_end();

            if PSEUDO_CALLS.contains(&name) || cx.lang.is_keyword(name) {
                continue;
            }
            if matches!(prev_word(code, name_start), Some((_, "function"))) {
                continue;
            }
            let Some(close) = matching_close(code, open) else {
                continue;
            };
            // `name(…) {` defines a method, `name(…) =>` is an async arrow head.
            if matches!(next_non_space(code, close + 1), Some((_, '{')))
                || code[close + 1..].trim_start().starts_with("=>")
            {
                continue;
            }
            let member = matches!(prev_non_space(code, name_start), Some((_, '.')));

            let call = Call {
                name,
                name_start,
                open,
                close,
            };
            let signature = (!member && !declared.contains(name))
                .then(|| cx.lang.custom_function(name))
                .flatten();
            check_call(cx, &call, signature, &mut out);
        }
        Ok(out)
    }
}

struct Call<'a> {
    name: &'a str,
    name_start: usize,
    open: usize,
    close: usize,
}

fn check_call(cx: &CheckContext<'_>, call: &Call<'_>, signature: Option<&FunctionSignature>, out: &mut Vec<Diagnostic>) {
    let inner_start = call.open + 1;
    let inner = &cx.code[inner_start..call.close];
    let args: Vec<(usize, &str)> = if inner.trim().is_empty() {
        Vec::new()
    } else {
        split_top_level(inner)
    };

    if let Some(sig) = signature {
        let at = cx.position(call.name_start);
        let (required, total) = (sig.required_count(), sig.total_count());
        if args.len() < required {
            out.push(
                Diagnostic::error(
                    DiagnosticSource::Calls,
                    at,
                    format!(
                        "'{}' expects at least {} argument{}, got {}",
                        call.name,
                        required,
                        if required == 1 { "" } else { "s" },
                        args.len()
                    ),
                )
                .with_length(call.name.chars().count()),
            );
        } else if args.len() > total {
            out.push(
                Diagnostic::warning(
                    DiagnosticSource::Calls,
                    at,
                    format!(
                        "'{}' accepts at most {} argument{}, got {}",
                        call.name,
                        total,
                        if total == 1 { "" } else { "s" },
                        args.len()
                    ),
                )
                .with_length(call.name.chars().count()),
            );
        }
    }

    for (index, (rel, code_arg)) in args.iter().enumerate() {
        let start = inner_start + rel;
        let literal = &cx.comment_free[start..start + code_arg.len()];
        let class = classify_argument(cx, literal, code_arg, start);
        let leading = code_arg.len() - code_arg.trim_start().len();
        let at = cx.position(start + leading);
        let ordinal = index + 1;

        match class {
            ArgumentClass::Empty => out.push(Diagnostic::error(
                DiagnosticSource::Calls,
                cx.position(start),
                format!("Empty argument {ordinal} in call to '{}'", call.name),
            )),
            ArgumentClass::InvalidCharacters => out.push(
                Diagnostic::error(
                    DiagnosticSource::Calls,
                    at,
                    format!("Invalid characters in argument {ordinal} of '{}'", call.name),
                )
                .with_length(code_arg.trim().chars().count()),
            ),
            ArgumentClass::UnknownIdentifier => {
                let ident = literal.trim();
                let mut message = format!("Undefined variable '{ident}' (argument {ordinal} of '{}')", call.name);
                if let Some(hint) = suggest(ident, &cx.known_names(start + leading)) {
                    message.push_str(&format!("; did you mean '{hint}'?"));
                }
                out.push(
                    Diagnostic::warning(DiagnosticSource::Calls, at, message).with_length(ident.chars().count()),
                );
            }
            _ => {
                let declared = signature.and_then(|sig| sig.params.get(index)).map(|p| (p.name, p.kind));
                if let (Some(found), Some((param, expected))) = (class.literal_kind(), declared)
                    && expected != ValueKind::Any
                    && expected != found
                {
                    out.push(
                        Diagnostic::warning(
                            DiagnosticSource::Calls,
                            at,
                            format!(
                                "Argument {ordinal} ('{param}') of '{}' should be a {expected}, found {found}",
                                call.name
                            ),
                        )
                        .with_length(code_arg.trim().chars().count()),
                    );
                }
            }
        }
    }
}
