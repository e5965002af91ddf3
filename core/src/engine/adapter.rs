use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{EngineLease, EngineProvider};
use crate::check::{CheckContext, Checker};
use crate::diag::{Diagnostic, DiagnosticSource, Severity};
use crate::lang::LanguageDefinition;
use crate::params::ParameterDefinition;
use crate::text::is_identifier;
use crate::util::fast_map::FastHashSet;

static POSITION_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\(?\s*[Ll]ine\s*:?\s*(\d+)\s*,\s*[Cc]olumn\s*:?\s*(\d+)\s*\)?").ok());
static PREFIX_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\s*(?:Uncaught\s+)?\w*Error:\s*").ok());

/// User code preceded by the stubs it needs to compile on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationScript {
    pub source: String,
    /// Lines before the first line of user code.
    pub header_lines: usize,
}

impl ValidationScript {
    pub fn build(code: &str, parameters: &[ParameterDefinition], lang: &LanguageDefinition) -> Self {
        let mut header = String::new();
        let mut declared: FastHashSet<&str> = FastHashSet::default();

        for &name in &lang.environment_globals {
            if declared.insert(name) {
                header.push_str(&format!("var {name} = {};\n", environment_stub(name)));
            }
        }
        for param in parameters {
            if !is_identifier(&param.name) || lang.is_keyword(&param.name) || !declared.insert(&param.name) {
                continue;
            }
            header.push_str(&format!("var {} = {};\n", param.name, param.data_type.stub_literal()));
        }
        for function in &lang.custom_functions {
            if !declared.insert(function.name) {
                continue;
            }
            let params: Vec<&str> = function.params.iter().map(|p| p.name).collect();
            header.push_str(&format!("function {}({}) {{}}\n", function.name, params.join(", ")));
        }

        let header_lines = header.matches('\n').count();
        header.push_str(code);
        Self {
            source: header,
            header_lines,
        }
    }
}

fn environment_stub(name: &str) -> &'static str {
    match name {
        "results" => "[]",
        _ => "{}",
    }
}

/// Translate an engine error into a diagnostic on user code.
///
/// Unparsable coordinates fall back to (1, 1). Errors that land in the synthesized header
/// (adjusted line ≤ 0) yield `None`.
pub fn map_engine_error(message: &str, header_lines: usize) -> Option<Diagnostic> {
    let coords = POSITION_RE.as_ref().and_then(|re| re.captures(message)).and_then(|caps| {
        let line = caps.get(1)?.as_str().parse::<i64>().ok()?;
        let column = caps.get(2)?.as_str().parse::<i64>().ok()?;
        Some((line, column))
    });
    let (line, column) = coords.unwrap_or((1, 1));

    let line = line - header_lines as i64;
    if line <= 0 {
        tracing::debug!(message, "compile error inside synthesized header suppressed");
        return None;
    }

    Some(Diagnostic::at(
        DiagnosticSource::Compile,
        Severity::Error,
        line,
        column.max(1),
        clean_message(message),
    ))
}

fn clean_message(message: &str) -> String {
    let mut text = message.to_string();
    if let Some(re) = POSITION_RE.as_ref() {
        text = re.replace_all(&text, "").into_owned();
    }
    if let Some(re) = PREFIX_RE.as_ref() {
        text = re.replace(&text, "").into_owned();
    }
    let text = text.trim().trim_end_matches([',', ':']).trim();
    if text.is_empty() { "Syntax error".to_string() } else { text.to_string() }
}

/// The compile check: runs the validation script through an engine acquired for this pass.
pub struct CompileChecker {
    provider: Arc<dyn EngineProvider>,
}

impl CompileChecker {
    pub fn new(provider: Arc<dyn EngineProvider>) -> Self {
        Self { provider }
    }
}

impl Checker for CompileChecker {
    fn name(&self) -> &'static str {
        "compile"
    }

    fn source(&self) -> DiagnosticSource {
        DiagnosticSource::Compile
    }

    fn best_effort(&self) -> bool {
        true
    }

    fn check(&self, cx: &CheckContext<'_>) -> Result<Vec<Diagnostic>> {
        let script = ValidationScript::build(cx.text, &cx.definitions, &cx.lang);
        let mut lease = EngineLease::acquire(self.provider.as_ref())?;
        match lease.compile(&script.source) {
            Ok(()) => Ok(Vec::new()),
            Err(err) => Ok(map_engine_error(&err.to_string(), script.header_lines)
                .into_iter()
                .collect()),
        }
    }
}
