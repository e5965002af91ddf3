use std::fmt;

use serde::{Deserialize, Serialize};

use crate::text::Position;
use crate::util::fast_map::{FastHashSet, fast_hash_set_with_capacity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// Which pass produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSource {
    Strings,
    Brackets,
    Calls,
    Heuristics,
    Identifiers,
    Compile,
    Validator,
}

impl fmt::Display for DiagnosticSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticSource::Strings => "strings",
            DiagnosticSource::Brackets => "brackets",
            DiagnosticSource::Calls => "calls",
            DiagnosticSource::Heuristics => "heuristics",
            DiagnosticSource::Identifiers => "identifiers",
            DiagnosticSource::Compile => "compile",
            DiagnosticSource::Validator => "validator",
        })
    }
}

/// A single report with a 1-based line/column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub line: i64,
    pub column: i64,
    /// Marker width in characters, at least 1.
    pub length: usize,
    pub severity: Severity,
    pub source: DiagnosticSource,
}

impl Diagnostic {
    pub fn new(source: DiagnosticSource, severity: Severity, position: Position, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: position.line as i64,
            column: position.column as i64,
            length: 1,
            severity,
            source,
        }
    }

    pub fn error(source: DiagnosticSource, position: Position, message: impl Into<String>) -> Self {
        Self::new(source, Severity::Error, position, message)
    }

    pub fn warning(source: DiagnosticSource, position: Position, message: impl Into<String>) -> Self {
        Self::new(source, Severity::Warning, position, message)
    }

    pub fn info(source: DiagnosticSource, position: Position, message: impl Into<String>) -> Self {
        Self::new(source, Severity::Info, position, message)
    }

    /// Diagnostic at a raw line/column that may not map to the document, e.g. engine output.
    pub fn at(source: DiagnosticSource, severity: Severity, line: i64, column: i64, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            length: 1,
            severity,
            source,
        }
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length.max(1);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}: {}", self.line, self.column, self.severity, self.message)
    }
}

/// Severity tallies for a diagnostics list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticCounts {
    pub errors: usize,
    pub warnings: usize,
    pub hints: usize,
}

impl DiagnosticCounts {
    pub fn of(diagnostics: &[Diagnostic]) -> Self {
        let mut counts = Self::default();
        for d in diagnostics {
            match d.severity {
                Severity::Error => counts.errors += 1,
                Severity::Warning => counts.warnings += 1,
                Severity::Info => counts.hints += 1,
            }
        }
        counts
    }
}

/// Human-readable status line: `✓ passed` or `N errors, M warnings, K hints`.
pub fn summarize(diagnostics: &[Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return "✓ passed".to_string();
    }
    let counts = DiagnosticCounts::of(diagnostics);
    format!(
        "{}, {}, {}",
        plural(counts.errors, "error"),
        plural(counts.warnings, "warning"),
        plural(counts.hints, "hint")
    )
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 { format!("1 {noun}") } else { format!("{n} {noun}s") }
}

/// Drop unplaceable entries, de-duplicate, order by position and cap the list.
///
/// De-duplication keys on `(line, column, severity)` and keeps the earliest producer, so a
/// specific message from an early pass wins over a generic one from a later pass.
pub fn finalize(diagnostics: Vec<Diagnostic>, max: usize) -> Vec<Diagnostic> {
    let mut seen: FastHashSet<(i64, i64, Severity)> = fast_hash_set_with_capacity(diagnostics.len());
    let mut out: Vec<Diagnostic> = diagnostics
        .into_iter()
        .filter(|d| d.line > 0)
        .filter(|d| seen.insert((d.line, d.column, d.severity)))
        .collect();
    out.sort_by_key(|d| (d.line, d.column));
    if max > 0 && out.len() > max {
        out.truncate(max);
    }
    out
}
