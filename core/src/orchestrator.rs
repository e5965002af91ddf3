//! Runs every enabled pass over one snapshot, isolates failures and merges the results.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use crate::check::{CheckContext, Checker, standard_checkers};
use crate::config::{AnalysisConfig, CheckToggles};
use crate::diag::{Diagnostic, DiagnosticSource, Severity, finalize, summarize};
use crate::engine::{CompileChecker, EngineProvider, default_provider};
use crate::lang::LanguageDefinition;
use crate::params::ParameterDefinition;
use crate::scope::{ScopeTree, build_scope_tree};

/// Outcome of one validation pass: the full replacement diagnostics list and its summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
    pub status: String,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

pub struct Orchestrator {
    lang: Arc<LanguageDefinition>,
    checkers: Vec<Box<dyn Checker>>,
    toggles: CheckToggles,
    max_diagnostics: usize,
}

impl Orchestrator {
    pub fn new(config: &AnalysisConfig, provider: Arc<dyn EngineProvider>) -> Self {
        let mut checkers = standard_checkers();
        checkers.push(Box::new(CompileChecker::new(provider)));
        Self::with_checkers(config, checkers)
    }

    /// Default configuration and the built-in engine.
    pub fn with_defaults() -> Self {
        Self::new(&AnalysisConfig::default(), default_provider())
    }

    /// Run exactly `checkers`, in order.
    pub fn with_checkers(config: &AnalysisConfig, checkers: Vec<Box<dyn Checker>>) -> Self {
        Self {
            lang: LanguageDefinition::shared(),
            checkers,
            toggles: config.checks.clone(),
            max_diagnostics: config.max_diagnostics,
        }
    }

    pub fn language(&self) -> &Arc<LanguageDefinition> {
        &self.lang
    }

    fn enabled(&self, checker: &dyn Checker) -> bool {
        match checker.source() {
            DiagnosticSource::Strings => self.toggles.strings,
            DiagnosticSource::Calls => self.toggles.calls,
            DiagnosticSource::Heuristics => self.toggles.heuristics,
            DiagnosticSource::Identifiers => self.toggles.identifiers,
            DiagnosticSource::Compile => self.toggles.compile,
            DiagnosticSource::Brackets | DiagnosticSource::Validator => true,
        }
    }

    /// Validate `text` against an already built scope tree.
    pub fn validate(&self, text: &str, scope: Arc<ScopeTree>, parameters: &[ParameterDefinition]) -> ValidationReport {
        let started = Instant::now();
        let cx = CheckContext::new(text, scope, parameters, self.lang.clone());
        let mut collected = Vec::new();

        for checker in self.checkers.iter().filter(|c| self.enabled(c.as_ref())) {
            if let Some(diagnostic) = run_pass(checker.as_ref(), &cx, &mut collected) {
                collected.push(diagnostic);
            }
        }

        let diagnostics = finalize(collected, self.max_diagnostics);
        let status = summarize(&diagnostics);
        tracing::debug!(
            elapsed_us = started.elapsed().as_micros() as u64,
            count = diagnostics.len(),
            "validation pass finished"
        );
        ValidationReport { diagnostics, status }
    }

    /// Validate `text`, building its scope tree first.
    pub fn validate_text(&self, text: &str, parameters: &[ParameterDefinition]) -> ValidationReport {
        self.validate(text, Arc::new(build_scope_tree(text)), parameters)
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Run one pass with its failures contained. Returns the replacement diagnostic for a failed
/// strict pass.
fn run_pass(checker: &dyn Checker, cx: &CheckContext<'_>, out: &mut Vec<Diagnostic>) -> Option<Diagnostic> {
    let started = Instant::now();
    let cause = match catch_unwind(AssertUnwindSafe(|| checker.check(cx))) {
        Ok(Ok(diagnostics)) => {
            tracing::debug!(
                pass = checker.name(),
                count = diagnostics.len(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "pass done"
            );
            out.extend(diagnostics);
            return None;
        }
        Ok(Err(err)) => format!("{err:#}"),
        Err(payload) => panic_message(payload.as_ref()),
    };

    if checker.best_effort() {
        tracing::warn!(pass = checker.name(), %cause, "best-effort pass failed, skipped");
        return None;
    }
    tracing::warn!(pass = checker.name(), %cause, "pass failed");
    Some(Diagnostic::at(
        DiagnosticSource::Validator,
        Severity::Error,
        1,
        1,
        format!("Validator error in {}: {}", checker.name(), cause),
    ))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "internal panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::params::ParameterType;

    fn weight() -> Vec<ParameterDefinition> {
        vec![ParameterDefinition::new("weight", ParameterType::Number)]
    }

    struct Failing {
        best_effort: bool,
        panics: bool,
    }

    impl Checker for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn source(&self) -> DiagnosticSource {
            DiagnosticSource::Validator
        }

        fn best_effort(&self) -> bool {
            self.best_effort
        }

        fn check(&self, _cx: &CheckContext<'_>) -> anyhow::Result<Vec<Diagnostic>> {
            if self.panics {
                panic!("index out of range");
            }
            Err(anyhow!("cannot scan"))
        }
    }

    #[test]
    fn test_clean_script_passes() {
        let text = "addNormalResult('d', weight*2, 'mg','','','')";
        let report = Orchestrator::with_defaults().validate_text(text, &weight());
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
        assert_eq!(report.status, "✓ passed");
    }

    #[test]
    fn test_misspelling_reported_once() {
        let text = "addNormalResult('d', wieght*2, 'mg','','','')";
        let report = Orchestrator::with_defaults().validate_text(text, &weight());
        assert_eq!(report.diagnostics.len(), 1, "{:?}", report.diagnostics);
        let d = &report.diagnostics[0];
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.column as usize, text.find("wieght").unwrap() + 1);
        assert_eq!(report.status, "0 errors, 1 warning, 0 hints");
    }

    #[test]
    fn test_compile_errors_are_merged() {
        let report = Orchestrator::with_defaults().validate_text("let total = weight *;\n", &weight());
        assert!(report.has_errors());
        assert!(report.diagnostics.iter().any(|d| d.source == DiagnosticSource::Compile && d.line == 1));
    }

    #[test]
    fn test_deeply_nested_literal_reports_compile_error() {
        let text = format!("let dose = {}weight{};\n", "[".repeat(10_000), "]".repeat(10_000));
        let report = Orchestrator::with_defaults().validate_text(&text, &weight());
        assert!(report.has_errors());
        assert!(
            report
                .diagnostics
                .iter()
                .any(|d| d.source == DiagnosticSource::Compile && d.message.contains("Nesting too deep"))
        );
    }

    #[test]
    fn test_toggles_disable_passes() {
        let mut config = AnalysisConfig::default();
        config.checks.identifiers = false;
        config.checks.calls = false;
        config.checks.compile = false;
        let orchestrator = Orchestrator::new(&config, default_provider());
        let report = orchestrator.validate_text("log(missing);", &[]);
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    }

    #[test]
    fn test_strict_failure_becomes_validator_error() {
        let checkers: Vec<Box<dyn Checker>> = vec![
            Box::new(Failing {
                best_effort: false,
                panics: false,
            }),
            Box::new(crate::check::BracketChecker),
        ];
        let report = Orchestrator::with_checkers(&AnalysisConfig::default(), checkers).validate_text("x = (", &[]);
        assert_eq!(report.diagnostics.len(), 2);
        assert_eq!(report.diagnostics[0].message, "Validator error in failing: cannot scan");
        assert_eq!((report.diagnostics[0].line, report.diagnostics[0].column), (1, 1));
    }

    #[test]
    fn test_best_effort_failures_are_silent() {
        let checkers: Vec<Box<dyn Checker>> = vec![
            Box::new(Failing {
                best_effort: true,
                panics: true,
            }),
            Box::new(Failing {
                best_effort: true,
                panics: false,
            }),
        ];
        let report = Orchestrator::with_checkers(&AnalysisConfig::default(), checkers).validate_text("x", &[]);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_strict_panic_is_contained() {
        let checkers: Vec<Box<dyn Checker>> = vec![Box::new(Failing {
            best_effort: false,
            panics: true,
        })];
        let report = Orchestrator::with_checkers(&AnalysisConfig::default(), checkers).validate_text("x", &[]);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.contains("index out of range"));
    }

    #[test]
    fn test_diagnostic_cap() {
        let mut config = AnalysisConfig::default();
        config.max_diagnostics = 3;
        let text = ")\n)\n)\n)\n)\n";
        let report = Orchestrator::new(&config, default_provider()).validate_text(text, &[]);
        assert_eq!(report.diagnostics.len(), 3);
    }
}
