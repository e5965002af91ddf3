//! Independent diagnostic passes over sanitized copies of a document.
//!
//! Each pass implements [`Checker`] and only sees a [`CheckContext`]; the orchestrator decides
//! order, isolation and merging.

mod brackets;
mod calls;
mod heuristics;
mod identifiers;
mod strings;


use std::sync::Arc;

use anyhow::Result;

use crate::diag::{Diagnostic, DiagnosticSource};
use crate::lang::LanguageDefinition;
use crate::params::ParameterDefinition;
use crate::scope::ScopeTree;
use crate::text::{LineIndex, Position, SanitizeMode, sanitize};
use crate::util::fast_map::FastHashSet;

pub use brackets::{BracketChecker, match_brackets};
pub use calls::{ArgumentClass, CallChecker, classify_argument};
pub use heuristics::HeuristicChecker;
pub use identifiers::{IdentifierChecker, suggest};
pub use strings::StringChecker;

/// A single analysis pass.
pub trait Checker: Send + Sync {
    fn name(&self) -> &'static str;

    fn source(&self) -> DiagnosticSource;

    /// Best-effort passes are skipped silently when they fail; strict ones report the failure.
    fn best_effort(&self) -> bool {
        false
    }

    fn check(&self, cx: &CheckContext<'_>) -> Result<Vec<Diagnostic>>;
}

/// Everything a pass may look at for one document snapshot.
pub struct CheckContext<'a> {
    /// The text exactly as typed.
    pub text: &'a str,
    /// Comments and literal contents blanked.
    pub code: String,
    /// Comments blanked, literals intact.
    pub comment_free: String,
    pub lines: LineIndex<'a>,
    pub scope: Arc<ScopeTree>,
    pub parameters: FastHashSet<String>,
    /// Host parameters with their declared types.
    pub definitions: Vec<ParameterDefinition>,
    pub lang: Arc<LanguageDefinition>,
}

impl<'a> CheckContext<'a> {
    pub fn new(
        text: &'a str,
        scope: Arc<ScopeTree>,
        parameters: &[ParameterDefinition],
        lang: Arc<LanguageDefinition>,
    ) -> Self {
        Self {
            text,
            code: sanitize(text, SanitizeMode::Full),
            comment_free: sanitize(text, SanitizeMode::CommentsOnly),
            lines: LineIndex::new(text),
            scope,
            parameters: parameters.iter().map(|p| p.name.clone()).collect(),
            definitions: parameters.to_vec(),
            lang,
        }
    }

    pub fn position(&self, offset: usize) -> Position {
        self.lines.position(offset)
    }

    /// Declared in scope at `offset`, supplied by the host, or predeclared by the language.
    pub fn is_known(&self, name: &str, offset: usize) -> bool {
        self.parameters.contains(name) || self.lang.is_predeclared(name) || self.scope.is_visible(name, offset)
    }

    /// Every name that would resolve at `offset`; used for suggestions.
    pub fn known_names(&self, offset: usize) -> Vec<String> {
        let mut names: Vec<String> = self.scope.variables_in_scope(offset).into_iter().collect();
        names.extend(self.parameters.iter().cloned());
        names.extend(self.lang.custom_functions.iter().map(|f| f.name.to_string()));
        names.extend(self.lang.builtin_functions.iter().map(|(name, _)| name.to_string()));
        names.extend(self.lang.builtin_objects.iter().map(|o| o.name.to_string()));
        names
    }
}

/// The text-level passes in the order they run: strings, brackets, calls, heuristics,
/// identifiers. The compile check is appended by the orchestrator.
pub fn standard_checkers() -> Vec<Box<dyn Checker>> {
    vec![
        Box::new(StringChecker),
        Box::new(BracketChecker),
        Box::new(CallChecker),
        Box::new(HeuristicChecker),
        Box::new(IdentifierChecker),
    ]
}
