//! Ranked completion candidates from the language tables, the scope tree and host parameters.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::lang::LanguageDefinition;
use crate::params::ParameterDefinition;
use crate::scope::{ScopeTree, SymbolKind};
use crate::text::{floor_char_boundary, prev_word, word_at};
use crate::util::fast_map::FastHashMap;

static PLACEHOLDER_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\$\{\d+:([^}]*)\}").ok());
static TAB_STOP_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\$\{\d+\}|\$\d+").ok());

const LOCAL_VARIABLE: f32 = 0.5;
const LOCAL_FUNCTION: f32 = 0.55;
const PARAMETER: f32 = 0.65;
const METHOD: f32 = 0.7;
const CONTROL_KEYWORD: f32 = 0.8;
const KEYWORD: f32 = 0.9;
const OTHER: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    Variable,
    Function,
    Parameter,
    Method,
    Keyword,
    Object,
    Constant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionCandidate {
    pub text: String,
    pub kind: CompletionKind,
    /// Lower ranks first.
    pub priority: f32,
    /// Text to insert, possibly with `${n:label}` markers.
    pub insertion_template: String,
    pub detail: Option<String>,
}

impl CompletionCandidate {
    fn new(text: impl Into<String>, kind: CompletionKind, priority: f32) -> Self {
        let text = text.into();
        Self {
            insertion_template: text.clone(),
            text,
            kind,
            priority,
            detail: None,
        }
    }

    fn template(mut self, template: impl Into<String>) -> Self {
        self.insertion_template = template.into();
        self
    }

    fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// The text actually inserted on commit.
    pub fn insertion_text(&self) -> String {
        collapse_template(&self.insertion_template)
    }
}

/// Replace `${n:label}` markers by their label and drop bare tab stops.
pub fn collapse_template(template: &str) -> String {
    let mut out = template.to_string();
    if let Some(re) = PLACEHOLDER_RE.as_ref() {
        out = re.replace_all(&out, "$1").into_owned();
    }
    if let Some(re) = TAB_STOP_RE.as_ref() {
        out = re.replace_all(&out, "").into_owned();
    }
    out
}

/// Commit `candidate` at `caret`: the word around the caret is replaced by the collapsed
/// insertion text. Returns the new text and the caret after the insertion.
pub fn apply_completion(text: &str, caret: usize, candidate: &CompletionCandidate) -> (String, usize) {
    let span = word_at(text, caret);
    let inserted = candidate.insertion_text();
    let mut out = String::with_capacity(text.len() + inserted.len());
    out.push_str(&text[..span.start]);
    out.push_str(&inserted);
    out.push_str(&text[span.end..]);
    (out, span.start + inserted.len())
}

pub struct CompletionProvider {
    lang: Arc<LanguageDefinition>,
    max_items: usize,
}

impl CompletionProvider {
    pub fn new(lang: Arc<LanguageDefinition>, max_items: usize) -> Self {
        Self { lang, max_items }
    }

    /// Candidates for the caret position. `prefix` overrides the word left of the caret.
    pub fn complete(
        &self,
        text: &str,
        caret: usize,
        prefix: Option<&str>,
        tree: &ScopeTree,
        parameters: &[ParameterDefinition],
    ) -> Vec<CompletionCandidate> {
        let caret = floor_char_boundary(text, caret);
        let span = word_at(text, caret);
        let typed = match prefix {
            Some(p) => p.to_string(),
            None => span.prefix_at(text, caret).to_string(),
        };

        let pool = match member_target(text, span.start) {
            Some(object) => self.member_candidates(object),
            None => self.scope_candidates(caret, tree, parameters),
        };
        self.rank(pool, &typed)
    }

    fn member_candidates(&self, object: &str) -> Vec<CompletionCandidate> {
        if let Some(builtin) = self.lang.builtin_object(object) {
            return builtin
                .members
                .iter()
                .map(|m| CompletionCandidate::new(*m, CompletionKind::Method, METHOD).detail(format!("{object}.{m}")))
                .collect();
        }
        self.lang
            .array_methods
            .iter()
            .chain(self.lang.string_methods.iter())
            .map(|m| CompletionCandidate::new(*m, CompletionKind::Method, METHOD))
            .collect()
    }

    fn scope_candidates(
        &self,
        caret: usize,
        tree: &ScopeTree,
        parameters: &[ParameterDefinition],
    ) -> Vec<CompletionCandidate> {
        let mut pool = Vec::new();

        for symbol in tree.visible_symbols(caret) {
            let candidate = match symbol.kind {
                SymbolKind::Variable => CompletionCandidate::new(symbol.name, CompletionKind::Variable, LOCAL_VARIABLE),
                SymbolKind::Function => {
                    let template = format!("{}($0)", symbol.name);
                    CompletionCandidate::new(symbol.name, CompletionKind::Function, LOCAL_FUNCTION).template(template)
                }
            };
            pool.push(candidate.detail("declared in script"));
        }

        for param in parameters {
            pool.push(
                CompletionCandidate::new(param.name.clone(), CompletionKind::Parameter, PARAMETER)
                    .detail(format!("{} ({})", param.label(), param.data_type)),
            );
        }

        for function in &self.lang.custom_functions {
            pool.push(
                CompletionCandidate::new(function.name, CompletionKind::Function, METHOD)
                    .template(function.insertion_template())
                    .detail(format!("{} - {}", function.label(), function.description)),
            );
        }

        for keyword in &self.lang.keywords {
            let priority = if keyword.control_flow { CONTROL_KEYWORD } else { KEYWORD };
            let mut candidate = CompletionCandidate::new(keyword.name, CompletionKind::Keyword, priority);
            if let Some(snippet) = keyword.snippet {
                candidate = candidate.template(snippet);
            }
            pool.push(candidate);
        }

        for (name, description) in &self.lang.builtin_functions {
            pool.push(
                CompletionCandidate::new(*name, CompletionKind::Function, OTHER)
                    .template(format!("{name}($0)"))
                    .detail(*description),
            );
        }
        for object in &self.lang.builtin_objects {
            pool.push(CompletionCandidate::new(object.name, CompletionKind::Object, OTHER).detail(object.description));
        }
        for constant in &self.lang.constants {
            pool.push(CompletionCandidate::new(*constant, CompletionKind::Constant, OTHER));
        }
        pool
    }

    /// Filter by case-insensitive prefix, keep the best entry per name, sort and cap.
    fn rank(&self, pool: Vec<CompletionCandidate>, prefix: &str) -> Vec<CompletionCandidate> {
        let prefix = prefix.to_lowercase();
        let mut best: FastHashMap<String, CompletionCandidate> = FastHashMap::default();
        for candidate in pool {
            if !candidate.text.to_lowercase().starts_with(&prefix) {
                continue;
            }
            match best.get(&candidate.text) {
                Some(existing) if existing.priority <= candidate.priority => {}
                _ => {
                    best.insert(candidate.text.clone(), candidate);
                }
            }
        }

        let mut out: Vec<CompletionCandidate> = best.into_values().collect();
        out.sort_by(|a, b| a.priority.total_cmp(&b.priority).then_with(|| a.text.cmp(&b.text)));
        if self.max_items > 0 {
            out.truncate(self.max_items);
        }
        out
    }
}

/// Object name when the word at `word_start` follows `object.`.
fn member_target(text: &str, word_start: usize) -> Option<&str> {
    let before = text[..word_start].strip_suffix('.')?;
    prev_word(before, before.len())
        .filter(|(start, word)| start + word.len() == before.len())
        .map(|(_, word)| word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterType;
    use crate::scope::build_scope_tree;

    fn provider() -> CompletionProvider {
        CompletionProvider::new(LanguageDefinition::shared(), 0)
    }

    fn names(items: &[CompletionCandidate]) -> Vec<&str> {
        items.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_parameter_ranks_before_keyword() {
        let text = "w";
        let params = vec![ParameterDefinition::new("weight", ParameterType::Number)];
        let items = provider().complete(text, 1, Some("w"), &build_scope_tree(text), &params);
        let names = names(&items);
        let weight = names.iter().position(|n| *n == "weight").unwrap();
        let while_kw = names.iter().position(|n| *n == "while").unwrap();
        assert!(weight < while_kw);
    }

    #[test]
    fn test_prefix_is_case_insensitive_and_taken_from_caret() {
        let text = "let Weight = 1;\nwe";
        let items = provider().complete(text, text.len(), None, &build_scope_tree(text), &[]);
        assert_eq!(names(&items), vec!["Weight"]);
        assert_eq!(items[0].kind, CompletionKind::Variable);
    }

    #[test]
    fn test_locals_rank_first_and_respect_scope() {
        let text = "function calc(dose) { let dosing = 1; do }\nd";
        let inside = text.find(" do }").unwrap() + 3;
        let tree = build_scope_tree(text);
        let items = provider().complete(text, inside, None, &tree, &[]);
        assert_eq!(&names(&items)[..2], &["dose", "dosing"]);
        assert!(names(&items).contains(&"do"));

        let outside = provider().complete(text, text.len(), None, &tree, &[]);
        assert!(!names(&outside).contains(&"dose"));
    }

    #[test]
    fn test_member_completion() {
        let text = "let r = Math.ro";
        let items = provider().complete(text, text.len(), None, &build_scope_tree(text), &[]);
        assert_eq!(names(&items), vec!["round"]);
        assert_eq!(items[0].kind, CompletionKind::Method);

        let text = "doses.fil";
        let items = provider().complete(text, text.len(), None, &build_scope_tree(text), &[]);
        assert_eq!(names(&items), vec!["fill", "filter"]);
    }

    #[test]
    fn test_custom_function_template_collapses() {
        let text = "roundT";
        let items = provider().complete(text, text.len(), None, &build_scope_tree(text), &[]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].insertion_template, "roundTo(${1:value}, ${2:decimals})");

        let (out, caret) = apply_completion(text, text.len(), &items[0]);
        assert_eq!(out, "roundTo(value, decimals)");
        assert_eq!(caret, out.len());
    }

    #[test]
    fn test_apply_replaces_whole_word() {
        let text = "x = weig + 1";
        let candidate = CompletionCandidate::new("weight", CompletionKind::Parameter, PARAMETER);
        let (out, caret) = apply_completion(text, 6, &candidate);
        assert_eq!(out, "x = weight + 1");
        assert_eq!(caret, 10);
    }

    #[test]
    fn test_caret_inside_multibyte_char() {
        let text = "let dosé = 1;\ndosé";
        let caret = text.len() - 1;
        let items = provider().complete(text, caret, None, &build_scope_tree(text), &[]);
        assert_eq!(names(&items)[0], "dosé");

        let (out, after) = apply_completion(text, caret, &items[0]);
        assert_eq!(out, text);
        assert_eq!(after, text.len());
    }

    #[test]
    fn test_collapse_template() {
        assert_eq!(collapse_template("if (${1:condition}) {\n\t$0\n}"), "if (condition) {\n\t\n}");
        assert_eq!(collapse_template("f(${1})"), "f()");
    }

    #[test]
    fn test_max_items_and_ties() {
        let text = "";
        let items = CompletionProvider::new(LanguageDefinition::shared(), 5).complete(
            text,
            0,
            None,
            &build_scope_tree(text),
            &[],
        );
        assert_eq!(items.len(), 5);
        let mut sorted = items.clone();
        sorted.sort_by(|a, b| a.priority.total_cmp(&b.priority).then_with(|| a.text.cmp(&b.text)));
        assert_eq!(items, sorted);
    }
}
