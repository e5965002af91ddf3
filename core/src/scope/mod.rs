//! Scope tree reconstruction from raw, possibly broken, source text.
//!
//! No parser is involved: braces in a sanitized copy of the text delimit scopes and
//! declarations are recovered by scanning each scope's own span (children excluded).

mod builder;
mod declarations;
#[cfg(test)]
mod scope_test;

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::util::fast_map::content_fingerprint;

pub use builder::build_scope_tree;
pub use declarations::{declarator_names, param_names};

pub type ScopeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Root,
    Function,
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Offset of the opening `{` (0 for the root).
    pub start: usize,
    /// Offset of the closing `}`, or the end of text when unclosed.
    pub end: usize,
    pub level: u32,
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    pub children: Vec<ScopeId>,
    pub block_vars: BTreeSet<String>,
    pub function_vars: BTreeSet<String>,
    pub functions: BTreeSet<String>,
}

impl Scope {
    fn new(start: usize, end: usize, level: u32, parent: Option<ScopeId>, kind: ScopeKind) -> Self {
        Self {
            start,
            end,
            level,
            parent,
            kind,
            children: Vec::new(),
            block_vars: BTreeSet::new(),
            function_vars: BTreeSet::new(),
            functions: BTreeSet::new(),
        }
    }

    pub fn contains(&self, offset: usize) -> bool {
        match self.kind {
            ScopeKind::Root => true,
            _ => self.start < offset && offset <= self.end,
        }
    }

    pub fn is_function_like(&self) -> bool {
        matches!(self.kind, ScopeKind::Root | ScopeKind::Function)
    }
}

/// Parameters of an arrow function with an expression body, visible over `[start, end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrowBinding {
    pub start: usize,
    pub end: usize,
    pub names: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleSymbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Nesting level of the scope that declares it; deeper is more local.
    pub level: u32,
}

/// Text before a scope's `{` whose names resolve inside that scope: parameter lists,
/// `for (…)` clauses and `catch (…)` bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSpan {
    pub start: usize,
    pub end: usize,
    pub scope: ScopeId,
}

/// Scope tree for one text snapshot. Index 0 is always the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeTree {
    pub(crate) scopes: Vec<Scope>,
    pub(crate) headers: Vec<HeaderSpan>,
    pub(crate) arrow_bindings: Vec<ArrowBinding>,
    pub(crate) global_variables: BTreeSet<String>,
    pub(crate) global_functions: BTreeSet<String>,
}

impl ScopeTree {
    pub fn root(&self) -> &Scope {
        &self.scopes[0]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn global_variables(&self) -> &BTreeSet<String> {
        &self.global_variables
    }

    pub fn global_functions(&self) -> &BTreeSet<String> {
        &self.global_functions
    }

    /// Deepest scope containing `offset`. Offsets inside a header belong to the scope the
    /// header introduces.
    pub fn innermost(&self, offset: usize) -> ScopeId {
        if let Some(header) = self.headers.iter().find(|h| h.start <= offset && offset <= h.end) {
            return header.scope;
        }
        let mut current = 0;
        'descend: loop {
            for &child in &self.scopes[current].children {
                if self.scopes[child].contains(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Scope chain from the innermost scope at `offset` up to the root.
    pub fn chain(&self, offset: usize) -> Vec<ScopeId> {
        let mut out = Vec::new();
        let mut cursor = Some(self.innermost(offset));
        while let Some(id) = cursor {
            out.push(id);
            cursor = self.scopes[id].parent;
        }
        out
    }

    /// Identifiers visible at `offset`: names declared in every enclosing scope, the
    /// parameters of enclosing expression-bodied arrows, and all globals.
    pub fn variables_in_scope(&self, offset: usize) -> BTreeSet<String> {
        self.visible_symbols(offset).into_iter().map(|s| s.name).collect()
    }

    /// Like [`variables_in_scope`](Self::variables_in_scope) but keeps kind and nesting level.
    /// When a name is declared at several levels the innermost declaration wins.
    pub fn visible_symbols(&self, offset: usize) -> Vec<VisibleSymbol> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut out = Vec::new();

        for binding in self.arrow_bindings.iter().filter(|b| b.start <= offset && offset <= b.end) {
            for name in &binding.names {
                push_symbol(&mut seen, &mut out, name, SymbolKind::Variable, u32::MAX);
            }
        }

        for id in self.chain(offset) {
            let scope = &self.scopes[id];
            for name in &scope.functions {
                push_symbol(&mut seen, &mut out, name, SymbolKind::Function, scope.level);
            }
            for name in scope.block_vars.iter().chain(scope.function_vars.iter()) {
                push_symbol(&mut seen, &mut out, name, SymbolKind::Variable, scope.level);
            }
        }

        for name in &self.global_functions {
            push_symbol(&mut seen, &mut out, name, SymbolKind::Function, 0);
        }
        for name in &self.global_variables {
            push_symbol(&mut seen, &mut out, name, SymbolKind::Variable, 0);
        }
        out
    }

    /// Whether `name` resolves at `offset`. Same rules as
    /// [`variables_in_scope`](Self::variables_in_scope) without building the set.
    pub fn is_visible(&self, name: &str, offset: usize) -> bool {
        if self.global_variables.contains(name) || self.global_functions.contains(name) {
            return true;
        }
        if self
            .arrow_bindings
            .iter()
            .any(|b| b.start <= offset && offset <= b.end && b.names.contains(name))
        {
            return true;
        }
        self.chain(offset).into_iter().any(|id| {
            let scope = &self.scopes[id];
            scope.block_vars.contains(name) || scope.function_vars.contains(name) || scope.functions.contains(name)
        })
    }

    /// Every name declared anywhere in the document.
    pub fn all_declared(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for scope in &self.scopes {
            out.extend(scope.block_vars.iter().cloned());
            out.extend(scope.function_vars.iter().cloned());
            out.extend(scope.functions.iter().cloned());
        }
        for binding in &self.arrow_bindings {
            out.extend(binding.names.iter().cloned());
        }
        out
    }
}

fn push_symbol<'a>(
    seen: &mut BTreeSet<&'a str>,
    out: &mut Vec<VisibleSymbol>,
    name: &'a str,
    kind: SymbolKind,
    level: u32,
) {
    if seen.insert(name) {
        out.push(VisibleSymbol {
            name: name.to_string(),
            kind,
            level,
        });
    }
}

/// Caches the tree of the last analyzed text so unchanged input is never re-scanned.
#[derive(Debug, Default)]
pub struct ScopeAnalyzer {
    last: Option<(u64, Arc<ScopeTree>)>,
}

impl ScopeAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tree for `text` and whether a rebuild happened.
    pub fn analyze(&mut self, text: &str) -> (Arc<ScopeTree>, bool) {
        let fingerprint = content_fingerprint(text);
        if let Some((last_fp, tree)) = &self.last
            && *last_fp == fingerprint
        {
            return (tree.clone(), false);
        }

        let tree = Arc::new(build_scope_tree(text));
        tracing::debug!(scopes = tree.scopes.len(), "rebuilt scope tree");
        self.last = Some((fingerprint, tree.clone()));
        (tree, true)
    }

    pub fn current(&self) -> Option<Arc<ScopeTree>> {
        self.last.as_ref().map(|(_, tree)| tree.clone())
    }
}
