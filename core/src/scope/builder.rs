use std::collections::BTreeSet;

use super::declarations::{declarator_names, param_names};
use super::{ArrowBinding, HeaderSpan, Scope, ScopeId, ScopeKind, ScopeTree};
use crate::text::{
    SanitizeMode, is_ident_continue, is_ident_start, matching_open, next_non_space, prev_non_space, prev_word,
    sanitize, scan_identifiers,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderKind {
    Params,
    ForClause,
    CatchClause,
}

/// Text preceding a scope's `{` whose bindings belong to that scope, e.g. a parameter list.
#[derive(Debug, Clone, Copy)]
struct Header {
    kind: HeaderKind,
    start: usize,
    end: usize,
}

/// Build the scope tree for `text`. Pure: identical input yields an identical tree.
pub fn build_scope_tree(text: &str) -> ScopeTree {
    let clean = sanitize(text, SanitizeMode::Full);
    let len = clean.len();

    let mut scopes = vec![Scope::new(0, len, 0, None, ScopeKind::Root)];
    let mut headers: Vec<Option<Header>> = vec![None];
    let mut stack: Vec<ScopeId> = vec![0];

    for (i, b) in clean.bytes().enumerate() {
        match b {
            b'{' => {
                let parent = stack.last().copied().unwrap_or(0);
                let (kind, header) = classify_brace(&clean, i);
                let id = scopes.len();
                let level = scopes[parent].level + 1;
                scopes.push(Scope::new(i, len, level, Some(parent), kind));
                headers.push(header);
                scopes[parent].children.push(id);
                stack.push(id);
            }
            b'}' if stack.len() > 1 => {
                if let Some(id) = stack.pop() {
                    scopes[id].end = i;
                }
            }
            _ => {}
        }
    }

    for id in 0..scopes.len() {
        let own = own_text(&clean, &scopes, &headers, id);
        collect_declarations(&mut scopes, id, &own, &clean);
        if let Some(header) = headers[id] {
            collect_header(&mut scopes, id, header, &clean[header.start..header.end]);
        }
    }

    let root = &scopes[0];
    let global_variables = root.block_vars.union(&root.function_vars).cloned().collect();
    let global_functions = root.functions.clone();
    let arrow_bindings = expression_arrows(&clean);
    let headers = headers
        .iter()
        .enumerate()
        .filter_map(|(scope, h)| {
            h.map(|h| HeaderSpan {
                start: h.start,
                end: h.end,
                scope,
            })
        })
        .collect();

    ScopeTree {
        scopes,
        headers,
        arrow_bindings,
        global_variables,
        global_functions,
    }
}

fn classify_brace(clean: &str, brace: usize) -> (ScopeKind, Option<Header>) {
    let Some((prev_idx, prev)) = prev_non_space(clean, brace) else {
        return (ScopeKind::Block, None);
    };
    let bytes = clean.as_bytes();

    if prev == ')' {
        let Some(open) = matching_open(clean, prev_idx) else {
            return (ScopeKind::Block, None);
        };
        let header = |kind| {
            Some(Header {
                kind,
                start: open + 1,
                end: prev_idx,
            })
        };
        return match prev_word(clean, open) {
            Some((_, "for")) => (ScopeKind::Block, header(HeaderKind::ForClause)),
            Some((_, "catch")) => (ScopeKind::Block, header(HeaderKind::CatchClause)),
            Some((_, "if" | "while" | "switch" | "with")) => (ScopeKind::Block, None),
            // `function (…) {`, `function name(…) {` and method shorthand `name(…) {`
            Some(_) => (ScopeKind::Function, header(HeaderKind::Params)),
            None => (ScopeKind::Block, None),
        };
    }

    if prev == '>' && prev_idx > 0 && bytes[prev_idx - 1] == b'=' {
        let arrow = prev_idx - 1;
        return (ScopeKind::Function, arrow_params(clean, arrow));
    }

    (ScopeKind::Block, None)
}

/// Parameter header of the arrow whose `=>` starts at `arrow`.
fn arrow_params(clean: &str, arrow: usize) -> Option<Header> {
    let (idx, c) = prev_non_space(clean, arrow)?;
    if c == ')' {
        let open = matching_open(clean, idx)?;
        return Some(Header {
            kind: HeaderKind::Params,
            start: open + 1,
            end: idx,
        });
    }
    if is_ident_continue(c) {
        let (start, word) = prev_word(clean, arrow)?;
        return Some(Header {
            kind: HeaderKind::Params,
            start,
            end: start + word.len(),
        });
    }
    None
}

/// The scope's span with every child scope and child header blanked out.
fn own_text(clean: &str, scopes: &[Scope], headers: &[Option<Header>], id: ScopeId) -> String {
    let len = clean.len();
    let scope = &scopes[id];
    let region_start = scope.start;
    let region_end = if scope.kind == ScopeKind::Root {
        len
    } else {
        (scope.end + 1).min(len)
    };

    let mut bytes = clean.as_bytes()[region_start..region_end].to_vec();
    let mut blank = |from: usize, to: usize| {
        let from = from.clamp(region_start, region_end) - region_start;
        let to = to.clamp(region_start, region_end) - region_start;
        for b in &mut bytes[from..to] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    };
    for &child in &scope.children {
        let c = &scopes[child];
        blank(c.start, (c.end + 1).min(len));
        if let Some(h) = headers[child] {
            blank(h.start, h.end);
        }
    }

    // Only whole ranges of characters were replaced, so the bytes stay valid UTF-8.
    String::from_utf8(bytes).unwrap_or_default()
}

fn hoist_target(scopes: &[Scope], id: ScopeId) -> ScopeId {
    let mut current = id;
    while !scopes[current].is_function_like() {
        match scopes[current].parent {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current
}

fn collect_declarations(scopes: &mut [Scope], id: ScopeId, own: &str, clean: &str) {
    let region_start = scopes[id].start;
    for occ in scan_identifiers(own) {
        if matches!(prev_non_space(own, occ.offset), Some((_, '.'))) {
            continue;
        }
        let after = occ.offset + occ.name.len();
        match occ.name {
            "let" | "const" => {
                for decl in declarator_names(&own[after..]) {
                    if decl.is_function {
                        scopes[id].functions.insert(decl.name.clone());
                    }
                    scopes[id].block_vars.insert(decl.name);
                }
            }
            "var" => {
                let target = hoist_target(scopes, id);
                for decl in declarator_names(&own[after..]) {
                    if decl.is_function {
                        scopes[target].functions.insert(decl.name.clone());
                    }
                    scopes[target].function_vars.insert(decl.name);
                }
            }
            "function" => {
                // Looked up in the full text: the parameter list that follows is blank in `own`.
                if let Some(name) = function_name(clean, region_start + after) {
                    let target = hoist_target(scopes, id);
                    scopes[target].functions.insert(name);
                }
            }
            _ => {}
        }
    }
}

/// Name following a `function` keyword, if the function is named.
fn function_name(text: &str, after_keyword: usize) -> Option<String> {
    let (mut idx, mut c) = next_non_space(text, after_keyword)?;
    if c == '*' {
        (idx, c) = next_non_space(text, idx + 1)?;
    }
    if !is_ident_start(c) {
        return None;
    }
    let name: String = text[idx..].chars().take_while(|ch| is_ident_continue(*ch)).collect();
    Some(name)
}

fn collect_header(scopes: &mut [Scope], id: ScopeId, header: Header, text: &str) {
    match header.kind {
        HeaderKind::Params | HeaderKind::CatchClause => {
            scopes[id].block_vars.extend(param_names(text));
        }
        HeaderKind::ForClause => {
            let Some(first) = scan_identifiers(text).into_iter().next() else {
                return;
            };
            let rest = &text[first.offset + first.name.len()..];
            match first.name {
                "let" | "const" => {
                    scopes[id].block_vars.extend(declarator_names(rest).into_iter().map(|d| d.name));
                }
                "var" => {
                    let target = hoist_target(scopes, id);
                    scopes[target]
                        .function_vars
                        .extend(declarator_names(rest).into_iter().map(|d| d.name));
                }
                _ => {}
            }
        }
    }
}

/// Bindings of arrow functions whose body is an expression rather than a block.
fn expression_arrows(clean: &str) -> Vec<ArrowBinding> {
    let bytes = clean.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;
    while i + 1 < bytes.len() {
        if bytes[i] != b'=' || bytes[i + 1] != b'>' {
            i += 1;
            continue;
        }
        let arrow = i;
        i += 2;
        if matches!(next_non_space(clean, arrow + 2), Some((_, '{')) | None) {
            continue;
        }
        let Some(header) = arrow_params(clean, arrow) else {
            continue;
        };
        let names: BTreeSet<String> = param_names(&clean[header.start..header.end]).into_iter().collect();
        if names.is_empty() {
            continue;
        }
        out.push(ArrowBinding {
            start: header.start,
            end: expression_end(bytes, arrow + 2),
            names,
        });
    }
    out
}

fn expression_end(bytes: &[u8], from: usize) -> usize {
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                if depth == 0 {
                    return i;
                }
                depth -= 1;
            }
            b',' | b';' if depth == 0 => return i,
            _ => {}
        }
    }
    bytes.len()
}
