#[cfg(test)]
mod tests {
    use crate::scope::{ScopeAnalyzer, ScopeKind, SymbolKind, build_scope_tree};

    const SAMPLE: &str = "var x=1; function f(y){ let z=2; }";

    #[test]
    fn test_globals_hide_function_locals() {
        let tree = build_scope_tree(SAMPLE);
        let visible = tree.variables_in_scope(SAMPLE.len());
        assert!(visible.contains("x"));
        assert!(visible.contains("f"));
        assert!(!visible.contains("y"));
        assert!(!visible.contains("z"));
    }

    #[test]
    fn test_function_body_sees_params_locals_and_globals() {
        let tree = build_scope_tree(SAMPLE);
        let inside = SAMPLE.find("z=2").unwrap();
        let visible = tree.variables_in_scope(inside);
        for name in ["x", "f", "y", "z"] {
            assert!(visible.contains(name), "{name} should be visible");
        }
    }

    #[test]
    fn test_tree_shape() {
        let tree = build_scope_tree(SAMPLE);
        assert_eq!(tree.scopes().len(), 2);
        let f = tree.scope(1);
        assert_eq!(f.kind, ScopeKind::Function);
        assert_eq!(f.parent, Some(0));
        assert_eq!(f.level, 1);
        assert!(f.block_vars.contains("y"));
        assert!(tree.global_functions().contains("f"));
        assert!(tree.global_variables().contains("x"));
    }

    #[test]
    fn test_var_hoists_out_of_blocks() {
        let text = "function g() {\n  if (ok) {\n    var hoisted = 1;\n    let blocked = 2;\n  }\n  \n}";
        let tree = build_scope_tree(text);
        let after_if = text.rfind("  \n}").unwrap() + 1;
        let visible = tree.variables_in_scope(after_if);
        assert!(visible.contains("hoisted"));
        assert!(!visible.contains("blocked"));
        assert!(!tree.variables_in_scope(text.len()).contains("hoisted"));
    }

    #[test]
    fn test_for_and_catch_headers_bind_to_body() {
        let text = "for (let i = 0; i < 3; i++) { use(i); }\ntry { a(); } catch (err) { log(err); }\n";
        let tree = build_scope_tree(text);
        assert!(tree.variables_in_scope(text.find("use(i)").unwrap()).contains("i"));
        assert!(tree.variables_in_scope(text.find("log(err)").unwrap()).contains("err"));
        let end = tree.variables_in_scope(text.len());
        assert!(!end.contains("i"));
        assert!(!end.contains("err"));
    }

    #[test]
    fn test_arrow_params() {
        let text = "const double = v => v * 2;\nconst add = (a, b) => {\n  return a + b;\n};\nlet t = 0;";
        let tree = build_scope_tree(text);
        assert!(tree.variables_in_scope(text.find("v * 2").unwrap()).contains("v"));
        assert!(tree.variables_in_scope(text.find("a + b").unwrap()).contains("b"));
        let end = tree.variables_in_scope(text.len());
        assert!(!end.contains("v"));
        assert!(!end.contains("a"));
        assert!(end.contains("double"));
        assert!(tree.global_functions().contains("add"));
    }

    #[test]
    fn test_comments_and_strings_do_not_declare() {
        let text = "// let ghost = 1\nconst s = 'var phantom = 2';\n/* function spook() {} */";
        let tree = build_scope_tree(text);
        let visible = tree.variables_in_scope(text.len());
        assert!(visible.contains("s"));
        assert!(!visible.contains("ghost"));
        assert!(!visible.contains("phantom"));
        assert!(!visible.contains("spook"));
        assert_eq!(tree.scopes().len(), 1);
    }

    #[test]
    fn test_unclosed_scope_extends_to_end() {
        let text = "function broken(dose) {\n  let x = dose";
        let tree = build_scope_tree(text);
        assert_eq!(tree.scope(1).end, text.len());
        let visible = tree.variables_in_scope(text.len());
        assert!(visible.contains("dose"));
        assert!(visible.contains("x"));
    }

    #[test]
    fn test_visible_symbols_prefer_innermost() {
        let text = "let n = 1;\nfunction h(n) { return n; }";
        let tree = build_scope_tree(text);
        let symbols = tree.visible_symbols(text.find("return").unwrap());
        let n = symbols.iter().find(|s| s.name == "n").unwrap();
        assert_eq!(n.level, 1);
        let h = symbols.iter().find(|s| s.name == "h").unwrap();
        assert_eq!(h.kind, SymbolKind::Function);
    }

    #[test]
    fn test_nested_function_sees_enclosing_function_locals() {
        let text = "function outer(a) { var b = 1; function inner(c) { return b + a + c; } }";
        let tree = build_scope_tree(text);
        let inside = text.find("return").unwrap();
        let visible = tree.variables_in_scope(inside);
        for name in ["outer", "a", "b", "inner", "c"] {
            assert!(visible.contains(name), "{name} should be visible");
            assert!(tree.is_visible(name, inside));
        }
        assert!(!tree.is_visible("c", text.find("var b").unwrap()));
    }

    #[test]
    fn test_member_access_is_not_a_declaration() {
        let tree = build_scope_tree("obj.let = 1; cfg.var = 2;");
        assert!(tree.all_declared().is_empty());
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let mut analyzer = ScopeAnalyzer::new();
        let (first, rebuilt) = analyzer.analyze(SAMPLE);
        assert!(rebuilt);
        let (second, rebuilt) = analyzer.analyze(SAMPLE);
        assert!(!rebuilt);
        assert_eq!(*first, *second);
        assert_eq!(*first, build_scope_tree(SAMPLE));

        let (third, rebuilt) = analyzer.analyze("let other = 1;");
        assert!(rebuilt);
        assert!(third.global_variables().contains("other"));
    }
}
