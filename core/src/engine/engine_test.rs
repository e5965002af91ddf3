#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::check::{CheckContext, Checker};
    use crate::diag::{DiagnosticSource, Severity};
    use crate::engine::{
        CompileChecker, EngineError, EngineLease, EngineProvider, ScriptEngine, SyntaxEngine, SyntaxEngineProvider,
        SyntaxError, Token, Tokenizer, ValidationScript, map_engine_error,
    };
    use crate::lang::LanguageDefinition;
    use crate::params::{ParameterDefinition, ParameterType};
    use crate::scope::build_scope_tree;

    fn error_of(source: &str) -> SyntaxError {
        SyntaxEngine::check(source).unwrap_err()
    }

    #[test]
    fn test_tokenizer_positions() {
        let tokens = Tokenizer::tokenize("let a = 1\n  b++").unwrap();
        let ids: Vec<_> = tokens.iter().map(|t| (t.token.clone(), t.line, t.column, t.newline_before)).collect();
        assert_eq!(ids[0], (Token::Id("let".into()), 1, 1, false));
        assert_eq!(ids[3], (Token::Number, 1, 9, false));
        assert_eq!(ids[4], (Token::Id("b".into()), 2, 3, true));
        assert_eq!(ids[5].0, Token::Increment);
        assert_eq!(tokens.last().map(|t| &t.token), Some(&Token::Eof));
    }

    #[test]
    fn test_tokenizer_regex_versus_division() {
        let tokens = Tokenizer::tokenize("x = a / b / c; y = /ab+c/gi;").unwrap();
        assert_eq!(tokens.iter().filter(|t| t.token == Token::Op("/")).count(), 2);
        assert_eq!(tokens.iter().filter(|t| t.token == Token::Regex).count(), 1);
    }

    #[test]
    fn test_valid_script_compiles() {
        let source = r#"var total = 0;
const doses = [1, 2.5, 3];
for (const d of doses) { total += d; }
let label = `Total: ${total} mg`;
const half = doses.map(x => x / 2).filter((v, i) => i > 0);
function pick(a, b = 2, ...rest) {
  if (a?.value ?? false) { return a.value; } else if (b) return b;
  switch (a) { case 1: break; default: return -1; }
  return rest.length;
}
const o = { dose: 1, 'unit': "mg", [label]: 2, calc() { return 1; } };
const re = /ab+c/gi;
try { pick(1); } catch (e) { log(e); } finally { log('done'); }
do { total--; } while (total > 0);
for (let i = 0; i < 3; i++) { if (i in o) continue; }
const { dose, unit = 'mg' } = o;
let n = typeof dose === 'number' ? dose : 0
addNormalResult('d', total, 'mg', '', '', '');
"#;
        assert_eq!(SyntaxEngine::check(source), Ok(()));
    }

    #[test]
    fn test_automatic_semicolons() {
        assert!(SyntaxEngine::check("let a = 1\nlet b = 2\nb = a").is_ok());
        let err = error_of("let a = 1 let b = 2");
        assert_eq!((err.line, err.column), (1, 11));
        assert_eq!(err.message, "Unexpected token 'let'");
    }

    #[test]
    fn test_syntax_errors() {
        let err = error_of("let x = ;");
        assert_eq!((err.line, err.column), (1, 9));
        assert_eq!(err.to_string(), "SyntaxError: Unexpected token ';' (Line 1, Column 9)");

        assert_eq!(error_of("try { }").message, "Missing catch or finally after try");
        assert_eq!(error_of("throw\nx;").message, "Illegal newline after throw");
        assert_eq!(error_of("const a;").message, "Missing initializer in const declaration");
        assert_eq!(error_of("1 = 2;").message, "Invalid left-hand side in assignment");
        assert_eq!(error_of("if (x) {").message, "Unexpected end of input");
        assert_eq!(error_of("function () {}").message, "Function statements require a function name");
    }

    #[test]
    fn test_lexical_errors() {
        let err = error_of("let s = 'abc");
        assert_eq!(err.message, "Unterminated string literal");
        assert_eq!((err.line, err.column), (1, 9));
        assert_eq!(error_of("let t = `abc").message, "Unterminated template literal");
        assert_eq!(error_of("/* open").message, "Unterminated comment");
        assert_eq!(error_of("let a = 1 # 2;").message, "Invalid or unexpected token");
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let source = format!("x = {}1{};", "[".repeat(10_000), "]".repeat(10_000));
        let err = error_of(&source);
        assert_eq!(err.message, "Nesting too deep");
        assert_eq!(err.line, 1);

        assert_eq!(error_of(&"!".repeat(10_000)).message, "Nesting too deep");
        assert_eq!(error_of(&"{".repeat(10_000)).message, "Nesting too deep");
        assert_eq!(error_of(&format!("x = {}X;", "new ".repeat(10_000))).message, "Nesting too deep");

        let shallow = format!("x = {}1{};", "[".repeat(50), "]".repeat(50));
        assert!(SyntaxEngine::check(&shallow).is_ok());
    }

    #[test]
    fn test_validation_script_header() {
        let lang = LanguageDefinition::shared();
        let params = vec![
            ParameterDefinition::new("weight", ParameterType::Number),
            ParameterDefinition::new("isChild", ParameterType::Boolean),
            ParameterDefinition::new("2x", ParameterType::Number),
            ParameterDefinition::new("has space", ParameterType::String),
        ];
        let script = ValidationScript::build("log(weight);", &params, &lang);

        assert!(script.source.contains("var weight = 0;\n"));
        assert!(script.source.contains("var isChild = false;\n"));
        assert!(!script.source.contains("2x"));
        assert!(!script.source.contains("has space"));
        assert!(script.source.contains("function roundTo(value, decimals) {}\n"));
        assert_eq!(script.source.lines().nth(script.header_lines), Some("log(weight);"));
        assert_eq!(SyntaxEngine::check(&script.source), Ok(()));
    }

    #[test]
    fn test_map_engine_error_shifts_lines() {
        let d = map_engine_error("SyntaxError: Unexpected token ')' (Line 17, Column 5)", 15).unwrap();
        assert_eq!((d.line, d.column), (2, 5));
        assert_eq!(d.message, "Unexpected token ')'");
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.source, DiagnosticSource::Compile);
    }

    #[test]
    fn test_map_engine_error_suppresses_header() {
        assert!(map_engine_error("SyntaxError: Unexpected token (Line 3, Column 2)", 3).is_none());
        assert!(map_engine_error("SyntaxError: something broke", 15).is_none());
        let d = map_engine_error("something broke", 0).unwrap();
        assert_eq!((d.line, d.column), (1, 1));
        assert_eq!(d.message, "something broke");
    }

    #[test]
    fn test_compile_checker_maps_to_user_lines() {
        let lang = LanguageDefinition::shared();
        let params = vec![ParameterDefinition::new("weight", ParameterType::Number)];
        let checker = CompileChecker::new(Arc::new(SyntaxEngineProvider));

        let ok = "let total = weight * 2;\naddNormalResult('d', total, 'mg');";
        let cx = CheckContext::new(ok, Arc::new(build_scope_tree(ok)), &params, lang.clone());
        assert!(checker.check(&cx).unwrap().is_empty());

        let broken = "let total = weight * 2;\nlet x = ;";
        let cx = CheckContext::new(broken, Arc::new(build_scope_tree(broken)), &params, lang);
        let diags = checker.check(&cx).unwrap();
        assert_eq!(diags.len(), 1);
        assert_eq!((diags[0].line, diags[0].column), (2, 9));
        assert!(diags[0].is_error());
    }

    struct CountingEngine {
        released: Arc<AtomicUsize>,
        panic: bool,
    }

    impl ScriptEngine for CountingEngine {
        fn compile(&mut self, _source: &str) -> Result<(), EngineError> {
            if self.panic {
                panic!("engine crashed");
            }
            Err(EngineError::new("SyntaxError: nope (Line 1, Column 1)"))
        }

        fn release(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingProvider {
        released: Arc<AtomicUsize>,
        panic: bool,
    }

    impl EngineProvider for CountingProvider {
        fn acquire(&self) -> anyhow::Result<Box<dyn ScriptEngine>> {
            Ok(Box::new(CountingEngine {
                released: self.released.clone(),
                panic: self.panic,
            }))
        }
    }

    #[test]
    fn test_lease_releases_on_every_exit() {
        let released = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            released: released.clone(),
            panic: false,
        };
        {
            let mut lease = EngineLease::acquire(&provider).unwrap();
            assert!(lease.compile("x").is_err());
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);

        let provider = CountingProvider {
            released: released.clone(),
            panic: true,
        };
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut lease = EngineLease::acquire(&provider).unwrap();
            let _ = lease.compile("x");
        }));
        assert!(result.is_err());
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }
}
