#[cfg(test)]
mod tests {
    use crate::*;
    use dosescript_core::{DiagnosticSource, Severity};

    #[test]
    fn test_sanitize_path_allows_simple_relative() {
        let p = sanitize_path("scripts/dose.ds").expect("relative path should be allowed");
        assert_eq!(p, PathBuf::from("scripts/dose.ds"));
    }

    #[test]
    fn test_sanitize_path_rejects_parent_dir() {
        let err = sanitize_path("scripts/../dose.ds").unwrap_err();
        assert!(err.to_string().contains("Parent directory components"));
    }

    #[test]
    fn test_cli_args_check_defaults() {
        let args = CliArgs::try_parse_from(["dosescript", "check", "dose.ds"]).expect("should parse");
        match args.command {
            Commands::Check {
                file, params, format, ..
            } => {
                assert_eq!(file, PathBuf::from("dose.ds"));
                assert!(params.is_none());
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("expected check command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_args_complete_requires_offset() {
        assert!(CliArgs::try_parse_from(["dosescript", "complete", "dose.ds"]).is_err());
        let args = CliArgs::try_parse_from(["dosescript", "complete", "dose.ds", "--offset", "12", "--prefix", "w"])
            .expect("should parse");
        match args.command {
            Commands::Complete { offset, prefix, .. } => {
                assert_eq!(offset, 12);
                assert_eq!(prefix.as_deref(), Some("w"));
            }
            other => panic!("expected complete command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_args_rejects_parent_dir_params() {
        let err = CliArgs::try_parse_from(["dosescript", "check", "dose.ds", "--params", "../p.json"]).unwrap_err();
        assert!(err.to_string().contains("Parent directory components"));
    }

    #[test]
    fn test_env_toggle() {
        assert!(env_toggle_enabled("1"));
        assert!(env_toggle_enabled("dosescript_core=debug"));
        assert!(!env_toggle_enabled("off"));
        assert!(!env_toggle_enabled("  "));
    }

    #[test]
    fn test_render_diagnostics() {
        let diagnostics = vec![Diagnostic::at(
            DiagnosticSource::Identifiers,
            Severity::Warning,
            1,
            22,
            "Unknown identifier 'wieght'",
        )];
        let out = render_diagnostics(Path::new("dose.ds"), &diagnostics, "0 errors, 1 warning, 0 hints");
        assert_eq!(
            out,
            "dose.ds:1:22: warning[identifiers]: Unknown identifier 'wieght'\n0 errors, 1 warning, 0 hints\n"
        );
    }
}
