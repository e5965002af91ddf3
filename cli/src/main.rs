use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;
use std::sync::Once;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use dosescript_core::completion::CompletionProvider;
use dosescript_core::engine::default_provider;
use dosescript_core::lang::LanguageDefinition;
use dosescript_core::params::load_parameters;
use dosescript_core::scope::{SymbolKind, build_scope_tree};
use dosescript_core::text::floor_char_boundary;
use dosescript_core::{AnalysisConfig, CompletionCandidate, Diagnostic, Orchestrator, ParameterDefinition};
use serde::Serialize;

#[cfg(test)]
mod main_test;

static TRACE_INIT: Once = Once::new();
const DEFAULT_TRACE_FILTER: &str = "dosescript_core=info,dosescript=info";

#[derive(Debug, Parser)]
#[command(name = "dosescript", author, version, about = "Static checks and completions for DoseScript", long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run every diagnostic pass over a script.
    Check {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        /// Parameter definitions (JSON, YAML or TOML)
        #[arg(long, value_parser = parse_sanitized_path)]
        params: Option<PathBuf>,
        /// Analysis configuration (TOML)
        #[arg(long, value_parser = parse_sanitized_path)]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List completion candidates at a byte offset.
    Complete {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        #[arg(long)]
        offset: usize,
        /// Filter prefix; defaults to the word left of the offset
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long, value_parser = parse_sanitized_path)]
        params: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the identifiers visible at a byte offset (end of file by default).
    Scopes {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        #[arg(long)]
        offset: Option<usize>,
    },
}

fn read_file_content(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file '{}'", path.display()))
}

fn sanitize_path(raw: &str) -> anyhow::Result<PathBuf> {
    let p = Path::new(raw);
    if p.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(anyhow::anyhow!("Parent directory components ('..') are not allowed in file paths."));
    }
    Ok(p.to_path_buf())
}

fn parse_sanitized_path(raw: &str) -> Result<PathBuf, String> {
    sanitize_path(raw).map_err(|e| e.to_string())
}

fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    !(trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("0")
        || trimmed.eq_ignore_ascii_case("false")
        || trimmed.eq_ignore_ascii_case("off"))
}

/// `DOSESCRIPT_TRACE=1` enables stderr tracing; any other non-toggle value is used as the filter.
fn maybe_init_tracing() {
    let Ok(raw) = std::env::var("DOSESCRIPT_TRACE") else {
        return;
    };
    if !env_toggle_enabled(&raw) {
        return;
    }

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;

        let trimmed = raw.trim();
        let filter_expr = if trimmed.eq_ignore_ascii_case("1") || trimmed.eq_ignore_ascii_case("true") {
            std::env::var("RUST_LOG").ok()
        } else {
            Some(trimmed.to_string())
        };
        let filter = filter_expr
            .and_then(|expr| EnvFilter::try_new(expr).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_TRACE_FILTER));
        let _ = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .try_init();
    });
}

fn load_params(path: Option<&Path>) -> anyhow::Result<Vec<ParameterDefinition>> {
    match path {
        Some(path) => {
            let parameters = load_parameters(path)?;
            tracing::debug!(path = %path.display(), count = parameters.len(), "parameters loaded");
            Ok(parameters)
        }
        None => Ok(Vec::new()),
    }
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    file: String,
    status: &'a str,
    diagnostics: &'a [Diagnostic],
}

fn render_diagnostics(file: &Path, diagnostics: &[Diagnostic], status: &str) -> String {
    let mut out = String::new();
    for d in diagnostics {
        let _ = writeln!(
            out,
            "{}:{}:{}: {}[{}]: {}",
            file.display(),
            d.line,
            d.column,
            d.severity,
            d.source,
            d.message
        );
    }
    let _ = writeln!(out, "{status}");
    out
}

fn render_completions(items: &[CompletionCandidate]) -> String {
    let mut out = String::new();
    for item in items {
        let kind = serde_json::to_value(item.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let _ = writeln!(out, "{}\t{}\t{:.2}\t{}", item.text, kind, item.priority, item.insertion_text());
    }
    out
}

fn run_check(
    file: &Path,
    params: Option<&Path>,
    config: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    let source = read_file_content(file)?;
    let parameters = load_params(params)?;
    let config = match config {
        Some(path) => AnalysisConfig::from_toml_file(path)?,
        None => AnalysisConfig::default(),
    };

    let report = Orchestrator::new(&config, default_provider()).validate_text(&source, &parameters);
    tracing::debug!(
        file = %file.display(),
        diagnostics = report.diagnostics.len(),
        status = %report.status,
        "check finished"
    );
    match format {
        OutputFormat::Text => print!("{}", render_diagnostics(file, &report.diagnostics, &report.status)),
        OutputFormat::Json => {
            let output = CheckOutput {
                file: file.display().to_string(),
                status: &report.status,
                diagnostics: &report.diagnostics,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(if report.has_errors() { ExitCode::from(1) } else { ExitCode::SUCCESS })
}

fn run_complete(
    file: &Path,
    offset: usize,
    prefix: Option<&str>,
    params: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    let source = read_file_content(file)?;
    let parameters = load_params(params)?;
    let config = AnalysisConfig::default();
    let provider = CompletionProvider::new(LanguageDefinition::shared(), config.completion.max_items);
    let offset = floor_char_boundary(&source, offset);
    let tree = build_scope_tree(&source);
    let items = provider.complete(&source, offset, prefix, &tree, &parameters);
    tracing::debug!(offset, candidates = items.len(), "completion finished");
    match format {
        OutputFormat::Text => print!("{}", render_completions(&items)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
    }
    Ok(ExitCode::SUCCESS)
}

fn run_scopes(file: &Path, offset: Option<usize>) -> anyhow::Result<ExitCode> {
    let source = read_file_content(file)?;
    let offset = floor_char_boundary(&source, offset.unwrap_or(source.len()));
    let tree = build_scope_tree(&source);
    for symbol in tree.visible_symbols(offset) {
        let kind = match symbol.kind {
            SymbolKind::Variable => "variable",
            SymbolKind::Function => "function",
        };
        println!("{}\t{}\t{}", symbol.name, kind, symbol.level);
    }
    Ok(ExitCode::SUCCESS)
}

fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    match args.command {
        Commands::Check {
            file,
            params,
            config,
            format,
        } => run_check(&file, params.as_deref(), config.as_deref(), format),
        Commands::Complete {
            file,
            offset,
            prefix,
            params,
            format,
        } => run_complete(&file, offset, prefix.as_deref(), params.as_deref(), format),
        Commands::Scopes { file, offset } => run_scopes(&file, offset),
    }
}

fn main() -> ExitCode {
    maybe_init_tracing();
    match run(CliArgs::parse()) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}
