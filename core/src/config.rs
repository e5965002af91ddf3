use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Tunables for analysis, completion and revalidation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    pub debounce_ms: u64,
    /// Upper bound on diagnostics per pass; 0 disables the cap.
    pub max_diagnostics: usize,
    pub checks: CheckToggles,
    pub completion: CompletionConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 400,
            max_diagnostics: 200,
            checks: CheckToggles::default(),
            completion: CompletionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckToggles {
    pub strings: bool,
    pub calls: bool,
    pub heuristics: bool,
    pub identifiers: bool,
    pub compile: bool,
}

impl Default for CheckToggles {
    fn default() -> Self {
        Self {
            strings: true,
            calls: true,
            heuristics: true,
            identifiers: true,
            compile: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompletionConfig {
    pub max_items: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self { max_items: 100 }
    }
}

impl AnalysisConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.max(1))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid analysis configuration")
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration '{}'", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Configuration pushed by an editor client as a JSON section.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).context("invalid analysis configuration section")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.debounce_ms, 400);
        assert!(cfg.checks.compile);
        assert_eq!(cfg.completion.max_items, 100);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = AnalysisConfig::from_toml_str("debounceMs = 150\n[checks]\nheuristics = false\n").unwrap();
        assert_eq!(cfg.debounce_ms, 150);
        assert!(!cfg.checks.heuristics);
        assert!(cfg.checks.identifiers);
        assert_eq!(cfg.max_diagnostics, 200);
    }

    #[test]
    fn test_json_section() {
        let value = serde_json::json!({"maxDiagnostics": 0, "completion": {"maxItems": 5}});
        let cfg = AnalysisConfig::from_json_value(value).unwrap();
        assert_eq!(cfg.max_diagnostics, 0);
        assert_eq!(cfg.completion.max_items, 5);
        assert_eq!(cfg.debounce(), Duration::from_millis(400));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"maxDiagnostics = 10\n[completion]\nmaxItems = 3\n").unwrap();
        let cfg = AnalysisConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(cfg.max_diagnostics, 10);
        assert_eq!(cfg.completion.max_items, 3);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(AnalysisConfig::from_toml_str("debounceMs = \"soon\"").is_err());
    }
}
