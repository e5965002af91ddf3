use std::fmt;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Declared data type of a host parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParameterType {
    Number,
    Boolean,
    String,
    Array,
    Other(String),
}

impl From<String> for ParameterType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "number" | "numeric" | "decimal" | "double" | "float" | "int" | "integer" => ParameterType::Number,
            "boolean" | "bool" | "checkbox" => ParameterType::Boolean,
            "string" | "text" | "select" | "option" => ParameterType::String,
            "array" | "list" => ParameterType::Array,
            _ => ParameterType::Other(value),
        }
    }
}

impl From<ParameterType> for String {
    fn from(value: ParameterType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterType::Number => f.write_str("number"),
            ParameterType::Boolean => f.write_str("boolean"),
            ParameterType::String => f.write_str("string"),
            ParameterType::Array => f.write_str("array"),
            ParameterType::Other(raw) => f.write_str(raw),
        }
    }
}

impl ParameterType {
    /// Literal a compile-check stub initialises a parameter of this type with.
    pub fn stub_literal(&self) -> &'static str {
        match self {
            ParameterType::Number | ParameterType::Other(_) => "0",
            ParameterType::Boolean => "false",
            ParameterType::String => "\"\"",
            ParameterType::Array => "[]",
        }
    }
}

/// An input variable supplied by the host, always treated as declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_type", alias = "type")]
    pub data_type: ParameterType,
    #[serde(default)]
    pub default_value: Option<String>,
}

fn default_type() -> ParameterType {
    ParameterType::Number
}

impl ParameterDefinition {
    pub fn new(name: impl Into<String>, data_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            data_type,
            default_value: None,
        }
    }

    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ParameterFile {
    List(Vec<ParameterDefinition>),
    Table { parameters: Vec<ParameterDefinition> },
}

impl From<ParameterFile> for Vec<ParameterDefinition> {
    fn from(file: ParameterFile) -> Self {
        match file {
            ParameterFile::List(list) | ParameterFile::Table { parameters: list } => list,
        }
    }
}

/// Parse parameter definitions; the format is chosen by `extension` (`json`, `yaml`/`yml`, `toml`).
pub fn parse_parameters(content: &str, extension: &str) -> Result<Vec<ParameterDefinition>> {
    let file: ParameterFile = match extension.to_ascii_lowercase().as_str() {
        "json" => serde_json::from_str(content).context("invalid JSON parameter file")?,
        "yaml" | "yml" => serde_yaml::from_str(content).context("invalid YAML parameter file")?,
        "toml" => toml::from_str(content).context("invalid TOML parameter file")?,
        other => return Err(anyhow!("unsupported parameter file format '{}'", other)),
    };
    Ok(file.into())
}

pub fn load_parameters(path: &Path) -> Result<Vec<ParameterDefinition>> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read parameter file '{}'", path.display()))?;
    parse_parameters(&content, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_list() {
        let json = r#"[{"name": "weight", "displayName": "Weight (kg)", "dataType": "decimal"},
                       {"name": "isChild", "type": "bool"}]"#;
        let params = parse_parameters(json, "json").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].data_type, ParameterType::Number);
        assert_eq!(params[0].label(), "Weight (kg)");
        assert_eq!(params[1].data_type, ParameterType::Boolean);
        assert_eq!(params[1].label(), "isChild");
    }

    #[test]
    fn test_parse_yaml_and_toml_tables() {
        let yaml = "parameters:\n  - name: drug\n    dataType: Text\n  - name: doses\n    dataType: List\n";
        let params = parse_parameters(yaml, "yml").unwrap();
        assert_eq!(params[0].data_type, ParameterType::String);
        assert_eq!(params[1].data_type, ParameterType::Array);

        let toml_src = "[[parameters]]\nname = \"age\"\ndataType = \"int\"\ndefaultValue = \"40\"\n";
        let params = parse_parameters(toml_src, "toml").unwrap();
        assert_eq!(params[0].name, "age");
        assert_eq!(params[0].default_value.as_deref(), Some("40"));
    }

    #[test]
    fn test_unknown_type_and_format() {
        let params = parse_parameters(r#"[{"name": "x", "dataType": "Matrix"}]"#, "json").unwrap();
        assert_eq!(params[0].data_type, ParameterType::Other("Matrix".to_string()));
        assert_eq!(params[0].data_type.stub_literal(), "0");
        assert!(parse_parameters("", "ini").is_err());
    }

    #[test]
    fn test_load_parameters_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.yaml");
        std::fs::write(&path, "- name: weight\n  dataType: number\n").unwrap();
        let params = load_parameters(&path).unwrap();
        assert_eq!(params, vec![ParameterDefinition::new("weight", ParameterType::Number)]);

        let err = load_parameters(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read parameter file"));
    }

    #[test]
    fn test_stub_literals() {
        assert_eq!(ParameterType::Boolean.stub_literal(), "false");
        assert_eq!(ParameterType::String.stub_literal(), "\"\"");
        assert_eq!(ParameterType::Array.stub_literal(), "[]");
    }
}
