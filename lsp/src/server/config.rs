use std::path::Path;

use anyhow::Result;
use dosescript_core::params::load_parameters;
use dosescript_core::{AnalysisConfig, ParameterDefinition};
use serde::Deserialize;
use tower_lsp::lsp_types::{ConfigurationItem, MessageType};

use super::CONFIG_SECTION;
use super::state::DoseScriptLanguageServer;

#[derive(Debug, Clone, Default)]
pub(crate) struct ServerConfig {
    pub(crate) analysis: AnalysisConfig,
    pub(crate) parameters: Vec<ParameterDefinition>,
}

/// The `dosescript` client section. Analysis tunables sit at the top level next to the
/// parameter list.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct DoseScriptConfigSection {
    #[serde(default)]
    parameters: Vec<ParameterDefinition>,
    #[serde(default)]
    parameters_file: Option<String>,
}

impl ServerConfig {
    pub(crate) fn from_section(value: serde_json::Value) -> Result<Self> {
        let section: DoseScriptConfigSection = serde_json::from_value(value.clone())?;
        let analysis = AnalysisConfig::from_json_value(value)?;
        let mut parameters = section.parameters;
        if let Some(path) = section.parameters_file.filter(|p| !p.is_empty()) {
            parameters.extend(load_parameters(Path::new(&path))?);
        }
        Ok(Self { analysis, parameters })
    }
}

impl DoseScriptLanguageServer {
    pub(crate) async fn load_config(&self) {
        let items = vec![ConfigurationItem {
            scope_uri: None,
            section: Some(CONFIG_SECTION.to_string()),
        }];

        let Ok(values) = self.client.configuration(items).await else {
            return;
        };
        let Some(value) = values.into_iter().next().filter(|v| !v.is_null()) else {
            return;
        };
        match ServerConfig::from_section(value) {
            Ok(config) => self.apply_config(config),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring invalid configuration");
                self.client
                    .log_message(MessageType::WARNING, format!("DoseScript: invalid configuration: {err:#}"))
                    .await;
            }
        }
    }

    /// Store `config` and push its parameters into every open session. Analysis tunables
    /// take effect for documents opened afterwards.
    pub(crate) fn apply_config(&self, config: ServerConfig) {
        let parameters = config.parameters.clone();
        if let Ok(mut guard) = self.config.lock() {
            *guard = config;
        }
        for mut doc in self.documents.iter_mut() {
            doc.session.update_parameters(parameters.clone());
        }
        tracing::info!(parameters = parameters.len(), "configuration applied");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dosescript_core::ParameterType;
    use serde_json::json;

    #[test]
    fn test_section_with_tunables_and_parameters() {
        let config = ServerConfig::from_section(json!({
            "debounceMs": 250,
            "checks": { "heuristics": false },
            "parameters": [
                { "name": "weight", "type": "number", "displayName": "Weight (kg)" },
                { "name": "isRenal", "dataType": "checkbox" }
            ]
        }))
        .unwrap();
        assert_eq!(config.analysis.debounce_ms, 250);
        assert!(!config.analysis.checks.heuristics);
        assert!(config.analysis.checks.identifiers);
        assert_eq!(config.parameters.len(), 2);
        assert_eq!(config.parameters[0].label(), "Weight (kg)");
        assert_eq!(config.parameters[1].data_type, ParameterType::Boolean);
    }

    #[test]
    fn test_missing_parameters_file_is_error() {
        let result = ServerConfig::from_section(json!({ "parametersFile": "/nonexistent/params.json" }));
        assert!(result.is_err());
    }
}
