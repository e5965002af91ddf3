use std::sync::{Arc, Mutex};

use anyhow::Result;
use dashmap::DashMap;
use dosescript_core::{Diagnostic as CoreDiagnostic, EditorSession, SessionEvent, Severity};
use ropey::Rope;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tower_lsp::Client;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, MessageType, NumberOrString, Url};

use super::config::ServerConfig;
use super::text::diagnostic_range;

/// An open DoseScript document and the analysis session attached to it.
pub(crate) struct Document {
    pub(crate) content: Rope,
    pub(crate) version: i32,
    pub(crate) session: EditorSession,
    forwarder: JoinHandle<()>,
}

impl Document {
    pub(crate) fn text(&self) -> String {
        self.content.to_string()
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        self.session.dispose();
        self.forwarder.abort();
    }
}

/// Primary LSP server state shared across handlers.
pub(crate) struct DoseScriptLanguageServer {
    pub(crate) client: Client,
    pub(crate) documents: Arc<DashMap<Url, Document>>,
    pub(crate) config: Mutex<ServerConfig>,
}

impl DoseScriptLanguageServer {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(DashMap::new()),
            config: Mutex::new(ServerConfig::default()),
        }
    }

    fn config_snapshot(&self) -> ServerConfig {
        self.config.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Start a session for `uri`, wire its events to the client and analyze the initial text.
    pub(crate) fn open_document(&self, uri: Url, text: &str, version: i32) -> Result<()> {
        let config = self.config_snapshot();
        let mut session = EditorSession::new(&config.analysis)?;
        session.update_parameters(config.parameters);
        let forwarder = match session.subscribe() {
            Some(events) => spawn_forwarder(self.client.clone(), self.documents.clone(), uri.clone(), events),
            None => tokio::spawn(async {}),
        };
        session.analyze(text, 0);

        let document = Document {
            content: Rope::from_str(text),
            version,
            session,
            forwarder,
        };
        self.documents.insert(uri, document);
        Ok(())
    }
}

pub(crate) fn to_lsp_diagnostic(content: &Rope, diagnostic: &CoreDiagnostic) -> Diagnostic {
    let severity = match diagnostic.severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Info => DiagnosticSeverity::INFORMATION,
    };
    Diagnostic {
        range: diagnostic_range(content, diagnostic),
        severity: Some(severity),
        code: Some(NumberOrString::String(diagnostic.source.to_string())),
        source: Some("dosescript".to_string()),
        message: diagnostic.message.clone(),
        ..Default::default()
    }
}

/// Relay session events for one document: diagnostics are published, status lines logged.
fn spawn_forwarder(
    client: Client,
    documents: Arc<DashMap<Url, Document>>,
    uri: Url,
    mut events: tokio::sync::broadcast::Receiver<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(%uri, skipped, "session events lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            match event {
                SessionEvent::Diagnostics(list) => {
                    // Map against the current buffer; the guard must not live across the await.
                    let mapped = documents.get(&uri).map(|doc| {
                        let diags: Vec<Diagnostic> = list.iter().map(|d| to_lsp_diagnostic(&doc.content, d)).collect();
                        (diags, doc.version)
                    });
                    if let Some((diags, version)) = mapped {
                        client.publish_diagnostics(uri.clone(), diags, Some(version)).await;
                    }
                }
                SessionEvent::Status(status) => {
                    tracing::debug!(%uri, %status, "validation finished");
                    client.log_message(MessageType::LOG, format!("{uri}: {status}")).await;
                }
                SessionEvent::ContextChanged(names) => {
                    tracing::trace!(%uri, visible = names.len(), "context changed");
                }
            }
        }
    })
}
