use dosescript_core::lang::LanguageDefinition;
use dosescript_core::scope::{SymbolKind, param_names};
use dosescript_core::text::{matching_close, word_at};
use dosescript_core::{CompletionCandidate, CompletionKind};
use tower_lsp::LanguageServer;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tracing::info;

use super::signature::{script_signature_info, signature_info};
use super::state::DoseScriptLanguageServer;
use super::text::{apply_change, char_idx_to_position, find_call_before_cursor, position_to_byte};

#[tower_lsp::async_trait]
impl LanguageServer for DoseScriptLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("DoseScript language server initializing for {:?}", params.root_uri);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::INCREMENTAL)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(vec![".".to_string()]),
                    work_done_progress_options: Default::default(),
                    all_commit_characters: None,
                    completion_item: None,
                }),
                signature_help_provider: Some(SignatureHelpOptions {
                    trigger_characters: Some(vec!["(".to_string(), ",".to_string()]),
                    retrigger_characters: None,
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "DoseScript Language Server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("DoseScript language server initialized");
        self.client
            .log_message(MessageType::INFO, "DoseScript language server started")
            .await;
        self.load_config().await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("DoseScript language server shutting down");
        self.documents.clear();
        Ok(())
    }

    async fn did_change_configuration(&self, _params: DidChangeConfigurationParams) {
        self.load_config().await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        if let Err(err) = self.open_document(doc.uri.clone(), &doc.text, doc.version) {
            tracing::error!(uri = %doc.uri, error = %err, "failed to start analysis session");
            self.client
                .log_message(MessageType::ERROR, format!("DoseScript: cannot analyze {}: {err:#}", doc.uri))
                .await;
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let Some(mut entry) = self.documents.get_mut(&uri) else {
            tracing::debug!(%uri, "change for unknown document");
            return;
        };
        entry.version = params.text_document.version;

        let mut caret_char = 0;
        for change in &params.content_changes {
            caret_char = apply_change(&mut entry.content, change);
        }
        let caret = entry.content.char_to_byte(caret_char.min(entry.content.len_chars()));
        let text = entry.text();
        entry.session.analyze(&text, caret);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.remove(&uri);
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let Some(mut doc) = self.documents.get_mut(uri) else {
            return Ok(None);
        };
        let caret = position_to_byte(&doc.content, position);
        let text = doc.text();
        doc.session.analyze(&text, caret);
        let items: Vec<CompletionItem> = doc
            .session
            .request_completion(None, caret)
            .iter()
            .enumerate()
            .map(|(rank, c)| to_completion_item(rank, c))
            .collect();
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let Some(doc) = self.documents.get(uri) else {
            return Ok(None);
        };
        let text = doc.text();
        let offset = position_to_byte(&doc.content, position);
        let span = word_at(&text, offset);
        if span.text.is_empty() {
            return Ok(None);
        }
        let Some(contents) = describe_word(&doc.session, &text, &span.text, offset) else {
            return Ok(None);
        };
        let range = Range::new(
            char_idx_to_position(&doc.content, doc.content.byte_to_char(span.start)),
            char_idx_to_position(&doc.content, doc.content.byte_to_char(span.end)),
        );
        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: contents,
            }),
            range: Some(range),
        }))
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> Result<Option<SignatureHelp>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let Some(doc) = self.documents.get(uri) else {
            return Ok(None);
        };
        let text = doc.text();
        let offset = position_to_byte(&doc.content, position);
        drop(doc);

        let Some((name, active)) = find_call_before_cursor(&text[..offset]) else {
            return Ok(None);
        };
        let lang = LanguageDefinition::shared();
        let signature = match lang.custom_function(&name) {
            Some(function) => signature_info(function, active),
            None => match script_function_params(&text, &name) {
                Some(params) => script_signature_info(&name, params, active),
                None => return Ok(None),
            },
        };
        let active_parameter = signature.active_parameter;
        Ok(Some(SignatureHelp {
            signatures: vec![signature],
            active_signature: Some(0),
            active_parameter,
        }))
    }
}

fn to_completion_item(rank: usize, candidate: &CompletionCandidate) -> CompletionItem {
    let kind = match candidate.kind {
        CompletionKind::Variable => CompletionItemKind::VARIABLE,
        CompletionKind::Function => CompletionItemKind::FUNCTION,
        CompletionKind::Parameter => CompletionItemKind::FIELD,
        CompletionKind::Method => CompletionItemKind::METHOD,
        CompletionKind::Keyword => CompletionItemKind::KEYWORD,
        CompletionKind::Object => CompletionItemKind::MODULE,
        CompletionKind::Constant => CompletionItemKind::CONSTANT,
    };
    let snippet = candidate.insertion_template != candidate.text;
    CompletionItem {
        label: candidate.text.clone(),
        kind: Some(kind),
        detail: candidate.detail.clone(),
        // Keep the engine's ranking instead of the client's alphabetical order.
        sort_text: Some(format!("{rank:05}")),
        insert_text: Some(candidate.insertion_template.clone()),
        insert_text_format: Some(if snippet {
            InsertTextFormat::SNIPPET
        } else {
            InsertTextFormat::PLAIN_TEXT
        }),
        ..Default::default()
    }
}

fn describe_word(session: &dosescript_core::EditorSession, text: &str, word: &str, offset: usize) -> Option<String> {
    let lang = LanguageDefinition::shared();
    if let Some(function) = lang.custom_function(word) {
        return Some(format!("```dosescript\n{}\n```\n{}", function.label(), function.description));
    }
    if let Some(param) = session.parameters().iter().find(|p| p.name == word) {
        return Some(format!("**{}** parameter `{}`: {}", param.label(), param.name, param.data_type));
    }
    if lang.is_keyword(word) {
        return Some(format!("Keyword `{word}`"));
    }
    if let Some(object) = lang.builtin_object(word) {
        return Some(format!("`{}`: {}", object.name, object.description));
    }
    if let Some((_, description)) = lang.builtin_functions.iter().find(|(name, _)| *name == word) {
        return Some(format!("`{word}()`: {description}"));
    }

    let tree = dosescript_core::scope::build_scope_tree(text);
    let symbol = tree.visible_symbols(offset).into_iter().find(|s| s.name == word)?;
    Some(match symbol.kind {
        SymbolKind::Function => match script_function_params(text, word) {
            Some(params) => format!("```dosescript\nfunction {}({})\n```", word, params.join(", ")),
            None => format!("Function `{word}`"),
        },
        SymbolKind::Variable => format!("Variable `{word}` (scope level {})", symbol.level),
    })
}

/// Parameter names of `function name(...)` declared in `text`.
fn script_function_params(text: &str, name: &str) -> Option<Vec<String>> {
    let needle = format!("function {name}");
    let mut from = 0;
    while let Some(found) = text[from..].find(&needle) {
        let after = from + found + needle.len();
        let rest = &text[after..];
        let open = after + rest.len() - rest.trim_start().len();
        if text[open..].starts_with('(') {
            let close = matching_close(text, open)?;
            return Some(param_names(&text[open + 1..close]));
        }
        from = after;
    }
    None
}
