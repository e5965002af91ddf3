use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

use super::state::DoseScriptLanguageServer;

const DEFAULT_LOG_FILTER: &str = "dosescript_core=info,dosescript_lsp=info";

pub async fn run() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(DoseScriptLanguageServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
