use anyhow::Context;
use chartnav_lsp::server::config::ConfigManager;
use chartnav_lsp::server::LspServer;
use std::sync::Arc;
use tower_lsp::{LspService, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Stdout carries the LSP stream; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let root = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));

    let config = ConfigManager::new();
    config
        .load_from_workspace(&root)
        .context("failed to load configuration")?;
    let config = Arc::new(config);

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| {
        LspServer::new_with_config(client, root.clone(), Arc::clone(&config))
    });
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
