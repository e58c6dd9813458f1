pub mod cancellation;
pub mod config;
pub mod error;
pub mod handlers;
pub mod services;
pub mod state;
pub mod util;

pub use error::LspError;

use crate::constants::{CHART_MANIFEST, OVERRIDE_PATTERNS};
use crate::server::config::ConfigManager;
use crate::server::state::ServerState;
use std::path::PathBuf;
use std::sync::Arc;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::info;

pub struct LspServer {
    pub client: Client,
    pub state: ServerState,
}

impl LspServer {
    pub fn new(client: Client, workspace_root: PathBuf) -> Self {
        Self::new_with_config(client, workspace_root, Arc::new(ConfigManager::new()))
    }

    pub fn new_with_config(
        client: Client,
        workspace_root: PathBuf,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            client,
            state: ServerState::new(workspace_root, config),
        }
    }

    pub async fn register_watched_files(&self) {
        let mut patterns = vec![
            "**/chartnav.toml".to_string(),
            format!("**/{}", CHART_MANIFEST),
            "**/*.tgz".to_string(),
            "**/values.yaml".to_string(),
            "**/values.yml".to_string(),
            "**/values/*.yaml".to_string(),
            "**/values/*.yml".to_string(),
        ];
        for pattern in OVERRIDE_PATTERNS {
            patterns.push(format!("**/{}", pattern));
        }
        for pattern in self.state.config.override_patterns() {
            patterns.push(format!("**/{}", pattern));
        }

        let watchers = patterns
            .into_iter()
            .map(|glob_pattern| FileSystemWatcher {
                glob_pattern: GlobPattern::String(glob_pattern),
                kind: None,
            })
            .collect();

        let registration = Registration {
            id: "chartnav-file-watcher".to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: Some(
                serde_json::to_value(DidChangeWatchedFilesRegistrationOptions { watchers })
                    .expect("watcher options serialize"),
            ),
        };
        if let Err(e) = self.client.register_capability(vec![registration]).await {
            self.client
                .log_message(
                    MessageType::ERROR,
                    format!("Failed to register watcher: {}", e),
                )
                .await;
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for LspServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        self.state
            .config
            .set_init_settings(params.initialization_options);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string()]),
                    ..Default::default()
                }),
                definition_provider: Some(OneOf::Left(true)),
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![
                        "chartnav.values.select".to_string(),
                        "chartnav.values.list".to_string(),
                        "chartnav.archive.read".to_string(),
                    ],
                    work_done_progress_options: WorkDoneProgressOptions {
                        work_done_progress: None,
                    },
                }),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "chartnav-lsp initialized!")
            .await;

        match self
            .state
            .config
            .load_from_workspace(&self.state.workspace_root)
        {
            Ok(_) => info!(
                "Loaded configuration from {}",
                self.state.workspace_root.display()
            ),
            Err(e) => tracing::warn!("Failed to load configuration: {}", e),
        }

        self.register_watched_files().await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.state.documents.open(
            params.text_document.uri,
            params.text_document.language_id,
            params.text_document.text,
            params.text_document.version,
        );
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        self.state.documents.change(
            &params.text_document.uri,
            params.content_changes,
            params.text_document.version,
        );
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.state.documents.close(&params.text_document.uri);
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        for change in params.changes {
            let Ok(path) = change.uri.to_file_path() else {
                continue;
            };

            if path.ends_with("chartnav.toml") {
                self.client
                    .log_message(MessageType::INFO, "Reloading configuration...")
                    .await;
                if let Err(e) = self
                    .state
                    .config
                    .load_from_workspace(&self.state.workspace_root)
                {
                    tracing::warn!("Failed to reload configuration: {}", e);
                }
                continue;
            }

            // Merged trees are a pure function of disk contents; any change
            // to a chart source drops the affected cache entries.
            self.state.values.invalidate_file(&path);
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        Ok(handlers::handle_definition(params, &self.state).await)
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        match handlers::handle_completion(params, &self.state).await {
            Some(items) => Ok(Some(CompletionResponse::Array(items))),
            None => Ok(None),
        }
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        Ok(handlers::handle_execute_command(params, &self.state).await)
    }
}
