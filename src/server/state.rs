//! Server state: a thin coordinator over the focused services.

use crate::server::config::ConfigManager;
use crate::server::services::{ChartService, DocumentService, ValuesService};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct ServerState {
    /// Open-document tracking.
    pub documents: DocumentService,
    /// Chart context detection and subchart discovery.
    pub charts: ChartService,
    /// Values cache, override selection, and resolution.
    pub values: ValuesService,
    /// Effective configuration.
    pub config: Arc<ConfigManager>,
    pub workspace_root: PathBuf,
}

impl ServerState {
    pub fn new(workspace_root: PathBuf, config: Arc<ConfigManager>) -> Self {
        Self {
            documents: DocumentService::new(),
            charts: ChartService::new(Arc::clone(&config)),
            values: ValuesService::new(),
            config,
            workspace_root,
        }
    }
}
