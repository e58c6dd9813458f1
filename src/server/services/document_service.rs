//! Open-document tracking.
//!
//! Documents are synced with full content on every change; the parser
//! re-scans from scratch per request, so no per-document analysis state is
//! kept here.

use dashmap::DashMap;
use std::sync::Arc;
use tower_lsp::lsp_types::{TextDocumentContentChangeEvent, Url};

#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub version: i32,
    pub language_id: String,
}

#[derive(Clone, Default)]
pub struct DocumentService {
    documents: Arc<DashMap<Url, Document>>,
}

impl DocumentService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, uri: Url, language_id: String, content: String, version: i32) {
        self.documents.insert(
            uri,
            Document {
                content,
                version,
                language_id,
            },
        );
    }

    /// Applies full-sync changes; the last change event wins.
    pub fn change(&self, uri: &Url, changes: Vec<TextDocumentContentChangeEvent>, version: i32) {
        let Some(text) = changes.into_iter().last().map(|c| c.text) else {
            return;
        };
        if let Some(mut doc) = self.documents.get_mut(uri) {
            doc.content = text;
            doc.version = version;
        }
    }

    pub fn close(&self, uri: &Url) {
        self.documents.remove(uri);
    }

    pub fn get_content(&self, uri: &Url) -> Option<String> {
        self.documents.get(uri).map(|doc| doc.content.clone())
    }

    pub fn all_uris(&self) -> Vec<Url> {
        self.documents.iter().map(|e| e.key().clone()).collect()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}
