//! Structured error types for the LSP server.
//!
//! None of these conditions is fatal to the host: every failure in the
//! resolution subsystem degrades to "no definition / no completions" so
//! the editing experience stays uninterrupted. The variants exist so the
//! degradation is logged with its cause.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LspError {
    #[error("{uri} is not inside a Helm chart")]
    NotHelmContext { uri: String },

    #[error("no definition for value path '{path}'")]
    UndefinedPath { path: String },

    #[error("malformed chart source {path}: {reason}")]
    MalformedChart { path: String, reason: String },

    #[error("cannot address archive entry {archive}:{inner}")]
    ArchiveUnaddressable { archive: String, inner: String },

    #[error("document not found: {uri}")]
    DocumentNotFound { uri: String },

    #[error("invalid position: line {line}, char {character} in {uri}")]
    InvalidPosition {
        uri: String,
        line: u32,
        character: u32,
    },
}

impl LspError {
    pub fn log_debug(&self) {
        tracing::debug!("LSP error: {}", self);
    }

    pub fn log_warn(&self) {
        tracing::warn!("LSP error: {}", self);
    }

    pub fn not_helm_context(uri: &tower_lsp::lsp_types::Url) -> Self {
        Self::NotHelmContext {
            uri: uri.to_string(),
        }
    }

    pub fn undefined_path(path: &[compact_str::CompactString]) -> Self {
        Self::UndefinedPath {
            path: path.join("."),
        }
    }

    pub fn document_not_found(uri: &tower_lsp::lsp_types::Url) -> Self {
        Self::DocumentNotFound {
            uri: uri.to_string(),
        }
    }

    pub fn invalid_position(
        uri: &tower_lsp::lsp_types::Url,
        position: tower_lsp::lsp_types::Position,
    ) -> Self {
        Self::InvalidPosition {
            uri: uri.to_string(),
            line: position.line,
            character: position.character,
        }
    }
}
