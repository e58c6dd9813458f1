#![allow(dead_code)]

use chartnav_lsp::server::config::ConfigManager;
use chartnav_lsp::server::handlers::{handle_completion, handle_definition};
use chartnav_lsp::server::state::ServerState;
use chartnav_lsp::server::util::offset_to_position;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionParams, GotoDefinitionParams, GotoDefinitionResponse, Location,
    PartialResultParams, Position, TextDocumentIdentifier, TextDocumentPositionParams, Url,
    WorkDoneProgressParams,
};

pub struct TestFixture {
    _temp: TempDir,
    pub root: PathBuf,
    pub state: ServerState,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = temp.path().to_path_buf();
        let state = ServerState::new(root.clone(), Arc::new(ConfigManager::new()));
        Self {
            _temp: temp,
            root,
            state,
        }
    }

    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, content).expect("write");
        path
    }

    pub fn file_url(&self, relative: &str) -> Url {
        Url::from_file_path(self.root.join(relative)).expect("file url")
    }

    /// Creates a minimal chart: `Chart.yaml` plus default values.
    pub fn create_chart(&self, relative: &str, name: &str, values: &str) -> PathBuf {
        self.write_file(
            &format!("{}/Chart.yaml", relative),
            &format!("name: {}\nversion: 0.1.0\n", name),
        );
        self.write_file(&format!("{}/values.yaml", relative), values);
        self.root.join(relative)
    }

    /// Packages a `.tgz` chart archive whose entries live under
    /// `inner_root/`.
    pub fn create_archive(
        &self,
        relative: &str,
        inner_root: &str,
        files: &[(&str, &str)],
    ) -> PathBuf {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");

        let file = File::create(&path).expect("create archive");
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            let entry_path = if inner_root.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", inner_root, name)
            };
            builder
                .append_data(&mut header, entry_path, content.as_bytes())
                .expect("append entry");
        }
        builder
            .into_inner()
            .expect("finish tar")
            .finish()
            .expect("finish gzip");
        path
    }
}

/// Position of the first occurrence of `needle` in `content`, offset by
/// `within` characters into the match.
pub fn position_of(content: &str, needle: &str, within: usize) -> Position {
    let offset = content.find(needle).expect("needle present");
    offset_to_position(content, offset + within)
}

pub async fn definition_at(
    fixture: &TestFixture,
    uri: &Url,
    position: Position,
) -> Option<Location> {
    let response = handle_definition(
        GotoDefinitionParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri: uri.clone() },
                position,
            },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        },
        &fixture.state,
    )
    .await?;
    match response {
        GotoDefinitionResponse::Scalar(location) => Some(location),
        GotoDefinitionResponse::Array(mut locations) => locations.pop(),
        GotoDefinitionResponse::Link(_) => None,
    }
}

pub async fn completion_at(
    fixture: &TestFixture,
    uri: &Url,
    position: Position,
) -> Option<Vec<CompletionItem>> {
    handle_completion(
        CompletionParams {
            text_document_position: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri: uri.clone() },
                position,
            },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            context: None,
        },
        &fixture.state,
    )
    .await
}
