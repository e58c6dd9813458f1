use crate::archive;
use crate::constants::{ARCHIVE_URI_SCHEME, CHART_MANIFEST};
use crate::server::cancellation::CancellationToken;
use crate::server::error::LspError;
use crate::server::state::ServerState;
use crate::server::util;
use crate::template::{parse_template_references, reference_at_offset, TemplateObject};
use crate::values::tree::parse_values_text;
use crate::values::ValuesFile;
use compact_str::CompactString;
use std::sync::Arc;
use std::time::Instant;
use tower_lsp::lsp_types::{GotoDefinitionParams, GotoDefinitionResponse, Position, Url};

pub async fn handle_definition(
    params: GotoDefinitionParams,
    state: &ServerState,
) -> Option<GotoDefinitionResponse> {
    let uri = &params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;
    tracing::debug!(
        "[HANDLE_DEFINITION_ENTER] uri={} pos={}:{}",
        uri,
        position.line,
        position.character
    );
    let start = Instant::now();

    if !state.config.is_definition_enabled() {
        tracing::debug!(
            "[HANDLE_DEFINITION_EXIT] disabled elapsed_ms={}",
            start.elapsed().as_millis()
        );
        return None;
    }

    let cancel = CancellationToken::new();
    let result = match uri.scheme() {
        "file" => definition_in_file(uri, position, state, &cancel),
        scheme if scheme == ARCHIVE_URI_SCHEME => {
            definition_in_archive(uri, position, state, &cancel)
        }
        _ => None,
    };

    tracing::debug!(
        "[HANDLE_DEFINITION_EXIT] result={} elapsed_ms={}",
        if result.is_some() { "found" } else { "none" },
        start.elapsed().as_millis()
    );
    result
}

fn definition_in_file(
    uri: &Url,
    position: Position,
    state: &ServerState,
    cancel: &CancellationToken,
) -> Option<GotoDefinitionResponse> {
    let path = uri.to_file_path().ok()?;
    if !state.charts.is_template_file(&path) {
        LspError::not_helm_context(uri).log_debug();
        return None;
    }
    let Some(context) = state.charts.context_for_file(&path) else {
        LspError::not_helm_context(uri).log_debug();
        return None;
    };

    let content = match state.documents.get_content(uri) {
        Some(content) => content,
        None => match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => {
                LspError::document_not_found(uri).log_debug();
                return None;
            }
        },
    };
    let Some(offset) = util::position_to_offset(&content, position) else {
        LspError::invalid_position(uri, position).log_debug();
        return None;
    };

    let references = parse_template_references(&content);
    let reference = reference_at_offset(&references, offset)?;

    match reference.object {
        TemplateObject::Values => {
            let Some(resolved) = state
                .values
                .resolve_in_chain(&context, &reference.path, cancel)
            else {
                LspError::undefined_path(&reference.path).log_debug();
                return None;
            };
            let key_len = reference.last_segment().map(str::len).unwrap_or(0);
            util::location_for(&resolved, key_len).map(GotoDefinitionResponse::Scalar)
        }
        TemplateObject::Chart => {
            let text = match std::fs::read_to_string(&context.chart_yaml_path) {
                Ok(text) => text,
                Err(e) => {
                    LspError::MalformedChart {
                        path: context.chart_yaml_path.display().to_string(),
                        reason: e.to_string(),
                    }
                    .log_debug();
                    return None;
                }
            };
            let file = Arc::new(ValuesFile::OnDisk(context.chart_yaml_path.clone()));
            manifest_definition(&text, file, &reference.path)
        }
        _ => None,
    }
}

fn definition_in_archive(
    uri: &Url,
    position: Position,
    state: &ServerState,
    cancel: &CancellationToken,
) -> Option<GotoDefinitionResponse> {
    let (archive_path, inner) = archive::parse_archive_uri(uri)?;

    let content = match state.documents.get_content(uri) {
        Some(content) => content,
        None => archive::read_archive_entry(&archive_path, &inner)?,
    };
    let Some(offset) = util::position_to_offset(&content, position) else {
        LspError::invalid_position(uri, position).log_debug();
        return None;
    };

    let references = parse_template_references(&content);
    let reference = reference_at_offset(&references, offset)?;

    match reference.object {
        TemplateObject::Values => {
            let parent = state.charts.context_for_archive(&archive_path);
            let resolved = state.values.resolve_in_archive(
                parent.as_ref().map(|(ctx, sub)| (ctx, sub)),
                &archive_path,
                &reference.path,
                cancel,
            );
            let Some(resolved) = resolved else {
                LspError::undefined_path(&reference.path).log_debug();
                return None;
            };
            let key_len = reference.last_segment().map(str::len).unwrap_or(0);
            util::location_for(&resolved, key_len).map(GotoDefinitionResponse::Scalar)
        }
        TemplateObject::Chart => {
            let text = archive::read_archive_entry(&archive_path, CHART_MANIFEST)?;
            let file = Arc::new(ValuesFile::InArchive {
                archive: archive_path.clone(),
                inner: CHART_MANIFEST.to_string(),
            });
            manifest_definition(&text, file, &reference.path)
        }
        _ => None,
    }
}

// `.Chart.Name` style references address manifest fields whose keys are the
// template accessor with a lowered first letter (`Name` -> `name`,
// `AppVersion` -> `appVersion`).
fn manifest_definition(
    text: &str,
    file: Arc<ValuesFile>,
    path: &[CompactString],
) -> Option<GotoDefinitionResponse> {
    let mapped = manifest_path(path)?;
    let tree = parse_values_text(text, file)?;
    let mark = tree.key_position(&mapped)?;
    let key_len = mapped.last().map(|s| s.len()).unwrap_or(0);
    let resolved = crate::values::ValuePosition {
        file: mark.file.as_ref().clone(),
        line: mark.line,
        character: mark.character,
    };
    util::location_for(&resolved, key_len).map(GotoDefinitionResponse::Scalar)
}

fn manifest_path(path: &[CompactString]) -> Option<Vec<CompactString>> {
    let (first, rest) = path.split_first()?;
    let mut chars = first.chars();
    let lowered: CompactString = match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => return None,
    };
    let mut mapped = Vec::with_capacity(path.len());
    mapped.push(lowered);
    mapped.extend_from_slice(rest);
    Some(mapped)
}
