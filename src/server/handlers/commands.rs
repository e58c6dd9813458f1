use crate::archive;
use crate::server::error::LspError;
use crate::server::state::ServerState;
use serde_json::json;
use std::path::PathBuf;
use std::time::Instant;
use tower_lsp::lsp_types::{ExecuteCommandParams, Url};

pub async fn handle_execute_command(
    params: ExecuteCommandParams,
    state: &ServerState,
) -> Option<serde_json::Value> {
    tracing::debug!("[HANDLE_EXECUTE_COMMAND_ENTER] cmd={}", params.command);
    let start = Instant::now();

    let result = handle_execute_command_inner(&params, state);

    tracing::debug!(
        "[HANDLE_EXECUTE_COMMAND_EXIT] cmd={} result={} elapsed_ms={}",
        params.command,
        if result.is_some() { "some" } else { "none" },
        start.elapsed().as_millis()
    );
    result
}

fn handle_execute_command_inner(
    params: &ExecuteCommandParams,
    state: &ServerState,
) -> Option<serde_json::Value> {
    match params.command.as_str() {
        // Select (or clear, with a null second argument) the override
        // values file for the chart owning the given file.
        "chartnav.values.select" => {
            let Some(anchor) = params.arguments.first().and_then(arg_path) else {
                return Some(json!({ "error": "expected a file path argument" }));
            };
            let Some(context) = state.charts.context_for_file(&anchor) else {
                LspError::NotHelmContext {
                    uri: anchor.display().to_string(),
                }
                .log_debug();
                return Some(json!({ "error": "file is not inside a Helm chart" }));
            };

            let selected = params.arguments.get(1).and_then(arg_path);
            state
                .values
                .select_override(&context.chart_root, selected.clone());

            Some(json!({
                "success": true,
                "chartRoot": context.chart_root.display().to_string(),
                "selected": selected.map(|p| p.display().to_string()),
            }))
        }
        // Enumerate the override candidates for the chart owning a file.
        "chartnav.values.list" => {
            let Some(anchor) = params.arguments.first().and_then(arg_path) else {
                return Some(json!({ "error": "expected a file path argument" }));
            };
            let Some(context) = state.charts.context_for_file(&anchor) else {
                return Some(json!({ "error": "file is not inside a Helm chart" }));
            };

            let overrides: Vec<String> = context
                .values_override_files
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            let selected = state
                .values
                .selected_override(&context.chart_root)
                .map(|p| p.display().to_string());

            Some(json!({
                "chartRoot": context.chart_root.display().to_string(),
                "defaultValues": context.values_yaml_path.display().to_string(),
                "overrides": overrides,
                "selected": selected,
            }))
        }
        // Materialize a read-only view of an archive entry for the client's
        // virtual-document provider.
        "chartnav.archive.read" => {
            let locator = params
                .arguments
                .first()
                .and_then(|arg| arg.as_str())
                .and_then(|s| Url::parse(s).ok());
            let Some((archive_path, inner)) = locator.as_ref().and_then(archive::parse_archive_uri)
            else {
                return Some(json!({ "error": "not a chart archive locator" }));
            };

            match archive::read_archive_entry(&archive_path, &inner) {
                Some(content) => Some(json!({ "content": content })),
                None => {
                    LspError::ArchiveUnaddressable {
                        archive: archive_path.display().to_string(),
                        inner,
                    }
                    .log_warn();
                    Some(json!({ "error": "archive entry is unreadable" }))
                }
            }
        }
        _ => None,
    }
}

// Command arguments may be plain paths or file URIs.
fn arg_path(arg: &serde_json::Value) -> Option<PathBuf> {
    let s = arg.as_str()?;
    if let Ok(url) = Url::parse(s) {
        if url.scheme() == "file" {
            return url.to_file_path().ok();
        }
    }
    Some(PathBuf::from(s))
}
