use crate::constants::GLOBAL_KEY;
use crate::server::cancellation::CancellationToken;
use crate::server::error::LspError;
use crate::server::state::ServerState;
use crate::server::util;
use crate::values::tree::ValueNode;
use compact_str::CompactString;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;
use std::time::Instant;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionParams, Documentation, MarkupContent,
    MarkupKind,
};

// Suggestion groups, encoded as sort-key prefixes: common globals first,
// then per-subchart globals, subchart root keys, local chart keys.
const GROUP_GLOBAL: &str = "0_";
const GROUP_SUBCHART_GLOBAL: &str = "1_";
const GROUP_SUBCHART: &str = "2_";
const GROUP_LOCAL: &str = "3_";

pub async fn handle_completion(
    params: CompletionParams,
    state: &ServerState,
) -> Option<Vec<CompletionItem>> {
    let uri = &params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;
    tracing::debug!(
        "[HANDLE_COMPLETION_ENTER] uri={} pos={}:{}",
        uri,
        position.line,
        position.character
    );
    let start = Instant::now();

    if !state.config.is_completion_enabled() {
        tracing::debug!(
            "[HANDLE_COMPLETION_EXIT] disabled elapsed_ms={}",
            start.elapsed().as_millis()
        );
        return None;
    }

    let path = uri.to_file_path().ok()?;
    if !state.charts.is_template_file(&path) {
        LspError::not_helm_context(uri).log_debug();
        return None;
    }
    let context = state.charts.context_for_file(&path)?;

    let content = match state.documents.get_content(uri) {
        Some(content) => content,
        None => std::fs::read_to_string(&path).ok()?,
    };
    let offset = util::position_to_offset(&content, position)?;
    let container = values_completion_path(&content, offset)?;

    let cancel = CancellationToken::new();
    let items = collect_items(state, &context, &container, &cancel);

    tracing::debug!(
        "[HANDLE_COMPLETION_EXIT] count={} elapsed_ms={}",
        items.len(),
        start.elapsed().as_millis()
    );
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

// The dotted span between `.Values.` and the cursor, inside an open
// template expression. The trailing partial segment is the word being
// completed and is dropped; what remains is the container path.
static VALUES_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.Values\.([A-Za-z0-9_\.\-]*)$").unwrap());

fn values_completion_path(content: &str, offset: usize) -> Option<Vec<CompactString>> {
    let before = content.get(..offset)?;
    let open = before.rfind("{{")?;
    if before[open..].contains("}}") {
        return None;
    }

    let captures = VALUES_PREFIX.captures(before)?;
    if captures.get(0).map(|m| m.start())? < open {
        return None;
    }
    let span = captures.get(1).map(|m| m.as_str()).unwrap_or("");

    let mut segments: Vec<CompactString> = span.split('.').map(CompactString::from).collect();
    segments.pop();
    Some(segments)
}

fn collect_items(
    state: &ServerState,
    context: &crate::chart::ChartContext,
    container: &[CompactString],
    cancel: &CancellationToken,
) -> Vec<CompletionItem> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut items = Vec::new();

    match container.split_first() {
        None => {
            complete_top_level(state, context, &mut seen, &mut items);
        }
        Some((head, rest)) if head == GLOBAL_KEY => {
            complete_globals(state, context, rest, cancel, &mut seen, &mut items);
        }
        Some((head, rest)) => {
            if cancel.is_cancelled() {
                return items;
            }
            // Keys nested below a subchart's values key complete from that
            // subchart's packaged defaults as well as local overrides.
            if let Some(subchart) = context
                .subcharts
                .iter()
                .find(|s| s.values_key() == head.as_str())
            {
                if let Some(defaults) = state.values.subchart_defaults(subchart) {
                    if let Some(mapping) = defaults.descend(rest).and_then(ValueNode::as_mapping)
                    {
                        for (key, entry) in &mapping.entries {
                            push_item(
                                &mut seen,
                                &mut items,
                                key,
                                GROUP_SUBCHART,
                                CompletionItemKind::FIELD,
                                entry.node.preview(),
                                format!(
                                    "From `{}` (subchart `{}`)",
                                    entry.key_mark.file.display_name(),
                                    subchart.name
                                ),
                            );
                        }
                    }
                }
            }

            if let Some(merged) = state.values.merged_for(&context.chart_root) {
                if let Some(mapping) = merged.descend(container).and_then(ValueNode::as_mapping) {
                    for (key, entry) in &mapping.entries {
                        push_item(
                            &mut seen,
                            &mut items,
                            key,
                            GROUP_LOCAL,
                            CompletionItemKind::FIELD,
                            entry.node.preview(),
                            format!("From `{}`", entry.key_mark.file.display_name()),
                        );
                    }
                }
            }
        }
    }

    items
}

fn complete_top_level(
    state: &ServerState,
    context: &crate::chart::ChartContext,
    seen: &mut FxHashSet<String>,
    items: &mut Vec<CompletionItem>,
) {
    push_item(
        seen,
        items,
        GLOBAL_KEY,
        GROUP_GLOBAL,
        CompletionItemKind::MODULE,
        "global values".to_string(),
        "Values visible to this chart and every subchart.".to_string(),
    );

    for subchart in &context.subcharts {
        let detail = if subchart.is_archive {
            format!("subchart `{}` (archive)", subchart.name)
        } else {
            format!("subchart `{}`", subchart.name)
        };
        push_item(
            seen,
            items,
            subchart.values_key(),
            GROUP_SUBCHART,
            CompletionItemKind::MODULE,
            detail,
            format!("Overrides nested for `{}`.", subchart.path.display()),
        );
    }

    if let Some(merged) = state.values.merged_for(&context.chart_root) {
        if let Some(mapping) = merged.as_mapping() {
            for (key, entry) in &mapping.entries {
                push_item(
                    seen,
                    items,
                    key,
                    GROUP_LOCAL,
                    CompletionItemKind::FIELD,
                    entry.node.preview(),
                    format!("From `{}`", entry.key_mark.file.display_name()),
                );
            }
        }
    }
}

// Global keys come from every chart in the ancestor chain (an ancestor's
// override can introduce globals for all descendants), then from each
// subchart's packaged defaults.
fn complete_globals(
    state: &ServerState,
    context: &crate::chart::ChartContext,
    rest: &[CompactString],
    cancel: &CancellationToken,
    seen: &mut FxHashSet<String>,
    items: &mut Vec<CompletionItem>,
) {
    let mut global_path: Vec<CompactString> = Vec::with_capacity(rest.len() + 1);
    global_path.push(CompactString::from(GLOBAL_KEY));
    global_path.extend_from_slice(rest);

    for ancestor in context.ancestors_root_first() {
        if cancel.is_cancelled() {
            return;
        }
        if let Some(merged) = state.values.merged_for(&ancestor.chart_root) {
            if let Some(mapping) = merged.descend(&global_path).and_then(ValueNode::as_mapping) {
                for (key, entry) in &mapping.entries {
                    push_item(
                        seen,
                        items,
                        key,
                        GROUP_GLOBAL,
                        CompletionItemKind::FIELD,
                        entry.node.preview(),
                        format!("Global from `{}`", entry.key_mark.file.display_name()),
                    );
                }
            }
        }
    }

    for subchart in &context.subcharts {
        if cancel.is_cancelled() {
            return;
        }
        if let Some(defaults) = state.values.subchart_defaults(subchart) {
            if let Some(mapping) = defaults.descend(&global_path).and_then(ValueNode::as_mapping)
            {
                for (key, entry) in &mapping.entries {
                    push_item(
                        seen,
                        items,
                        key,
                        GROUP_SUBCHART_GLOBAL,
                        CompletionItemKind::FIELD,
                        entry.node.preview(),
                        format!("Global declared by subchart `{}`", subchart.name),
                    );
                }
            }
        }
    }
}

fn push_item(
    seen: &mut FxHashSet<String>,
    items: &mut Vec<CompletionItem>,
    label: &str,
    sort_prefix: &str,
    kind: CompletionItemKind,
    detail: String,
    documentation: String,
) {
    if !seen.insert(label.to_string()) {
        return;
    }
    items.push(CompletionItem {
        label: label.to_string(),
        kind: Some(kind),
        detail: Some(detail),
        documentation: Some(Documentation::MarkupContent(MarkupContent {
            kind: MarkupKind::Markdown,
            value: documentation,
        })),
        insert_text: Some(label.to_string()),
        sort_text: Some(format!("{}{}", sort_prefix, label)),
        ..Default::default()
    });
}
