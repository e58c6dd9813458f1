//! The value-resolution core: where is a dotted `.Values` path defined?
//!
//! Root-chart lookups resolve against the chart's merged default/override
//! layers. Subchart lookups walk the ancestor chain from the topmost chart
//! down, because ancestors can override a descendant's values under
//! `global.*` (visible at any depth) or under the subchart's values key.
//! The first layer defining the path wins; an undefined path yields no
//! position, never an error.

use crate::chart::{ChartContext, SubchartInfo};
use crate::constants::GLOBAL_KEY;
use crate::server::cancellation::CancellationToken;
use crate::values::cache::{OverrideSelection, ValuesCache};
use crate::values::tree::{Mark, ValuesFile};
use compact_str::CompactString;
use std::path::Path;

/// Where a value path is defined: a position in a plain file or inside a
/// chart archive, depending on the file form.
#[derive(Debug, Clone)]
pub struct ValuePosition {
    pub file: ValuesFile,
    pub line: u32,
    pub character: u32,
}

impl ValuePosition {
    pub fn is_from_archive(&self) -> bool {
        self.file.is_archive()
    }

    fn from_mark(mark: &Mark) -> Self {
        Self {
            file: mark.file.as_ref().clone(),
            line: mark.line,
            character: mark.character,
        }
    }
}

/// Resolves a path against a single chart's merged layers: the override's
/// position when the key is present there, else the default's.
pub fn find_value_position(
    cache: &ValuesCache,
    chart_root: &Path,
    override_file: Option<&Path>,
    path: &[CompactString],
    cancel: &CancellationToken,
) -> Option<ValuePosition> {
    if path.is_empty() || cancel.is_cancelled() {
        return None;
    }
    let merged = cache.merged_values(chart_root, override_file)?;
    merged.key_position(path).map(ValuePosition::from_mark)
}

/// Resolves a path for a template belonging to `context`, walking the
/// ancestor chain when the chart is a subchart.
///
/// Per level, highest precedence first: an ancestor's `global.<path>`, the
/// immediate parent's `<subchartKey>.<path>`, the chart's own selected
/// override, the chart's own defaults.
pub fn find_value_position_in_chain(
    cache: &ValuesCache,
    selection: &OverrideSelection,
    context: &ChartContext,
    path: &[CompactString],
    cancel: &CancellationToken,
) -> Option<ValuePosition> {
    if path.is_empty() {
        return None;
    }

    if context.is_subchart {
        let chain = context.ancestors_root_first();

        if path[0] == GLOBAL_KEY {
            for ancestor in &chain[..chain.len() - 1] {
                if cancel.is_cancelled() {
                    return None;
                }
                if let Some(position) = lookup_merged(cache, selection, ancestor, path) {
                    return Some(position);
                }
            }
        } else if let Some(parent) = chain.len().checked_sub(2).map(|i| chain[i]) {
            if cancel.is_cancelled() {
                return None;
            }
            if let Some(key) = context.subchart_values_key() {
                let nested = prefixed(key, path);
                if let Some(position) = lookup_merged(cache, selection, parent, &nested) {
                    return Some(position);
                }
            }
        }
    }

    let selected = selection.selected_for(&context.chart_root);
    if let Some(position) =
        find_value_position(cache, &context.chart_root, selected.as_deref(), path, cancel)
    {
        return Some(position);
    }

    // A path rooted at a subchart's values key and absent from this chart's
    // own layers still has a definition: the subchart's packaged defaults.
    if cancel.is_cancelled() {
        return None;
    }
    lookup_in_subchart_defaults(cache, context, path)
}

fn lookup_in_subchart_defaults(
    cache: &ValuesCache,
    context: &ChartContext,
    path: &[CompactString],
) -> Option<ValuePosition> {
    let (head, rest) = path.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let subchart = context
        .subcharts
        .iter()
        .find(|s| s.values_key() == head.as_str())?;
    let defaults = cache.subchart_defaults(subchart)?;
    defaults.key_position(rest).map(ValuePosition::from_mark)
}

/// Resolves a path for a template living inside an archive-packaged
/// subchart. `parent` is the chart holding the archive under `charts/`;
/// when the archive is not part of any chart tree, pass `None` and the
/// path resolves against the packaged defaults alone.
pub fn find_archive_value_position(
    cache: &ValuesCache,
    selection: &OverrideSelection,
    parent: Option<(&ChartContext, &SubchartInfo)>,
    archive_path: &Path,
    path: &[CompactString],
    cancel: &CancellationToken,
) -> Option<ValuePosition> {
    if path.is_empty() || cancel.is_cancelled() {
        return None;
    }

    if let Some((parent_context, subchart)) = parent {
        if path[0] == GLOBAL_KEY {
            for ancestor in parent_context.ancestors_root_first() {
                if cancel.is_cancelled() {
                    return None;
                }
                if let Some(position) = lookup_merged(cache, selection, ancestor, path) {
                    return Some(position);
                }
            }
        } else {
            let nested = prefixed(CompactString::from(subchart.values_key()), path);
            if let Some(position) = lookup_merged(cache, selection, parent_context, &nested) {
                return Some(position);
            }
        }
    }

    if cancel.is_cancelled() {
        return None;
    }
    let packaged = cache.archive_values(archive_path)?;
    packaged.key_position(path).map(ValuePosition::from_mark)
}

fn lookup_merged(
    cache: &ValuesCache,
    selection: &OverrideSelection,
    context: &ChartContext,
    path: &[CompactString],
) -> Option<ValuePosition> {
    let selected = selection.selected_for(&context.chart_root);
    let merged = cache.merged_values(&context.chart_root, selected.as_deref())?;
    merged.key_position(path).map(ValuePosition::from_mark)
}

fn prefixed(key: CompactString, path: &[CompactString]) -> Vec<CompactString> {
    let mut nested = Vec::with_capacity(path.len() + 1);
    nested.push(key);
    nested.extend_from_slice(path);
    nested
}
