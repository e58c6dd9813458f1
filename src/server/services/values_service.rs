//! Values resolution service: the cache, the per-chart override selection,
//! and the resolution entry points used by the handlers.

use crate::chart::{ChartContext, SubchartInfo};
use crate::server::cancellation::CancellationToken;
use crate::values::cache::{OverrideSelection, ValuesCache};
use crate::values::resolution;
use crate::values::tree::ValueNode;
use crate::values::ValuePosition;
use compact_str::CompactString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct ValuesService {
    cache: Arc<ValuesCache>,
    selection: Arc<OverrideSelection>,
}

impl ValuesService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the override file selected for a chart root and drops the
    /// root's cached merges; `None` clears the selection.
    pub fn select_override(&self, chart_root: &Path, file: Option<PathBuf>) {
        let previous = self.selection.select(chart_root, file.clone());
        if previous != file {
            self.cache.invalidate_chart(chart_root);
        }
    }

    pub fn selected_override(&self, chart_root: &Path) -> Option<PathBuf> {
        self.selection.selected_for(chart_root)
    }

    /// The chart's merged default/selected-override tree.
    pub fn merged_for(&self, chart_root: &Path) -> Option<Arc<ValueNode>> {
        let selected = self.selection.selected_for(chart_root);
        self.cache.merged_values(chart_root, selected.as_deref())
    }

    pub fn subchart_defaults(&self, subchart: &SubchartInfo) -> Option<Arc<ValueNode>> {
        self.cache.subchart_defaults(subchart)
    }

    pub fn resolve_in_chain(
        &self,
        context: &ChartContext,
        path: &[CompactString],
        cancel: &CancellationToken,
    ) -> Option<ValuePosition> {
        resolution::find_value_position_in_chain(
            &self.cache,
            &self.selection,
            context,
            path,
            cancel,
        )
    }

    pub fn resolve_in_archive(
        &self,
        parent: Option<(&ChartContext, &SubchartInfo)>,
        archive_path: &Path,
        path: &[CompactString],
        cancel: &CancellationToken,
    ) -> Option<ValuePosition> {
        resolution::find_archive_value_position(
            &self.cache,
            &self.selection,
            parent,
            archive_path,
            path,
            cancel,
        )
    }

    /// Drops cache entries that may have read `path`; wired to the
    /// client's watched-file notifications.
    pub fn invalidate_file(&self, path: &Path) {
        self.cache.invalidate_file(path);
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
