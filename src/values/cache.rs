//! Merged-tree caching keyed by `(chart root, selected override file)`.
//!
//! The cache is a pure function of its key plus current disk contents: the
//! only shared mutable state in the resolution subsystem. Entries are
//! dropped when a watched file changes or when a different override file is
//! selected for a chart root, never on a timer.

use crate::archive;
use crate::chart::context::default_values_path;
use crate::chart::SubchartInfo;
use crate::constants::DEFAULT_VALUES_FILES;
use crate::values::merge::merge_trees;
use crate::values::tree::{parse_values_text, ValueNode, ValuesFile};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    chart_root: PathBuf,
    override_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ValuesCache {
    merged: DashMap<CacheKey, Arc<ValueNode>>,
    archives: DashMap<PathBuf, Arc<ValueNode>>,
}

impl ValuesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The chart's default values layered with the selected override, if
    /// any. `None` when no layer loads; misses are not cached so that a
    /// file appearing on disk is picked up immediately.
    pub fn merged_values(
        &self,
        chart_root: &Path,
        override_file: Option<&Path>,
    ) -> Option<Arc<ValueNode>> {
        let key = CacheKey {
            chart_root: chart_root.to_path_buf(),
            override_file: override_file.map(|p| p.to_path_buf()),
        };
        if let Some(cached) = self.merged.get(&key) {
            return Some(Arc::clone(&cached));
        }

        let defaults = load_disk_values(&default_values_path(chart_root));
        let overrides = override_file.and_then(load_disk_values);

        let tree = match (defaults, overrides) {
            (Some(base), Some(overlay)) => merge_trees(base, overlay),
            (Some(base), None) => base,
            (None, Some(overlay)) => overlay,
            (None, None) => return None,
        };

        let tree = Arc::new(tree);
        self.merged.insert(key, Arc::clone(&tree));
        Some(tree)
    }

    /// The default values tree packaged inside a `.tgz` subchart, marks
    /// tagged with archive-internal locations.
    pub fn archive_values(&self, archive_path: &Path) -> Option<Arc<ValueNode>> {
        if let Some(cached) = self.archives.get(archive_path) {
            return Some(Arc::clone(&cached));
        }

        let (inner, text) = DEFAULT_VALUES_FILES.iter().find_map(|name| {
            archive::read_archive_entry(archive_path, name).map(|text| (*name, text))
        })?;
        let file = Arc::new(ValuesFile::InArchive {
            archive: archive_path.to_path_buf(),
            inner: inner.to_string(),
        });
        let tree = Arc::new(parse_values_text(&text, file)?);
        self.archives
            .insert(archive_path.to_path_buf(), Arc::clone(&tree));
        Some(tree)
    }

    /// Default values of a subchart, wherever it lives.
    pub fn subchart_defaults(&self, subchart: &SubchartInfo) -> Option<Arc<ValueNode>> {
        if subchart.is_archive {
            self.archive_values(&subchart.path)
        } else {
            self.merged_values(&subchart.path, None)
        }
    }

    /// Drops every entry that may have read `path`.
    pub fn invalidate_file(&self, path: &Path) {
        self.merged.retain(|key, _| {
            !path.starts_with(&key.chart_root)
                && key.override_file.as_deref() != Some(path)
        });
        self.archives.retain(|archive, _| archive != path);
    }

    /// Drops every entry for a chart root, used on override reselection.
    pub fn invalidate_chart(&self, chart_root: &Path) {
        self.merged.retain(|key, _| key.chart_root != chart_root);
    }

    pub fn clear(&self) {
        self.merged.clear();
        self.archives.clear();
    }

    pub fn len(&self) -> usize {
        self.merged.len() + self.archives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn load_disk_values(path: &Path) -> Option<ValueNode> {
    let text = std::fs::read_to_string(path).ok()?;
    parse_values_text(&text, Arc::new(ValuesFile::OnDisk(path.to_path_buf())))
}

/// The override file currently selected per chart root.
///
/// Selection is driven by the client through `chartnav.values.select`; a
/// chart root with no selection resolves against its defaults alone.
#[derive(Debug, Default)]
pub struct OverrideSelection {
    selected: DashMap<PathBuf, PathBuf>,
}

impl OverrideSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_for(&self, chart_root: &Path) -> Option<PathBuf> {
        self.selected.get(chart_root).map(|entry| entry.value().clone())
    }

    /// Records (or clears, with `None`) the selection for a chart root and
    /// returns the previous selection.
    pub fn select(&self, chart_root: &Path, file: Option<PathBuf>) -> Option<PathBuf> {
        match file {
            Some(file) => self.selected.insert(chart_root.to_path_buf(), file),
            None => self.selected.remove(chart_root).map(|(_, v)| v),
        }
    }
}
