//! Enumeration of a chart's subcharts under `charts/`.

use crate::archive;
use crate::chart::manifest;
use crate::constants::{ARCHIVE_EXT, CHARTS_DIR, CHART_MANIFEST};
use compact_str::CompactString;
use std::path::{Path, PathBuf};

/// A declared or discovered subchart: an expanded directory or a packaged
/// `.tgz` archive under the enclosing chart's `charts/` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubchartInfo {
    pub name: CompactString,
    pub alias: Option<CompactString>,
    /// Directory of the subchart, or path of the `.tgz` when `is_archive`.
    pub path: PathBuf,
    pub is_archive: bool,
}

impl SubchartInfo {
    /// The key under which the enclosing chart's values tree nests this
    /// subchart's overrides.
    pub fn values_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Enumerates the subcharts of `chart_root`, resolving aliases from the
/// enclosing manifest's dependency declarations.
///
/// Candidates with a missing or unparsable `Chart.yaml` are skipped
/// silently; partial chart trees are common while editing.
pub fn discover_subcharts(chart_root: &Path) -> Vec<SubchartInfo> {
    let parent_manifest = manifest::load_manifest(&chart_root.join(CHART_MANIFEST)).ok();
    let alias_for = |name: &str| -> Option<CompactString> {
        parent_manifest
            .as_ref()
            .and_then(|m| m.alias_for(name))
            .map(CompactString::from)
    };

    let charts_dir = chart_root.join(CHARTS_DIR);
    let Ok(entries) = std::fs::read_dir(&charts_dir) else {
        return Vec::new();
    };

    let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
    paths.sort();

    let mut subcharts = Vec::new();
    for path in paths {
        if path.is_dir() {
            match manifest::load_manifest(&path.join(CHART_MANIFEST)) {
                Ok(m) => {
                    let name = CompactString::from(m.name);
                    subcharts.push(SubchartInfo {
                        alias: alias_for(&name),
                        name,
                        path,
                        is_archive: false,
                    });
                }
                Err(e) => {
                    tracing::debug!("skipping subchart candidate {}: {}", path.display(), e);
                }
            }
        } else if path.extension().and_then(|e| e.to_str()) == Some(ARCHIVE_EXT) {
            match archive::probe_chart_archive(&path) {
                Some(probed) => subcharts.push(SubchartInfo {
                    alias: alias_for(&probed.name),
                    name: probed.name,
                    path,
                    is_archive: true,
                }),
                None => {
                    tracing::debug!("skipping unreadable archive {}", path.display());
                }
            }
        }
    }

    subcharts
}
