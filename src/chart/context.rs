//! Chart context detection.
//!
//! Given an arbitrary file, walks upward to the chart root owning it and
//! resolves the full ancestor chain when the chart is itself a subchart
//! (nested under an enclosing chart's `charts/` directory).

use crate::chart::manifest;
use crate::chart::subchart::{self, SubchartInfo};
use crate::constants::{
    CHARTS_DIR, CHART_MANIFEST, DEFAULT_VALUES_FILES, OVERRIDE_PATTERNS, TEMPLATES_DIR,
    VALUES_DIR,
};
use compact_str::CompactString;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// The chart a file belongs to, with its full ancestor chain.
///
/// `parent` is an owned upward chain: a root chart has no parent, and a
/// context has a parent exactly when `is_subchart` is true. `subcharts` is
/// recomputed at detection time and never outlives the request.
#[derive(Debug, Clone)]
pub struct ChartContext {
    pub chart_root: PathBuf,
    pub chart_yaml_path: PathBuf,
    pub values_yaml_path: PathBuf,
    pub values_override_files: Vec<PathBuf>,
    pub is_subchart: bool,
    pub subchart_name: Option<CompactString>,
    pub parent: Option<Box<ChartContext>>,
    pub subcharts: Vec<SubchartInfo>,
}

impl ChartContext {
    /// Ancestor chain from the topmost chart down to this one.
    pub fn ancestors_root_first(&self) -> Vec<&ChartContext> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(ctx) = current {
            chain.push(ctx);
            current = ctx.parent.as_deref();
        }
        chain.reverse();
        chain
    }

    /// The key under which the enclosing chart's values nest this subchart's
    /// overrides: the declared alias when one exists, else the chart name.
    pub fn subchart_values_key(&self) -> Option<CompactString> {
        let parent = self.parent.as_deref()?;
        if let Some(info) = parent.subcharts.iter().find(|s| s.path == self.chart_root) {
            return Some(CompactString::from(info.values_key()));
        }
        self.subchart_name.clone()
    }
}

/// Walks `parent` links to the topmost chart of the chain.
pub fn root_ancestor(context: &ChartContext) -> &ChartContext {
    let mut current = context;
    while let Some(parent) = current.parent.as_deref() {
        current = parent;
    }
    current
}

/// Detects the chart a file (or directory) belongs to.
///
/// Returns `None` when no `Chart.yaml` is found on the way up to the
/// filesystem root.
pub fn detect_helm_chart(path: &Path) -> Option<ChartContext> {
    detect_helm_chart_with_patterns(path, &[])
}

/// Like [`detect_helm_chart`], with additional override file-name patterns
/// from configuration.
pub fn detect_helm_chart_with_patterns(
    path: &Path,
    extra_patterns: &[String],
) -> Option<ChartContext> {
    let root = path
        .ancestors()
        .find(|dir| dir.join(CHART_MANIFEST).is_file())?;
    Some(context_for_root(root, extra_patterns))
}

fn context_for_root(root: &Path, extra_patterns: &[String]) -> ChartContext {
    // A chart sitting at `<ancestor>/charts/<name>/` is a subchart of that
    // ancestor; the recursion shortens the path, so it terminates.
    let parent = root
        .parent()
        .filter(|p| p.file_name() == Some(OsStr::new(CHARTS_DIR)))
        .and_then(|charts| charts.parent())
        .filter(|gp| gp.join(CHART_MANIFEST).is_file())
        .map(|gp| Box::new(context_for_root(gp, extra_patterns)));

    let chart_yaml_path = root.join(CHART_MANIFEST);
    let subchart_name = match manifest::load_manifest(&chart_yaml_path) {
        Ok(m) => Some(CompactString::from(m.name)),
        Err(e) => {
            tracing::debug!("unreadable manifest at {}: {}", root.display(), e);
            root.file_name()
                .and_then(|n| n.to_str())
                .map(CompactString::from)
        }
    };

    ChartContext {
        chart_root: root.to_path_buf(),
        chart_yaml_path,
        values_yaml_path: default_values_path(root),
        values_override_files: discover_override_files(root, extra_patterns),
        is_subchart: parent.is_some(),
        subchart_name: if parent.is_some() { subchart_name } else { None },
        parent,
        subcharts: subchart::discover_subcharts(root),
    }
}

/// The chart's default values file: the first of `values.yaml`/`values.yml`
/// that exists, else the expected `values.yaml` path.
pub fn default_values_path(chart_root: &Path) -> PathBuf {
    DEFAULT_VALUES_FILES
        .iter()
        .map(|name| chart_root.join(name))
        .find(|p| p.is_file())
        .unwrap_or_else(|| chart_root.join(DEFAULT_VALUES_FILES[0]))
}

/// Classifies `.yaml`/`.yml`/`.tpl` files under a chart's `templates/`
/// directory as templates.
pub fn is_helm_template_file(path: &Path) -> bool {
    let is_template_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e, "yaml" | "yml" | "tpl"))
        .unwrap_or(false);
    if !is_template_ext {
        return false;
    }

    path.ancestors()
        .skip(1)
        .any(|dir| {
            dir.file_name() == Some(OsStr::new(TEMPLATES_DIR))
                && dir
                    .parent()
                    .map(|chart| chart.join(CHART_MANIFEST).is_file())
                    .unwrap_or(false)
        })
}

/// Enumerates override value files for a chart root: file names matching the
/// override patterns next to `Chart.yaml` (minus the default values file),
/// plus everything under the `values/` subdirectory.
pub fn discover_override_files(chart_root: &Path, extra_patterns: &[String]) -> Vec<PathBuf> {
    let mut patterns: Vec<glob::Pattern> = OVERRIDE_PATTERNS
        .iter()
        .map(|p| glob::Pattern::new(p).expect("static pattern"))
        .collect();
    for p in extra_patterns {
        match glob::Pattern::new(p) {
            Ok(pattern) => patterns.push(pattern),
            Err(e) => tracing::warn!("invalid override pattern {:?}: {}", p, e),
        }
    }

    let default_values = default_values_path(chart_root);
    let mut overrides = Vec::new();

    if let Ok(entries) = std::fs::read_dir(chart_root) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || path == default_values {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if patterns.iter().any(|p| p.matches(file_name)) {
                overrides.push(path);
            }
        }
    }

    if let Ok(entries) = std::fs::read_dir(chart_root.join(VALUES_DIR)) {
        for entry in entries.flatten() {
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e, "yaml" | "yml"))
                .unwrap_or(false);
            if path.is_file() && is_yaml {
                overrides.push(path);
            }
        }
    }

    overrides.sort();
    overrides
}
