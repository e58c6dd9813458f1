//! Chart-context facade over detection and discovery.

use crate::chart::context::{self, ChartContext};
use crate::chart::SubchartInfo;
use crate::server::config::ConfigManager;
use std::path::Path;
use std::sync::Arc;

/// Resolves chart contexts on demand. Contexts are recomputed per request;
/// nothing here survives a structural change on disk.
#[derive(Clone)]
pub struct ChartService {
    config: Arc<ConfigManager>,
}

impl ChartService {
    pub fn new(config: Arc<ConfigManager>) -> Self {
        Self { config }
    }

    pub fn context_for_file(&self, path: &Path) -> Option<ChartContext> {
        context::detect_helm_chart_with_patterns(path, &self.config.override_patterns())
    }

    /// The chart owning an archive under its `charts/` directory, plus the
    /// archive's subchart record in that chart. `None` when the archive is
    /// not part of any chart tree.
    pub fn context_for_archive(
        &self,
        archive_path: &Path,
    ) -> Option<(ChartContext, SubchartInfo)> {
        let parent_dir = archive_path.parent()?;
        let context = self.context_for_file(parent_dir)?;
        let subchart = context
            .subcharts
            .iter()
            .find(|s| s.path == archive_path)?
            .clone();
        Some((context, subchart))
    }

    pub fn is_template_file(&self, path: &Path) -> bool {
        context::is_helm_template_file(path)
    }
}
