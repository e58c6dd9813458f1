//! Chart file-layout names shared across the codebase.

/// Chart descriptor file name.
pub const CHART_MANIFEST: &str = "Chart.yaml";

/// Default values file names, in lookup order.
pub const DEFAULT_VALUES_FILES: &[&str] = &["values.yaml", "values.yml"];

/// Directory holding expanded and packaged subcharts.
pub const CHARTS_DIR: &str = "charts";

/// Directory holding template files.
pub const TEMPLATES_DIR: &str = "templates";

/// Subdirectory scanned for additional override files.
pub const VALUES_DIR: &str = "values";

/// File-name patterns classifying override value files.
pub const OVERRIDE_PATTERNS: &[&str] = &[
    "values*.yaml",
    "values*.yml",
    "*.values.yaml",
    "*.values.yml",
    "*-values.yaml",
    "*-values.yml",
];

/// Extension of packaged subchart archives.
pub const ARCHIVE_EXT: &str = "tgz";

/// URI scheme for read-only views into chart archives.
pub const ARCHIVE_URI_SCHEME: &str = "helm-tgz";

/// Values key visible to every descendant subchart.
pub const GLOBAL_KEY: &str = "global";
