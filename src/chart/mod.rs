pub mod context;
pub mod manifest;
pub mod subchart;

pub use context::{
    detect_helm_chart, is_helm_template_file, root_ancestor, ChartContext,
};
pub use manifest::{ChartDependency, ChartManifest, ManifestError};
pub use subchart::{discover_subcharts, SubchartInfo};
