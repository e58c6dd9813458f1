pub mod archive;
pub mod chart;
pub mod constants;
pub mod server;
pub mod template;
pub mod values;

pub use server::LspServer;
pub use server::config::{ChartnavConfig, FeatureConfig, WorkspaceConfig};
